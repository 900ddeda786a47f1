//! 测验编写服务 - 业务能力层
//!
//! 只负责"把表单字段变成合法题目并保存"的能力，不关心界面

use tracing::{debug, info};

use crate::error::{AppResult, IndexError, ValidationError};
use crate::infrastructure::Storage;
use crate::models::{self, Difficulty, Question, QuizDocument, OPTION_COUNT};

/// 编写题目所需的全部字段
///
/// `correct` 与 `options` 一一对应，表示该选项是否正确
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionDraft {
    pub text: String,
    pub options: [String; OPTION_COUNT],
    pub correct: [bool; OPTION_COUNT],
    pub difficulty: Difficulty,
}

impl QuestionDraft {
    /// 用已有题目填充表单（编辑模式）
    pub fn from_question(question: &Question) -> Self {
        let mut correct = [false; OPTION_COUNT];
        for &index in &question.correct_indexes {
            if let Some(slot) = correct.get_mut(index) {
                *slot = true;
            }
        }
        Self {
            text: question.text.clone(),
            options: question.options.clone(),
            correct,
            difficulty: question.difficulty,
        }
    }

    /// 校验并生成题目
    ///
    /// 依次检查：题干为空、任一选项为空、没有正确答案
    pub fn build(&self) -> Result<Question, ValidationError> {
        if self.text.is_empty() {
            return Err(ValidationError::EmptyQuestion);
        }
        if let Some(index) = self.options.iter().position(|o| o.is_empty()) {
            return Err(ValidationError::EmptyOption { index });
        }
        let correct_indexes = self
            .correct
            .iter()
            .enumerate()
            .filter_map(|(i, &checked)| checked.then_some(i))
            .collect::<std::collections::BTreeSet<_>>();
        if correct_indexes.is_empty() {
            return Err(ValidationError::NoCorrectAnswer);
        }

        Ok(Question {
            text: self.text.clone(),
            options: self.options.clone(),
            correct_indexes,
            difficulty: self.difficulty,
        })
    }
}

/// 添加题目的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedQuestion {
    pub question: Question,
    /// 在测验中的位置（从 0 开始）
    pub position: usize,
    /// 通知界面清空输入表单
    pub reset_form: bool,
}

/// 测验编写服务
///
/// 职责：
/// - 独占正在编写的 QuizDocument，直到保存
/// - 校验表单字段
/// - 保存时目标路径由调用方提供
pub struct QuizAuthoring<S: Storage> {
    storage: S,
    document: QuizDocument,
}

impl<S: Storage> QuizAuthoring<S> {
    /// 从空测验开始编写
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            document: QuizDocument::new(),
        }
    }

    /// 校验并追加一道题目
    pub fn add_question(&mut self, draft: &QuestionDraft) -> Result<AddedQuestion, ValidationError> {
        let question = draft.build()?;
        let position = self.document.push(question.clone());
        debug!("添加题目 #{}: {}", position + 1, question.text);

        Ok(AddedQuestion {
            question,
            position,
            reset_form: true,
        })
    }

    /// 移除尚未保存的题目
    pub fn remove_question(&mut self, index: usize) -> Result<Question, IndexError> {
        self.document.remove(index)
    }

    /// 正在编写的测验（只读）
    pub fn document(&self) -> &QuizDocument {
        &self.document
    }

    /// 保存到调用方指定的位置
    pub fn save_document(&self, destination: &str) -> AppResult<()> {
        save_document(&self.storage, &self.document, destination)
    }
}

/// 序列化并整体写入测验，空测验拒绝保存
pub fn save_document<S: Storage + ?Sized>(
    storage: &S,
    document: &QuizDocument,
    destination: &str,
) -> AppResult<()> {
    if document.is_empty() {
        return Err(ValidationError::EmptyQuiz.into());
    }

    let bytes = models::serialize(document)?;
    storage.write(destination, &bytes)?;
    info!("✓ 测验已保存: {} ({} 道题目)", destination, document.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::infrastructure::MemoryStorage;

    fn draft() -> QuestionDraft {
        QuestionDraft {
            text: "Capital of France?".to_string(),
            options: ["Paris".into(), "Rome".into(), "Berlin".into(), "Madrid".into()],
            correct: [true, false, false, false],
            difficulty: Difficulty::Easy,
        }
    }

    #[test]
    fn test_build_rejects_exactly_three_conditions() {
        let mut empty_text = draft();
        empty_text.text.clear();
        assert_eq!(empty_text.build(), Err(ValidationError::EmptyQuestion));

        let mut empty_option = draft();
        empty_option.options[2] = String::new();
        assert_eq!(
            empty_option.build(),
            Err(ValidationError::EmptyOption { index: 2 })
        );

        let mut no_correct = draft();
        no_correct.correct = [false; OPTION_COUNT];
        assert_eq!(no_correct.build(), Err(ValidationError::NoCorrectAnswer));

        let mut multi = draft();
        multi.correct = [true, false, true, true];
        let question = multi.build().unwrap();
        assert_eq!(question.correct_indexes.iter().copied().collect::<Vec<_>>(), vec![0, 2, 3]);
    }

    #[test]
    fn test_duplicate_options_are_accepted() {
        let mut dup = draft();
        dup.options[1] = "Paris".to_string();
        assert!(dup.build().is_ok());
    }

    #[test]
    fn test_add_question_signals_form_reset() {
        let mut authoring = QuizAuthoring::new(MemoryStorage::new());
        let added = authoring.add_question(&draft()).unwrap();
        assert_eq!(added.position, 0);
        assert!(added.reset_form);

        let mut bad = draft();
        bad.text.clear();
        assert!(authoring.add_question(&bad).is_err());
        assert_eq!(authoring.document().len(), 1);
    }

    #[test]
    fn test_whitespace_text_and_options_are_accepted() {
        let mut blank_text = draft();
        blank_text.text = " ".to_string();
        assert_eq!(blank_text.build().unwrap().text, " ");

        let mut blank_option = draft();
        blank_option.options[1] = "  ".to_string();
        assert_eq!(blank_option.build().unwrap().options[1], "  ");

        let mut authoring = QuizAuthoring::new(MemoryStorage::new());
        assert!(authoring.add_question(&blank_text).is_ok());
        assert!(authoring.add_question(&blank_option).is_ok());
        assert_eq!(authoring.document().len(), 2);
    }

    #[test]
    fn test_save_empty_quiz_is_rejected() {
        let storage = MemoryStorage::new();
        let authoring = QuizAuthoring::new(&storage);
        let err = authoring.save_document("quiz.json").unwrap_err();
        assert!(matches!(err, AppError::Validation(ValidationError::EmptyQuiz)));
        assert!(storage.read("quiz.json").unwrap().is_none());
    }

    #[test]
    fn test_save_writes_parseable_document() {
        let storage = MemoryStorage::new();
        let mut authoring = QuizAuthoring::new(&storage);
        authoring.add_question(&draft()).unwrap();
        authoring.save_document("geo.json").unwrap();

        let bytes = storage.read("geo.json").unwrap().unwrap();
        assert_eq!(&models::parse(&bytes).unwrap(), authoring.document());
    }

    #[test]
    fn test_remove_question() {
        let mut authoring = QuizAuthoring::new(MemoryStorage::new());
        authoring.add_question(&draft()).unwrap();
        assert!(authoring.remove_question(3).is_err());
        assert_eq!(authoring.remove_question(0).unwrap().text, "Capital of France?");
        assert!(authoring.document().is_empty());
    }

    #[test]
    fn test_draft_from_question_round_trip() {
        let question = draft().build().unwrap();
        assert_eq!(QuestionDraft::from_question(&question), draft());
    }
}
