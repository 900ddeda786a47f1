//! 测验编辑服务 - 业务能力层
//!
//! 打开已保存的测验，逐题修改并立即写回

use tracing::{info, warn};

use crate::error::{AppError, AppResult, IndexError};
use crate::infrastructure::Storage;
use crate::models::{self, quiz_id_from_path, Question, QuizDocument};
use crate::services::authoring_service::QuestionDraft;

/// 已保存测验的编辑器
///
/// 每次成功修改都会整体写回原文件，没有"未保存"状态
pub struct QuizEditor<S: Storage> {
    storage: S,
    path: String,
    document: QuizDocument,
}

impl<S: Storage> QuizEditor<S> {
    /// 打开测验文件；内容格式错误时按空测验处理
    pub fn open(storage: S, path: impl Into<String>) -> AppResult<Self> {
        let path = path.into();
        let bytes = storage.read(&path)?.ok_or_else(|| {
            AppError::file_read_failed(
                path.clone(),
                std::io::Error::from(std::io::ErrorKind::NotFound),
            )
        })?;

        let document = models::parse(&bytes).unwrap_or_else(|e| {
            warn!("测验文件格式错误，按空测验处理 {}: {}", path, e);
            QuizDocument::new()
        });

        Ok(Self {
            storage,
            path,
            document,
        })
    }

    pub fn document(&self) -> &QuizDocument {
        &self.document
    }

    pub fn quiz_id(&self) -> String {
        quiz_id_from_path(&self.path)
    }

    pub fn question(&self, index: usize) -> Result<&Question, IndexError> {
        self.document.get(index)
    }

    /// 选中题目后用于填充编辑表单
    pub fn draft(&self, index: usize) -> Result<QuestionDraft, IndexError> {
        self.question(index).map(QuestionDraft::from_question)
    }

    /// 替换指定题目并立即写回文件
    ///
    /// 写入失败时内存中的测验保持不变
    pub fn update_question(&mut self, index: usize, question: Question) -> AppResult<()> {
        let mut updated = self.document.clone();
        updated.replace(index, question)?;

        let bytes = models::serialize(&updated)?;
        self.storage.write(&self.path, &bytes)?;
        self.document = updated;

        info!("✓ 题目 {} 已更新并保存: {}", index + 1, self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::MemoryStorage;
    use crate::models::Difficulty;

    const QUIZ: &str = r#"[
        {"question":"q1","options":["a","b","c","d"],"correct":[0],"difficulty":1},
        {"question":"q2","options":["e","f","g","h"],"correct":[1,2],"difficulty":3}
    ]"#;

    fn replacement() -> Question {
        Question {
            text: "new".to_string(),
            options: ["w".into(), "x".into(), "y".into(), "z".into()],
            correct_indexes: [3].into_iter().collect(),
            difficulty: Difficulty::Medium,
        }
    }

    #[test]
    fn test_update_writes_through() {
        let storage = MemoryStorage::new().with_file("quiz.json", QUIZ);
        let mut editor = QuizEditor::open(&storage, "quiz.json").unwrap();

        editor.update_question(1, replacement()).unwrap();

        let saved = models::parse(&storage.read("quiz.json").unwrap().unwrap()).unwrap();
        assert_eq!(saved.questions()[1], replacement());
        assert_eq!(saved.questions()[0].text, "q1");
        assert_eq!(editor.document(), &saved);
    }

    #[test]
    fn test_update_out_of_range_is_index_error() {
        let storage = MemoryStorage::new().with_file("quiz.json", QUIZ);
        let mut editor = QuizEditor::open(&storage, "quiz.json").unwrap();

        let err = editor.update_question(2, replacement()).unwrap_err();
        assert!(matches!(err, AppError::Index(IndexError { index: 2, len: 2 })));
    }

    #[test]
    fn test_failed_write_keeps_document() {
        let storage = MemoryStorage::read_only();
        let mut editor = QuizEditor {
            storage: &storage,
            path: "quiz.json".to_string(),
            document: models::parse(QUIZ.as_bytes()).unwrap(),
        };

        assert!(matches!(
            editor.update_question(0, replacement()),
            Err(AppError::File(_))
        ));
        assert_eq!(editor.question(0).unwrap().text, "q1");
    }

    #[test]
    fn test_open_missing_and_malformed() {
        let storage = MemoryStorage::new().with_file("junk.json", "{}");
        assert!(QuizEditor::open(&storage, "missing.json").is_err());

        let editor = QuizEditor::open(&storage, "junk.json").unwrap();
        assert!(editor.document().is_empty());
        assert_eq!(editor.quiz_id(), "junk.json");
    }

    #[test]
    fn test_draft_prefills_checkboxes() {
        let storage = MemoryStorage::new().with_file("quiz.json", QUIZ);
        let editor = QuizEditor::open(&storage, "quiz.json").unwrap();
        let draft = editor.draft(1).unwrap();
        assert_eq!(draft.correct, [false, true, true, false]);
        assert_eq!(draft.difficulty, Difficulty::Hard);
        assert!(editor.draft(9).is_err());
    }
}
