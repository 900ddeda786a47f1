use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use crate::error::{FormatError, IndexError};

/// 每道题固定的选项数量
pub const OPTION_COUNT: usize = 4;

/// 难度，同时决定分值和时间预算
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub enum Difficulty {
    /// 简单
    Easy = 1,
    /// 中等
    #[default]
    Medium = 2,
    /// 困难
    Hard = 3,
}

impl Difficulty {
    /// 答对得分
    pub fn weight(self) -> u32 {
        self as u32
    }

    /// 每道题的时间预算（秒）
    pub fn seconds(self) -> u32 {
        match self {
            Difficulty::Easy => 20,
            Difficulty::Medium => 35,
            Difficulty::Hard => 90,
        }
    }

    /// 获取显示名称
    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "简单",
            Difficulty::Medium => "中等",
            Difficulty::Hard => "困难",
        }
    }

    /// 从等级数值解析
    pub fn from_level(level: i64) -> Option<Self> {
        match level {
            1 => Some(Difficulty::Easy),
            2 => Some(Difficulty::Medium),
            3 => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

impl TryFrom<i64> for Difficulty {
    type Error = FormatError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_level(value).ok_or(FormatError::InvalidDifficulty { value })
    }
}

impl From<Difficulty> for u8 {
    fn from(difficulty: Difficulty) -> Self {
        difficulty as u8
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// 单道选择题
///
/// 磁盘格式：`{ "question": .., "options": [4 个字符串], "correct": [索引..], "difficulty": 1|2|3 }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "question")]
    pub text: String,
    pub options: [String; OPTION_COUNT],
    #[serde(rename = "correct")]
    pub correct_indexes: BTreeSet<usize>,
    #[serde(default)]
    pub difficulty: Difficulty,
}

impl Question {
    /// 正确选项的文本（按原始顺序）
    pub fn correct_options(&self) -> Vec<&str> {
        self.correct_indexes
            .iter()
            .filter_map(|&i| self.options.get(i).map(String::as_str))
            .collect()
    }
}

/// 一份测验：按编写顺序排列的题目
///
/// 没有测验级元数据，身份即文件名（见 [`quiz_id_from_path`]）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuizDocument {
    questions: Vec<Question>,
}

impl QuizDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_questions(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&Question, IndexError> {
        self.questions.get(index).ok_or(IndexError {
            index,
            len: self.questions.len(),
        })
    }

    pub(crate) fn push(&mut self, question: Question) -> usize {
        self.questions.push(question);
        self.questions.len() - 1
    }

    /// 替换指定位置的题目，返回旧题目
    pub(crate) fn replace(&mut self, index: usize, question: Question) -> Result<Question, IndexError> {
        let len = self.questions.len();
        let slot = self
            .questions
            .get_mut(index)
            .ok_or(IndexError { index, len })?;
        Ok(std::mem::replace(slot, question))
    }

    pub(crate) fn remove(&mut self, index: usize) -> Result<Question, IndexError> {
        if index >= self.questions.len() {
            return Err(IndexError {
                index,
                len: self.questions.len(),
            });
        }
        Ok(self.questions.remove(index))
    }

    /// 整个测验的时间预算（秒）
    pub fn time_budget(&self) -> u32 {
        self.questions.iter().map(|q| q.difficulty.seconds()).sum()
    }

    /// 全部答对时的得分
    pub fn max_score(&self) -> u32 {
        self.questions.iter().map(|q| q.difficulty.weight()).sum()
    }

    /// 只读浏览用的题目摘要
    pub fn summaries(&self) -> Vec<QuestionSummary> {
        self.questions
            .iter()
            .enumerate()
            .map(|(i, q)| QuestionSummary {
                number: i + 1,
                text: q.text.clone(),
                correct_options: q.correct_options().into_iter().map(str::to_string).collect(),
                difficulty: q.difficulty,
            })
            .collect()
    }
}

/// 题目摘要（浏览模式）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionSummary {
    /// 题号（从 1 开始）
    pub number: usize,
    pub text: String,
    pub correct_options: Vec<String>,
    pub difficulty: Difficulty,
}

impl fmt::Display for QuestionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "题目 {}: {}\n正确答案: {}\n难度: {}",
            self.number,
            self.text,
            self.correct_options.join(", "),
            self.difficulty
        )
    }
}

/// 解析测验文件内容
///
/// 未知字段会被忽略，缺少 `difficulty` 时按中等处理；正确答案索引必须落在选项范围内
pub fn parse(raw: &[u8]) -> Result<QuizDocument, FormatError> {
    let doc: QuizDocument = serde_json::from_slice(raw)?;
    for (number, question) in doc.questions.iter().enumerate() {
        if let Some(&index) = question.correct_indexes.iter().find(|&&i| i >= OPTION_COUNT) {
            return Err(FormatError::CorrectIndexOutOfRange {
                question: number + 1,
                index,
            });
        }
    }
    Ok(doc)
}

/// 序列化测验，输出可被 [`parse`] 无损读回
pub fn serialize(doc: &QuizDocument) -> Result<Vec<u8>, FormatError> {
    Ok(serde_json::to_vec_pretty(doc)?)
}

/// 测验标识：路径中的文件名部分
pub fn quiz_id_from_path(path: impl AsRef<Path>) -> String {
    let path = path.as_ref();
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}
