//! 当前题目快照
//!
//! 封装"正在作答第几题、显示哪些选项"这一信息，交给界面渲染

use std::collections::BTreeSet;
use std::fmt::Display;

use crate::models::Difficulty;

/// 当前题目的只读快照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    /// 题目索引（从 0 开始）
    pub index: usize,

    /// 题目总数
    pub total: usize,

    pub text: String,

    /// 打乱后的显示顺序
    pub options: Vec<String>,

    pub difficulty: Difficulty,
}

impl QuestionView {
    /// 题号（从 1 开始）
    pub fn number(&self) -> usize {
        self.index + 1
    }

    /// 把勾选的显示位置换成选项文本，越界的位置被忽略
    pub fn select(&self, display_indexes: &[usize]) -> BTreeSet<String> {
        display_indexes
            .iter()
            .filter_map(|&i| self.options.get(i).cloned())
            .collect()
    }
}

impl Display for QuestionView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[题目 #{}/{} 难度#{}] {}",
            self.number(),
            self.total,
            self.difficulty,
            self.text
        )
    }
}
