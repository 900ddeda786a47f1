//! 测验会话 - 流程层
//!
//! 核心职责：定义"一次限时作答"的完整状态机
//!
//! 状态转换：
//! 1. 开始 → 计算时间预算 → 载入第 0 题（没有题目则直接结束）
//! 2. 提交答案 → 完全匹配才得分 → 载入下一题
//! 3. 计时 → 每秒减一，归零时强制结束
//! 4. 结束 → 可以重新开始，复用同一份测验

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::error::ValidationError;
use crate::models::QuizDocument;
use crate::utils::logging::{log_session_finished, log_session_start, truncate_text};
use crate::workflow::question_view::QuestionView;

/// 会话结束原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// 所有题目都已作答
    Completed,
    /// 时间用完
    TimeUp,
}

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// 正在显示第 i 题，等待作答
    Presenting(usize),
    /// 已结束（终止状态）
    Finished(FinishReason),
}

/// 单次作答的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub correct: bool,
    /// 本题得分
    pub awarded: u32,
    /// 提交后的状态
    pub phase: SessionPhase,
}

/// 会话最终结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionResult {
    pub score: u32,
    pub max_score: u32,
    pub answered: usize,
    pub total_questions: usize,
    pub reason: FinishReason,
}

/// 测验会话
///
/// - 只读借用 QuizDocument
/// - 独占会话状态，外部只能通过操作推动
/// - 正确性按打乱后的选项文本比较，两个选项文本相同时视为同一答案
pub struct QuizSession<'a, R: Rng = StdRng> {
    quiz: &'a QuizDocument,
    phase: SessionPhase,
    current_index: usize,
    score: u32,
    answered: usize,
    total_seconds: u32,
    remaining_seconds: u32,
    shuffled_options: Vec<String>,
    correct_answers: BTreeSet<String>,
    rng: R,
}

impl<'a> QuizSession<'a, StdRng> {
    /// 使用系统熵源开始新会话
    pub fn start(quiz: &'a QuizDocument) -> Self {
        Self::start_with_rng(quiz, StdRng::from_entropy())
    }
}

impl<'a, R: Rng> QuizSession<'a, R> {
    /// 使用指定随机源开始新会话
    pub fn start_with_rng(quiz: &'a QuizDocument, rng: R) -> Self {
        let mut session = Self {
            quiz,
            phase: SessionPhase::Finished(FinishReason::Completed),
            current_index: 0,
            score: 0,
            answered: 0,
            total_seconds: 0,
            remaining_seconds: 0,
            shuffled_options: Vec::new(),
            correct_answers: BTreeSet::new(),
            rng,
        };
        session.begin();
        session
    }

    fn begin(&mut self) {
        self.current_index = 0;
        self.score = 0;
        self.answered = 0;
        self.total_seconds = self.quiz.time_budget();
        self.remaining_seconds = self.total_seconds;

        log_session_start(self.quiz.len(), self.total_seconds);

        // 让 load_question 能够进入结束状态
        self.phase = SessionPhase::Presenting(0);
        self.load_question(0);
    }

    fn load_question(&mut self, index: usize) {
        let quiz = self.quiz;
        let Some(question) = quiz.questions().get(index) else {
            self.finish(FinishReason::Completed);
            return;
        };

        let mut options = question.options.to_vec();
        options.shuffle(&mut self.rng);

        self.correct_answers = question
            .correct_indexes
            .iter()
            .filter_map(|&i| question.options.get(i).cloned())
            .collect();
        self.shuffled_options = options;
        self.phase = SessionPhase::Presenting(index);

        debug!(
            "载入题目 #{}: {}",
            index + 1,
            truncate_text(&question.text, 80)
        );
    }

    fn finish(&mut self, reason: FinishReason) {
        if self.is_finished() {
            return;
        }
        self.phase = SessionPhase::Finished(reason);
        self.shuffled_options.clear();
        self.correct_answers.clear();

        log_session_finished(self.score, self.quiz.max_score(), reason);
    }

    /// 提交当前题目的答案（选项文本集合）
    ///
    /// 只有与正确答案集合完全相等才得分，多选或漏选都不得分
    pub fn submit_answer(
        &mut self,
        selected: &BTreeSet<String>,
    ) -> Result<AnswerOutcome, ValidationError> {
        let SessionPhase::Presenting(index) = self.phase else {
            return Err(ValidationError::SessionFinished);
        };
        if selected.is_empty() {
            return Err(ValidationError::NoSelection);
        }

        let quiz = self.quiz;
        let question = &quiz.questions()[index];
        let correct = *selected == self.correct_answers;
        let awarded = if correct {
            question.difficulty.weight()
        } else {
            0
        };

        self.score += awarded;
        self.answered += 1;
        info!(
            "题目 #{} {} (+{} 分，当前 {} 分)",
            index + 1,
            if correct { "✓ 回答正确" } else { "✗ 回答错误" },
            awarded,
            self.score
        );

        self.current_index += 1;
        self.load_question(self.current_index);

        Ok(AnswerOutcome {
            correct,
            awarded,
            phase: self.phase,
        })
    }

    /// 计时器每秒调用一次；时间归零时强制结束
    pub fn tick(&mut self) -> SessionPhase {
        if let SessionPhase::Presenting(_) = self.phase {
            if self.remaining_seconds > 0 {
                self.remaining_seconds -= 1;
                if self.remaining_seconds == 0 {
                    info!("⏰ 时间到");
                    self.finish(FinishReason::TimeUp);
                }
            }
        }
        self.phase
    }

    /// 结束后重新开始，已提交的排行榜记录不受影响
    pub fn restart(&mut self) -> Result<(), ValidationError> {
        if !self.is_finished() {
            return Err(ValidationError::SessionInProgress);
        }
        info!("🔄 重新开始测验");
        self.begin();
        Ok(())
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, SessionPhase::Finished(_))
    }

    pub fn quiz(&self) -> &'a QuizDocument {
        self.quiz
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn total_seconds(&self) -> u32 {
        self.total_seconds
    }

    /// 当前题目的快照，结束后为 `None`
    pub fn current_view(&self) -> Option<QuestionView> {
        let SessionPhase::Presenting(index) = self.phase else {
            return None;
        };
        let question = self.quiz.questions().get(index)?;
        Some(QuestionView {
            index,
            total: self.quiz.len(),
            text: question.text.clone(),
            options: self.shuffled_options.clone(),
            difficulty: question.difficulty,
        })
    }

    /// 最终结果，未结束时为 `None`
    pub fn result(&self) -> Option<SessionResult> {
        let SessionPhase::Finished(reason) = self.phase else {
            return None;
        };
        Some(SessionResult {
            score: self.score,
            max_score: self.quiz.max_score(),
            answered: self.answered,
            total_questions: self.quiz.len(),
            reason,
        })
    }
}
