//! 会话驱动器 - 编排层
//!
//! ## 职责
//!
//! 把计时器和输入事件合并到同一个循环里推动 `QuizSession`。
//!
//! ## 设计特点
//!
//! - **单循环**：计时和作答在同一个 `select!` 中处理，计时不会在提交过程中触发
//! - **单调计时**：第一次计时在开始后一个周期触发，错过的计时顺延
//! - **可关闭**：收到 `Close` 或事件源结束时停止计时并返回

use std::collections::BTreeSet;
use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::info;

use crate::error::ValidationError;
use crate::workflow::{AnswerOutcome, QuestionView, QuizSession, SessionResult};

/// 界面发给会话的事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// 按选项文本作答
    Answer(BTreeSet<String>),
    /// 按显示位置作答（从 0 开始）
    AnswerDisplayed(Vec<usize>),
    /// 关闭会话
    Close,
}

/// 会话事件来源
#[allow(async_fn_in_trait)]
pub trait EventSource {
    /// 返回 `None` 表示事件源已结束
    async fn next_event(&mut self) -> Option<SessionEvent>;
}

impl EventSource for mpsc::Receiver<SessionEvent> {
    async fn next_event(&mut self) -> Option<SessionEvent> {
        self.recv().await
    }
}

/// 会话进展通知，供界面渲染
pub trait SessionObserver {
    fn on_question(&mut self, _view: &QuestionView, _remaining_seconds: u32) {}

    fn on_tick(&mut self, _remaining_seconds: u32) {}

    fn on_answer(&mut self, _outcome: &AnswerOutcome) {}

    fn on_rejected(&mut self, _error: &ValidationError) {}

    fn on_finished(&mut self, _result: &SessionResult) {}
}

impl SessionObserver for () {}

/// 驱动结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// 会话正常结束或时间到
    Finished(SessionResult),
    /// 会话在结束前被关闭
    Closed,
}

/// 驱动会话直到结束或被关闭
///
/// # 参数
/// - `session`: 已开始的会话
/// - `events`: 输入事件来源
/// - `period`: 计时周期（正常为 1 秒）
/// - `observer`: 进展通知
pub async fn run_session<R, E, O>(
    session: &mut QuizSession<'_, R>,
    events: &mut E,
    period: Duration,
    observer: &mut O,
) -> RunOutcome
where
    R: Rng,
    E: EventSource,
    O: SessionObserver,
{
    if let Some(result) = session.result() {
        observer.on_finished(&result);
        return RunOutcome::Finished(result);
    }
    if let Some(view) = session.current_view() {
        observer.on_question(&view, session.remaining_seconds());
    }

    let period = period.max(Duration::from_millis(1));
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                session.tick();
                observer.on_tick(session.remaining_seconds());
            }
            event = events.next_event() => match event {
                None | Some(SessionEvent::Close) => {
                    info!("会话已关闭，停止计时");
                    return RunOutcome::Closed;
                }
                Some(SessionEvent::Answer(selected)) => {
                    submit(session, &selected, observer);
                }
                Some(SessionEvent::AnswerDisplayed(positions)) => {
                    let selected = session
                        .current_view()
                        .map(|view| view.select(&positions))
                        .unwrap_or_default();
                    submit(session, &selected, observer);
                }
            }
        }

        if let Some(result) = session.result() {
            observer.on_finished(&result);
            return RunOutcome::Finished(result);
        }
    }
}

fn submit<R: Rng, O: SessionObserver>(
    session: &mut QuizSession<'_, R>,
    selected: &BTreeSet<String>,
    observer: &mut O,
) {
    match session.submit_answer(selected) {
        Ok(outcome) => {
            observer.on_answer(&outcome);
            if let Some(view) = session.current_view() {
                observer.on_question(&view, session.remaining_seconds());
            }
        }
        Err(e) => observer.on_rejected(&e),
    }
}
