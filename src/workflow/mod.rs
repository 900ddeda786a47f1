pub mod question_view;
pub mod session;

pub use question_view::QuestionView;
pub use session::{AnswerOutcome, FinishReason, QuizSession, SessionPhase, SessionResult};
