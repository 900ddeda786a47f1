pub mod authoring_service;
pub mod editor_service;
pub mod leaderboard_service;

pub use authoring_service::{save_document, AddedQuestion, QuestionDraft, QuizAuthoring};
pub use editor_service::QuizEditor;
pub use leaderboard_service::{JsonLeaderboard, LeaderboardFilter, LeaderboardStore};
