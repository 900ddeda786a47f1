pub mod loaders;
pub mod question;
pub mod score;

pub use loaders::{load_all_quiz_files, load_quiz_document, load_quiz_lenient};
pub use question::{
    parse, quiz_id_from_path, serialize, Difficulty, Question, QuestionSummary, QuizDocument,
    OPTION_COUNT,
};
pub use score::ScoreRecord;
