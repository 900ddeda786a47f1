pub mod json_loader;

pub use json_loader::{load_all_quiz_files, load_quiz_document, load_quiz_lenient};
