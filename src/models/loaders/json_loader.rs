use crate::error::{AppError, AppResult, FileError};
use crate::models::question::{self, quiz_id_from_path, QuizDocument};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从目录中加载的一份测验
#[derive(Debug, Clone)]
pub struct LoadedQuiz {
    pub path: PathBuf,
    pub quiz_id: String,
    pub document: QuizDocument,
}

/// 从 JSON 文件加载测验，格式错误时返回 `FormatError`
pub async fn load_quiz_document(path: &Path) -> AppResult<QuizDocument> {
    let content = fs::read(path)
        .await
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;

    Ok(question::parse(&content)?)
}

/// 宽松加载：文件格式错误时按空测验处理，读取失败仍然返回错误
pub async fn load_quiz_lenient(path: &Path) -> AppResult<QuizDocument> {
    match load_quiz_document(path).await {
        Err(AppError::Format(e)) => {
            tracing::warn!("测验文件格式错误，按空测验处理 {}: {}", path.display(), e);
            Ok(QuizDocument::new())
        }
        other => other,
    }
}

/// 加载目录中所有 `.json` 测验文件，按文件名排序；无法加载的文件会被跳过
pub async fn load_all_quiz_files(folder_path: &str) -> AppResult<Vec<LoadedQuiz>> {
    let folder = PathBuf::from(folder_path);

    if !folder.is_dir() {
        return Err(FileError::DirectoryNotFound {
            path: folder_path.to_string(),
        }
        .into());
    }

    let mut quizzes = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .map_err(|e| AppError::file_read_failed(folder_path, e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::file_read_failed(folder_path, e))?
    {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }

        match load_quiz_document(&path).await {
            Ok(document) => {
                tracing::info!(
                    "成功加载 {}: {} 道题目",
                    path.file_name().unwrap_or_default().to_string_lossy(),
                    document.len()
                );
                quizzes.push(LoadedQuiz {
                    quiz_id: quiz_id_from_path(&path),
                    path,
                    document,
                });
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {}", path.display(), e);
            }
        }
    }

    quizzes.sort_by(|a, b| a.quiz_id.cmp(&b.quiz_id));
    Ok(quizzes)
}
