use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 持久化数据格式错误
    #[error("格式错误: {0}")]
    Format(#[from] FormatError),
    /// 输入不完整或未选择答案
    #[error("校验失败: {0}")]
    Validation(#[from] ValidationError),
    /// 题目索引越界
    #[error("索引错误: {0}")]
    Index(#[from] IndexError),
    /// 文件读写错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 持久化的测验 / 排行榜数据格式错误
#[derive(Debug, Error)]
pub enum FormatError {
    /// JSON 解析失败
    #[error("JSON解析失败: {source}")]
    Json {
        #[source]
        source: serde_json::Error,
    },
    /// 难度值不在 1..=3 之内
    #[error("难度值 {value} 无效，应为 1、2 或 3")]
    InvalidDifficulty { value: i64 },
    /// 正确答案索引超出选项范围
    #[error("第 {question} 题的正确答案索引 {index} 超出选项范围")]
    CorrectIndexOutOfRange { question: usize, index: usize },
}

/// 校验错误，调用方应重新提示用户
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("题目内容不能为空")]
    EmptyQuestion,
    #[error("选项 {index} 不能为空")]
    EmptyOption { index: usize },
    #[error("至少需要一个正确答案")]
    NoCorrectAnswer,
    #[error("测验中没有题目，无法保存")]
    EmptyQuiz,
    #[error("请至少选择一个选项")]
    NoSelection,
    #[error("测验已结束")]
    SessionFinished,
    #[error("测验尚未结束，无法重新开始")]
    SessionInProgress,
}

/// 编辑器引用了不存在的题目
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("索引 {index} 超出范围 (共 {len} 题)")]
pub struct IndexError {
    pub index: usize,
    pub len: usize,
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// TOML 配置文件解析失败
    #[error("配置文件解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

impl From<serde_json::Error> for FormatError {
    fn from(source: serde_json::Error) -> Self {
        FormatError::Json { source }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Format(err.into())
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }

    /// 是否为可以直接重新提示用户的校验错误
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_converts_into_app_error() {
        let err: AppError = ValidationError::NoSelection.into();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "校验失败: 请至少选择一个选项");
    }

    #[test]
    fn test_index_error_message() {
        let err = IndexError { index: 5, len: 2 };
        assert_eq!(err.to_string(), "索引 5 超出范围 (共 2 题)");
    }
}
