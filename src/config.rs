use serde::Deserialize;
use std::path::Path;

use crate::error::{AppResult, ConfigError};

/// 默认配置文件路径
pub const DEFAULT_CONFIG_FILE: &str = "quiz.toml";

/// 程序配置文件
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// 测验文件存放目录
    pub quiz_folder: String,
    /// 直接打开的测验文件（为空时从目录中选择）
    pub quiz_file: Option<String>,
    /// 排行榜文件
    pub scores_file: String,
    /// 计时器间隔（毫秒）
    pub tick_interval_ms: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            quiz_folder: "quizzes".to_string(),
            quiz_file: None,
            scores_file: "scores.json".to_string(),
            tick_interval_ms: 1000,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从 TOML 文件加载配置，缺省字段使用默认值
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::AppError::file_read_failed(path.display().to_string(), e))?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    fn from_toml_str(content: &str, origin: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|source| {
            ConfigError::TomlParseFailed {
                path: origin.to_string(),
                source,
            }
            .into()
        })
    }

    /// 先读取配置文件（`QUIZ_CONFIG`，默认 `quiz.toml`，不存在则用默认值），再应用环境变量覆盖
    pub fn from_env() -> AppResult<Self> {
        let config_path = std::env::var("QUIZ_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let base = if Path::new(&config_path).exists() {
            Self::from_file(Path::new(&config_path))?
        } else {
            Self::default()
        };
        base.with_overrides(|name| std::env::var(name).ok())
    }

    /// 应用环境变量覆盖，`lookup` 便于在测试中替换环境
    pub fn with_overrides(self, lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        Ok(Self {
            quiz_folder: lookup("QUIZ_FOLDER").unwrap_or(self.quiz_folder),
            quiz_file: lookup("QUIZ_FILE").or(self.quiz_file),
            scores_file: lookup("SCORES_FILE").unwrap_or(self.scores_file),
            tick_interval_ms: parse_var(&lookup, "TICK_INTERVAL_MS", "u64")?
                .unwrap_or(self.tick_interval_ms),
            verbose_logging: parse_var(&lookup, "VERBOSE_LOGGING", "bool")?
                .unwrap_or(self.verbose_logging),
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var_name: &str,
    expected_type: &str,
) -> AppResult<Option<T>> {
    match lookup(var_name) {
        None => Ok(None),
        Some(value) => value.trim().parse().map(Some).map_err(|_| {
            ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }
            .into()
        }),
    }
}
