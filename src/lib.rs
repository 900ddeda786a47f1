//! # Quiz Engine
//!
//! 限时多选测验的核心逻辑：编写测验、限时作答、排行榜
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有文件系统，只暴露整文件读写能力
//! - `Storage` - 可注入的存储接口，`FileStorage` / `MemoryStorage`
//!
//! ### ② 模型层（Models）
//! - `models/` - 测验文档、题目、难度、成绩记录及其 JSON 格式
//!
//! ### ③ 业务能力层（Services）
//! - `QuizAuthoring` - 校验表单并编写新测验
//! - `QuizEditor` - 修改已保存的测验，立即写回
//! - `JsonLeaderboard` - 只追加的成绩账本
//!
//! ### ④ 流程层（Workflow）
//! - `QuizSession` - 一次限时作答的状态机
//! - `QuestionView` - 当前题目的只读快照
//!
//! ### ⑤ 编排层（Orchestration）
//! - `session_runner` - 计时器与输入事件的单循环驱动
//! - `App` - 终端界面
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{FileStorage, MemoryStorage, Storage};
pub use models::{Difficulty, Question, QuizDocument, ScoreRecord};
pub use orchestrator::{run_session, App, RunOutcome, SessionEvent};
pub use services::{JsonLeaderboard, LeaderboardFilter, LeaderboardStore, QuestionDraft, QuizAuthoring, QuizEditor};
pub use workflow::{QuestionView, QuizSession, SessionPhase, SessionResult};
