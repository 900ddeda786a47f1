//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `session_runner` - 会话驱动器
//! - 合并一秒一次的计时和界面输入事件
//! - 计时与作答互不重入
//! - 关闭会话即停止计时
//!
//! ### `app` - 终端应用
//! - 选择测验、显示题目和倒计时
//! - 结束后记录成绩、显示排行榜、可重新开始
//! - 创建测验、查看并编辑已保存的测验
//! - 同步存储调用放到阻塞线程池执行
//!
//! ## 层次关系
//!
//! ```text
//! app (终端输入输出)
//!     ↓
//! session_runner (计时 + 事件)
//!     ↓
//! workflow::QuizSession (状态机)
//!     ↓
//! services (能力层：编写 / 编辑 / 排行榜)
//!     ↓
//! infrastructure (基础设施：Storage)
//! ```

pub mod app;
pub mod session_runner;

// 重新导出主要类型
pub use app::App;
pub use session_runner::{run_session, EventSource, RunOutcome, SessionEvent, SessionObserver};
