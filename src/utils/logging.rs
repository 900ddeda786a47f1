/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::workflow::session::FinishReason;

/// 初始化日志
///
/// 输出到 stderr，stdout 留给界面；`RUST_LOG` 优先，否则按 `verbose` 选择 debug / info
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 测验程序启动 - {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("📁 测验目录: {}", config.quiz_folder);
    info!("🏆 排行榜文件: {}", config.scores_file);
    info!("{}", "=".repeat(60));
}

/// 记录会话开始信息
///
/// # 参数
/// - `total_questions`: 题目总数
/// - `total_seconds`: 时间预算（秒）
pub fn log_session_start(total_questions: usize, total_seconds: u32) {
    info!(
        "📋 开始测验: {} 道题目，限时 {}",
        total_questions,
        format_clock(total_seconds)
    );
}

/// 记录会话结束信息
pub fn log_session_finished(score: u32, max_score: u32, reason: FinishReason) {
    let reason = match reason {
        FinishReason::Completed => "全部作答完成",
        FinishReason::TimeUp => "时间用完",
    };
    info!("{}", "─".repeat(60));
    info!("✓ 测验结束 ({}): 得分 {}/{}", reason, score, max_score);
    info!("{}", "─".repeat(60));
}

/// 秒数格式化为 `mm:ss`
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
