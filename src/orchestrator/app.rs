//! 终端应用 - 编排层
//!
//! 主菜单提供三种模式：
//! - 开始测验：选择测验 → 限时作答 → 记录成绩 → 显示排行榜 → 可重新开始
//! - 创建测验：逐题录入 → 保存到测验目录
//! - 查看/编辑测验：列出题目摘要 → 修改某一题 → 立即写回
//!
//! 所有规则都在库中，这里只负责输入输出。

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, warn};

use crate::config::Config;
use crate::error::{AppResult, ValidationError};
use crate::infrastructure::FileStorage;
use crate::models::{self, quiz_id_from_path, Difficulty, QuizDocument, ScoreRecord, OPTION_COUNT};
use crate::orchestrator::session_runner::{
    run_session, EventSource, RunOutcome, SessionEvent, SessionObserver,
};
use crate::services::{
    JsonLeaderboard, LeaderboardFilter, LeaderboardStore, QuestionDraft, QuizAuthoring, QuizEditor,
};
use crate::utils::logging::{format_clock, log_startup};
use crate::workflow::{AnswerOutcome, FinishReason, QuestionView, QuizSession, SessionResult};

/// 主菜单选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuChoice {
    Take,
    Create,
    Edit,
    Quit,
}

impl MenuChoice {
    fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "1" => Some(MenuChoice::Take),
            "2" => Some(MenuChoice::Create),
            "3" => Some(MenuChoice::Edit),
            "q" | "Q" => Some(MenuChoice::Quit),
            _ => None,
        }
    }
}

/// 应用主结构
pub struct App {
    config: Config,
    leaderboard: Arc<JsonLeaderboard<FileStorage>>,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let leaderboard = JsonLeaderboard::new(FileStorage::new(), config.scores_file.clone());

        Ok(Self {
            config,
            leaderboard: Arc::new(leaderboard),
        })
    }

    /// 运行应用主逻辑
    ///
    /// 配置了 `quiz_file` 时直接开始测验，否则进入主菜单
    pub async fn run(&self) -> Result<()> {
        let mut lines = spawn_stdin_reader();

        if self.config.quiz_file.is_some() {
            return self.take_quiz(&mut lines).await;
        }

        loop {
            println!("{}", "=".repeat(40));
            println!("  1. 开始测验");
            println!("  2. 创建测验");
            println!("  3. 查看/编辑测验");
            println!("  q. 退出");
            let Some(line) = lines.recv().await else {
                return Ok(());
            };

            let outcome = match MenuChoice::parse(&line) {
                Some(MenuChoice::Take) => self.take_quiz(&mut lines).await,
                Some(MenuChoice::Create) => self.create_quiz(&mut lines).await,
                Some(MenuChoice::Edit) => self.edit_quiz(&mut lines).await,
                Some(MenuChoice::Quit) => return Ok(()),
                None => {
                    println!("无效的选项: {}", line.trim());
                    continue;
                }
            };
            if let Err(e) = outcome {
                error!("操作失败: {:#}", e);
                println!("操作失败: {:#}", e);
            }
        }
    }

    async fn take_quiz(&self, lines: &mut mpsc::Receiver<String>) -> Result<()> {
        let path = self.choose_quiz(lines).await?;
        let quiz_id = quiz_id_from_path(&path);
        let document = models::load_quiz_lenient(&path)
            .await
            .with_context(|| format!("无法打开测验: {}", path.display()))?;

        self.play(&document, &quiz_id, lines).await
    }

    /// 选择测验文件：配置中指定的优先，否则从目录中选择
    async fn choose_quiz(&self, lines: &mut mpsc::Receiver<String>) -> Result<PathBuf> {
        if let Some(file) = &self.config.quiz_file {
            return Ok(PathBuf::from(file));
        }

        let quizzes = models::load_all_quiz_files(&self.config.quiz_folder)
            .await
            .context("无法读取测验目录")?;
        if quizzes.is_empty() {
            bail!("目录 {} 中没有测验文件", self.config.quiz_folder);
        }

        println!("可用的测验:");
        for (i, quiz) in quizzes.iter().enumerate() {
            println!("  {}. {} ({} 道题目)", i + 1, quiz.quiz_id, quiz.document.len());
        }

        loop {
            let line = prompt(lines, "请输入编号:").await?;
            match line.trim().parse::<usize>() {
                Ok(n) if (1..=quizzes.len()).contains(&n) => return Ok(quizzes[n - 1].path.clone()),
                _ => println!("无效的编号: {}", line.trim()),
            }
        }
    }

    async fn play(
        &self,
        document: &QuizDocument,
        quiz_id: &str,
        lines: &mut mpsc::Receiver<String>,
    ) -> Result<()> {
        let period = Duration::from_millis(self.config.tick_interval_ms);
        let mut session = QuizSession::start(document);

        loop {
            println!("输入选项编号作答（可多选，如 \"1 3\"），输入 q 退出");
            let mut events = TerminalEvents { lines: &mut *lines };
            let outcome = run_session(&mut session, &mut events, period, &mut TerminalObserver).await;

            let RunOutcome::Finished(result) = outcome else {
                return Ok(());
            };

            self.offer_submission(result.score, quiz_id, lines).await;
            self.print_leaderboard(quiz_id).await;

            println!("再来一次? (y/n)");
            match lines.recv().await {
                Some(answer) if answer.trim().eq_ignore_ascii_case("y") => {
                    session.restart().context("无法重新开始测验")?;
                }
                _ => return Ok(()),
            }
        }
    }

    /// 询问名字并写入排行榜；写入失败只提示，不中断
    async fn offer_submission(&self, score: u32, quiz_id: &str, lines: &mut mpsc::Receiver<String>) {
        println!("请输入名字以记录成绩（留空跳过）:");
        let Some(name) = lines.recv().await else {
            return;
        };

        match submit_score(&self.leaderboard, name, score, quiz_id.to_string()).await {
            Ok(true) => println!("成绩已记录"),
            Ok(false) => println!("未记录成绩"),
            Err(e) => {
                error!("保存成绩失败: {:#}", e);
                println!("保存成绩失败: {:#}", e);
            }
        }
    }

    async fn print_leaderboard(&self, quiz_id: &str) {
        let filter = LeaderboardFilter::Quiz(quiz_id.to_string());
        let (records, ids) = match query_scores(&self.leaderboard, filter).await {
            Ok(board) => board,
            Err(e) => {
                warn!("读取排行榜失败: {:#}", e);
                return;
            }
        };

        println!("{}", "=".repeat(40));
        println!("排行榜 [{}]", quiz_id);
        for (rank, record) in records.iter().enumerate() {
            println!("  {:>2}. {:<20} {}", rank + 1, record.name, record.score);
        }
        println!("{}", "=".repeat(40));

        let others: Vec<_> = ids.into_iter().filter(|id| id != quiz_id).collect();
        if !others.is_empty() {
            println!("其他测验: {}", others.join(", "));
        }
    }

    /// 逐题录入新测验，保存到测验目录
    async fn create_quiz(&self, lines: &mut mpsc::Receiver<String>) -> Result<()> {
        tokio::fs::create_dir_all(&self.config.quiz_folder)
            .await
            .with_context(|| format!("无法创建测验目录: {}", self.config.quiz_folder))?;
        let mut authoring = QuizAuthoring::new(FileStorage::with_root(&self.config.quiz_folder));

        loop {
            let draft = read_draft(lines, &QuestionDraft::default()).await?;
            match authoring.add_question(&draft) {
                Ok(added) => println!("✓ 已添加第 {} 题", added.position + 1),
                Err(e) => println!("{}", e),
            }
            if !confirm(lines, "继续添加题目? (y/n)").await? {
                break;
            }
        }

        if authoring.document().is_empty() {
            println!("没有题目，未保存");
            return Ok(());
        }

        loop {
            let line = prompt(lines, "保存为（文件名，如 math.json）:").await?;
            let Some(file_name) = json_file_name(&line) else {
                println!("文件名不能为空");
                continue;
            };

            let (returned, saved) = blocking(move || {
                let saved = authoring.save_document(&file_name);
                (authoring, saved)
            })
            .await?;
            authoring = returned;

            match saved {
                Ok(()) => {
                    println!("✓ 测验已保存 ({} 道题目)", authoring.document().len());
                    return Ok(());
                }
                Err(e) => println!("保存失败: {}", e),
            }
        }
    }

    /// 查看测验摘要，逐题修改并立即写回
    async fn edit_quiz(&self, lines: &mut mpsc::Receiver<String>) -> Result<()> {
        let path = self.choose_quiz(lines).await?;
        let path_str = path.display().to_string();
        let mut editor = blocking(move || QuizEditor::open(FileStorage::new(), path_str)).await??;

        loop {
            println!("{}", "=".repeat(40));
            println!("{}", editor.quiz_id());
            for summary in editor.document().summaries() {
                println!("{}\n", summary);
            }

            let line = prompt(lines, "输入题号编辑，直接回车返回:").await?;
            if line.trim().is_empty() {
                return Ok(());
            }
            let Some(index) = line.trim().parse::<usize>().ok().and_then(|n| n.checked_sub(1)) else {
                println!("无效的题号: {}", line.trim());
                continue;
            };
            let current = match editor.draft(index) {
                Ok(draft) => draft,
                Err(e) => {
                    println!("{}", e);
                    continue;
                }
            };

            println!("直接回车保留原值");
            let question = match read_draft(lines, &current).await?.build() {
                Ok(question) => question,
                Err(e) => {
                    println!("{}", e);
                    continue;
                }
            };

            let (returned, updated) = blocking(move || {
                let updated = editor.update_question(index, question);
                (editor, updated)
            })
            .await?;
            editor = returned;

            match updated {
                Ok(()) => println!("✓ 题目 {} 已保存", index + 1),
                Err(e) => println!("保存失败: {}", e),
            }
        }
    }
}

/// 在阻塞线程池中执行同步存储操作
async fn blocking<T, F>(task: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .context("后台任务异常退出")
}

async fn submit_score<L>(board: &Arc<L>, name: String, score: u32, quiz_id: String) -> Result<bool>
where
    L: LeaderboardStore + Send + Sync + 'static,
{
    let board = Arc::clone(board);
    Ok(blocking(move || board.submit(&name, score, &quiz_id)).await??)
}

/// 查询排行榜，同时返回出现过的测验标识
async fn query_scores<L>(
    board: &Arc<L>,
    filter: LeaderboardFilter,
) -> Result<(Vec<ScoreRecord>, BTreeSet<String>)>
where
    L: LeaderboardStore + Send + Sync + 'static,
{
    let board = Arc::clone(board);
    let queried = blocking(move || -> AppResult<_> {
        Ok((board.query(&filter)?, board.list_quiz_ids()?))
    })
    .await??;
    Ok(queried)
}

/// 逐行读取 stdin，供菜单、作答和输入名字共用
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        let mut reader = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = reader.next_line().await {
            if tx.send(line).await.is_err() {
                break;
            }
        }
    });
    rx
}

async fn prompt(lines: &mut mpsc::Receiver<String>, message: &str) -> Result<String> {
    println!("{}", message);
    lines.recv().await.context("输入已结束")
}

async fn confirm(lines: &mut mpsc::Receiver<String>, message: &str) -> Result<bool> {
    let line = prompt(lines, message).await?;
    Ok(line.trim().eq_ignore_ascii_case("y"))
}

/// 录入一道题目的表单字段
///
/// 空行保留 `current` 中的值；题干和选项原样保留输入中的空白
async fn read_draft(
    lines: &mut mpsc::Receiver<String>,
    current: &QuestionDraft,
) -> Result<QuestionDraft> {
    let mut draft = current.clone();

    let text = prompt(lines, &format!("题干 [{}]:", current.text)).await?;
    if !text.is_empty() {
        draft.text = text;
    }

    for (i, option) in draft.options.iter_mut().enumerate() {
        let line = prompt(lines, &format!("选项 {} [{}]:", i + 1, option)).await?;
        if !line.is_empty() {
            *option = line;
        }
    }

    let line = prompt(lines, "正确选项编号（可多选，如 \"1 3\"）:").await?;
    if let Some(correct) = parse_correct_line(&line) {
        draft.correct = correct;
    }

    let line = prompt(lines, &format!("难度 1-3 [{}]:", u8::from(current.difficulty))).await?;
    if let Some(difficulty) = line.trim().parse::<i64>().ok().and_then(Difficulty::from_level) {
        draft.difficulty = difficulty;
    } else if !line.trim().is_empty() {
        println!("无效的难度，保留 {}", current.difficulty);
    }

    Ok(draft)
}

/// 把 1 开始的编号解析成勾选状态；没有有效编号时返回 `None`
fn parse_correct_line(line: &str) -> Option<[bool; OPTION_COUNT]> {
    let mut correct = [false; OPTION_COUNT];
    let mut any = false;
    for n in line
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter_map(|token| token.parse::<usize>().ok())
    {
        if let Some(slot) = n.checked_sub(1).and_then(|i| correct.get_mut(i)) {
            *slot = true;
            any = true;
        }
    }
    any.then_some(correct)
}

/// 补全 `.json` 后缀；空白输入返回 `None`
fn json_file_name(line: &str) -> Option<String> {
    let name = line.trim();
    if name.is_empty() {
        None
    } else if name.ends_with(".json") {
        Some(name.to_string())
    } else {
        Some(format!("{}.json", name))
    }
}

/// 把终端输入行解析成会话事件
struct TerminalEvents<'a> {
    lines: &'a mut mpsc::Receiver<String>,
}

impl EventSource for TerminalEvents<'_> {
    async fn next_event(&mut self) -> Option<SessionEvent> {
        let line = self.lines.recv().await?;
        Some(parse_answer_line(&line))
    }
}

/// `q` 关闭会话；其余按 1 开始的编号解析，无法解析的部分被忽略
fn parse_answer_line(line: &str) -> SessionEvent {
    let line = line.trim();
    if line.eq_ignore_ascii_case("q") {
        return SessionEvent::Close;
    }
    let positions = line
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter_map(|token| token.parse::<usize>().ok())
        .filter_map(|n| n.checked_sub(1))
        .collect();
    SessionEvent::AnswerDisplayed(positions)
}

struct TerminalObserver;

impl SessionObserver for TerminalObserver {
    fn on_question(&mut self, view: &QuestionView, remaining_seconds: u32) {
        println!();
        println!("题目 {}/{} [{}] 剩余 {}", view.number(), view.total, view.difficulty, format_clock(remaining_seconds));
        println!("{}", view.text);
        for (i, option) in view.options.iter().enumerate() {
            println!("  {}. {}", i + 1, option);
        }
    }

    fn on_tick(&mut self, remaining_seconds: u32) {
        if remaining_seconds > 0 && (remaining_seconds % 30 == 0 || remaining_seconds <= 5) {
            println!("⏱ 剩余 {}", format_clock(remaining_seconds));
        }
    }

    fn on_answer(&mut self, outcome: &AnswerOutcome) {
        if outcome.correct {
            println!("✓ 正确 (+{})", outcome.awarded);
        } else {
            println!("✗ 错误");
        }
    }

    fn on_rejected(&mut self, error: &ValidationError) {
        println!("{}", error);
    }

    fn on_finished(&mut self, result: &SessionResult) {
        if result.reason == FinishReason::TimeUp {
            println!("时间到！测验结束。");
        }
        println!("你的得分: {}/{}", result.score, result.max_score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::MemoryStorage;

    fn feed(input: &[&str]) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(input.len().max(1));
        for line in input {
            tx.try_send(line.to_string()).unwrap();
        }
        rx
    }

    #[test]
    fn test_parse_answer_line() {
        assert_eq!(parse_answer_line(" Q "), SessionEvent::Close);
        assert_eq!(
            parse_answer_line("1, 3 x 0"),
            SessionEvent::AnswerDisplayed(vec![0, 2])
        );
        assert_eq!(parse_answer_line(""), SessionEvent::AnswerDisplayed(vec![]));
    }

    #[test]
    fn test_menu_and_form_helpers() {
        assert_eq!(MenuChoice::parse(" 2 "), Some(MenuChoice::Create));
        assert_eq!(MenuChoice::parse("Q"), Some(MenuChoice::Quit));
        assert_eq!(MenuChoice::parse("4"), None);

        assert_eq!(parse_correct_line("1,4"), Some([true, false, false, true]));
        assert_eq!(parse_correct_line("0 9 x"), None);

        assert_eq!(json_file_name(" math "), Some("math.json".to_string()));
        assert_eq!(json_file_name("geo.json"), Some("geo.json".to_string()));
        assert_eq!(json_file_name("  "), None);
    }

    #[tokio::test]
    async fn test_read_draft_for_new_question() {
        let mut lines = feed(&[" ", "Paris", "Rome", "Berlin", "Madrid", "1", "3"]);
        let draft = read_draft(&mut lines, &QuestionDraft::default()).await.unwrap();

        assert_eq!(draft.text, " ");
        assert_eq!(draft.options[3], "Madrid");
        assert_eq!(draft.correct, [true, false, false, false]);
        assert_eq!(draft.difficulty, Difficulty::Hard);
        assert!(draft.build().is_ok());
    }

    #[tokio::test]
    async fn test_read_draft_blank_lines_keep_current_values() {
        let current = QuestionDraft {
            text: "old".to_string(),
            options: ["a", "b", "c", "d"].map(str::to_string),
            correct: [false, true, false, false],
            difficulty: Difficulty::Easy,
        };
        let mut lines = feed(&["", "", "B", "", "", "", "7"]);
        let draft = read_draft(&mut lines, &current).await.unwrap();

        assert_eq!(draft.text, "old");
        assert_eq!(draft.options, ["a", "B", "c", "d"].map(str::to_string));
        assert_eq!(draft.correct, current.correct);
        assert_eq!(draft.difficulty, Difficulty::Easy);
    }

    #[tokio::test]
    async fn test_read_draft_fails_when_input_ends() {
        let mut lines = feed(&["only text"]);
        assert!(read_draft(&mut lines, &QuestionDraft::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_leaderboard_calls_run_on_blocking_pool() {
        let board = Arc::new(JsonLeaderboard::new(MemoryStorage::new(), "scores.json"));

        assert!(submit_score(&board, "Ann".into(), 3, "q.json".into()).await.unwrap());
        assert!(!submit_score(&board, " ".into(), 9, "q.json".into()).await.unwrap());
        assert!(submit_score(&board, "Bo".into(), 5, "other.json".into()).await.unwrap());

        let (records, ids) = query_scores(&board, LeaderboardFilter::parse("q.json"))
            .await
            .unwrap();
        assert_eq!(records, vec![ScoreRecord::new("Ann", 3, "q.json")]);
        assert_eq!(ids.len(), 2);
    }
}
