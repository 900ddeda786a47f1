//! 排行榜服务 - 业务能力层
//!
//! 只追加的成绩账本：写入成绩、按分数排序查询、列出出现过的测验

use std::collections::BTreeSet;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::AppResult;
use crate::infrastructure::Storage;
use crate::models::ScoreRecord;

/// 默认排行榜文件
pub const DEFAULT_SCORES_FILE: &str = "scores.json";

/// 查询过滤条件
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LeaderboardFilter {
    /// 全部测验
    #[default]
    All,
    /// 只看某个测验
    Quiz(String),
}

impl LeaderboardFilter {
    /// 选择器中"全部测验"对应的值
    pub const ALL: &'static str = "ALL";

    /// 从选择器的值解析
    pub fn parse(selector: &str) -> Self {
        if selector == Self::ALL {
            LeaderboardFilter::All
        } else {
            LeaderboardFilter::Quiz(selector.to_string())
        }
    }

    pub fn matches(&self, record: &ScoreRecord) -> bool {
        match self {
            LeaderboardFilter::All => true,
            LeaderboardFilter::Quiz(quiz_id) => &record.quiz_id == quiz_id,
        }
    }
}

/// 排行榜存储接口
///
/// 会话引擎只通过该接口提交成绩，不直接访问文件
pub trait LeaderboardStore {
    /// 追加一条成绩；名字为空白时不记录，返回 `false`
    fn submit(&self, name: &str, score: u32, quiz_id: &str) -> AppResult<bool>;

    /// 按分数降序返回记录，同分保持写入顺序
    fn query(&self, filter: &LeaderboardFilter) -> AppResult<Vec<ScoreRecord>>;

    /// 账本中出现过的测验标识
    fn list_quiz_ids(&self) -> AppResult<BTreeSet<String>>;
}

/// 以 JSON 数组整体读写的排行榜
pub struct JsonLeaderboard<S: Storage> {
    storage: S,
    key: String,
}

impl<S: Storage> JsonLeaderboard<S> {
    pub fn new(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// 读取账本原始元素；文件不存在或不是 JSON 数组时视为空
    ///
    /// 元素原样保留，重写时不会丢失无法识别的记录
    fn load_raw(&self) -> AppResult<Vec<Value>> {
        let Some(bytes) = self.storage.read(&self.key)? else {
            debug!("排行榜文件 {} 不存在，视为空", self.key);
            return Ok(Vec::new());
        };

        match serde_json::from_slice::<Vec<Value>>(&bytes) {
            Ok(elements) => Ok(elements),
            Err(e) => {
                warn!("排行榜文件格式错误，视为空 {}: {}", self.key, e);
                Ok(Vec::new())
            }
        }
    }

    /// 宽松读取全部记录，非对象元素被跳过
    fn load(&self) -> AppResult<Vec<ScoreRecord>> {
        Ok(self
            .load_raw()?
            .iter()
            .filter_map(ScoreRecord::from_json)
            .collect())
    }
}

impl<S: Storage> LeaderboardStore for JsonLeaderboard<S> {
    fn submit(&self, name: &str, score: u32, quiz_id: &str) -> AppResult<bool> {
        let name = name.trim();
        if name.is_empty() {
            debug!("名字为空，不记录成绩");
            return Ok(false);
        }

        let mut elements = self.load_raw()?;
        elements.push(serde_json::to_value(ScoreRecord::new(name, score, quiz_id))?);
        let bytes = serde_json::to_vec_pretty(&elements)?;
        self.storage.write(&self.key, &bytes)?;

        info!("🏆 已记录成绩: {} - {} 分 [{}]", name, score, quiz_id);
        Ok(true)
    }

    fn query(&self, filter: &LeaderboardFilter) -> AppResult<Vec<ScoreRecord>> {
        let mut records: Vec<ScoreRecord> = self
            .load()?
            .into_iter()
            .filter(|record| filter.matches(record))
            .collect();
        // sort_by 是稳定排序
        records.sort_by(|a, b| b.score.cmp(&a.score));
        Ok(records)
    }

    fn list_quiz_ids(&self) -> AppResult<BTreeSet<String>> {
        Ok(self.load()?.into_iter().map(|r| r.quiz_id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::MemoryStorage;

    fn board() -> JsonLeaderboard<MemoryStorage> {
        JsonLeaderboard::new(MemoryStorage::new(), DEFAULT_SCORES_FILE)
    }

    fn names(records: &[ScoreRecord]) -> Vec<(&str, u32)> {
        records.iter().map(|r| (r.name.as_str(), r.score)).collect()
    }

    #[test]
    fn test_query_sorted_descending_and_stable() {
        let board = board();
        board.submit("A", 5, "q.json").unwrap();
        board.submit("B", 9, "q.json").unwrap();
        board.submit("C", 5, "q.json").unwrap();

        let records = board.query(&LeaderboardFilter::All).unwrap();
        assert_eq!(names(&records), vec![("B", 9), ("A", 5), ("C", 5)]);
    }

    #[test]
    fn test_query_by_quiz_and_list_ids() {
        let board = board();
        board.submit("A", 1, "math.json").unwrap();
        board.submit("B", 2, "history.json").unwrap();
        board.submit("C", 3, "math.json").unwrap();

        let math = board.query(&LeaderboardFilter::parse("math.json")).unwrap();
        assert_eq!(names(&math), vec![("C", 3), ("A", 1)]);
        assert!(math.iter().all(|r| r.quiz_id == "math.json"));

        let ids = board.list_quiz_ids().unwrap();
        assert_eq!(
            ids.into_iter().collect::<Vec<_>>(),
            vec!["history.json".to_string(), "math.json".to_string()]
        );
        assert_eq!(LeaderboardFilter::parse("ALL"), LeaderboardFilter::All);
    }

    #[test]
    fn test_blank_name_is_not_recorded() {
        let board = board();
        assert!(!board.submit("   ", 10, "q.json").unwrap());
        assert!(!board.submit("", 10, "q.json").unwrap());
        assert!(board.query(&LeaderboardFilter::All).unwrap().is_empty());
    }

    #[test]
    fn test_same_name_is_appended_and_trimmed() {
        let board = board();
        board.submit("  Ann ", 1, "q.json").unwrap();
        board.submit("Ann", 1, "q.json").unwrap();

        let records = board.query(&LeaderboardFilter::All).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.name == "Ann"));
    }

    #[test]
    fn test_reads_original_file_format() {
        let storage = MemoryStorage::new().with_file(
            DEFAULT_SCORES_FILE,
            r#"[{"name":"Old","score":4,"quiz":"geo.json"}]"#,
        );
        let board = JsonLeaderboard::new(&storage, DEFAULT_SCORES_FILE);
        board.submit("New", 6, "geo.json").unwrap();

        let saved: serde_json::Value =
            serde_json::from_slice(&storage.read(DEFAULT_SCORES_FILE).unwrap().unwrap()).unwrap();
        assert_eq!(saved[0]["name"], "Old");
        assert_eq!(saved[1]["quiz"], "geo.json");
        assert_eq!(saved[1]["score"], 6);
    }

    #[test]
    fn test_unreadable_record_survives_submit() {
        let storage = MemoryStorage::new().with_file(
            DEFAULT_SCORES_FILE,
            r#"[{"name":"Old","score":4,"quiz":"geo.json"},{"name":"Legacy","score":-1,"quiz":"geo.json"},"stray"]"#,
        );
        let board = JsonLeaderboard::new(&storage, DEFAULT_SCORES_FILE);
        assert_eq!(
            names(&board.query(&LeaderboardFilter::All).unwrap()),
            vec![("Old", 4), ("Legacy", 0)]
        );

        assert!(board.submit("New", 6, "geo.json").unwrap());

        let saved: serde_json::Value =
            serde_json::from_slice(&storage.read(DEFAULT_SCORES_FILE).unwrap().unwrap()).unwrap();
        assert_eq!(saved.as_array().unwrap().len(), 4);
        assert_eq!(saved[0]["name"], "Old");
        assert_eq!(saved[1]["score"], -1);
        assert_eq!(saved[2], "stray");
        assert_eq!(saved[3]["name"], "New");
        assert_eq!(
            names(&board.query(&LeaderboardFilter::parse("geo.json")).unwrap()),
            vec![("New", 6), ("Old", 4), ("Legacy", 0)]
        );
    }

    #[test]
    fn test_malformed_ledger_is_treated_as_empty() {
        let storage = MemoryStorage::new().with_file(DEFAULT_SCORES_FILE, "garbage");
        let board = JsonLeaderboard::new(&storage, DEFAULT_SCORES_FILE);
        assert!(board.query(&LeaderboardFilter::All).unwrap().is_empty());
        assert!(board.list_quiz_ids().unwrap().is_empty());
    }
}
