use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 排行榜记录，写入后不再修改
///
/// 磁盘格式：`{ "name": .., "score": .., "quiz": .. }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub name: String,
    pub score: u32,
    #[serde(rename = "quiz")]
    pub quiz_id: String,
}

impl ScoreRecord {
    pub fn new(name: impl Into<String>, score: u32, quiz_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            score,
            quiz_id: quiz_id.into(),
        }
    }

    /// 宽松读取账本中的一个元素
    ///
    /// 缺失或类型不符的字段取默认值：字符串为空，分数为 0；
    /// 小数分数向下取整，负数按 0 处理。不是对象时返回 `None`
    pub fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let text = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let score = object
            .get("score")
            .and_then(|v| v.as_u64().or_else(|| v.as_f64().map(|f| f.max(0.0) as u64)))
            .map(|s| u32::try_from(s).unwrap_or(u32::MAX))
            .unwrap_or(0);

        Some(Self {
            name: text("name"),
            score,
            quiz_id: text("quiz"),
        })
    }
}

impl std::fmt::Display for ScoreRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {} 分 [{}]", self.name, self.score, self.quiz_id)
    }
}
