//! Memo records as delivered by webhooks and the Memos list endpoint.

use crate::constants::UNKNOWN_MEMO_ID;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The subset of a Memos memo this bridge reads.
///
/// Fields are loose on purpose: webhook payloads and list responses disagree on casing
/// and on how timestamps are encoded, and `attachments` is not always an array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Memo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub attachments: Value,
    #[serde(default, rename = "displayTime")]
    pub display_time: Option<Value>,
    #[serde(default, rename = "createTime")]
    pub create_time_camel: Option<Value>,
    #[serde(default, rename = "create_time")]
    pub create_time: Option<Value>,
}

impl Memo {
    /// The memo's identifier, or `unknown` when the record has no name.
    pub fn id(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(UNKNOWN_MEMO_ID)
    }

    /// Last path segment of `name` (`memos/42` -> `42`), as used in per-memo API routes.
    pub fn short_id(&self) -> Option<&str> {
        let name = self.name.as_deref().filter(|n| !n.is_empty())?;
        name.rsplit('/').next()
    }

    /// The first non-empty of `displayTime`, `createTime`, `create_time`.
    pub fn timestamp(&self) -> Option<&Value> {
        [&self.display_time, &self.create_time_camel, &self.create_time]
            .into_iter()
            .flatten()
            .find(|v| !is_blank(v))
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        _ => false,
    }
}
