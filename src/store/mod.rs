//! 本地键值存储抽象。浏览器里由 localStorage 适配实现，
//! 测试与非浏览器环境用内存实现；值一律存 JSON 字符串。

pub mod scores;
pub mod users;

pub use scores::{ScoreBook, ScoreEntry, ScoreTable};
pub use users::{AttemptRecord, NewUser, SessionUser, UserDirectory, UserRecord};

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// 存储层错误；可序列化，便于原样抛给 JS 侧。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum StoreError {
    Backend { message: String },
    Corrupt { key: String, message: String },
}

/// 字符串键值存储的最小接口。
pub trait KeyValueStore {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn delete(&mut self, key: &str);
}

/// 内存实现。
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

pub(crate) fn read_json<S, T>(store: &S, key: &str) -> Result<Option<T>, StoreError>
where
    S: KeyValueStore,
    T: DeserializeOwned,
{
    match store.read(key) {
        None => Ok(None),
        Some(raw) => serde_json::from_str(&raw).map(Some).map_err(|err| {
            StoreError::Corrupt {
                key: key.to_string(),
                message: err.to_string(),
            }
        }),
    }
}

pub(crate) fn write_json<S, T>(store: &mut S, key: &str, value: &T) -> Result<(), StoreError>
where
    S: KeyValueStore,
    T: Serialize,
{
    let raw = serde_json::to_string(value).map_err(|err| StoreError::Corrupt {
        key: key.to_string(),
        message: err.to_string(),
    })?;
    store.write(key, &raw)
}
