//! 浏览器环境胶水：墙钟与 localStorage 适配。
//! 核心模块不直接碰 `web_sys`，时间与持久化都从这里注入。

use web_sys::js_sys::Date;
use web_sys::Storage;

use crate::store::{KeyValueStore, StoreError};

/// 当前时间（epoch 毫秒）。
pub fn now_ms() -> f64 {
    Date::now()
}

/// localStorage 适配层；只做字符串读写，JSON 编解码在存储模块里。
pub struct LocalStore {
    storage: Storage,
}

impl LocalStore {
    pub fn new() -> Result<Self, StoreError> {
        let storage = web_sys::window()
            .and_then(|window| window.local_storage().ok().flatten())
            .ok_or_else(|| StoreError::Backend {
                message: "localStorage unavailable".to_string(),
            })?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for LocalStore {
    fn read(&self, key: &str) -> Option<String> {
        self.storage.get_item(key).ok().flatten()
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage
            .set_item(key, value)
            .map_err(|_| StoreError::Backend {
                message: format!("failed to write key {key}"),
            })
    }

    fn delete(&mut self, key: &str) {
        let _ = self.storage.remove_item(key);
    }
}
