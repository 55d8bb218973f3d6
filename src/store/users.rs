use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{read_json, write_json, KeyValueStore, StoreError};

pub(crate) const USERS_KEY: &str = "gameUsers";
pub(crate) const SESSION_KEY: &str = "currentUser";
pub(crate) const ATTEMPTS_KEY: &str = "loginAttempts";
pub(crate) const TOKEN_KEY: &str = "userToken";

/// 连续失败 5 次后封锁账号。
const MAX_FAILED_ATTEMPTS: u32 = 5;
/// 距最后一次失败超过 30 分钟后计数清零、解除封锁。
const ATTEMPT_WINDOW_MS: f64 = 30.0 * 60.0 * 1000.0;

/// 注册时收集的字段。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: String,
    pub fullname: String,
}

/// 持久化的账号记录。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
    pub id: u64,
    pub username: String,
    pub password: String,
    pub email: String,
    pub fullname: String,
    pub created_ms: f64,
    #[serde(default)]
    pub last_login_ms: Option<f64>,
}

/// 当前登录会话：账号加会话开始时间。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionUser {
    #[serde(flatten)]
    pub user: UserRecord,
    pub session_start_ms: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AttemptRecord {
    pub count: u32,
    #[serde(default)]
    pub last_attempt_ms: Option<f64>,
    #[serde(default)]
    pub blocked: bool,
}

/// 账号目录：注册记录、登录会话与失败计数都落在同一个键值存储上。
/// 时间一律由调用方以 epoch 毫秒注入。
#[derive(Debug)]
pub struct UserDirectory<S> {
    store: S,
}

impl<S: KeyValueStore> UserDirectory<S> {
    pub fn new(store: S) -> Result<Self, StoreError> {
        let mut directory = Self { store };
        directory.init_storage()?;
        Ok(directory)
    }

    fn init_storage(&mut self) -> Result<(), StoreError> {
        if self.store.read(USERS_KEY).is_none() {
            write_json(&mut self.store, USERS_KEY, &Vec::<UserRecord>::new())?;
        }
        if self.store.read(ATTEMPTS_KEY).is_none() {
            write_json(
                &mut self.store,
                ATTEMPTS_KEY,
                &HashMap::<String, AttemptRecord>::new(),
            )?;
        }
        Ok(())
    }

    pub fn all_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        Ok(read_json(&self.store, USERS_KEY)?.unwrap_or_default())
    }

    pub fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self
            .all_users()?
            .into_iter()
            .find(|user| user.username == username))
    }

    /// 新账号入库；id 与创建时间都取自注入的时钟。
    pub fn add_user(&mut self, new_user: NewUser, now_ms: f64) -> Result<UserRecord, StoreError> {
        let mut users = self.all_users()?;
        let record = UserRecord {
            id: now_ms as u64,
            username: new_user.username,
            password: new_user.password,
            email: new_user.email,
            fullname: new_user.fullname,
            created_ms: now_ms,
            last_login_ms: None,
        };
        users.push(record.clone());
        write_json(&mut self.store, USERS_KEY, &users)?;
        Ok(record)
    }

    pub fn update_last_login(&mut self, username: &str, now_ms: f64) -> Result<bool, StoreError> {
        let mut users = self.all_users()?;
        let Some(user) = users.iter_mut().find(|user| user.username == username) else {
            return Ok(false);
        };
        user.last_login_ms = Some(now_ms);
        write_json(&mut self.store, USERS_KEY, &users)?;
        Ok(true)
    }

    pub fn set_current_user(
        &mut self,
        user: &UserRecord,
        now_ms: f64,
    ) -> Result<SessionUser, StoreError> {
        let session = SessionUser {
            user: user.clone(),
            session_start_ms: now_ms,
        };
        let token = format!("{}-{}", user.username, now_ms as u64);
        write_json(&mut self.store, SESSION_KEY, &session)?;
        self.store.write(TOKEN_KEY, &token)?;
        self.update_last_login(&user.username, now_ms)?;
        Ok(session)
    }

    pub fn current_user(&self) -> Result<Option<SessionUser>, StoreError> {
        read_json(&self.store, SESSION_KEY)
    }

    pub fn is_logged_in(&self) -> bool {
        self.store.read(TOKEN_KEY).is_some()
    }

    pub fn logout(&mut self) {
        self.store.delete(SESSION_KEY);
        self.store.delete(TOKEN_KEY);
    }

    fn attempts(&self) -> Result<HashMap<String, AttemptRecord>, StoreError> {
        Ok(read_json(&self.store, ATTEMPTS_KEY)?.unwrap_or_default())
    }

    pub fn record_failed_login(
        &mut self,
        username: &str,
        now_ms: f64,
    ) -> Result<AttemptRecord, StoreError> {
        let mut attempts = self.attempts()?;
        let record = attempts.entry(username.to_string()).or_default();

        // 距上次失败超过窗口时间则重新计数
        if let Some(last) = record.last_attempt_ms {
            if now_ms - last > ATTEMPT_WINDOW_MS {
                record.count = 0;
                record.blocked = false;
            }
        }

        record.count += 1;
        record.last_attempt_ms = Some(now_ms);
        if record.count >= MAX_FAILED_ATTEMPTS {
            record.blocked = true;
        }

        let snapshot = record.clone();
        write_json(&mut self.store, ATTEMPTS_KEY, &attempts)?;
        Ok(snapshot)
    }

    pub fn is_blocked(&mut self, username: &str, now_ms: f64) -> Result<bool, StoreError> {
        let mut attempts = self.attempts()?;
        let Some(record) = attempts.get_mut(username) else {
            return Ok(false);
        };
        if !record.blocked {
            return Ok(false);
        }

        let expired = record
            .last_attempt_ms
            .map_or(true, |last| now_ms - last > ATTEMPT_WINDOW_MS);
        if expired {
            record.blocked = false;
            record.count = 0;
            write_json(&mut self.store, ATTEMPTS_KEY, &attempts)?;
            return Ok(false);
        }
        Ok(true)
    }
}
