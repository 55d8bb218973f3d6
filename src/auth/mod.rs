//! 账号注册 / 登录逻辑。只做校验与存储编排，页面提示语在 JS 侧。

use serde::{Deserialize, Serialize};

use crate::store::{KeyValueStore, NewUser, SessionUser, StoreError, UserDirectory, UserRecord};

const MIN_USERNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub email: String,
    pub fullname: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// 注册 / 登录被拒绝的原因。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum AuthError {
    PasswordMismatch,
    PasswordTooShort { min: usize },
    UsernameTooShort { min: usize },
    InvalidEmail,
    UsernameTaken,
    AccountBlocked,
    InvalidCredentials,
    Store { error: StoreError },
}

impl From<StoreError> for AuthError {
    fn from(error: StoreError) -> Self {
        AuthError::Store { error }
    }
}

/// 校验顺序与拒绝原因保持页面原有行为：
/// 两次密码一致 → 密码长度 → 用户名长度 → 邮箱格式 → 用户名未占用。
pub fn register<S: KeyValueStore>(
    directory: &mut UserDirectory<S>,
    request: RegisterRequest,
    now_ms: f64,
) -> Result<UserRecord, AuthError> {
    if request.password != request.confirm_password {
        return Err(AuthError::PasswordMismatch);
    }
    if request.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    if request.username.chars().count() < MIN_USERNAME_LEN {
        return Err(AuthError::UsernameTooShort {
            min: MIN_USERNAME_LEN,
        });
    }
    if !is_valid_email(&request.email) {
        return Err(AuthError::InvalidEmail);
    }
    if directory.find_by_username(&request.username)?.is_some() {
        return Err(AuthError::UsernameTaken);
    }

    let record = directory.add_user(
        NewUser {
            username: request.username,
            password: request.password,
            email: request.email,
            fullname: request.fullname,
        },
        now_ms,
    )?;
    Ok(record)
}

/// 登录流程：封锁检查 → 账号查找 → 密码比对（失败计入封锁计数）→ 建立会话。
pub fn login<S: KeyValueStore>(
    directory: &mut UserDirectory<S>,
    request: &LoginRequest,
    now_ms: f64,
) -> Result<SessionUser, AuthError> {
    if directory.is_blocked(&request.username, now_ms)? {
        return Err(AuthError::AccountBlocked);
    }

    let Some(user) = directory.find_by_username(&request.username)? else {
        return Err(AuthError::InvalidCredentials);
    };

    if user.password != request.password {
        let attempt = directory.record_failed_login(&request.username, now_ms)?;
        return Err(if attempt.blocked {
            AuthError::AccountBlocked
        } else {
            AuthError::InvalidCredentials
        });
    }

    Ok(directory.set_current_user(&user, now_ms)?)
}

// local@domain.tld 的结构检查，不允许空白字符。
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && !tld.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const NOW: f64 = 1_700_000_000_000.0;
    const MINUTE_MS: f64 = 60_000.0;

    fn directory() -> UserDirectory<MemoryStore> {
        UserDirectory::new(MemoryStore::new()).expect("init should succeed")
    }

    fn valid_request() -> RegisterRequest {
        RegisterRequest {
            username: "alice".into(),
            password: "secret99".into(),
            confirm_password: "secret99".into(),
            email: "alice@example.com".into(),
            fullname: "Alice Doe".into(),
        }
    }

    #[test]
    fn register_accepts_a_valid_request() {
        let mut directory = directory();
        let record =
            register(&mut directory, valid_request(), NOW).expect("register should succeed");
        assert_eq!(record.username, "alice");
        assert!(directory
            .find_by_username("alice")
            .expect("read should succeed")
            .is_some());
    }

    #[test]
    fn register_rejects_invalid_input() {
        let mut directory = directory();

        let mut request = valid_request();
        request.confirm_password = "different".into();
        assert_eq!(
            register(&mut directory, request, NOW),
            Err(AuthError::PasswordMismatch)
        );

        let mut request = valid_request();
        request.password = "short".into();
        request.confirm_password = "short".into();
        assert_eq!(
            register(&mut directory, request, NOW),
            Err(AuthError::PasswordTooShort { min: 6 })
        );

        let mut request = valid_request();
        request.username = "al".into();
        assert_eq!(
            register(&mut directory, request, NOW),
            Err(AuthError::UsernameTooShort { min: 3 })
        );

        let mut request = valid_request();
        request.email = "not-an-email".into();
        assert_eq!(
            register(&mut directory, request, NOW),
            Err(AuthError::InvalidEmail)
        );
    }

    #[test]
    fn register_rejects_duplicate_usernames() {
        let mut directory = directory();
        register(&mut directory, valid_request(), NOW).expect("register should succeed");
        assert_eq!(
            register(&mut directory, valid_request(), NOW + 1.0),
            Err(AuthError::UsernameTaken)
        );
    }

    #[test]
    fn login_establishes_a_session() {
        let mut directory = directory();
        register(&mut directory, valid_request(), NOW).expect("register should succeed");

        let request = LoginRequest {
            username: "alice".into(),
            password: "secret99".into(),
        };
        let session =
            login(&mut directory, &request, NOW + MINUTE_MS).expect("login should succeed");
        assert_eq!(session.user.username, "alice");
        assert_eq!(session.session_start_ms, NOW + MINUTE_MS);
        assert!(directory.is_logged_in());

        let stored = directory
            .find_by_username("alice")
            .expect("read should succeed")
            .expect("user should exist");
        assert_eq!(stored.last_login_ms, Some(NOW + MINUTE_MS));
    }

    #[test]
    fn login_rejects_unknown_users_and_wrong_passwords() {
        let mut directory = directory();
        register(&mut directory, valid_request(), NOW).expect("register should succeed");

        let unknown = LoginRequest {
            username: "bob".into(),
            password: "whatever1".into(),
        };
        assert_eq!(
            login(&mut directory, &unknown, NOW),
            Err(AuthError::InvalidCredentials)
        );

        let wrong = LoginRequest {
            username: "alice".into(),
            password: "wrong999".into(),
        };
        assert_eq!(
            login(&mut directory, &wrong, NOW),
            Err(AuthError::InvalidCredentials)
        );
        assert!(!directory.is_logged_in());
    }

    #[test]
    fn repeated_failures_block_then_expire() {
        let mut directory = directory();
        register(&mut directory, valid_request(), NOW).expect("register should succeed");

        let wrong = LoginRequest {
            username: "alice".into(),
            password: "wrong999".into(),
        };
        for attempt in 0..4 {
            assert_eq!(
                login(&mut directory, &wrong, NOW + attempt as f64),
                Err(AuthError::InvalidCredentials)
            );
        }
        // 第五次失败直接返回封锁
        assert_eq!(
            login(&mut directory, &wrong, NOW + 4.0),
            Err(AuthError::AccountBlocked)
        );

        // 封锁期内连正确密码也被拒
        let correct = LoginRequest {
            username: "alice".into(),
            password: "secret99".into(),
        };
        assert_eq!(
            login(&mut directory, &correct, NOW + MINUTE_MS),
            Err(AuthError::AccountBlocked)
        );

        // 窗口过后恢复
        login(&mut directory, &correct, NOW + 31.0 * MINUTE_MS).expect("login should succeed");
    }

    #[test]
    fn email_structure_checks() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last@sub.domain.org"));

        assert!(!is_valid_email("ab.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.co"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("a@.co"));
        assert!(!is_valid_email("a@b."));
        assert!(!is_valid_email("a@@b.co"));
    }
}
