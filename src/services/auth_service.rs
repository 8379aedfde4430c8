use jsonwebtoken::{encode, EncodingKey, Header};
use subtle::ConstantTimeEq;

use crate::config::get_config;
use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::models::user::{Role, User};
use crate::utils;

const SESSION_TTL_HOURS: i64 = 24;
const LOGIN_FAILED_MESSAGE: &str = "Tài khoản hoặc mật khẩu không chính xác";

struct DemoAccount {
    username: &'static str,
    password: &'static str,
    name: &'static str,
    role: Role,
}

/// The product ships with fixed demo identities instead of a user table.
const DEMO_ACCOUNTS: &[DemoAccount] = &[
    DemoAccount {
        username: "test",
        password: "123",
        name: "Ứng viên Test",
        role: Role::Candidate,
    },
    DemoAccount {
        username: "nhipham",
        password: "1",
        name: "Phạm Tuyết Nhi",
        role: Role::Hr,
    },
    DemoAccount {
        username: "admin_voltria",
        password: "123456",
        name: "Quản trị viên",
        role: Role::Hr,
    },
];

#[derive(Clone, Default)]
pub struct AuthService;

impl AuthService {
    pub fn new() -> Self {
        Self
    }

    /// Checks the credentials against the demo roster and issues a session
    /// token. The failure message never says which half was wrong.
    pub fn login(&self, username: &str, password: &str) -> Result<(String, User)> {
        let account = DEMO_ACCOUNTS
            .iter()
            .find(|a| a.username == username)
            .ok_or_else(|| Error::Unauthorized(LOGIN_FAILED_MESSAGE.to_string()))?;

        if !bool::from(ConstantTimeEq::ct_eq(
            password.as_bytes(),
            account.password.as_bytes(),
        )) {
            return Err(Error::Unauthorized(LOGIN_FAILED_MESSAGE.to_string()));
        }

        let user = User {
            username: account.username.to_string(),
            name: account.name.to_string(),
            role: account.role,
        };
        let token = self.issue_token(&user)?;
        tracing::info!(username = %user.username, role = user.role.as_str(), "login succeeded");
        Ok((token, user))
    }

    fn issue_token(&self, user: &User) -> Result<String> {
        let config = get_config();
        let exp = (utils::time::now() + chrono::Duration::hours(SESSION_TTL_HOURS)).timestamp();
        let claims = Claims {
            sub: user.username.clone(),
            name: user.name.clone(),
            exp: exp as usize,
            role: Some(user.role.as_str().to_string()),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .map_err(|e| Error::Internal(format!("Token signing failed: {}", e)))
    }
}
