//! Account endpoints and sign-in flows

use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::Serialize;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::http::ApiClient;
use crate::refresh::REFRESH_TOKEN_PATH;
use crate::types::{TokenPair, UserInfo};

pub const ACCOUNT_PREFIX: &str = "/console/account";

/// Credentials for login and registration
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoginParams {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remember_me: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_token: Option<String>,
}

impl LoginParams {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            ..Default::default()
        }
    }
}

/// Hex SHA-256 digest; passwords never leave the client in clear text
pub fn hash_password(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Placeholder username for new accounts: `user_` + base36 millis + 4 random
/// alphanumerics
pub fn generate_username() -> String {
    let millis = chrono::Utc::now().timestamp_millis().max(0) as u64;
    let mut rng = rand::thread_rng();
    let suffix: String = (0..4)
        .map(|_| rng.sample(Alphanumeric) as char)
        .collect();
    format!("user_{}{}", to_base36(millis), suffix)
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

impl ApiClient {
    /// Exchange credentials for a token pair without persisting it
    pub async fn login(&self, params: &LoginParams) -> Result<TokenPair> {
        let body = LoginParams {
            password: hash_password(&params.password),
            ..params.clone()
        };
        self.post(&format!("{}/login", ACCOUNT_PREFIX), &body).await
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<Value> {
        self.post(
            &format!("{}/register", ACCOUNT_PREFIX),
            &json!({
                "email": email,
                "name": generate_username(),
                "password": hash_password(password),
            }),
        )
        .await
    }

    /// Log in and store the resulting tokens
    pub async fn sign_in(&self, params: &LoginParams) -> Result<TokenPair> {
        let tokens = self.login(params).await?;
        self.store().save_token_pair(&tokens)?;
        tracing::info!("Signed in as {}", params.email);
        Ok(tokens)
    }

    pub async fn sign_up_and_sign_in(&self, params: &LoginParams) -> Result<TokenPair> {
        self.register(&params.email, &params.password).await?;
        self.sign_in(params).await
    }

    /// End the server session and forget local tokens. Local state is cleared
    /// even when the server call fails.
    pub async fn logout(&self) -> Result<()> {
        let result: Result<Value> = self
            .get(&format!("{}/logout", ACCOUNT_PREFIX), &json!({}))
            .await;
        self.store().clear_tokens()?;
        result.map(|_| ())
    }

    pub async fn current_account(&self) -> Result<UserInfo> {
        self.get(&format!("{}/current-account", ACCOUNT_PREFIX), &json!({}))
            .await
    }

    /// Call the refresh endpoint directly. Prefer
    /// [`TokenRefresher`](crate::TokenRefresher), which coordinates with other
    /// clients.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenPair> {
        self.post(REFRESH_TOKEN_PATH, &json!({ "refresh_token": refresh_token }))
            .await
    }
}
