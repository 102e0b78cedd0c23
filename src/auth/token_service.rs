//! 令牌服务 - 通过client credentials获取Graph访问令牌
//!
//! 每次运行只获取一次令牌，不做刷新。

use crate::config::GraphConfig;
use crate::error::{AppError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::fmt;

/// 令牌请求超时
pub const TOKEN_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Bearer访问令牌
#[derive(Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    #[cfg(test)]
    pub fn new<T: Into<String>>(token: T) -> Self {
        Self {
            token: token.into(),
            expires_at: None,
        }
    }

    /// 令牌是否已过期（未知过期时间视为有效）
    pub fn is_expired(&self) -> bool {
        self.expires_at.map_or(false, |at| Utc::now() >= at)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// 令牌服务
pub struct TokenService {
    http: reqwest::Client,
    config: GraphConfig,
}

impl TokenService {
    /// 创建令牌服务
    pub fn new(config: &GraphConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config: config.clone(),
        }
    }

    /// 获取访问令牌
    pub async fn fetch_token(&self) -> Result<AccessToken> {
        let response = self
            .http
            .post(self.config.token_url())
            .timeout(std::time::Duration::from_secs(TOKEN_TIMEOUT_SECS))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("scope", self.config.scope.as_str()),
            ])
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let token = parse_token_response(status, &body)?;

        match token.expires_at {
            Some(at) => log::info!("🔑 已获取Graph访问令牌，有效期至 {}", at),
            None => log::info!("🔑 已获取Graph访问令牌"),
        }
        Ok(token)
    }
}

/// 解析令牌端点的响应
pub fn parse_token_response(status: u16, body: &str) -> Result<AccessToken> {
    if status != 200 {
        return Err(AppError::authentication(format!(
            "获取访问令牌失败: {}, {}",
            status, body
        )));
    }

    let response: TokenResponse = serde_json::from_str(body)
        .map_err(|e| AppError::authentication(format!("令牌响应格式错误: {}", e)))?;

    if response.access_token.is_empty() {
        return Err(AppError::authentication("令牌响应中没有access_token"));
    }

    Ok(AccessToken {
        token: response.access_token,
        expires_at: response
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs)),
    })
}
