//! Microsoft Graph sendMail

use crate::auth::{AccessToken, TokenService};
use crate::config::GraphConfig;
use crate::error::{AppError, Result};
use crate::types::EmailJob;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio::sync::OnceCell;

use super::MailSender;

/// 通过Graph API以固定发件人身份发信
pub struct GraphMailer {
    http: reqwest::Client,
    send_url: String,
    tokens: TokenService,
    token: OnceCell<AccessToken>,
}

impl GraphMailer {
    pub fn new(graph: &GraphConfig, from_address: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            send_url: graph.send_mail_url(from_address),
            tokens: TokenService::new(graph),
            token: OnceCell::new(),
        }
    }

    /// 使用已有令牌
    #[cfg(test)]
    pub fn with_token(graph: &GraphConfig, from_address: &str, token: AccessToken) -> Self {
        let mailer = Self::new(graph, from_address);
        // 新建的单元格必然为空
        mailer.token.set(token).ok();
        mailer
    }

    /// sendMail 请求体
    pub fn message_body(job: &EmailJob) -> Value {
        json!({
            "message": {
                "subject": job.subject,
                "body": {
                    "contentType": "HTML",
                    "content": job.html_body,
                },
                "toRecipients": [
                    { "emailAddress": { "address": job.recipient } }
                ]
            }
        })
    }
}

#[async_trait]
impl MailSender for GraphMailer {
    async fn authenticate(&self) -> Result<()> {
        if self.token.get().is_some() {
            return Ok(());
        }

        let token = self.tokens.fetch_token().await?;
        // 已被设置时保留先前的令牌
        self.token.set(token).ok();
        Ok(())
    }

    async fn send(&self, job: &EmailJob) -> Result<()> {
        let token = self
            .token
            .get()
            .ok_or_else(|| AppError::authentication("尚未获取Graph访问令牌"))?;

        if token.is_expired() {
            log::warn!("Graph访问令牌已过期，请求可能被拒绝");
        }

        let response = self
            .http
            .post(&self.send_url)
            .bearer_auth(&token.token)
            .json(&Self::message_body(job))
            .send()
            .await?;

        let status = response.status();
        let body = if status == StatusCode::ACCEPTED {
            String::new()
        } else {
            response.text().await.unwrap_or_default()
        };
        send_result(status, body)
    }
}

/// sendMail 只有 202 Accepted 视为已发送
pub fn send_result(status: StatusCode, body: String) -> Result<()> {
    if status == StatusCode::ACCEPTED {
        return Ok(());
    }

    Err(AppError::Http {
        status: status.as_u16(),
        body,
    })
}
