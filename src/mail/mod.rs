//! 通知邮件模块

pub mod graph_mailer;
pub mod template;

pub use graph_mailer::GraphMailer;
pub use template::{EmailTemplate, TemplateValues};

use crate::error::Result;
use crate::types::EmailJob;
use async_trait::async_trait;

/// 邮件发送接口
#[async_trait]
pub trait MailSender: Send + Sync {
    /// 发送前认证一次，失败则整批终止
    async fn authenticate(&self) -> Result<()> {
        Ok(())
    }

    /// 发送一封邮件，服务端未接受时返回错误
    async fn send(&self, job: &EmailJob) -> Result<()>;
}
