//! 通知邮件服务
//!
//! 读取中间文件，认证一次后逐行发信。单行失败只记录日志，继续处理下一行。

use crate::config::MailConfig;
use crate::error::Result;
use crate::mail::{EmailTemplate, MailSender, TemplateValues};
use crate::storage::GrantRepository;
use crate::types::{AccessGrant, DeliveryFailure, EmailJob, NotificationReport};
use crate::utils::display_date;
use std::path::Path;

/// 通知邮件服务
pub struct NotifierService<'a, M: MailSender + ?Sized> {
    mailer: &'a M,
    template: EmailTemplate,
    subject: String,
    recipient_override: Option<String>,
}

impl<'a, M: MailSender + ?Sized> NotifierService<'a, M> {
    pub fn new(mailer: &'a M, template: EmailTemplate, mail: &MailConfig) -> Self {
        if let Some(ref recipient) = mail.recipient_override {
            log::warn!("⚠️ 已启用测试收件人，所有邮件都会发往 {}", recipient);
        }

        Self {
            mailer,
            template,
            subject: mail.subject.clone(),
            recipient_override: mail.recipient_override.clone(),
        }
    }

    /// 根据签发记录生成邮件
    pub fn build_job(&self, grant: &AccessGrant) -> Result<EmailJob> {
        let start_date = display_date(&grant.access_start);
        let end_date = display_date(&grant.access_end);

        let html_body = self.template.render(&TemplateValues {
            user_name: &grant.name,
            access_code: &grant.access_code,
            start_date: &start_date,
            end_date: &end_date,
        })?;

        Ok(EmailJob {
            user_name: grant.name.clone(),
            recipient: self
                .recipient_override
                .clone()
                .unwrap_or_else(|| grant.email.clone()),
            subject: self.subject.clone(),
            html_body,
        })
    }

    /// 读取中间文件并逐行发送通知
    pub async fn send_notifications(&self, grants_path: &Path) -> Result<NotificationReport> {
        let grants = GrantRepository::load(grants_path)?;
        log::info!("📨 共 {} 封通知邮件待发送", grants.len());

        self.mailer.authenticate().await?;
        Ok(self.send_all(&grants).await)
    }

    /// 逐行发送，失败的行记入报告
    pub async fn send_all(&self, grants: &[AccessGrant]) -> NotificationReport {
        let mut report = NotificationReport::default();

        for grant in grants {
            report.attempted += 1;

            let result = match self.build_job(grant) {
                Ok(job) => self.mailer.send(&job).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(()) => {
                    log::info!("✅ 已向 {} 发送邮件", grant.name);
                    report.sent += 1;
                }
                Err(e) => {
                    log::error!("❌ 向 {} 发送邮件失败: {}", grant.name, e);
                    report.failures.push(DeliveryFailure {
                        user_name: grant.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        log::info!(
            "📊 邮件发送完成: 尝试 {} 封，成功 {} 封，失败 {} 封",
            report.attempted,
            report.sent,
            report.failed()
        );
        report
    }
}
