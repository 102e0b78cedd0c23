//! 工作流运行器
//!
//! 选择文件 → 签发门禁码 → 发送通知 → （可选）清理中间文件，严格顺序执行。
//! 任一步骤失败即停止，错误带上步骤信息返回。

use crate::config::AppConfig;
use crate::error::Result;
use crate::mail::{EmailTemplate, MailSender};
use crate::services::{IssuerService, NotifierService};
use crate::storage::GrantRepository;
use crate::types::{CleanupOutcome, IssueOutcome, NotificationReport, WorkflowOutcome, WorkflowStep};
use crate::vendor::LockVendor;
use std::path::Path;

use super::FilePicker;

/// 工作流选项
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkflowOptions {
    /// 完成后删除中间文件
    pub cleanup: bool,
}

/// 工作流运行器
pub struct WorkflowRunner<'a, V: LockVendor + ?Sized, M: MailSender + ?Sized> {
    config: &'a AppConfig,
    vendor: &'a V,
    mailer: &'a M,
    template: EmailTemplate,
    options: WorkflowOptions,
}

impl<'a, V: LockVendor + ?Sized, M: MailSender + ?Sized> WorkflowRunner<'a, V, M> {
    pub fn new(
        config: &'a AppConfig,
        vendor: &'a V,
        mailer: &'a M,
        template: EmailTemplate,
        options: WorkflowOptions,
    ) -> Self {
        Self {
            config,
            vendor,
            mailer,
            template,
            options,
        }
    }

    /// 运行完整工作流
    pub async fn run(&self, picker: &dyn FilePicker) -> Result<WorkflowOutcome> {
        log::info!("📂 请选择学员名单CSV文件...");
        let input = match picker
            .pick_input()
            .map_err(|e| e.in_step(WorkflowStep::SelectInput))?
        {
            Some(path) => path,
            None => {
                log::info!("未选择文件，工作流结束");
                return Ok(WorkflowOutcome::Cancelled);
            }
        };
        log::info!("已选择文件: {}", input.display());

        log::info!("▶️ 开始{}", WorkflowStep::IssueCodes);
        let issuer = IssuerService::new(self.vendor, self.config)
            .map_err(|e| e.in_step(WorkflowStep::IssueCodes))?;
        let issued = issuer
            .issue_codes(&input)
            .await
            .map_err(|e| e.in_step(WorkflowStep::IssueCodes))?;
        log::info!("✅ {}完成", WorkflowStep::IssueCodes);

        let notifications = match &issued {
            IssueOutcome::NoDevice => {
                log::warn!("⚠️ 没有签发任何门禁码，跳过{}", WorkflowStep::SendNotifications);
                NotificationReport::default()
            }
            IssueOutcome::Issued { output, .. } => {
                log::info!("▶️ 开始{}", WorkflowStep::SendNotifications);
                let report = NotifierService::new(self.mailer, self.template.clone(), &self.config.mail)
                    .send_notifications(output)
                    .await
                    .map_err(|e| e.in_step(WorkflowStep::SendNotifications))?;
                log::info!("✅ {}完成", WorkflowStep::SendNotifications);
                report
            }
        };

        let cleanup = if self.options.cleanup {
            cleanup_grants_file(&self.config.files.grants_path)
        } else {
            CleanupOutcome::Skipped
        };

        Ok(WorkflowOutcome::Completed {
            issued,
            notifications,
            cleanup,
        })
    }
}

/// 删除中间文件，失败只记录日志
pub fn cleanup_grants_file(path: &Path) -> CleanupOutcome {
    match GrantRepository::remove(path) {
        Ok(true) => {
            log::info!("🗑️ 已删除中间文件: {}", path.display());
            CleanupOutcome::Deleted
        }
        Ok(false) => {
            log::warn!("中间文件不存在，无需删除: {}", path.display());
            CleanupOutcome::Missing
        }
        Err(e) => {
            log::warn!("⚠️ {}出错: {}", WorkflowStep::Cleanup, e);
            CleanupOutcome::Failed(e.to_string())
        }
    }
}
