//! 系统类型定义

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// 学员名单中的一行（输入CSV）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    #[serde(rename = "First Name")]
    pub first_name: String,
    #[serde(rename = "Last Name")]
    pub last_name: String,
    #[serde(rename = "Email")]
    pub email: String,
    /// 课程开始日期，MM/DD/YYYY
    #[serde(rename = "Class Start")]
    pub class_start: String,
    /// 课程结束日期，MM/DD/YYYY
    #[serde(rename = "Class End")]
    pub class_end: String,
}

impl RosterEntry {
    /// 学员全名
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// 已签发的门禁码（中间文件中的一行）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Email")]
    pub email: String,
    /// 6位数字字符串，保留前导零
    #[serde(rename = "Access Code")]
    pub access_code: String,
    #[serde(rename = "Access Start Date", with = "crate::utils::time::iso_datetime")]
    pub access_start: DateTime<FixedOffset>,
    #[serde(rename = "Access End Date", with = "crate::utils::time::iso_datetime")]
    pub access_end: DateTime<FixedOffset>,
}

/// 待发送的邮件（运行时生成，不持久化）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailJob {
    pub user_name: String,
    pub recipient: String,
    pub subject: String,
    pub html_body: String,
}

/// 门锁厂商返回的设备
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub device_id: String,
    pub device_type: String,
}

/// 创建门禁码请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessCodeRequest {
    pub device_id: String,
    pub code: String,
    pub name: String,
    pub starts_at: String,
    pub ends_at: String,
}

/// 厂商确认创建的门禁码
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedAccessCode {
    #[serde(default)]
    pub access_code_id: String,
    pub code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// 工作流步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStep {
    /// 选择输入文件
    SelectInput,
    /// 签发门禁码
    IssueCodes,
    /// 发送通知邮件
    SendNotifications,
    /// 清理中间文件
    Cleanup,
}

impl WorkflowStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStep::SelectInput => "选择输入文件",
            WorkflowStep::IssueCodes => "签发门禁码",
            WorkflowStep::SendNotifications => "发送通知邮件",
            WorkflowStep::Cleanup => "清理中间文件",
        }
    }
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 签发结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueOutcome {
    /// 没有找到指定类型的门锁，未签发任何门禁码
    NoDevice,
    /// 已签发并写入中间文件
    Issued {
        device_id: String,
        grants: Vec<AccessGrant>,
        output: PathBuf,
    },
}

impl IssueOutcome {
    /// 签发数量
    pub fn issued_count(&self) -> usize {
        match self {
            IssueOutcome::NoDevice => 0,
            IssueOutcome::Issued { grants, .. } => grants.len(),
        }
    }
}

/// 单封邮件发送失败
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    pub user_name: String,
    pub reason: String,
}

/// 通知发送汇总
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationReport {
    pub attempted: usize,
    pub sent: usize,
    pub failures: Vec<DeliveryFailure>,
}

impl NotificationReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// 清理中间文件的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// 未启用清理
    Skipped,
    /// 已删除
    Deleted,
    /// 文件不存在
    Missing,
    /// 删除失败（不影响整体结果）
    Failed(String),
}

/// 整个工作流的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowOutcome {
    /// 操作员未选择文件
    Cancelled,
    Completed {
        issued: IssueOutcome,
        notifications: NotificationReport,
        cleanup: CleanupOutcome,
    },
}
