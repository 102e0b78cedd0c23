//! 课程门禁码工作流
//!
//! 根据学员名单为每位学员：
//! - 生成6位数字门禁码并在Seam门锁上登记（课程开始日至结束日后7天有效）
//! - 将签发结果写入中间CSV文件
//! - 通过Microsoft Graph发送带门禁码的HTML通知邮件
//! - 可选地在完成后删除中间文件

pub mod auth;
pub mod config;
pub mod error;
pub mod mail;
pub mod services;
pub mod storage;
pub mod types;
pub mod utils;
pub mod vendor;
pub mod workflow;

// 重新导出常用类型
pub use config::{AppConfig, Secrets};
pub use error::{AppError, Result};
pub use types::{
    AccessGrant, CleanupOutcome, EmailJob, IssueOutcome, NotificationReport, RosterEntry,
    WorkflowOutcome, WorkflowStep,
};
pub use workflow::{WorkflowOptions, WorkflowRunner};
