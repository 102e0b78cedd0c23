//! 业务服务模块

pub mod issuer;
pub mod notifier;

// 重新导出主要组件
pub use issuer::IssuerService;
pub use notifier::NotifierService;
