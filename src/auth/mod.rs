//! 身份认证模块（Microsoft Entra client credentials）

pub mod token_service;

// 重新导出主要组件
pub use token_service::{AccessToken, TokenService};
