//! 错误处理模块

use crate::types::WorkflowStep;
use thiserror::Error;

/// 应用程序错误类型
#[derive(Error, Debug)]
pub enum AppError {
    #[error("配置错误: {0}")]
    Config(#[from] config::ConfigError),

    #[error("缺少必需的环境变量: {0}")]
    MissingSecret(String),

    #[error("解析错误: {0}")]
    Parse(String),

    #[error("CSV错误: {0}")]
    Csv(#[from] csv::Error),

    #[error("认证错误: {0}")]
    Authentication(String),

    #[error("网络错误: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP请求失败: {status}, {body}")]
    Http { status: u16, body: String },

    #[error("模板错误: {0}")]
    Template(String),

    #[error("文件状态错误: {0}")]
    FileState(String),

    #[error("{step}失败")]
    Step {
        step: WorkflowStep,
        source: Box<AppError>,
    },

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("验证错误: {0}")]
    Validation(String),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// 创建解析错误
    pub fn parse<T: Into<String>>(msg: T) -> Self {
        Self::Parse(msg.into())
    }

    /// 创建验证错误
    pub fn validation<T: Into<String>>(msg: T) -> Self {
        Self::Validation(msg.into())
    }

    /// 创建认证错误
    pub fn authentication<T: Into<String>>(msg: T) -> Self {
        Self::Authentication(msg.into())
    }

    /// 创建模板错误
    pub fn template<T: Into<String>>(msg: T) -> Self {
        Self::Template(msg.into())
    }

    /// 创建文件状态错误
    pub fn file_state<T: Into<String>>(msg: T) -> Self {
        Self::FileState(msg.into())
    }

    /// 缺少环境变量
    pub fn missing_secret<T: Into<String>>(name: T) -> Self {
        Self::MissingSecret(name.into())
    }

    /// 把错误归属到工作流的某个步骤
    pub fn in_step(self, step: WorkflowStep) -> Self {
        Self::Step {
            step,
            source: Box::new(self),
        }
    }
}

/// 应用程序Result类型
pub type Result<T> = std::result::Result<T, AppError>;
