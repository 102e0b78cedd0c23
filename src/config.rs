//! 配置管理模块
//!
//! 加载顺序：内置默认值 → 可选的JSON配置文件 → `ACCESS_` 前缀环境变量 → 密钥环境变量。

use crate::error::{AppError, Result};
use crate::utils::time::{parse_timezone, DEFAULT_GRACE_DAYS, DEFAULT_TIMEZONE};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// 门锁厂商密钥
pub const SEAM_API_KEY_VAR: &str = "SEAM_API_KEY";
/// Microsoft Entra 租户
pub const TENANT_ID_VAR: &str = "TENANT_ID";
/// 应用注册 client id
pub const CLIENT_ID_VAR: &str = "CLIENT_ID";
/// 应用注册 client secret
pub const CLIENT_SECRET_VAR: &str = "CLIENT_SECRET";

/// 应用程序配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Seam门锁配置
    pub seam: SeamConfig,
    /// Microsoft Graph配置
    pub graph: GraphConfig,
    /// 通知邮件配置
    pub mail: MailConfig,
    /// 文件路径配置
    pub files: FilesConfig,
    /// 有效期计算配置
    pub schedule: ScheduleConfig,
}

/// Seam门锁配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeamConfig {
    /// API Key（来自 SEAM_API_KEY）
    #[serde(skip_serializing)]
    pub api_key: String,
    pub base_url: String,
    /// 要签发门禁码的门锁类型
    pub device_type: String,
}

impl Default for SeamConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://connect.getseam.com".to_string(),
            device_type: "yale_lock".to_string(),
        }
    }
}

/// Microsoft Graph配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    #[serde(skip_serializing)]
    pub tenant_id: String,
    #[serde(skip_serializing)]
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: String,
    pub authority_url: String,
    pub api_url: String,
    pub scope: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            tenant_id: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            authority_url: "https://login.microsoftonline.com".to_string(),
            api_url: "https://graph.microsoft.com/v1.0".to_string(),
            scope: "https://graph.microsoft.com/.default".to_string(),
        }
    }
}

impl GraphConfig {
    /// 令牌端点
    pub fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_url.trim_end_matches('/'),
            self.tenant_id
        )
    }

    /// 发信端点
    pub fn send_mail_url(&self, from_address: &str) -> String {
        format!(
            "{}/users/{}/sendMail",
            self.api_url.trim_end_matches('/'),
            from_address
        )
    }
}

/// 通知邮件配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// 发件人
    pub from_address: String,
    /// 邮件标题
    pub subject: String,
    /// HTML模板路径
    pub template_path: PathBuf,
    /// 测试用：所有邮件改发到此地址
    pub recipient_override: Option<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            from_address: "hello@thirdplacepottery.com".to_string(),
            subject: "TTP Door Access Code and Policies".to_string(),
            template_path: PathBuf::from("email_templates/class_email_template.html"),
            recipient_override: None,
        }
    }
}

/// 文件路径配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// 签发结果中间文件
    pub grants_path: PathBuf,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            grants_path: PathBuf::from("csv_files/users_created.csv"),
        }
    }
}

/// 有效期计算配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// 解释名单日期所用的时区
    pub timezone: String,
    /// 课程结束后门禁码继续有效的天数
    pub grace_days: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE.to_string(),
            grace_days: DEFAULT_GRACE_DAYS,
        }
    }
}

/// 从环境变量读取的密钥
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    pub seam_api_key: Option<String>,
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl Secrets {
    /// 读取进程环境变量（空值视为缺失）
    pub fn from_env() -> Self {
        let read = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            seam_api_key: read(SEAM_API_KEY_VAR),
            tenant_id: read(TENANT_ID_VAR),
            client_id: read(CLIENT_ID_VAR),
            client_secret: read(CLIENT_SECRET_VAR),
        }
    }
}

impl AppConfig {
    /// 从配置文件（可不存在）和环境变量加载配置
    pub fn load<P: AsRef<Path>>(path: P, secrets: Secrets) -> Result<Self> {
        let path = path.as_ref();
        let settings = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Json).required(false))
            .add_source(
                config::Environment::with_prefix("ACCESS")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let mut app_config: AppConfig = settings.try_deserialize()?;
        app_config.apply_secrets(secrets);

        log::debug!("配置已加载: {}", path.display());
        Ok(app_config)
    }

    /// 用环境变量中的密钥覆盖配置
    pub fn apply_secrets(&mut self, secrets: Secrets) {
        if let Some(key) = secrets.seam_api_key {
            self.seam.api_key = key;
        }
        if let Some(tenant) = secrets.tenant_id {
            self.graph.tenant_id = tenant;
        }
        if let Some(client_id) = secrets.client_id {
            self.graph.client_id = client_id;
        }
        if let Some(client_secret) = secrets.client_secret {
            self.graph.client_secret = client_secret;
        }
    }

    /// 签发门禁码所需配置
    pub fn validate_for_issuer(&self) -> Result<()> {
        if self.seam.api_key.is_empty() {
            return Err(AppError::missing_secret(SEAM_API_KEY_VAR));
        }

        if self.seam.device_type.is_empty() {
            return Err(AppError::validation("门锁类型不能为空"));
        }

        parse_timezone(&self.schedule.timezone)?;

        if self.files.grants_path.as_os_str().is_empty() {
            return Err(AppError::validation("中间文件路径不能为空"));
        }

        Ok(())
    }

    /// 发送邮件所需配置
    pub fn validate_for_mail(&self) -> Result<()> {
        let missing: Vec<&str> = [
            (TENANT_ID_VAR, &self.graph.tenant_id),
            (CLIENT_ID_VAR, &self.graph.client_id),
            (CLIENT_SECRET_VAR, &self.graph.client_secret),
        ]
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| *name)
        .collect();

        if !missing.is_empty() {
            return Err(AppError::missing_secret(missing.join(", ")));
        }

        if !validator::validate_email(self.mail.from_address.as_str()) {
            return Err(AppError::validation(format!(
                "发件人地址无效: {}",
                self.mail.from_address
            )));
        }

        if let Some(ref recipient) = self.mail.recipient_override {
            if !validator::validate_email(recipient.as_str()) {
                return Err(AppError::validation(format!("测试收件人地址无效: {}", recipient)));
            }
        }

        if self.mail.subject.trim().is_empty() {
            return Err(AppError::validation("邮件标题不能为空"));
        }

        Ok(())
    }

    /// 完整工作流所需配置
    pub fn validate(&self) -> Result<()> {
        self.validate_for_issuer()?;
        self.validate_for_mail()
    }
}
