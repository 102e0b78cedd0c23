//! 门禁码签发服务
//!
//! 按名单顺序逐行调用门锁厂商创建门禁码，每成功一行立即写入中间文件。
//! 厂商调用失败时整批终止，之前成功的行已经保存在中间文件里。

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::storage::{GrantRepository, RosterRepository};
use crate::types::{AccessCodeRequest, AccessGrant, IssueOutcome, RosterEntry};
use crate::utils::time::{access_window, parse_timezone, to_iso, AccessWindow};
use crate::utils::generate_access_code;
use crate::vendor::{find_device, LockVendor};
use chrono_tz::Tz;
use std::path::{Path, PathBuf};

/// 门禁码签发服务
pub struct IssuerService<'a, V: LockVendor + ?Sized> {
    vendor: &'a V,
    device_type: String,
    timezone: Tz,
    grace_days: u64,
    grants_path: PathBuf,
}

impl<'a, V: LockVendor + ?Sized> IssuerService<'a, V> {
    /// 创建签发服务
    pub fn new(vendor: &'a V, config: &AppConfig) -> Result<Self> {
        Ok(Self {
            vendor,
            device_type: config.seam.device_type.clone(),
            timezone: parse_timezone(&config.schedule.timezone)?,
            grace_days: config.schedule.grace_days,
            grants_path: config.files.grants_path.clone(),
        })
    }

    /// 为名单中的每位学员签发门禁码
    pub async fn issue_codes(&self, input: &Path) -> Result<IssueOutcome> {
        log::info!("📖 读取学员名单: {}", input.display());
        let entries = RosterRepository::load(input)?;
        let planned = self.plan(entries)?;
        log::info!("👥 名单共 {} 位学员", planned.len());

        let devices = self.vendor.list_devices().await?;
        let device = match find_device(&devices, &self.device_type) {
            Some(device) => device.clone(),
            None => {
                log::warn!(
                    "⚠️ 没有找到类型为 {} 的门锁（共 {} 个设备），未签发任何门禁码",
                    self.device_type,
                    devices.len()
                );
                return Ok(IssueOutcome::NoDevice);
            }
        };
        log::info!("🔒 使用门锁 {}", device.device_id);

        let mut writer = GrantRepository::create(&self.grants_path)?;
        let mut grants = Vec::with_capacity(planned.len());

        for (entry, window) in planned {
            let user_name = entry.full_name();
            let code = generate_access_code(&mut rand::thread_rng());

            let request = AccessCodeRequest {
                device_id: device.device_id.clone(),
                code: code.clone(),
                name: user_name.clone(),
                starts_at: to_iso(&window.start),
                ends_at: to_iso(&window.end),
            };

            let created = match self.vendor.create_access_code(&request).await {
                Ok(created) => created,
                Err(e) => {
                    log::error!(
                        "❌ 为 {} 创建门禁码失败，已签发的 {} 条记录保存在 {}",
                        user_name,
                        writer.written(),
                        writer.path().display()
                    );
                    return Err(e);
                }
            };

            log::info!(
                "✅ 已为 {} 创建门禁码 {}",
                user_name,
                created.code.as_deref().unwrap_or(&code)
            );

            let grant = AccessGrant {
                name: user_name,
                email: entry.email,
                access_code: code,
                access_start: window.start,
                access_end: window.end,
            };
            writer.append(&grant)?;
            grants.push(grant);
        }

        log::info!("📝 已写入 {} 条签发记录: {}", grants.len(), self.grants_path.display());
        Ok(IssueOutcome::Issued {
            device_id: device.device_id,
            grants,
            output: self.grants_path.clone(),
        })
    }

    /// 校验所有行并计算有效期，任何一行出错都不会调用厂商
    fn plan(&self, entries: Vec<RosterEntry>) -> Result<Vec<(RosterEntry, AccessWindow)>> {
        entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                RosterRepository::validate_entry(index + 1, &entry)?;
                let window = access_window(
                    &entry.class_start,
                    &entry.class_end,
                    self.timezone,
                    self.grace_days,
                )
                .map_err(|e| match e {
                    AppError::Parse(message) => {
                        AppError::parse(format!("名单第 {} 行: {}", index + 1, message))
                    }
                    other => other,
                })?;
                Ok((entry, window))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CreatedAccessCode, Device};
    use crate::utils::is_valid_access_code;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// 记录调用的假厂商，第 fail_at 次创建时返回错误
    struct FakeVendor {
        devices: Vec<Device>,
        fail_at: Option<usize>,
        requests: Mutex<Vec<AccessCodeRequest>>,
    }

    impl FakeVendor {
        fn with_devices(types: &[&str]) -> Self {
            Self {
                devices: types
                    .iter()
                    .enumerate()
                    .map(|(i, t)| Device {
                        device_id: format!("device-{}", i),
                        device_type: t.to_string(),
                    })
                    .collect(),
                fail_at: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<AccessCodeRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LockVendor for FakeVendor {
        async fn list_devices(&self) -> Result<Vec<Device>> {
            Ok(self.devices.clone())
        }

        async fn create_access_code(&self, request: &AccessCodeRequest) -> Result<CreatedAccessCode> {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            if Some(requests.len()) == self.fail_at {
                return Err(AppError::Http {
                    status: 500,
                    body: "internal".to_string(),
                });
            }
            Ok(CreatedAccessCode {
                access_code_id: format!("ac-{}", requests.len()),
                code: Some(request.code.clone()),
                name: Some(request.name.clone()),
            })
        }
    }

    fn setup(roster: &str) -> (TempDir, PathBuf, AppConfig) {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("roster.csv");
        std::fs::write(&input, roster).unwrap();

        let mut config = AppConfig::default();
        config.files.grants_path = dir.path().join("csv_files").join("users_created.csv");
        (dir, input, config)
    }

    const TWO_ROWS: &str = "First Name,Last Name,Email,Class Start,Class End\n\
                            Ana,Lee,a@x.com,01/10/2024,01/12/2024\n\
                            Ben,Ortiz,b@x.com,02/01/2024,02/29/2024\n";

    #[tokio::test]
    async fn test_issue_single_row() -> Result<()> {
        let (_dir, input, config) =
            setup("First Name,Last Name,Email,Class Start,Class End\nAna,Lee,a@x.com,01/10/2024,01/12/2024\n");
        let vendor = FakeVendor::with_devices(&["smartthings_hub", "yale_lock"]);

        let outcome = IssuerService::new(&vendor, &config)?.issue_codes(&input).await?;

        let requests = vendor.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].device_id, "device-1");
        assert_eq!(requests[0].name, "Ana Lee");
        assert_eq!(requests[0].starts_at, "2024-01-10T00:00:00-08:00");
        assert_eq!(requests[0].ends_at, "2024-01-19T00:00:00-08:00");
        assert!(is_valid_access_code(&requests[0].code));

        let saved = GrantRepository::load(&config.files.grants_path)?;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].access_code, requests[0].code);
        assert_eq!(saved[0].email, "a@x.com");
        assert_eq!(outcome.issued_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_no_matching_device() -> Result<()> {
        let (_dir, input, config) = setup(TWO_ROWS);
        let vendor = FakeVendor::with_devices(&["august_lock"]);

        let outcome = IssuerService::new(&vendor, &config)?.issue_codes(&input).await?;

        assert_eq!(outcome, IssueOutcome::NoDevice);
        assert!(vendor.requests().is_empty());
        assert!(!config.files.grants_path.exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_rows_processed_in_order() -> Result<()> {
        let (_dir, input, config) = setup(TWO_ROWS);
        let vendor = FakeVendor::with_devices(&["yale_lock"]);

        IssuerService::new(&vendor, &config)?.issue_codes(&input).await?;

        let names: Vec<String> = vendor.requests().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Ana Lee", "Ben Ortiz"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_vendor_failure_keeps_earlier_grants() -> Result<()> {
        let (_dir, input, config) = setup(TWO_ROWS);
        let mut vendor = FakeVendor::with_devices(&["yale_lock"]);
        vendor.fail_at = Some(2);

        let result = IssuerService::new(&vendor, &config)?.issue_codes(&input).await;

        assert!(matches!(result, Err(AppError::Http { status: 500, .. })));
        let saved = GrantRepository::load(&config.files.grants_path)?;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].name, "Ana Lee");
        Ok(())
    }

    #[tokio::test]
    async fn test_bad_date_stops_before_vendor_calls() -> Result<()> {
        let (_dir, input, config) = setup(
            "First Name,Last Name,Email,Class Start,Class End\n\
             Ana,Lee,a@x.com,01/10/2024,01/12/2024\n\
             Ben,Ortiz,b@x.com,2024-02-01,02/29/2024\n",
        );
        let vendor = FakeVendor::with_devices(&["yale_lock"]);

        let result = IssuerService::new(&vendor, &config)?.issue_codes(&input).await;

        match result {
            Err(AppError::Parse(message)) => assert!(message.contains("第 2 行")),
            other => panic!("expected parse error, got {:?}", other),
        }
        assert!(vendor.requests().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_second_run_overwrites_output() -> Result<()> {
        let (_dir, input, config) = setup(TWO_ROWS);
        let vendor = FakeVendor::with_devices(&["yale_lock"]);
        let issuer = IssuerService::new(&vendor, &config)?;

        issuer.issue_codes(&input).await?;
        std::fs::write(
            &input,
            "First Name,Last Name,Email,Class Start,Class End\nCy,Park,c@x.com,03/01/2024,03/02/2024\n",
        )?;
        issuer.issue_codes(&input).await?;

        let saved = GrantRepository::load(&config.files.grants_path)?;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].name, "Cy Park");
        Ok(())
    }
}
