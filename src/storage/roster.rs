//! 学员名单读取

use crate::error::{AppError, Result};
use crate::types::RosterEntry;
use std::path::Path;

/// 名单必需的列
pub const ROSTER_COLUMNS: [&str; 5] = ["First Name", "Last Name", "Email", "Class Start", "Class End"];

/// 学员名单操作
pub struct RosterRepository;

impl RosterRepository {
    /// 读取名单CSV，多余的列会被忽略
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<RosterEntry>> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AppError::file_state(format!("名单文件 {} 不存在", path.display())));
        }

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;

        let headers = reader.headers()?.clone();
        let missing: Vec<&str> = ROSTER_COLUMNS
            .iter()
            .copied()
            .filter(|column| !headers.iter().any(|h| h == *column))
            .collect();
        if !missing.is_empty() {
            return Err(AppError::parse(format!(
                "名单 {} 缺少列: {}",
                path.display(),
                missing.join(", ")
            )));
        }

        let mut entries = Vec::new();
        for (index, record) in reader.deserialize::<RosterEntry>().enumerate() {
            let entry = record.map_err(|e| {
                AppError::parse(format!("名单第 {} 行无法解析: {}", index + 1, e))
            })?;
            entries.push(entry);
        }

        Ok(entries)
    }

    /// 校验单行名单（行号从1开始）
    pub fn validate_entry(row: usize, entry: &RosterEntry) -> Result<()> {
        if entry.first_name.is_empty() || entry.last_name.is_empty() {
            return Err(AppError::parse(format!("名单第 {} 行姓名为空", row)));
        }

        if !validator::validate_email(entry.email.as_str()) {
            return Err(AppError::parse(format!(
                "名单第 {} 行邮箱无效: {}",
                row, entry.email
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_roster() -> Result<()> {
        let file = write_csv(
            "First Name,Last Name,Email,Class Start,Class End,Notes\n\
             Ana,Lee,a@x.com,01/10/2024,01/12/2024,wheel\n\
             Ben , Ortiz ,b@x.com,01/10/2024,01/31/2024,\n",
        );

        let entries = RosterRepository::load(file.path())?;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].full_name(), "Ana Lee");
        assert_eq!(entries[1].full_name(), "Ben Ortiz");
        assert_eq!(entries[1].class_end, "01/31/2024");
        Ok(())
    }

    #[test]
    fn test_missing_column() {
        let file = write_csv("First Name,Last Name,Email,Class Start\nAna,Lee,a@x.com,01/10/2024\n");

        let err = RosterRepository::load(file.path()).unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
        assert!(err.to_string().contains("Class End"));
    }

    #[test]
    fn test_missing_file() {
        let file = NamedTempFile::new().unwrap();
        let missing = file.path().with_extension("gone");
        assert!(matches!(RosterRepository::load(&missing), Err(AppError::FileState(_))));
    }

    #[test]
    fn test_validate_entry() {
        let mut entry = RosterEntry {
            first_name: "Ana".to_string(),
            last_name: "Lee".to_string(),
            email: "a@x.com".to_string(),
            class_start: "01/10/2024".to_string(),
            class_end: "01/12/2024".to_string(),
        };
        assert!(RosterRepository::validate_entry(1, &entry).is_ok());

        entry.email = "not an email".to_string();
        assert!(RosterRepository::validate_entry(1, &entry).is_err());

        entry.email = "a@x.com".to_string();
        entry.first_name.clear();
        assert!(RosterRepository::validate_entry(1, &entry).is_err());
    }
}
