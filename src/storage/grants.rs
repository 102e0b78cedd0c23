//! 签发结果中间文件
//!
//! 列: `Name, Email, Access Code, Access Start Date, Access End Date`。
//! 门禁码始终按字符串读写，前导零不会丢失。

use crate::error::{AppError, Result};
use crate::types::AccessGrant;
use crate::utils::is_valid_access_code;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// 中间文件的列
pub const GRANT_COLUMNS: [&str; 5] = [
    "Name",
    "Email",
    "Access Code",
    "Access Start Date",
    "Access End Date",
];

/// 中间文件写入器，每写一行立即落盘
pub struct GrantWriter {
    writer: csv::Writer<File>,
    path: PathBuf,
    written: usize,
}

impl GrantWriter {
    /// 追加一条签发记录
    pub fn append(&mut self, grant: &AccessGrant) -> Result<()> {
        self.writer.serialize(grant)?;
        self.writer.flush()?;
        self.written += 1;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 已写入的行数
    pub fn written(&self) -> usize {
        self.written
    }
}

/// 中间文件操作
pub struct GrantRepository;

impl GrantRepository {
    /// 新建（覆盖）中间文件，仅包含表头
    pub fn create<P: AsRef<Path>>(path: P) -> Result<GrantWriter> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // 表头单独写入，保证没有记录时文件也有表头
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(File::create(path)?);
        writer.write_record(GRANT_COLUMNS)?;
        writer.flush()?;

        Ok(GrantWriter {
            writer,
            path: path.to_path_buf(),
            written: 0,
        })
    }

    /// 一次性写入全部记录
    pub fn save<P: AsRef<Path>>(path: P, grants: &[AccessGrant]) -> Result<()> {
        let mut writer = Self::create(path)?;
        for grant in grants {
            writer.append(grant)?;
        }
        Ok(())
    }

    /// 读取中间文件，并校验每行门禁码
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<AccessGrant>> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AppError::file_state(format!(
                "中间文件 {} 不存在，请先签发门禁码",
                path.display()
            )));
        }

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;

        let mut grants = Vec::new();
        for (index, record) in reader.deserialize::<AccessGrant>().enumerate() {
            let grant = record.map_err(|e| {
                AppError::parse(format!("中间文件第 {} 行无法解析: {}", index + 1, e))
            })?;

            if !is_valid_access_code(&grant.access_code) {
                return Err(AppError::parse(format!(
                    "中间文件第 {} 行门禁码无效: '{}'",
                    index + 1,
                    grant.access_code
                )));
            }

            grants.push(grant);
        }

        Ok(grants)
    }

    /// 删除中间文件，返回文件原先是否存在
    pub fn remove<P: AsRef<Path>>(path: P) -> Result<bool> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::time::parse_iso;
    use tempfile::TempDir;

    fn grant(name: &str, code: &str) -> AccessGrant {
        AccessGrant {
            name: name.to_string(),
            email: format!("{}@x.com", name.to_lowercase().replace(' ', ".")),
            access_code: code.to_string(),
            access_start: parse_iso("2024-01-10T00:00:00-08:00").unwrap(),
            access_end: parse_iso("2024-01-19T00:00:00-08:00").unwrap(),
        }
    }

    #[test]
    fn test_leading_zeros_survive_round_trip() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("users_created.csv");

        GrantRepository::save(&path, &[grant("Ana Lee", "004213"), grant("Ben Ortiz", "000000")])?;
        let loaded = GrantRepository::load(&path)?;

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].access_code, "004213");
        assert_eq!(loaded[1].access_code, "000000");
        assert_eq!(loaded[0], grant("Ana Lee", "004213"));
        Ok(())
    }

    #[test]
    fn test_file_layout() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("csv_files").join("users_created.csv");

        GrantRepository::save(&path, &[grant("Ana Lee", "004213")])?;
        let content = fs::read_to_string(&path)?;
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines[0], "Name,Email,Access Code,Access Start Date,Access End Date");
        assert_eq!(
            lines[1],
            "Ana Lee,ana.lee@x.com,004213,2024-01-10T00:00:00-08:00,2024-01-19T00:00:00-08:00"
        );
        Ok(())
    }

    #[test]
    fn test_create_overwrites_previous_file() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("users_created.csv");

        GrantRepository::save(&path, &[grant("Ana Lee", "111111"), grant("Ben Ortiz", "222222")])?;
        GrantRepository::save(&path, &[grant("Cy Park", "333333")])?;

        let loaded = GrantRepository::load(&path)?;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "Cy Park");
        Ok(())
    }

    #[test]
    fn test_writer_flushes_each_row() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("users_created.csv");

        let mut writer = GrantRepository::create(&path)?;
        writer.append(&grant("Ana Lee", "004213"))?;

        // 写入器仍然打开时，已写入的行就能被读到
        let loaded = GrantRepository::load(&path)?;
        assert_eq!(loaded.len(), 1);
        assert_eq!(writer.written(), 1);
        Ok(())
    }

    #[test]
    fn test_reads_space_separated_timestamps() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("users_created.csv");
        fs::write(
            &path,
            "Name,Email,Access Code,Access Start Date,Access End Date\n\
             Ana Lee,a@x.com,004213,2024-01-10 00:00:00-08:00,2024-01-19 00:00:00-08:00\n",
        )?;

        let loaded = GrantRepository::load(&path)?;
        assert_eq!(loaded[0].access_end, parse_iso("2024-01-19T00:00:00-08:00").unwrap());
        Ok(())
    }

    #[test]
    fn test_rejects_empty_or_short_code() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("users_created.csv");
        fs::write(
            &path,
            "Name,Email,Access Code,Access Start Date,Access End Date\n\
             Ana Lee,a@x.com,,2024-01-10T00:00:00-08:00,2024-01-19T00:00:00-08:00\n",
        )?;
        assert!(matches!(GrantRepository::load(&path), Err(AppError::Parse(_))));

        fs::write(
            &path,
            "Name,Email,Access Code,Access Start Date,Access End Date\n\
             Ana Lee,a@x.com,4213,2024-01-10T00:00:00-08:00,2024-01-19T00:00:00-08:00\n",
        )?;
        assert!(matches!(GrantRepository::load(&path), Err(AppError::Parse(_))));
        Ok(())
    }

    #[test]
    fn test_missing_file_and_remove() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("users_created.csv");

        assert!(matches!(GrantRepository::load(&path), Err(AppError::FileState(_))));
        assert!(!GrantRepository::remove(&path)?);

        GrantRepository::save(&path, &[])?;
        assert!(GrantRepository::remove(&path)?);
        assert!(!path.exists());
        Ok(())
    }
}
