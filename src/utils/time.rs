//! 日期与时区处理
//!
//! 名单中的日期为 `MM/DD/YYYY`，按固定时区（默认太平洋时间）的当地零点解释。
//! 访问结束时间为课程结束日当地零点再加整 `grace_days * 24` 小时，沿用结束日的UTC偏移。

use crate::error::{AppError, Result};
use chrono::{DateTime, Duration, FixedOffset, LocalResult, NaiveDate, Offset, TimeZone};
use chrono_tz::Tz;

/// 名单日期格式
pub const CLASS_DATE_FORMAT: &str = "%m/%d/%Y";

/// 邮件中显示的短日期格式
pub const DISPLAY_DATE_FORMAT: &str = "%m/%d/%y";

/// 默认时区
pub const DEFAULT_TIMEZONE: &str = "America/Los_Angeles";

/// 默认宽限天数
pub const DEFAULT_GRACE_DAYS: u64 = 7;

/// 门禁码有效期
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessWindow {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

/// 解析IANA时区名
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| AppError::validation(format!("未知时区: {}", name)))
}

/// 解析课程日期
pub fn parse_class_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), CLASS_DATE_FORMAT).map_err(|e| {
        AppError::parse(format!("日期 '{}' 不是 MM/DD/YYYY 格式: {}", value, e))
    })
}

/// 某天在指定时区的零点
pub fn local_midnight(date: NaiveDate, tz: Tz) -> Result<DateTime<FixedOffset>> {
    let naive = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| AppError::parse(format!("无效日期: {}", date)))?;

    let local = match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            return Err(AppError::parse(format!("{} 零点在时区 {} 中不存在", date, tz)))
        }
    };

    Ok(local.with_timezone(&local.offset().fix()))
}

/// 根据课程起止日期计算门禁码有效期
pub fn access_window(
    class_start: &str,
    class_end: &str,
    tz: Tz,
    grace_days: u64,
) -> Result<AccessWindow> {
    let start_date = parse_class_date(class_start)?;
    let end_date = parse_class_date(class_end)?;

    if end_date < start_date {
        return Err(AppError::parse(format!(
            "课程结束日期 {} 早于开始日期 {}",
            class_end, class_start
        )));
    }

    let start = local_midnight(start_date, tz)?;
    let class_end_at = local_midnight(end_date, tz)?;
    let end = i64::try_from(grace_days)
        .ok()
        .and_then(Duration::try_days)
        .and_then(|grace| class_end_at.checked_add_signed(grace))
        .ok_or_else(|| AppError::parse(format!("日期溢出: {} + {} 天", class_end, grace_days)))?;

    Ok(AccessWindow { start, end })
}

/// ISO-8601（带时区偏移）
pub fn to_iso(dt: &DateTime<FixedOffset>) -> String {
    dt.to_rfc3339()
}

/// 解析中间文件中的时间，兼容空格分隔的写法
pub fn parse_iso(value: &str) -> Result<DateTime<FixedOffset>> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%:z"))
        .map_err(|e| AppError::parse(format!("时间 '{}' 不是ISO-8601格式: {}", value, e)))
}

/// 邮件中显示的日期 MM/DD/YY
pub fn display_date(dt: &DateTime<FixedOffset>) -> String {
    dt.format(DISPLAY_DATE_FORMAT).to_string()
}

/// AccessGrant 时间字段的serde格式
pub mod iso_datetime {
    use chrono::{DateTime, FixedOffset};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(dt: &DateTime<FixedOffset>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::to_iso(dt))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        super::parse_iso(&value).map_err(serde::de::Error::custom)
    }
}
