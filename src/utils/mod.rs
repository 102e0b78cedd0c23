//! 工具模块

pub mod access_code;
pub mod time;

// 重新导出常用功能
pub use access_code::{generate_access_code, is_valid_access_code, ACCESS_CODE_LENGTH};
pub use time::{access_window, display_date, parse_class_date, parse_timezone, AccessWindow};
