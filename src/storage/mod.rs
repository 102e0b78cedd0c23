//! CSV文件读写模块

pub mod grants;
pub mod roster;

// 重新导出文件操作
pub use grants::{GrantRepository, GrantWriter};
pub use roster::RosterRepository;
