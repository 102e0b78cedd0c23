//! 输入文件选择
//!
//! 命令行参数直接给出路径时用 `PresetPicker`；否则启用 `dialog` 特性时弹出系统文件对话框，
//! 未启用时在终端提示输入路径。

use crate::error::Result;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// 选择学员名单文件，返回 `None` 表示操作员取消
pub trait FilePicker {
    fn pick_input(&self) -> Result<Option<PathBuf>>;
}

/// 预先给定的路径
#[derive(Debug, Clone, Default)]
pub struct PresetPicker(pub Option<PathBuf>);

impl FilePicker for PresetPicker {
    fn pick_input(&self) -> Result<Option<PathBuf>> {
        Ok(self.0.clone())
    }
}

/// 终端输入路径
#[derive(Debug, Clone, Default)]
pub struct PromptPicker;

impl PromptPicker {
    /// 读取一行路径，空行视为取消；去掉拖放文件时常带的引号
    pub fn read_path<R: BufRead>(mut reader: R) -> Result<Option<PathBuf>> {
        let mut line = String::new();
        reader.read_line(&mut line)?;

        let path = line.trim().trim_matches(|c| c == '"' || c == '\'').trim();
        if path.is_empty() {
            Ok(None)
        } else {
            Ok(Some(PathBuf::from(path)))
        }
    }
}

impl FilePicker for PromptPicker {
    fn pick_input(&self) -> Result<Option<PathBuf>> {
        print!("请输入学员名单CSV文件路径（直接回车取消）: ");
        io::stdout().flush()?;
        Self::read_path(io::stdin().lock())
    }
}

/// 系统文件对话框
#[cfg(feature = "dialog")]
#[derive(Debug, Clone, Default)]
pub struct DialogPicker;

#[cfg(feature = "dialog")]
impl FilePicker for DialogPicker {
    fn pick_input(&self) -> Result<Option<PathBuf>> {
        Ok(rfd::FileDialog::new()
            .set_title("Select Input CSV File")
            .add_filter("CSV Files", &["csv"])
            .add_filter("All Files", &["*"])
            .pick_file())
    }
}

/// 未指定路径时使用的选择方式
#[cfg(feature = "dialog")]
pub fn default_picker() -> Box<dyn FilePicker> {
    Box::new(DialogPicker)
}

/// 未指定路径时使用的选择方式
#[cfg(not(feature = "dialog"))]
pub fn default_picker() -> Box<dyn FilePicker> {
    Box::new(PromptPicker)
}
