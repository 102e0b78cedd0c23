//! 工作流编排模块

pub mod picker;
pub mod runner;

pub use picker::{default_picker, FilePicker, PresetPicker, PromptPicker};
pub use runner::{cleanup_grants_file, WorkflowOptions, WorkflowRunner};
