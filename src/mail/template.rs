//! HTML邮件模板
//!
//! 占位符写作 `{user_name}`，字面量花括号写作 `{{` 和 `}}`。

use crate::error::{AppError, Result};
use std::path::Path;

/// 模板中可用的占位符
pub const PLACEHOLDERS: [&str; 4] = ["user_name", "access_code", "start_date", "end_date"];

/// 单封邮件的占位符取值
#[derive(Debug, Clone, Copy)]
pub struct TemplateValues<'a> {
    pub user_name: &'a str,
    pub access_code: &'a str,
    pub start_date: &'a str,
    pub end_date: &'a str,
}

impl<'a> TemplateValues<'a> {
    fn lookup(&self, name: &str) -> Option<&'a str> {
        match name {
            "user_name" => Some(self.user_name),
            "access_code" => Some(self.access_code),
            "start_date" => Some(self.start_date),
            "end_date" => Some(self.end_date),
            _ => None,
        }
    }
}

/// 预加载的HTML模板
#[derive(Debug, Clone)]
pub struct EmailTemplate {
    source: String,
}

impl EmailTemplate {
    /// 从文件加载模板
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AppError::file_state(format!("邮件模板 {} 不存在", path.display())));
        }

        let template = Self::from_source(std::fs::read_to_string(path)?);
        // 加载时先试渲染一次，尽早发现模板错误
        let unused = template.unused_placeholders()?;
        if !unused.is_empty() {
            log::warn!(
                "⚠️ 邮件模板 {} 没有使用占位符: {}",
                path.display(),
                unused.join(", ")
            );
        }

        Ok(template)
    }

    pub fn from_source<S: Into<String>>(source: S) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// 模板中没有出现的占位符
    pub fn unused_placeholders(&self) -> Result<Vec<&'static str>> {
        let markers: Vec<String> = PLACEHOLDERS
            .iter()
            .map(|name| format!("\u{1}{}\u{1}", name))
            .collect();

        let rendered = self.render(&TemplateValues {
            user_name: &markers[0],
            access_code: &markers[1],
            start_date: &markers[2],
            end_date: &markers[3],
        })?;

        Ok(PLACEHOLDERS
            .into_iter()
            .zip(markers.iter())
            .filter(|(_, marker)| !rendered.contains(marker.as_str()))
            .map(|(name, _)| name)
            .collect())
    }

    /// 替换占位符
    pub fn render(&self, values: &TemplateValues<'_>) -> Result<String> {
        let mut output = String::with_capacity(self.source.len() + 64);
        let mut chars = self.source.char_indices().peekable();

        while let Some((index, c)) = chars.next() {
            match c {
                '{' if matches!(chars.peek(), Some((_, '{'))) => {
                    chars.next();
                    output.push('{');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }

                    if !closed {
                        return Err(AppError::template(format!("位置 {} 的 '{{' 没有闭合", index)));
                    }

                    let value = values.lookup(&name).ok_or_else(|| {
                        AppError::template(format!("未知占位符 '{{{}}}'", name))
                    })?;
                    output.push_str(value);
                }
                '}' if matches!(chars.peek(), Some((_, '}'))) => {
                    chars.next();
                    output.push('}');
                }
                '}' => {
                    return Err(AppError::template(format!("位置 {} 有多余的 '}}'", index)));
                }
                _ => output.push(c),
            }
        }

        Ok(output)
    }
}
