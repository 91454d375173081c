//! 行格式化
//!
//! 默认格式为 `{调用位置 }{时间戳} {级别} {内容}`，字段之间以空格分隔：
//!
//! ```text
//! my_app::server main.rs:42: 2026-10-18T09:15:02.123456789+08:00 INFO listening
//! ```
//!
//! 写入器只依赖 [`LineFormatter`]，时间戳与调用位置的具体样式可以整体替换。

use std::fmt::Display;
use std::io::{self, Write};
use std::path::Path;

use chrono::{Local, SecondsFormat};

use crate::config::Record;

/// 格式化函数
pub type LineFormatter = Box<dyn Fn(&mut dyn Write, &Record) -> io::Result<()> + Send + Sync>;

/// 默认格式化函数
pub fn default_formatter(with_caller: bool) -> LineFormatter {
    Box::new(move |buf: &mut dyn Write, record: &Record| {
        default_format(buf, record, with_caller)
    })
}

/// 默认格式
pub fn default_format(buf: &mut dyn Write, record: &Record, with_caller: bool) -> io::Result<()> {
    if with_caller {
        if let Some(tag) = caller_tag(record) {
            write!(buf, "{} ", tag)?;
        }
    }
    let timestamp = Local::now().to_rfc3339_opts(SecondsFormat::Nanos, false);
    writeln!(buf, "{} {} {}", timestamp, record.level, record.args)
}

/// 调用位置标签：`模块 文件名:行号:`
pub fn caller_tag(record: &Record) -> Option<String> {
    let file = record.file?;
    let file = Path::new(file)
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap_or(file);
    let line = record.line.unwrap_or(0);
    Some(match record.module_path {
        Some(module) => format!("{} {}:{}:", module, file, line),
        None => format!("{}:{}:", file, line),
    })
}

/// 把多个值以空格连接成一条消息
pub fn join_values(values: &[&dyn Display]) -> String {
    let mut out = String::new();
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&value.to_string());
    }
    out
}
