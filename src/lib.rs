//! rat_filelog - 按大小轮转的文件日志库
//!
//! 活动文件写满后在写入路径上同步轮转，归档的 gzip 压缩与保留数量清理
//! 由每个写入器独占的后台线程串行完成。

pub mod config;
pub mod core;
pub mod error;
pub mod fmt_impl;
pub mod handler;
pub mod naming;
pub mod policy;
pub mod producer_consumer;

// 重新导出主要类型
pub use config::{FileConfig, Level, Record, parse_level_or_default, parse_log_level_from_env};
pub use crate::core::{Logger, LoggerBuilder, LoggerCore, default_logger, set_default_logger};
pub use error::{LogError, Result};
pub use fmt_impl::LineFormatter;
pub use handler::{FileWriter, GzipArchiver};
pub use naming::{ArchiveEntry, ArchiveNamer};
pub use policy::{EvictionPlan, RotationPolicy};
pub use producer_consumer::{ArchiveCommand, ArchiveProcessor, ArchiveWorker};

// 日志宏
//
// 不带 `logger:` 时写入默认日志器：
//
// ```ignore
// rat_filelog::info!("listening on {}", addr);
// rat_filelog::info!(logger: &logger, "listening on {}", addr);
// ```

#[macro_export]
macro_rules! log {
    (logger: $logger:expr, $level:expr, $($arg:tt)+) => {{
        let __level = $level;
        let __logger = $logger;
        if __logger.should_log(__level) {
            __logger.log_record(&$crate::__private_record!(__level, $($arg)+));
        }
    }};
    ($level:expr, $($arg:tt)+) => {
        $crate::__private_log_impl(
            $level,
            ::std::format_args!($($arg)+),
            ::std::module_path!(),
            ::std::file!(),
            ::std::line!(),
        )
    };
}

#[macro_export]
macro_rules! fatal {
    (logger: $logger:expr, $($arg:tt)+) => {
        $logger.fatal_record(&$crate::__private_record!($crate::Level::Fatal, $($arg)+))
    };
    ($($arg:tt)+) => {
        $crate::__private_fatal_impl(
            ::std::format_args!($($arg)+),
            ::std::module_path!(),
            ::std::file!(),
            ::std::line!(),
        )
    };
}

#[macro_export]
macro_rules! error {
    (logger: $logger:expr, $($arg:tt)+) => {
        $crate::log!(logger: $logger, $crate::Level::Error, $($arg)+)
    };
    ($($arg:tt)+) => ($crate::log!($crate::Level::Error, $($arg)+));
}

#[macro_export]
macro_rules! warn {
    (logger: $logger:expr, $($arg:tt)+) => {
        $crate::log!(logger: $logger, $crate::Level::Warn, $($arg)+)
    };
    ($($arg:tt)+) => ($crate::log!($crate::Level::Warn, $($arg)+));
}

#[macro_export]
macro_rules! info {
    (logger: $logger:expr, $($arg:tt)+) => {
        $crate::log!(logger: $logger, $crate::Level::Info, $($arg)+)
    };
    ($($arg:tt)+) => ($crate::log!($crate::Level::Info, $($arg)+));
}

#[macro_export]
macro_rules! debug {
    (logger: $logger:expr, $($arg:tt)+) => {
        $crate::log!(logger: $logger, $crate::Level::Debug, $($arg)+)
    };
    ($($arg:tt)+) => ($crate::log!($crate::Level::Debug, $($arg)+));
}

#[macro_export]
macro_rules! trace {
    (logger: $logger:expr, $($arg:tt)+) => {
        $crate::log!(logger: $logger, $crate::Level::Trace, $($arg)+)
    };
    ($($arg:tt)+) => ($crate::log!($crate::Level::Trace, $($arg)+));
}

#[macro_export]
#[doc(hidden)]
macro_rules! __private_record {
    ($level:expr, $($arg:tt)+) => {
        $crate::Record::new($level, ::std::format!($($arg)+)).with_location(
            ::std::option::Option::Some(::std::module_path!()),
            ::std::file!(),
            ::std::line!(),
        )
    };
}

#[doc(hidden)]
pub fn __private_log_impl(
    level: Level,
    args: std::fmt::Arguments<'_>,
    module_path: &'static str,
    file: &'static str,
    line: u32,
) {
    match crate::core::default_logger() {
        Some(logger) => {
            if logger.should_log(level) {
                let record = Record::new(level, args.to_string())
                    .with_location(Some(module_path), file, line);
                logger.log_record(&record);
            }
        }
        // 未初始化默认日志器时输出到标准输出
        None => {
            if level.enabled_under(Level::Info) {
                let record = Record::new(level, args.to_string())
                    .with_location(Some(module_path), file, line);
                print_to_stdout(&record);
            }
        }
    }
}

#[doc(hidden)]
pub fn __private_fatal_impl(
    args: std::fmt::Arguments<'_>,
    module_path: &'static str,
    file: &'static str,
    line: u32,
) -> ! {
    let record = Record::new(Level::Fatal, args.to_string())
        .with_location(Some(module_path), file, line);
    match crate::core::default_logger() {
        Some(logger) => logger.fatal_record(&record),
        None => {
            print_to_stdout(&record);
            std::process::exit(1)
        }
    }
}

fn print_to_stdout(record: &Record) {
    use std::io::Write;
    let mut line = Vec::new();
    if fmt_impl::default_format(&mut line, record, true).is_ok() {
        let _ = std::io::stdout().lock().write_all(&line);
    }
}
