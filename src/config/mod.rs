//! 配置模块

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{LogError, Result};

/// 日志级别
///
/// 数值越大越详细，数值大于阈值的记录会被直接丢弃。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(i8)]
pub enum Level {
    Fatal = -1,
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl Level {
    pub fn as_i8(self) -> i8 {
        self as i8
    }

    pub fn from_i8(value: i8) -> Option<Level> {
        match value {
            -1 => Some(Level::Fatal),
            0 => Some(Level::Error),
            1 => Some(Level::Warn),
            2 => Some(Level::Info),
            3 => Some(Level::Debug),
            4 => Some(Level::Trace),
            _ => None,
        }
    }

    /// 级别标签
    pub fn label(self) -> &'static str {
        match self {
            Level::Fatal => "FATAL",
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        }
    }

    /// 在阈值 `threshold` 下是否应该输出
    pub fn enabled_under(self, threshold: Level) -> bool {
        self.as_i8() <= threshold.as_i8()
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Level {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fatal" => Ok(Level::Fatal),
            "error" => Ok(Level::Error),
            "warn" | "warning" => Ok(Level::Warn),
            "info" => Ok(Level::Info),
            "debug" => Ok(Level::Debug),
            "trace" => Ok(Level::Trace),
            other => Err(LogError::Config(format!("未知的日志级别: {:?}", other))),
        }
    }
}

/// 解析日志级别，无法识别时回退到 Info
pub fn parse_level_or_default(s: &str) -> Level {
    s.parse().unwrap_or(Level::Info)
}

/// 从 RUST_LOG 环境变量解析日志级别
pub fn parse_log_level_from_env() -> Option<Level> {
    std::env::var("RUST_LOG").ok().and_then(|v| v.parse().ok())
}

/// 日志记录
///
/// 每次调用时创建，写入后立即丢弃。
#[derive(Debug, Clone)]
pub struct Record {
    pub level: Level,
    pub args: String,
    pub module_path: Option<&'static str>,
    pub file: Option<&'static str>,
    pub line: Option<u32>,
}

impl Record {
    pub fn new(level: Level, args: impl Into<String>) -> Self {
        Self {
            level,
            args: args.into(),
            module_path: None,
            file: None,
            line: None,
        }
    }

    /// 附加调用位置
    pub fn with_location(
        mut self,
        module_path: Option<&'static str>,
        file: &'static str,
        line: u32,
    ) -> Self {
        self.module_path = module_path;
        self.file = Some(file);
        self.line = Some(line);
        self
    }

    /// 从 `#[track_caller]` 位置构建
    pub fn at_caller(
        level: Level,
        args: impl Into<String>,
        location: &'static std::panic::Location<'static>,
    ) -> Self {
        Self::new(level, args).with_location(None, location.file(), location.line())
    }
}

const DEFAULT_MAX_FILE_SIZE: u64 = 1 << 25;
const DEFAULT_MAX_BACKUPS: usize = 500;
const DEFAULT_COMPRESSION_LEVEL: u32 = 8;

/// 文件日志配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub log_dir: PathBuf,
    pub basename: String,
    pub level: Level,
    /// 活动文件写满多少字节后轮转
    pub max_file_size: u64,
    /// 最多保留的归档数量
    pub max_backups: usize,
    /// 不输出调用位置前缀
    pub no_prefix: bool,
    /// 同时输出到标准输出
    pub log_to_stdout: bool,
    /// gzip 压缩等级 (0-9)
    pub compression_level: u32,
    /// 启动时清空已有的活动文件
    ///
    /// 默认为 false：已有的活动文件会被追加写入，字节计数从文件当前长度开始，
    /// 重启不会丢掉上次运行尚未轮转的内容。设为 true 时按 `O_TRUNC` 打开，
    /// 启动即清空活动文件，字节计数从 0 开始。
    pub truncate_on_start: bool,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("."),
            basename: "app".to_string(),
            level: Level::Info,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_backups: DEFAULT_MAX_BACKUPS,
            no_prefix: false,
            log_to_stdout: false,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            truncate_on_start: false,
        }
    }
}

impl FileConfig {
    pub fn new(log_dir: impl Into<PathBuf>, basename: impl Into<String>) -> Self {
        Self {
            log_dir: log_dir.into(),
            basename: basename.into(),
            ..Default::default()
        }
    }

    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }

    pub fn with_basename(mut self, basename: impl Into<String>) -> Self {
        self.basename = basename.into();
        self
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    pub fn with_max_backups(mut self, max_backups: usize) -> Self {
        self.max_backups = max_backups;
        self
    }

    pub fn with_no_prefix(mut self, no_prefix: bool) -> Self {
        self.no_prefix = no_prefix;
        self
    }

    pub fn with_log_to_stdout(mut self, enabled: bool) -> Self {
        self.log_to_stdout = enabled;
        self
    }

    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level;
        self
    }

    /// 启动时是否清空活动文件，默认追加，见 [`FileConfig::truncate_on_start`]
    pub fn with_truncate_on_start(mut self, enabled: bool) -> Self {
        self.truncate_on_start = enabled;
        self
    }

    /// 活动文件名，没有 `.log` 后缀时自动补上
    pub fn active_file_name(&self) -> String {
        if self.basename.ends_with(".log") {
            self.basename.clone()
        } else {
            format!("{}.log", self.basename)
        }
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        if self.basename.is_empty() {
            return Err(LogError::Config("basename 不能为空".to_string()));
        }
        if self.basename.contains('/') || self.basename.contains(std::path::MAIN_SEPARATOR) {
            return Err(LogError::Config(format!(
                "basename 不能包含路径分隔符: {:?}",
                self.basename
            )));
        }
        if self.max_file_size == 0 {
            return Err(LogError::Config("max_file_size 不能为 0".to_string()));
        }
        if self.max_backups == 0 {
            return Err(LogError::Config("max_backups 不能为 0".to_string()));
        }
        if self.compression_level > 9 {
            return Err(LogError::Config(format!(
                "压缩等级 {} 超出范围 (0-9)",
                self.compression_level
            )));
        }
        Ok(())
    }

    /// 从环境变量加载配置，未设置的项使用默认值
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(dir) = lookup("RAT_LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }
        if let Some(basename) = lookup("RAT_LOG_BASENAME") {
            config.basename = basename;
        }
        if let Some(level) = lookup("RAT_LOG_LEVEL") {
            config.level = parse_level_or_default(&level);
        }
        if let Some(v) = lookup("RAT_LOG_MAX_SIZE") {
            config.max_file_size = parse_env("RAT_LOG_MAX_SIZE", &v)?;
        }
        if let Some(v) = lookup("RAT_LOG_MAX_BACKUPS") {
            config.max_backups = parse_env("RAT_LOG_MAX_BACKUPS", &v)?;
        }
        if let Some(v) = lookup("RAT_LOG_NO_PREFIX") {
            config.no_prefix = parse_bool("RAT_LOG_NO_PREFIX", &v)?;
        }
        if let Some(v) = lookup("RAT_LOG_STDOUT") {
            config.log_to_stdout = parse_bool("RAT_LOG_STDOUT", &v)?;
        }
        if let Some(v) = lookup("RAT_LOG_COMPRESSION") {
            config.compression_level = parse_env("RAT_LOG_COMPRESSION", &v)?;
        }
        Ok(config)
    }
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| LogError::Config(format!("{} 的值无效: {:?}", key, value)))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(LogError::Config(format!("{} 的值无效: {:?}", key, value))),
    }
}
