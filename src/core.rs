//! 日志核心模块 - 按级别记录日志的入口

use std::fmt::{self, Display};
use std::panic::Location;
use std::sync::Arc;
use std::time::Instant;

use once_cell::sync::OnceCell;

use crate::config::{FileConfig, Level, Record};
use crate::error::{LogError, Result};
use crate::fmt_impl::{LineFormatter, join_values};
use crate::handler::file::FileWriter;

/// 默认日志器，进程启动时初始化一次
static DEFAULT_LOGGER: OnceCell<Arc<LoggerCore>> = OnceCell::new();

/// 日志器 trait - 极简接口
pub trait Logger: Send + Sync {
    fn log(&self, record: &Record);
    fn flush(&self);
    fn set_level(&self, level: Level);
    fn level(&self) -> Level;
}

/// 日志核心实现
#[derive(Clone)]
pub struct LoggerCore {
    writer: Arc<FileWriter>,
}

impl LoggerCore {
    pub fn new(writer: FileWriter) -> Self {
        Self {
            writer: Arc::new(writer),
        }
    }

    /// 底层写入器
    pub fn writer(&self) -> &FileWriter {
        &self.writer
    }

    /// 检查是否应该记录该级别的日志
    pub fn should_log(&self, level: Level) -> bool {
        self.writer.should_log(level)
    }

    /// 记录已构建好的日志
    pub fn log_record(&self, record: &Record) {
        self.writer.append(record);
    }

    #[track_caller]
    pub fn log_at(&self, level: Level, args: fmt::Arguments<'_>) {
        if !self.should_log(level) {
            return;
        }
        self.writer
            .append(&Record::at_caller(level, args.to_string(), Location::caller()));
    }

    #[track_caller]
    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log_at(Level::Error, args);
    }

    #[track_caller]
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log_at(Level::Warn, args);
    }

    #[track_caller]
    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log_at(Level::Info, args);
    }

    #[track_caller]
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log_at(Level::Debug, args);
    }

    #[track_caller]
    pub fn trace(&self, args: fmt::Arguments<'_>) {
        self.log_at(Level::Trace, args);
    }

    /// 多个值以空格连接后记录
    #[track_caller]
    pub fn log_fields(&self, level: Level, values: &[&dyn Display]) {
        if !self.should_log(level) {
            return;
        }
        self.writer
            .append(&Record::at_caller(level, join_values(values), Location::caller()));
    }

    /// 只有级别通过时才构造消息
    #[track_caller]
    pub fn log_with<F>(&self, level: Level, build: F)
    where
        F: FnOnce() -> String,
    {
        if !self.should_log(level) {
            return;
        }
        self.writer
            .append(&Record::at_caller(level, build(), Location::caller()));
    }

    /// 执行 `f` 并记录耗时
    #[track_caller]
    pub fn log_time<R, F>(&self, level: Level, name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.should_log(level) {
            return f();
        }
        let start = Instant::now();
        let result = f();
        let message = format!("time-log {} time: {:?}", name, start.elapsed());
        self.writer
            .append(&Record::at_caller(level, message, Location::caller()));
        result
    }

    /// 以 Error 级别逐行记录当前调用栈
    #[track_caller]
    pub fn stack_trace(&self) {
        if !self.should_log(Level::Error) {
            return;
        }
        let location = Location::caller();
        let backtrace = std::backtrace::Backtrace::force_capture().to_string();
        for line in backtrace.lines() {
            self.writer.append(&Record::at_caller(
                Level::Error,
                format!("Stack trace: {}", line),
                location,
            ));
        }
    }

    /// 记录 Fatal 日志，刷盘后以状态码 1 退出进程
    #[track_caller]
    pub fn fatal(&self, args: fmt::Arguments<'_>) -> ! {
        let record = Record::at_caller(Level::Fatal, args.to_string(), Location::caller());
        self.fatal_record(&record)
    }

    pub fn fatal_record(&self, record: &Record) -> ! {
        self.writer.append(record);
        self.writer.flush();
        std::process::exit(1)
    }

    /// 不写文件，直接以格式化后的消息 panic
    pub fn panic(&self, args: fmt::Arguments<'_>) -> ! {
        panic!("{}", args)
    }

    /// 等待后台归档任务完成
    pub fn sync_archives(&self) -> Result<()> {
        self.writer.sync_archives()
    }

    /// 刷新并停止后台归档线程
    pub fn close(&self) {
        self.writer.close();
    }
}

impl Logger for LoggerCore {
    fn log(&self, record: &Record) {
        self.writer.append(record);
    }

    fn flush(&self) {
        self.writer.flush();
    }

    fn set_level(&self, level: Level) {
        self.writer.set_level(level);
    }

    fn level(&self) -> Level {
        self.writer.level()
    }
}

/// 日志构建器
pub struct LoggerBuilder {
    config: FileConfig,
    formatter: Option<LineFormatter>,
}

impl LoggerBuilder {
    /// 创建新的日志构建器
    pub fn new() -> Self {
        Self {
            config: FileConfig::default(),
            formatter: None,
        }
    }

    /// 从环境变量读取配置
    pub fn from_env() -> Result<Self> {
        Ok(Self::new().with_config(FileConfig::from_env()?))
    }

    pub fn with_config(mut self, config: FileConfig) -> Self {
        self.config = config;
        self
    }

    /// 设置日志级别
    pub fn with_level(mut self, level: Level) -> Self {
        self.config.level = level;
        self
    }

    /// 设置自定义格式化函数
    pub fn with_formatter(mut self, formatter: LineFormatter) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// 构建日志器
    pub fn build(self) -> Result<LoggerCore> {
        let writer = match self.formatter {
            Some(formatter) => FileWriter::with_formatter(self.config, formatter)?,
            None => FileWriter::open(self.config)?,
        };
        Ok(LoggerCore::new(writer))
    }

    /// 构建日志器，失败时直接退出进程
    pub fn build_or_exit(self) -> LoggerCore {
        match self.build() {
            Ok(logger) => logger,
            Err(e) => {
                eprintln!("[core] 无法创建日志器: {}", e);
                std::process::exit(1)
            }
        }
    }

    /// 构建并注册为默认日志器
    pub fn init(self) -> Result<Arc<LoggerCore>> {
        let logger = Arc::new(self.build()?);
        set_default_logger(logger.clone())?;
        Ok(logger)
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 注册默认日志器，只能设置一次
pub fn set_default_logger(logger: Arc<LoggerCore>) -> Result<()> {
    DEFAULT_LOGGER
        .set(logger)
        .map_err(|_| LogError::AlreadyInitialized)
}

/// 获取默认日志器
pub fn default_logger() -> Option<&'static Arc<LoggerCore>> {
    DEFAULT_LOGGER.get()
}
