//! 文件日志写入器
//!
//! 持有活动文件句柄、字节计数和归档序号，三者由同一把锁保护。
//! 写满 `max_file_size` 后在锁内同步完成轮转，压缩和清理交给归档线程。

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicI8, Ordering};

use parking_lot::Mutex;

use crate::config::{FileConfig, Level, Record};
use crate::error::{LogError, Result};
use crate::fmt_impl::{LineFormatter, default_formatter};
use crate::handler::archive::GzipArchiver;
use crate::naming::ArchiveNamer;
use crate::policy::RotationPolicy;
use crate::producer_consumer::ArchiveWorker;

/// 写入器的可变状态
pub(crate) struct WriterState {
    /// 启动失败或轮转后重新打开失败时为 None，此时输出到标准输出
    pub(crate) file: Option<File>,
    /// 自文件打开或上次清零以来写入的字节数
    pub(crate) byte_count: u64,
    /// 最近一次轮转使用的归档序号
    pub(crate) archive_seq: u64,
}

pub(crate) type SharedState = Arc<Mutex<WriterState>>;

/// 文件日志写入器
pub struct FileWriter {
    config: FileConfig,
    namer: ArchiveNamer,
    policy: RotationPolicy,
    level: AtomicI8,
    formatter: LineFormatter,
    state: SharedState,
    worker: ArchiveWorker,
}

impl FileWriter {
    /// 打开写入器并启动归档线程
    ///
    /// 无法创建活动文件时返回错误。
    pub fn open(config: FileConfig) -> Result<Self> {
        let formatter = default_formatter(!config.no_prefix);
        Self::with_formatter(config, formatter)
    }

    /// 使用自定义格式化函数打开写入器
    pub fn with_formatter(config: FileConfig, formatter: LineFormatter) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.log_dir)
            .map_err(|e| LogError::io("创建日志目录", &config.log_dir, e))?;

        let namer = ArchiveNamer::from_config(&config);
        let policy = RotationPolicy::from_config(&config);
        let active = namer.active_path();

        let file = open_active(&active, config.truncate_on_start)
            .map_err(|e| LogError::io("打开日志文件", &active, e))?;
        let byte_count = file
            .metadata()
            .map_err(|e| LogError::io("读取日志文件信息", &active, e))?
            .len();
        let existing = namer
            .scan()
            .map_err(|e| LogError::io("扫描日志目录", namer.dir(), e))?;
        let archive_seq = existing.iter().map(|e| e.seq).max().unwrap_or(0);

        let state = Arc::new(Mutex::new(WriterState {
            file: Some(file),
            byte_count,
            archive_seq,
        }));
        let archiver = GzipArchiver::new(
            namer.clone(),
            policy,
            config.compression_level,
            state.clone(),
        );
        let worker = ArchiveWorker::new(archiver)?;
        // 上次运行留下的未压缩归档
        for entry in existing.iter().filter(|e| !e.compressed) {
            worker.send_compress(entry.seq)?;
        }

        Ok(Self {
            level: AtomicI8::new(config.level.as_i8()),
            config,
            namer,
            policy,
            formatter,
            state,
            worker,
        })
    }

    pub fn config(&self) -> &FileConfig {
        &self.config
    }

    pub fn namer(&self) -> &ArchiveNamer {
        &self.namer
    }

    /// 当前级别阈值
    pub fn level(&self) -> Level {
        Level::from_i8(self.level.load(Ordering::Relaxed)).unwrap_or(Level::Info)
    }

    pub fn set_level(&self, level: Level) {
        self.level.store(level.as_i8(), Ordering::Relaxed);
    }

    /// 不加锁的级别过滤
    pub fn should_log(&self, level: Level) -> bool {
        level.as_i8() <= self.level.load(Ordering::Relaxed)
    }

    /// 追加一条记录
    pub fn append(&self, record: &Record) {
        if !self.should_log(record.level) {
            return;
        }
        let mut line = Vec::with_capacity(128);
        if let Err(e) = (self.formatter)(&mut line, record) {
            eprintln!("[file] 格式化日志失败: {}", e);
            return;
        }
        self.write_line(&line);
    }

    fn write_line(&self, line: &[u8]) {
        let mut state = self.state.lock();
        let Some(file) = state.file.as_mut() else {
            let _ = io::stdout().lock().write_all(line);
            return;
        };

        if let Err(first) = file.write_all(line) {
            if let Err(second) = file.write_all(line) {
                eprintln!("[file] 写入日志失败，重试后仍失败: {} / {}", first, second);
                std::process::abort();
            }
        }
        if self.config.log_to_stdout {
            let _ = io::stdout().lock().write_all(line);
        }

        state.byte_count += line.len() as u64;
        if self.policy.should_rotate(state.byte_count) {
            self.rotate(&mut state);
        }
    }

    /// 轮转，只能在持有锁时调用
    fn rotate(&self, state: &mut WriterState) {
        let next = state.archive_seq + 1;
        let active = self.namer.active_path();
        let archive = self.namer.archive_path(next);

        if let Some(file) = state.file.take() {
            let _ = file.sync_data();
        }

        match fs::rename(&active, &archive) {
            Ok(()) => {
                state.file = reopen(&active);
                state.byte_count = 0;
                state.archive_seq = next;

                // 序号交给归档线程后，写入器不再触碰该文件
                if let Err(e) = self.worker.send_compress(next) {
                    eprintln!("[file] 压缩任务入队失败: {}", e);
                }
                if self.policy.needs_eviction(next) {
                    if let Err(e) = self.worker.send_evict(next) {
                        eprintln!("[file] 清理任务入队失败: {}", e);
                    }
                }
            }
            Err(e) => {
                // 宁可丢掉旧内容也不能停止记录
                eprintln!("[file] 日志轮转到 {:?} 失败，清空当前文件继续写入: {}", archive, e);
                state.file = reopen(&active);
                state.byte_count = 0;
            }
        }
    }

    /// 刷新活动文件到磁盘
    pub fn flush(&self) {
        let mut state = self.state.lock();
        if let Some(file) = state.file.as_mut() {
            if let Err(e) = file.flush().and_then(|_| file.sync_data()) {
                eprintln!("[file] 刷新日志文件失败: {}", e);
            }
        }
    }

    /// 等待归档线程处理完已入队的压缩与清理任务
    pub fn sync_archives(&self) -> Result<()> {
        self.worker.sync()
    }

    /// 刷新文件并停止归档线程，剩余任务会先执行完
    pub fn close(&self) {
        self.flush();
        self.worker.shutdown();
    }

    /// 活动文件已写入的字节数
    pub fn byte_count(&self) -> u64 {
        self.state.lock().byte_count
    }

    /// 当前归档序号
    pub fn archive_seq(&self) -> u64 {
        self.state.lock().archive_seq
    }
}

impl Drop for FileWriter {
    fn drop(&mut self) {
        self.close();
    }
}

fn open_active(path: &Path, truncate: bool) -> io::Result<File> {
    if truncate {
        File::create(path)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn reopen(path: &Path) -> Option<File> {
    match open_active(path, true) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("[file] 重新打开日志文件 {:?} 失败，改为输出到标准输出: {}", path, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &Path) -> FileConfig {
        FileConfig::new(dir, "unit")
            .with_no_prefix(true)
            .with_level(Level::Debug)
    }

    #[test]
    fn test_byte_count_tracks_writes() {
        let dir = tempfile::tempdir().unwrap();
        let writer = FileWriter::open(config(dir.path())).unwrap();

        writer.append(&Record::new(Level::Info, "first"));
        writer.append(&Record::new(Level::Info, "second"));

        let on_disk = fs::metadata(dir.path().join("unit.log")).unwrap().len();
        assert_eq!(writer.byte_count(), on_disk);
        assert_eq!(writer.archive_seq(), 0);
    }

    #[test]
    fn test_level_filter_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let writer = FileWriter::open(config(dir.path())).unwrap();

        writer.append(&Record::new(Level::Trace, "too verbose"));
        assert_eq!(writer.byte_count(), 0);
        assert_eq!(fs::metadata(dir.path().join("unit.log")).unwrap().len(), 0);

        writer.set_level(Level::Trace);
        assert!(writer.should_log(Level::Trace));
        writer.append(&Record::new(Level::Trace, "now visible"));
        assert!(writer.byte_count() > 0);
    }

    #[test]
    fn test_reopen_appends_to_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("unit.log"), b"previous run\n").unwrap();
        fs::write(dir.path().join("unit.log.4.gz"), b"").unwrap();

        let writer = FileWriter::open(config(dir.path())).unwrap();
        assert_eq!(writer.byte_count(), 13);
        assert_eq!(writer.archive_seq(), 4);
    }

    #[test]
    fn test_truncate_on_start() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("unit.log"), b"previous run\n").unwrap();

        let writer = FileWriter::open(config(dir.path()).with_truncate_on_start(true)).unwrap();
        assert_eq!(writer.byte_count(), 0);
    }

    #[test]
    fn test_custom_formatter() {
        let dir = tempfile::tempdir().unwrap();
        let formatter: LineFormatter = Box::new(|buf: &mut dyn Write, record: &Record| {
            writeln!(buf, "{}|{}", record.level, record.args)
        });
        let writer = FileWriter::with_formatter(config(dir.path()), formatter).unwrap();

        writer.append(&Record::new(Level::Error, "boom"));
        writer.flush();

        let content = fs::read_to_string(dir.path().join("unit.log")).unwrap();
        assert_eq!(content, "ERROR|boom\n");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = FileWriter::open(config(dir.path()).with_max_backups(0));
        assert!(matches!(result, Err(LogError::Config(_))));
    }
}
