//! 归档工作线程
//!
//! 每个写入器独占一个后台线程，按入队顺序串行执行压缩和清理任务，
//! 保证同一写入器的压缩与清理不会并发。

use std::thread;

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use parking_lot::Mutex;

use crate::error::{LogError, Result};

/// 归档命令
#[derive(Debug, Clone)]
pub enum ArchiveCommand {
    /// 压缩指定序号的归档
    Compress(u64),
    /// 执行保留策略清理
    Evict(u64),
    /// 之前入队的任务全部完成后应答
    Sync(Sender<()>),
    /// 处理完已入队的任务后退出
    Shutdown,
}

/// 归档处理器 trait - 工作线程把命令分发到这里
pub trait ArchiveProcessor: Send + 'static {
    /// 处理器名称
    fn name(&self) -> &'static str;

    /// 压缩归档
    fn handle_compress(&mut self, seq: u64) -> Result<()>;

    /// 清理超出保留上限的归档
    fn handle_evict(&mut self, seq: u64) -> Result<()>;

    /// 退出前清理资源
    fn cleanup(&mut self) -> Result<()> {
        Ok(())
    }
}

/// 归档工作线程句柄
pub struct ArchiveWorker {
    sender: Sender<ArchiveCommand>,
    worker_thread: Mutex<Option<thread::JoinHandle<()>>>,
}

impl ArchiveWorker {
    /// 启动工作线程
    pub fn new<P>(processor: P) -> Result<Self>
    where
        P: ArchiveProcessor,
    {
        let (sender, receiver) = unbounded();
        let name = processor.name();

        let worker_thread = thread::Builder::new()
            .name(format!("rat-archive-{}", name))
            .spawn(move || Self::worker_thread(processor, receiver))
            .map_err(|source| LogError::Spawn { name, source })?;

        Ok(Self {
            sender,
            worker_thread: Mutex::new(Some(worker_thread)),
        })
    }

    fn worker_thread<P>(mut processor: P, receiver: Receiver<ArchiveCommand>)
    where
        P: ArchiveProcessor,
    {
        let name = processor.name();
        while let Ok(command) = receiver.recv() {
            match command {
                ArchiveCommand::Compress(seq) => {
                    if let Err(e) = processor.handle_compress(seq) {
                        eprintln!("[{}] 压缩归档 {} 失败: {}", name, seq, e);
                    }
                }
                ArchiveCommand::Evict(seq) => {
                    if let Err(e) = processor.handle_evict(seq) {
                        eprintln!("[{}] 清理归档失败 (序号 {}): {}", name, seq, e);
                    }
                }
                ArchiveCommand::Sync(ack) => {
                    let _ = ack.send(());
                }
                ArchiveCommand::Shutdown => break,
            }
        }

        if let Err(e) = processor.cleanup() {
            eprintln!("[{}] 处理器清理失败: {}", name, e);
        }
    }

    fn send(&self, command: ArchiveCommand) -> Result<()> {
        self.sender.send(command).map_err(|_| LogError::WorkerGone)
    }

    /// 发送压缩命令
    pub fn send_compress(&self, seq: u64) -> Result<()> {
        self.send(ArchiveCommand::Compress(seq))
    }

    /// 发送清理命令
    pub fn send_evict(&self, seq: u64) -> Result<()> {
        self.send(ArchiveCommand::Evict(seq))
    }

    /// 等待已入队的任务全部完成
    ///
    /// 不能在持有写入器锁时调用，清理任务需要获取该锁。
    pub fn sync(&self) -> Result<()> {
        let (ack_tx, ack_rx) = bounded(1);
        self.send(ArchiveCommand::Sync(ack_tx))?;
        ack_rx.recv().map_err(|_| LogError::WorkerGone)
    }

    /// 处理完剩余任务后停止工作线程，可重复调用
    pub fn shutdown(&self) {
        let handle = self.worker_thread.lock().take();
        if let Some(handle) = handle {
            let _ = self.sender.send(ArchiveCommand::Shutdown);
            if handle.join().is_err() {
                eprintln!("[archive] 归档线程异常退出");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker_thread.lock().is_some()
    }
}

impl Drop for ArchiveWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Debug, PartialEq, Eq)]
    enum Seen {
        Compress(u64),
        Evict(u64),
        Cleanup,
    }

    struct TestProcessor {
        seen: Arc<Mutex<Vec<Seen>>>,
        fail_compress: bool,
    }

    impl ArchiveProcessor for TestProcessor {
        fn name(&self) -> &'static str {
            "test"
        }

        fn handle_compress(&mut self, seq: u64) -> Result<()> {
            self.seen.lock().push(Seen::Compress(seq));
            if self.fail_compress {
                return Err(LogError::Config("模拟失败".to_string()));
            }
            Ok(())
        }

        fn handle_evict(&mut self, seq: u64) -> Result<()> {
            self.seen.lock().push(Seen::Evict(seq));
            Ok(())
        }

        fn cleanup(&mut self) -> Result<()> {
            self.seen.lock().push(Seen::Cleanup);
            Ok(())
        }
    }

    #[test]
    fn test_jobs_run_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let worker = ArchiveWorker::new(TestProcessor {
            seen: seen.clone(),
            fail_compress: false,
        })
        .unwrap();

        worker.send_compress(1).unwrap();
        worker.send_compress(2).unwrap();
        worker.send_evict(2).unwrap();
        worker.sync().unwrap();

        assert_eq!(
            *seen.lock(),
            vec![Seen::Compress(1), Seen::Compress(2), Seen::Evict(2)]
        );
    }

    #[test]
    fn test_failure_does_not_stop_worker() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let worker = ArchiveWorker::new(TestProcessor {
            seen: seen.clone(),
            fail_compress: true,
        })
        .unwrap();

        worker.send_compress(1).unwrap();
        worker.send_evict(1).unwrap();
        worker.sync().unwrap();

        assert_eq!(*seen.lock(), vec![Seen::Compress(1), Seen::Evict(1)]);
    }

    #[test]
    fn test_shutdown_drains_pending_jobs() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let worker = ArchiveWorker::new(TestProcessor {
            seen: seen.clone(),
            fail_compress: false,
        })
        .unwrap();

        worker.send_compress(7).unwrap();
        worker.shutdown();
        assert!(!worker.is_running());
        worker.shutdown();

        assert_eq!(*seen.lock(), vec![Seen::Compress(7), Seen::Cleanup]);
        assert!(matches!(worker.send_compress(8), Err(LogError::WorkerGone)));
    }
}
