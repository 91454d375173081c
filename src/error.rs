//! 错误类型

use std::io;
use std::path::PathBuf;

/// 日志库错误
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// 文件系统操作失败
    #[error("{op} {path:?} 失败: {source}")]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// 无法启动归档工作线程
    #[error("启动归档线程 {name} 失败: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: io::Error,
    },

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 默认日志器已经初始化
    #[error("默认日志器已经初始化")]
    AlreadyInitialized,

    /// 归档工作线程已退出
    #[error("归档工作线程已退出")]
    WorkerGone,
}

impl LogError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        LogError::Io {
            op,
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, LogError>;
