//! 日志处理器模块

pub mod archive;
pub mod file;

pub use archive::GzipArchiver;
pub use file::FileWriter;
