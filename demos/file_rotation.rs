//! 文件轮转示例

use rat_filelog::{FileConfig, Level, LoggerBuilder, info, warn};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = FileConfig::from_env()?
        .with_dir("./logs/rotation")
        .with_basename("rotation")
        .with_level(Level::Info)
        .with_max_file_size(1024) // 1KB - 很小以测试轮转
        .with_max_backups(5);

    let logger = LoggerBuilder::new().with_config(config).build()?;

    println!("开始测试文件轮转...");
    for i in 0..200 {
        info!(logger: &logger, "这是第 {} 条日志，用于测试文件轮转功能", i);
        if i % 10 == 0 {
            warn!(logger: &logger, "警告日志 {}", i);
        }
    }

    logger.sync_archives()?;
    println!("当前归档序号: {}", logger.writer().archive_seq());
    println!("日志生成完成，请检查 ./logs/rotation 目录");
    Ok(())
}
