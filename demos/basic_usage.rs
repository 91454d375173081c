//! 基本用法示例

use rat_filelog::{FileConfig, Level, LoggerBuilder};
use rat_filelog::{debug, error, info, warn};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = FileConfig::new("./logs/basic", "basic")
        .with_level(Level::Debug)
        .with_log_to_stdout(true);

    let logger = LoggerBuilder::new().with_config(config).init()?;

    info!("服务启动，pid = {}", std::process::id());
    debug!("调试信息");
    warn!("磁盘空间剩余 {}%", 12);
    error!("连接 {} 失败", "db-1");

    logger.log_fields(Level::Info, &[&"users", &3, &"online"]);
    let sum = logger.log_time(Level::Debug, "sum", || (1..=1000u64).sum::<u64>());
    info!(logger: &logger, "sum = {}", sum);

    logger.close();
    Ok(())
}
