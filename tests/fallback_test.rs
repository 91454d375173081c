//! 降级路径测试：轮转失败、启动失败、级别过滤

mod common;

use std::fs;

use common::{file_names, writer};
use rat_filelog::{FileConfig, FileWriter, Level, LogError, Record};

#[test]
fn test_rename_failure_truncates_in_place() {
    let dir = tempfile::tempdir().unwrap();
    // 让归档目标是一个非空目录，重命名必然失败
    let blocker = dir.path().join("fb.log.1");
    fs::create_dir(&blocker).unwrap();
    fs::write(blocker.join("keep"), b"x").unwrap();

    let writer = writer(dir.path(), "fb", 20, 3);
    writer.append(&Record::new(Level::Info, "aaaaaaaaa"));
    writer.append(&Record::new(Level::Info, "bbbbbbbbb"));

    let active = dir.path().join("fb.log");
    assert!(active.exists());
    assert_eq!(fs::metadata(&active).unwrap().len(), 0);
    assert_eq!(writer.byte_count(), 0);
    assert_eq!(writer.archive_seq(), 0);

    writer.append(&Record::new(Level::Info, "ccccccccc"));
    writer.flush();
    assert_eq!(fs::read_to_string(&active).unwrap(), "ccccccccc\n");
    assert_eq!(writer.byte_count(), 10);
    assert!(blocker.join("keep").exists());
}

#[test]
fn test_startup_failure_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let not_a_dir = dir.path().join("plain-file");
    fs::write(&not_a_dir, b"").unwrap();

    let result = FileWriter::open(FileConfig::new(&not_a_dir, "app"));
    assert!(matches!(result, Err(LogError::Io { .. })));
}

#[test]
fn test_filtered_levels_write_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = FileConfig::new(dir.path(), "quiet")
        .with_level(Level::Warn)
        .with_max_file_size(1);
    let writer = FileWriter::open(config).unwrap();

    writer.append(&Record::new(Level::Info, "info"));
    writer.append(&Record::new(Level::Debug, "debug"));
    writer.append(&Record::new(Level::Trace, "trace"));
    writer.sync_archives().unwrap();

    assert_eq!(file_names(dir.path()), vec!["quiet.log"]);
    assert_eq!(fs::metadata(dir.path().join("quiet.log")).unwrap().len(), 0);
    assert_eq!(writer.byte_count(), 0);
}

#[test]
fn test_writes_after_close_still_land_in_file() {
    let dir = tempfile::tempdir().unwrap();
    let writer = writer(dir.path(), "closed", 1024, 3);

    writer.append(&Record::new(Level::Info, "before"));
    writer.close();
    writer.append(&Record::new(Level::Info, "after"));
    writer.flush();

    assert_eq!(
        fs::read_to_string(dir.path().join("closed.log")).unwrap(),
        "before\nafter\n"
    );
    assert!(matches!(writer.sync_archives(), Err(LogError::WorkerGone)));
}
