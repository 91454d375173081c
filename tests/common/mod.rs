//! 集成测试公共工具

#![allow(dead_code)]

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use rat_filelog::{FileConfig, FileWriter, Level, LineFormatter, Record};

/// 只输出消息内容的格式化函数，便于精确控制每行字节数
pub fn message_only() -> LineFormatter {
    Box::new(|buf: &mut dyn Write, record: &Record| writeln!(buf, "{}", record.args))
}

pub fn writer(dir: &Path, basename: &str, max_file_size: u64, max_backups: usize) -> FileWriter {
    let config = FileConfig::new(dir, basename)
        .with_level(Level::Trace)
        .with_max_file_size(max_file_size)
        .with_max_backups(max_backups);
    FileWriter::with_formatter(config, message_only()).unwrap()
}

/// 目录下的文件名，已排序
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    names
}

/// 读取归档内容，压缩与否都可以
pub fn read_archive(path: &Path) -> String {
    let mut content = String::new();
    if path.extension().is_some_and(|ext| ext == "gz") {
        GzDecoder::new(File::open(path).unwrap())
            .read_to_string(&mut content)
            .unwrap();
    } else {
        File::open(path).unwrap().read_to_string(&mut content).unwrap();
    }
    content
}

/// 按轮转顺序读出全部内容：归档 1..N，然后是活动文件
pub fn read_all_in_order(writer: &FileWriter) -> String {
    let namer = writer.namer();
    let mut entries = namer.scan().unwrap();
    entries.sort_by_key(|e| e.seq);
    let mut content = String::new();
    for entry in &entries {
        content.push_str(&read_archive(&namer.entry_path(entry)));
    }
    content.push_str(&fs::read_to_string(namer.active_path()).unwrap());
    content
}
