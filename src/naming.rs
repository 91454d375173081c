//! 归档文件命名
//!
//! 活动文件为 `<basename>.log`，轮转后的归档为 `<basename>.log.<N>`，
//! 压缩完成后为 `<basename>.log.<N>.gz`。N 从 1 开始，十进制，无前导零。

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::FileConfig;

const GZ_SUFFIX: &str = ".gz";

/// 归档序号上限，超过的文件不属于本写入器的编号空间
pub const MAX_ARCHIVE_SEQ: u64 = u32::MAX as u64;

/// 目录中已存在的一个归档文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub seq: u64,
    pub compressed: bool,
    pub file_name: String,
}

/// 归档命名器
#[derive(Debug, Clone)]
pub struct ArchiveNamer {
    dir: PathBuf,
    active_name: String,
}

impl ArchiveNamer {
    pub fn new(dir: impl Into<PathBuf>, active_name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            active_name: active_name.into(),
        }
    }

    pub fn from_config(config: &FileConfig) -> Self {
        Self::new(config.log_dir.clone(), config.active_file_name())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn active_path(&self) -> PathBuf {
        self.dir.join(&self.active_name)
    }

    pub fn archive_name(&self, seq: u64, compressed: bool) -> String {
        if compressed {
            format!("{}.{}{}", self.active_name, seq, GZ_SUFFIX)
        } else {
            format!("{}.{}", self.active_name, seq)
        }
    }

    /// 未压缩归档路径
    pub fn archive_path(&self, seq: u64) -> PathBuf {
        self.dir.join(self.archive_name(seq, false))
    }

    /// 压缩归档路径
    pub fn gz_path(&self, seq: u64) -> PathBuf {
        self.dir.join(self.archive_name(seq, true))
    }

    pub fn entry_path(&self, entry: &ArchiveEntry) -> PathBuf {
        self.dir.join(&entry.file_name)
    }

    /// 解析文件名，不属于本 basename 的归档返回 None
    pub fn parse(&self, file_name: &str) -> Option<ArchiveEntry> {
        let rest = file_name
            .strip_prefix(self.active_name.as_str())?
            .strip_prefix('.')?;
        let (digits, compressed) = match rest.strip_suffix(GZ_SUFFIX) {
            Some(digits) => (digits, true),
            None => (rest, false),
        };
        if digits.is_empty()
            || digits.starts_with('0')
            || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }
        let seq: u64 = digits.parse().ok()?;
        if seq > MAX_ARCHIVE_SEQ {
            return None;
        }
        Some(ArchiveEntry {
            seq,
            compressed,
            file_name: file_name.to_string(),
        })
    }

    /// 列出目录下所有归档，按序号升序
    pub fn scan(&self) -> io::Result<Vec<ArchiveEntry>> {
        let mut entries = Vec::new();
        for dirent in fs::read_dir(&self.dir)? {
            let dirent = dirent?;
            if !dirent.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = dirent.file_name().to_str() {
                if let Some(entry) = self.parse(name) {
                    entries.push(entry);
                }
            }
        }
        entries.sort_by(|a, b| a.seq.cmp(&b.seq).then(a.compressed.cmp(&b.compressed)));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn namer() -> ArchiveNamer {
        ArchiveNamer::new("/var/log/svc", "app.log")
    }

    #[test]
    fn test_names() {
        let n = namer();
        assert_eq!(n.archive_name(3, false), "app.log.3");
        assert_eq!(n.archive_name(3, true), "app.log.3.gz");
        assert_eq!(n.active_path(), PathBuf::from("/var/log/svc/app.log"));
        assert_eq!(n.gz_path(12), PathBuf::from("/var/log/svc/app.log.12.gz"));
    }

    #[test]
    fn test_parse() {
        let n = namer();
        assert_eq!(n.parse("app.log.7").map(|e| (e.seq, e.compressed)), Some((7, false)));
        assert_eq!(n.parse("app.log.42.gz").map(|e| (e.seq, e.compressed)), Some((42, true)));
        assert!(n.parse("app.log").is_none());
        assert!(n.parse("app.log.").is_none());
        assert!(n.parse("app.log.0").is_none());
        assert!(n.parse("app.log.07").is_none());
        assert!(n.parse("app.log.3.gz.tmp").is_none());
        assert!(n.parse("app.log.x.gz").is_none());
        assert!(n.parse("other.log.3").is_none());
        assert!(n.parse("app.logger.3").is_none());
        assert_eq!(n.parse("app.log.4294967295").map(|e| e.seq), Some(MAX_ARCHIVE_SEQ));
        assert!(n.parse("app.log.4294967296").is_none());
        assert!(n.parse("app.log.18446744073709551615.gz").is_none());
        assert!(n.parse("app.log.99999999999999999999").is_none());
    }

    #[test]
    fn test_scan() {
        let dir = tempfile::tempdir().unwrap();
        let n = ArchiveNamer::new(dir.path(), "app.log");
        assert!(n.scan().unwrap().is_empty());

        let names = [
            "app.log",
            "app.log.1.gz",
            "app.log.2.gz",
            "app.log.5",
            "other.log.9",
            "app.log.bak",
        ];
        for name in names {
            File::create(dir.path().join(name)).unwrap();
        }
        fs::create_dir(dir.path().join("app.log.8")).unwrap();

        let seqs: Vec<u64> = n.scan().unwrap().iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![1, 2, 5]);
    }
}
