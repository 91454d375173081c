//! gzip 归档处理器

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;

use crate::error::{LogError, Result};
use crate::handler::file::SharedState;
use crate::naming::ArchiveNamer;
use crate::policy::RotationPolicy;
use crate::producer_consumer::ArchiveProcessor;

/// 在归档线程中压缩和清理归档文件
pub struct GzipArchiver {
    namer: ArchiveNamer,
    policy: RotationPolicy,
    compression: Compression,
    state: SharedState,
}

impl GzipArchiver {
    pub(crate) fn new(
        namer: ArchiveNamer,
        policy: RotationPolicy,
        level: u32,
        state: SharedState,
    ) -> Self {
        Self {
            namer,
            policy,
            compression: Compression::new(level),
            state,
        }
    }
}

impl ArchiveProcessor for GzipArchiver {
    fn name(&self) -> &'static str {
        "archive"
    }

    fn handle_compress(&mut self, seq: u64) -> Result<()> {
        let src = self.namer.archive_path(seq);
        let dst = self.namer.gz_path(seq);
        if !src.exists() {
            return Ok(());
        }

        if let Err(e) = gzip_file(&src, &dst, self.compression) {
            let _ = fs::remove_file(&dst);
            return Err(LogError::io("压缩", src, e));
        }

        // 删除原文件失败时放弃压缩结果，不能让两个版本同时存在
        if let Err(e) = fs::remove_file(&src) {
            let _ = fs::remove_file(&dst);
            return Err(LogError::io("删除已压缩的原文件", src, e));
        }
        Ok(())
    }

    fn handle_evict(&mut self, seq: u64) -> Result<()> {
        let entries = self
            .namer
            .scan()
            .map_err(|e| LogError::io("读取日志目录", self.namer.dir(), e))?;
        // 扫描之后再读序号：扫描到的文件一定不大于这个值
        let known = self.state.lock().archive_seq;
        let plan = self.policy.plan_eviction(&entries, seq, known);

        let mut clean = true;
        for entry in &plan.delete {
            match fs::remove_file(self.namer.entry_path(entry)) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    clean = false;
                    eprintln!("[archive] 删除归档 {} 失败: {}", entry.file_name, e);
                }
            }
        }
        for (entry, target) in &plan.renames {
            let to = self.namer.dir().join(self.namer.archive_name(*target, entry.compressed));
            if let Err(e) = fs::rename(self.namer.entry_path(entry), &to) {
                clean = false;
                eprintln!("[archive] 重命名归档 {} 失败: {}", entry.file_name, e);
            }
        }

        // 保留下来的未压缩归档（压缩失败或上次运行中断留下的）在新序号上补压缩
        for (i, entry) in plan.survivors.iter().enumerate() {
            if !entry.compressed {
                if let Err(e) = self.handle_compress(i as u64 + 1) {
                    eprintln!("[archive] 补压缩归档失败: {}", e);
                }
            }
        }

        // 清理期间发生过新的轮转时跳过修正，由下一次清理收敛
        let mut state = self.state.lock();
        if clean && state.archive_seq == seq {
            state.archive_seq = plan.retained as u64;
        }
        Ok(())
    }
}

fn gzip_file(src: &Path, dst: &Path, compression: Compression) -> io::Result<()> {
    let mut input = BufReader::new(File::open(src)?);
    let output = BufWriter::new(File::create(dst)?);
    let mut encoder = GzEncoder::new(output, compression);
    io::copy(&mut input, &mut encoder)?;
    let mut output = encoder.finish()?;
    output.flush()?;
    output.into_inner()?.sync_all()
}
