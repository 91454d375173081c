//! 轮转与保留策略
//!
//! 纯决策逻辑，不做任何 IO。

use std::collections::BTreeMap;

use crate::config::FileConfig;
use crate::naming::ArchiveEntry;

/// 轮转策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    max_file_size: u64,
    max_backups: usize,
}

/// 一次清理的执行计划
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EvictionPlan {
    /// 需要删除的文件
    pub delete: Vec<ArchiveEntry>,
    /// 需要重命名的文件及其新序号，按新序号升序
    pub renames: Vec<(ArchiveEntry, u64)>,
    /// 清理后保留的归档，按新序号排列（第 i 个的新序号为 i + 1）
    pub survivors: Vec<ArchiveEntry>,
    /// 清理后保留的归档数量（不含尚未处理的新归档）
    pub retained: usize,
}

impl RotationPolicy {
    pub fn new(max_file_size: u64, max_backups: usize) -> Self {
        Self {
            max_file_size,
            max_backups,
        }
    }

    pub fn from_config(config: &FileConfig) -> Self {
        Self::new(config.max_file_size, config.max_backups)
    }

    /// 当前字节数是否已达到轮转阈值
    pub fn should_rotate(&self, byte_count: u64) -> bool {
        byte_count >= self.max_file_size
    }

    /// 新序号是否超过保留上限
    pub fn needs_eviction(&self, archive_seq: u64) -> bool {
        archive_seq > self.max_backups as u64
    }

    /// 根据目录中的归档生成清理计划
    ///
    /// - `job_seq`: 本次清理任务携带的序号，只整理不大于它的归档
    /// - `known_seq`: 写入器当前的最大序号，大于它的归档视为孤儿并删除
    ///
    /// 介于两者之间的归档属于清理任务入队之后的轮转，保持不动。
    pub fn plan_eviction(
        &self,
        entries: &[ArchiveEntry],
        job_seq: u64,
        known_seq: u64,
    ) -> EvictionPlan {
        let orphan_above = known_seq.max(job_seq);
        let mut plan = EvictionPlan::default();
        let mut by_seq: BTreeMap<u64, ArchiveEntry> = BTreeMap::new();

        for entry in entries {
            if entry.seq > orphan_above {
                plan.delete.push(entry.clone());
                continue;
            }
            if entry.seq > job_seq {
                continue;
            }
            // 同一序号同时存在压缩和未压缩版本时，压缩版本是中断留下的残骸
            match by_seq.remove(&entry.seq) {
                None => {
                    by_seq.insert(entry.seq, entry.clone());
                }
                Some(existing) => {
                    let (keep, drop) = if existing.compressed {
                        (entry.clone(), existing)
                    } else {
                        (existing, entry.clone())
                    };
                    plan.delete.push(drop);
                    by_seq.insert(keep.seq, keep);
                }
            }
        }

        let total = by_seq.len();
        let evicted = total.saturating_sub(self.max_backups);
        let mut survivors = Vec::with_capacity(total - evicted);
        for (i, entry) in by_seq.into_values().enumerate() {
            if i < evicted {
                plan.delete.push(entry);
            } else {
                survivors.push(entry);
            }
        }

        for (i, entry) in survivors.into_iter().enumerate() {
            let target = i as u64 + 1;
            plan.retained += 1;
            if entry.seq != target {
                plan.renames.push((entry.clone(), target));
            }
            plan.survivors.push(entry);
        }
        plan
    }
}
