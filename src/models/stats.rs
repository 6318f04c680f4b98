use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// 进程运行期间的内存极值
///
/// `min_memory == 0` 表示尚未记录最小值，与持久化格式保持兼容。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    /// 最小内存 (字节)
    pub min_memory: u64,

    /// 最大内存 (字节)
    pub max_memory: u64,

    pub min_timestamp: DateTime<Local>,
    pub max_timestamp: DateTime<Local>,
}

impl MemoryStats {
    /// 创建一个尚未观测过的统计数据
    pub fn empty(now: DateTime<Local>) -> Self {
        Self {
            min_memory: 0,
            max_memory: 0,
            min_timestamp: now,
            max_timestamp: now,
        }
    }

    /// 最小值是否仍为未设置的哨兵值 0
    pub fn min_is_unset(&self) -> bool {
        self.min_memory == 0
    }

    /// 用新样本更新最小值，返回是否发生了更新
    pub fn record_min(&mut self, memory: u64, now: DateTime<Local>) -> bool {
        if self.min_is_unset() || memory < self.min_memory {
            self.min_memory = memory;
            self.min_timestamp = now;
            return true;
        }
        false
    }

    /// 用新样本更新最大值，返回是否发生了更新
    pub fn record_max(&mut self, memory: u64, now: DateTime<Local>) -> bool {
        if memory > self.max_memory {
            self.max_memory = memory;
            self.max_timestamp = now;
            return true;
        }
        false
    }
}
