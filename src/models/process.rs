use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
pub use crate::models::stats::MemoryStats;

/// 被跟踪进程的配置（来自 processes.json）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessConfig {
    /// 进程名称，同时作为 `pgrep -f` 风格的匹配模式
    pub name: String,
    /// 兼容字段，守护进程不会执行重启
    #[serde(default)]
    pub restart: bool,
    #[serde(default, rename = "maxRetries")]
    pub max_retries: u32,
}

/// 进程状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessState {
    /// 没有任何历史记录
    Unknown,
    Up,
    Down,
}

impl ProcessState {
    pub fn from_pid(pid: u32) -> Self {
        if pid > 0 {
            ProcessState::Up
        } else {
            ProcessState::Down
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessState::Unknown => "unknown",
            ProcessState::Up => "up",
            ProcessState::Down => "down",
        }
    }
}

/// 持久化到 `process:{name}:status` 的进程记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub name: String,
    /// 0 表示未运行
    pub current_pid: u32,
    /// 仅在 PID 变化时设置为变化前的 PID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_pid: Option<u32>,
    pub status: ProcessState,
    /// 最近一次 PID 变化的时间
    pub last_change: DateTime<Local>,
    pub memory_stats: MemoryStats,
    /// 最近一次采样的内存 (字节)
    pub current_memory: u64,
}

impl ProcessRecord {
    /// 存储中没有记录时使用的初始状态
    pub fn unknown(name: &str, now: DateTime<Local>) -> Self {
        Self {
            name: name.to_string(),
            current_pid: 0,
            previous_pid: None,
            status: ProcessState::Unknown,
            last_change: now,
            memory_stats: MemoryStats::empty(now),
            current_memory: 0,
        }
    }
}

/// 指标源对一个进程的单次采样
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessSample {
    pub pid: u32,
    pub memory_bytes: u64,
}

impl ProcessSample {
    pub fn not_running() -> Self {
        Self::default()
    }

    pub fn running(pid: u32, memory_bytes: u64) -> Self {
        Self { pid, memory_bytes }
    }
}
