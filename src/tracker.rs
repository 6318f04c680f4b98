//! 进程状态连续性跟踪。
//!
//! [`observe`] 是纯函数：根据上一次记录和新样本计算下一条记录，
//! 并返回需要记录日志的事件，由调用方负责持久化。

use chrono::{DateTime, Local};
use std::fmt;

use crate::models::{ProcessRecord, ProcessSample, ProcessState};

/// PID 变化的分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// 0 -> pid
    Started { pid: u32 },
    /// pid -> 0
    Stopped { previous: u32 },
    /// 两个非零 PID 之间的替换
    Changed { previous: u32, current: u32 },
}

impl Transition {
    fn classify(previous: u32, current: u32) -> Self {
        match (previous, current) {
            (0, pid) => Transition::Started { pid },
            (previous, 0) => Transition::Stopped { previous },
            (previous, current) => Transition::Changed { previous, current },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Transition::Started { .. } => "started",
            Transition::Stopped { .. } => "stopped",
            Transition::Changed { .. } => "changed",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Started { pid } => write!(f, "has started (PID: {})", pid),
            Transition::Stopped { previous } => {
                write!(f, "has stopped (previous PID: {})", previous)
            }
            Transition::Changed { previous, current } => {
                write!(f, "PID changed: {} -> {}", previous, current)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryEvent {
    NewMinimum(u64),
    NewMaximum(u64),
}

/// 一次观测的结果
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub record: ProcessRecord,
    pub transition: Option<Transition>,
    pub memory_events: Vec<MemoryEvent>,
}

pub fn observe(
    name: &str,
    previous: &ProcessRecord,
    sample: ProcessSample,
    now: DateTime<Local>,
) -> Observation {
    let pid = sample.pid;
    let memory = if pid > 0 { sample.memory_bytes } else { 0 };

    let mut record = ProcessRecord {
        name: name.to_string(),
        current_pid: pid,
        previous_pid: previous.previous_pid,
        status: ProcessState::from_pid(pid),
        last_change: previous.last_change,
        memory_stats: previous.memory_stats.clone(),
        current_memory: memory,
    };

    let mut transition = None;
    if pid != previous.current_pid {
        transition = Some(Transition::classify(previous.current_pid, pid));
        record.previous_pid = Some(previous.current_pid);
        record.last_change = now;
    }

    let mut memory_events = Vec::new();
    if memory > 0 {
        // 最小值为 0 视为未设置，因此第一次正数采样总会成为最小值
        if record.memory_stats.record_min(memory, now) {
            memory_events.push(MemoryEvent::NewMinimum(memory));
        }
        if record.memory_stats.record_max(memory, now) {
            memory_events.push(MemoryEvent::NewMaximum(memory));
        }
    }

    Observation {
        record,
        transition,
        memory_events,
    }
}
