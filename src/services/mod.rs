use async_trait::async_trait;

use crate::error::SourceError;
use crate::models::{HardwareKind, HardwareMetrics, ProcessSample};

pub mod hardware_source;
pub mod process_checker;
pub mod stats_collector;

pub use hardware_source::PlaceholderHardwareSource;
pub use stats_collector::SysinfoProcessSource;

/// 进程指标源：每次观测调用一次
#[async_trait]
pub trait ProcessSource: Send + Sync {
    /// 进程未运行时返回 `pid = 0` 的样本，只有查询本身失败才返回错误
    async fn sample(&self, name: &str) -> Result<ProcessSample, SourceError>;
}

/// 硬件指标源，按 (类型, 实例) 读取
#[async_trait]
pub trait HardwareSource: Send + Sync {
    async fn read(&self, kind: HardwareKind, instance: u32) -> Result<HardwareMetrics, SourceError>;
}
