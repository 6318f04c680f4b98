use async_trait::async_trait;

use super::HardwareSource;
use crate::error::SourceError;
use crate::models::hardware::capture_timestamp;
use crate::models::{FanMetrics, HardwareKind, HardwareMetrics, NpuMetrics, PsuMetrics};

/// 占位硬件数据源，返回固定的标称读数
///
/// 真实实现应当读取硬件寄存器，并以 `HardwareSource` 的形式接入。
#[derive(Debug, Clone, Default)]
pub struct PlaceholderHardwareSource;

#[async_trait]
impl HardwareSource for PlaceholderHardwareSource {
    async fn read(&self, kind: HardwareKind, _instance: u32) -> Result<HardwareMetrics, SourceError> {
        let timestamp = capture_timestamp();
        let metrics = match kind {
            HardwareKind::NetworkProcessor => HardwareMetrics::Npu(NpuMetrics {
                packet_rate: 1_000_000.0,
                throughput: 40.0,
                buffer_usage: 60.0,
                processor_usage: 70.0,
                timestamp,
            }),
            HardwareKind::PowerSupply => HardwareMetrics::Psu(PsuMetrics {
                voltage: 12.0,
                current: 50.0,
                power: 600.0,
                timestamp,
            }),
            HardwareKind::Fan => HardwareMetrics::Fan(FanMetrics {
                speed: 2000,
                duty: 60,
                timestamp,
            }),
        };
        Ok(metrics)
    }
}
