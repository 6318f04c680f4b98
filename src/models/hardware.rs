use chrono::{Local, SecondsFormat};
use serde::{Deserialize, Serialize};
use std::fmt;

/// FRU 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HardwareKind {
    #[serde(rename = "npu")]
    NetworkProcessor,
    #[serde(rename = "psu")]
    PowerSupply,
    #[serde(rename = "fan")]
    Fan,
}

impl HardwareKind {
    /// 存储键中使用的类型段
    pub fn key_segment(&self) -> &'static str {
        match self {
            HardwareKind::NetworkProcessor => "npu",
            HardwareKind::PowerSupply => "psu",
            HardwareKind::Fan => "fan",
        }
    }
}

impl fmt::Display for HardwareKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HardwareKind::NetworkProcessor => "NPU",
            HardwareKind::PowerSupply => "PSU",
            HardwareKind::Fan => "fan",
        };
        f.pad(label)
    }
}

/// 网络处理器指标
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpuMetrics {
    /// 包/秒
    pub packet_rate: f64,
    /// Gb/s
    pub throughput: f64,
    /// 缓冲区使用率 (%)
    pub buffer_usage: f64,
    /// 处理器使用率 (%)
    pub processor_usage: f64,
    pub timestamp: String,
}

/// 电源指标
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PsuMetrics {
    /// V
    pub voltage: f64,
    /// A
    pub current: f64,
    /// W
    pub power: f64,
    pub timestamp: String,
}

/// 风扇指标
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FanMetrics {
    /// RPM
    pub speed: u32,
    /// 占空比 (%)
    pub duty: u32,
    pub timestamp: String,
}

/// 一次硬件快照，按类型区分的指标形状
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HardwareMetrics {
    Npu(NpuMetrics),
    Psu(PsuMetrics),
    Fan(FanMetrics),
}

impl HardwareMetrics {
    pub fn kind(&self) -> HardwareKind {
        match self {
            HardwareMetrics::Npu(_) => HardwareKind::NetworkProcessor,
            HardwareMetrics::Psu(_) => HardwareKind::PowerSupply,
            HardwareMetrics::Fan(_) => HardwareKind::Fan,
        }
    }

    pub fn timestamp(&self) -> &str {
        match self {
            HardwareMetrics::Npu(m) => &m.timestamp,
            HardwareMetrics::Psu(m) => &m.timestamp,
            HardwareMetrics::Fan(m) => &m.timestamp,
        }
    }
}

impl fmt::Display for HardwareMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HardwareMetrics::Npu(m) => write!(
                f,
                "PacketRate={:.1} pps, Throughput={:.1} Gbps, BufferUsage={:.1}%, ProcessorUsage={:.1}%",
                m.packet_rate, m.throughput, m.buffer_usage, m.processor_usage
            ),
            HardwareMetrics::Psu(m) => write!(
                f,
                "Voltage={:.2}V, Current={:.2}A, Power={:.2}W",
                m.voltage, m.current, m.power
            ),
            HardwareMetrics::Fan(m) => write!(f, "Speed={}RPM, Duty={}%", m.speed, m.duty),
        }
    }
}

/// 采集时间戳，例如 `2025-03-24T04:39:59-07:00`
pub fn capture_timestamp() -> String {
    Local::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fan_metrics_serialize_integers() {
        let metrics = HardwareMetrics::Fan(FanMetrics {
            speed: 2000,
            duty: 60,
            timestamp: "2025-03-24T04:39:59-07:00".to_string(),
        });
        let json = serde_json::to_value(&metrics).unwrap();

        assert_eq!(json["speed"], 2000);
        assert_eq!(json["duty"], 60);
        assert!(json["speed"].is_u64());
        assert_eq!(json["timestamp"], "2025-03-24T04:39:59-07:00");
    }

    #[test]
    fn test_npu_metrics_field_names() {
        let metrics = HardwareMetrics::Npu(NpuMetrics {
            packet_rate: 1_000_000.0,
            throughput: 40.0,
            buffer_usage: 60.0,
            processor_usage: 70.0,
            timestamp: capture_timestamp(),
        });
        let json = serde_json::to_value(&metrics).unwrap();
        let object = json.as_object().unwrap();

        let mut keys: Vec<_> = object.keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(
            keys,
            ["buffer_usage", "packet_rate", "processor_usage", "throughput", "timestamp"]
        );
        assert_eq!(metrics.kind(), HardwareKind::NetworkProcessor);
    }

    #[test]
    fn test_capture_timestamp_is_rfc3339() {
        let stamp = capture_timestamp();
        assert!(chrono::DateTime::parse_from_rfc3339(&stamp).is_ok());
        assert!(!stamp.contains('.'));
    }

    #[test]
    fn test_kind_deserializes_from_key_segment() {
        let kind: HardwareKind = serde_json::from_str("\"psu\"").unwrap();
        assert_eq!(kind, HardwareKind::PowerSupply);
        assert_eq!(kind.key_segment(), "psu");
    }
}
