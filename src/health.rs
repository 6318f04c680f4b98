//! 硬件健康评估：把指标快照映射为 OK / WARNING / CRITICAL。
//!
//! 每种 FRU 的阈值表与其类型放在一起，同一规则内先判 CRITICAL 再判 WARNING，
//! 比较均为严格不等（例如 800W 整仍为 OK）。

use serde::Serialize;
use std::fmt;

use crate::models::{FanMetrics, HardwareMetrics, NpuMetrics, PsuMetrics};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    #[serde(rename = "green")]
    Ok,
    #[serde(rename = "yellow")]
    Warning,
    #[serde(rename = "red")]
    Critical,
}

impl Severity {
    /// Prometheus gauge 使用的数值
    pub fn as_gauge(&self) -> f64 {
        match self {
            Severity::Ok => 0.0,
            Severity::Warning => 1.0,
            Severity::Critical => 2.0,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Ok => "OK",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
        };
        f.pad(label)
    }
}

/// 结论的来源，用于区分同为 CRITICAL 的不同情况
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// 根据实测指标得出
    Measured,
    /// 设备不在位
    Absent,
    /// 指标获取或保存失败
    AcquisitionFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub severity: Severity,
    pub signal: Signal,
}

impl Verdict {
    pub fn measured(severity: Severity) -> Self {
        Self {
            severity,
            signal: Signal::Measured,
        }
    }

    pub fn absent() -> Self {
        Self {
            severity: Severity::Critical,
            signal: Signal::Absent,
        }
    }

    pub fn acquisition_failed() -> Self {
        Self {
            severity: Severity::Critical,
            signal: Signal::AcquisitionFailed,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.signal {
            Signal::Measured => write!(f, "{}", self.severity),
            Signal::Absent => write!(f, "{} (absent)", self.severity),
            Signal::AcquisitionFailed => write!(f, "{} (acquisition failed)", self.severity),
        }
    }
}

/// 按类型分派的统一评估入口
pub fn evaluate(metrics: &HardwareMetrics) -> Severity {
    match metrics {
        HardwareMetrics::Npu(m) => m.severity(),
        HardwareMetrics::Psu(m) => m.severity(),
        HardwareMetrics::Fan(m) => m.severity(),
    }
}

trait Thresholds {
    fn severity(&self) -> Severity;
}

const NPU_CRITICAL_USAGE: f64 = 95.0;
const NPU_WARNING_BUFFER: f64 = 80.0;
const NPU_WARNING_PROCESSOR: f64 = 85.0;

impl Thresholds for NpuMetrics {
    fn severity(&self) -> Severity {
        if self.buffer_usage > NPU_CRITICAL_USAGE || self.processor_usage > NPU_CRITICAL_USAGE {
            return Severity::Critical;
        }
        if self.buffer_usage > NPU_WARNING_BUFFER || self.processor_usage > NPU_WARNING_PROCESSOR {
            return Severity::Warning;
        }
        Severity::Ok
    }
}

// 12V ±10%
const PSU_MIN_VOLTAGE: f64 = 10.8;
const PSU_MAX_VOLTAGE: f64 = 13.2;
const PSU_WARNING_POWER: f64 = 800.0;

impl Thresholds for PsuMetrics {
    fn severity(&self) -> Severity {
        if self.voltage < PSU_MIN_VOLTAGE || self.voltage > PSU_MAX_VOLTAGE {
            return Severity::Critical;
        }
        if self.power > PSU_WARNING_POWER {
            return Severity::Warning;
        }
        Severity::Ok
    }
}

const FAN_MIN_SPEED: u32 = 100;
const FAN_WARNING_DUTY: u32 = 90;

impl Thresholds for FanMetrics {
    fn severity(&self) -> Severity {
        if self.speed < FAN_MIN_SPEED {
            return Severity::Critical;
        }
        if self.duty > FAN_WARNING_DUTY {
            return Severity::Warning;
        }
        Severity::Ok
    }
}
