use prometheus::{
    register_gauge_vec_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, Encoder, GaugeVec, IntCounter, IntCounterVec, Opts,
    Registry, TextEncoder,
};
use lazy_static::lazy_static;
use std::sync::Arc;

use crate::health::Verdict;
use crate::models::{HardwareKind, ProcessRecord};

pub struct MetricsRegistry {
    registry: Registry,

    // 进程
    pub process_up: GaugeVec,
    pub process_pid: GaugeVec,
    pub process_memory_bytes: GaugeVec,
    pub process_memory_min_bytes: GaugeVec,
    pub process_memory_max_bytes: GaugeVec,
    pub process_transitions: IntCounterVec,

    // 调度
    pub observation_failures: IntCounterVec,
    pub cycles: IntCounter,

    // 硬件
    pub fru_status: GaugeVec,
    pub fru_present: GaugeVec,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        let registry = Registry::new();

        let process_labels = &["name"];
        let fru_labels = &["name", "kind"];

        let process_up = register_gauge_vec_with_registry!(
            Opts::new("hostd_process_up", "Process is running (1) or down (0)"),
            process_labels,
            registry
        ).expect("register hostd_process_up");

        let process_pid = register_gauge_vec_with_registry!(
            Opts::new("hostd_process_pid", "Current PID of the process, 0 when down"),
            process_labels,
            registry
        ).expect("register hostd_process_pid");

        let process_memory_bytes = register_gauge_vec_with_registry!(
            Opts::new("hostd_process_memory_bytes", "Most recent resident memory sample in bytes"),
            process_labels,
            registry
        ).expect("register hostd_process_memory_bytes");

        let process_memory_min_bytes = register_gauge_vec_with_registry!(
            Opts::new("hostd_process_memory_min_bytes", "Lowest resident memory observed while running"),
            process_labels,
            registry
        ).expect("register hostd_process_memory_min_bytes");

        let process_memory_max_bytes = register_gauge_vec_with_registry!(
            Opts::new("hostd_process_memory_max_bytes", "Highest resident memory observed while running"),
            process_labels,
            registry
        ).expect("register hostd_process_memory_max_bytes");

        let process_transitions = register_int_counter_vec_with_registry!(
            Opts::new("hostd_process_transitions_total", "PID transitions by kind"),
            &["name", "transition"],
            registry
        ).expect("register hostd_process_transitions_total");

        let observation_failures = register_int_counter_vec_with_registry!(
            Opts::new("hostd_observation_failures_total", "Failed observations by entity and error kind"),
            &["entity", "kind"],
            registry
        ).expect("register hostd_observation_failures_total");

        let cycles = register_int_counter_with_registry!(
            Opts::new("hostd_cycles_total", "Completed process observation cycles"),
            registry
        ).expect("register hostd_cycles_total");

        let fru_status = register_gauge_vec_with_registry!(
            Opts::new("hostd_fru_status", "FRU severity: 0 ok, 1 warning, 2 critical"),
            fru_labels,
            registry
        ).expect("register hostd_fru_status");

        let fru_present = register_gauge_vec_with_registry!(
            Opts::new("hostd_fru_present", "FRU is present (1) or absent (0)"),
            fru_labels,
            registry
        ).expect("register hostd_fru_present");

        Self {
            registry,
            process_up,
            process_pid,
            process_memory_bytes,
            process_memory_min_bytes,
            process_memory_max_bytes,
            process_transitions,
            observation_failures,
            cycles,
            fru_status,
            fru_present,
        }
    }

    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// 用最新的进程记录刷新 gauge
    pub fn record_process(&self, record: &ProcessRecord) {
        let labels = &[record.name.as_str()];
        let up = if record.current_pid > 0 { 1.0 } else { 0.0 };

        self.process_up.with_label_values(labels).set(up);
        self.process_pid.with_label_values(labels).set(record.current_pid as f64);
        self.process_memory_bytes
            .with_label_values(labels)
            .set(record.current_memory as f64);

        // 最小值未设置时不输出
        if !record.memory_stats.min_is_unset() {
            self.process_memory_min_bytes
                .with_label_values(labels)
                .set(record.memory_stats.min_memory as f64);
        }
        if record.memory_stats.max_memory > 0 {
            self.process_memory_max_bytes
                .with_label_values(labels)
                .set(record.memory_stats.max_memory as f64);
        }
    }

    pub fn record_fru(&self, name: &str, kind: HardwareKind, present: bool, verdict: &Verdict) {
        let kind = kind.key_segment();
        let labels = &[name, kind];

        self.fru_status.with_label_values(labels).set(verdict.severity.as_gauge());
        self.fru_present
            .with_label_values(labels)
            .set(if present { 1.0 } else { 0.0 });
    }

    /// FRU 重新编号后删除旧名称下的序列
    pub fn forget_fru(&self, name: &str, kind: HardwareKind) {
        let labels = &[name, kind.key_segment()];
        let _ = self.fru_status.remove_label_values(labels);
        let _ = self.fru_present.remove_label_values(labels);
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static! {
    pub static ref METRICS: Arc<MetricsRegistry> = Arc::new(MetricsRegistry::new());
}
