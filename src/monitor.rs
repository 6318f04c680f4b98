//! 单个观测周期：读取上次记录、采样、计算新记录、写回存储。

use chrono::Local;
use log::{error, info};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{MonitorError, SourceError, StoreError};
use crate::metrics::METRICS;
use crate::models::{ProcessConfig, ProcessRecord, ProcessSample};
use crate::services::ProcessSource;
use crate::store::{keys, StateStore};
use crate::tracker::{self, MemoryEvent, Transition};

/// CRITICAL 级别事件使用的日志 target
pub const CRITICAL_TARGET: &str = "hostd::critical";

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// 一个周期的汇总
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub observed: usize,
    pub failed: usize,
}

pub struct ProcessMonitor {
    processes: Vec<ProcessConfig>,
    store: Arc<dyn StateStore>,
    source: Arc<dyn ProcessSource>,
    call_timeout: Duration,
}

impl ProcessMonitor {
    pub fn new(
        processes: Vec<ProcessConfig>,
        store: Arc<dyn StateStore>,
        source: Arc<dyn ProcessSource>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            processes,
            store,
            source,
            call_timeout,
        }
    }

    pub fn process_names(&self) -> impl Iterator<Item = &str> {
        self.processes.iter().map(|p| p.name.as_str())
    }

    /// 顺序观测所有进程；单个进程失败只记录日志，不影响其它进程
    pub async fn run_cycle(&self) -> CycleReport {
        let mut report = CycleReport::default();

        for process in &self.processes {
            match self.update_process(&process.name).await {
                Ok(_) => report.observed += 1,
                Err(e) => {
                    report.failed += 1;
                    METRICS
                        .observation_failures
                        .with_label_values(&[process.name.as_str(), e.kind()])
                        .inc();
                    error!("Error updating process {}: {}", process.name, e);
                }
            }
        }

        METRICS.cycles.inc();
        report
    }

    /// 观测一个进程并持久化新记录
    pub async fn update_process(&self, name: &str) -> Result<ProcessRecord, MonitorError> {
        let key = keys::process_status(name);

        let previous = self.load_record(name, &key).await?;
        let sample = self.sample(name).await?;

        let observation = tracker::observe(name, &previous, sample, Local::now());
        if let Some(transition) = observation.transition {
            log_transition(name, &transition);
            METRICS
                .process_transitions
                .with_label_values(&[name, transition.label()])
                .inc();
        }
        for event in &observation.memory_events {
            match event {
                MemoryEvent::NewMinimum(bytes) => info!(
                    "New minimum memory for process {}: {:.2} MB",
                    name,
                    *bytes as f64 / BYTES_PER_MB
                ),
                MemoryEvent::NewMaximum(bytes) => info!(
                    "New maximum memory for process {}: {:.2} MB",
                    name,
                    *bytes as f64 / BYTES_PER_MB
                ),
            }
        }

        let record = observation.record;
        let payload = serde_json::to_string(&record).map_err(|source| MonitorError::Serialization {
            key: key.clone(),
            source,
        })?;
        bounded(self.call_timeout, self.store.set(&key, payload))
            .await
            .map_err(|source| MonitorError::StoreUnavailable {
                key: key.clone(),
                source,
            })?;

        METRICS.record_process(&record);
        info!(
            "Process {} status: {} (PID: {}, Memory: {:.2} MB)",
            name,
            record.status.as_str(),
            record.current_pid,
            record.current_memory as f64 / BYTES_PER_MB
        );

        Ok(record)
    }

    /// 读取上次记录；键不存在时返回初始的 unknown 记录
    async fn load_record(&self, name: &str, key: &str) -> Result<ProcessRecord, MonitorError> {
        let stored = bounded(self.call_timeout, self.store.get(key))
            .await
            .map_err(|source| MonitorError::StoreUnavailable {
                key: key.to_string(),
                source,
            })?;

        match stored {
            None => Ok(ProcessRecord::unknown(name, Local::now())),
            Some(data) => serde_json::from_str(&data).map_err(|source| MonitorError::Serialization {
                key: key.to_string(),
                source,
            }),
        }
    }

    async fn sample(&self, name: &str) -> Result<ProcessSample, MonitorError> {
        let result = match tokio::time::timeout(self.call_timeout, self.source.sample(name)).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout(self.call_timeout)),
        };
        result.map_err(|source| MonitorError::SourceUnavailable {
            entity: name.to_string(),
            source,
        })
    }
}

fn log_transition(name: &str, transition: &Transition) {
    match transition {
        Transition::Stopped { .. } => error!(target: CRITICAL_TARGET, "Process {} {}", name, transition),
        _ => info!("Process {} {}", name, transition),
    }
}

/// 为存储调用加上超时，超时视为该实体的暂时失败
pub(crate) async fn bounded<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, StoreError>>,
) -> Result<T, StoreError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}
