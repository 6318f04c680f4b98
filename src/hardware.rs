//! 硬件 FRU：每次状态查询都重新采集指标、写入存储、再按阈值评估。

use log::{error, info};
use std::time::Duration;

use crate::config::HardwareUnitConfig;
use crate::error::{MonitorError, SourceError};
use crate::health::{self, Verdict};
use crate::metrics::METRICS;
use crate::models::{HardwareKind, HardwareMetrics};
use crate::monitor::{bounded, CRITICAL_TARGET};
use crate::services::HardwareSource;
use crate::store::{keys, StateStore};

#[derive(Debug, Clone)]
pub struct Fru {
    name: String,
    kind: HardwareKind,
    instance: u32,
    present: bool,
    last_metrics: Option<HardwareMetrics>,
}

impl Fru {
    pub fn new(kind: HardwareKind, name: &str, instance: u32) -> Self {
        Self {
            name: name.to_string(),
            kind,
            instance,
            present: true,
            last_metrics: None,
        }
    }

    pub fn from_config(config: &HardwareUnitConfig) -> Self {
        let mut fru = Self::new(config.kind, &config.name, config.instance);
        fru.present = config.present;
        fru
    }

    /// `{name}-{instance}`
    pub fn name(&self) -> String {
        format!("{}-{}", self.name, self.instance)
    }

    pub fn kind(&self) -> HardwareKind {
        self.kind
    }

    pub fn instance(&self) -> u32 {
        self.instance
    }

    pub fn available(&self) -> bool {
        self.present
    }

    /// 最近一次成功采集并保存的指标
    pub fn last_metrics(&self) -> Option<&HardwareMetrics> {
        self.last_metrics.as_ref()
    }

    /// 重新编号（例如热插拔之后）
    pub fn set_instance(&mut self, instance: u32) {
        self.instance = instance;
        info!("Set {} instance to {}", self.kind, instance);
    }

    pub fn set_present(&mut self, present: bool) {
        if self.present != present {
            info!(
                "{} {} is now {}",
                self.kind,
                self.instance,
                if present { "present" } else { "absent" }
            );
        }
        self.present = present;
    }

    pub fn metrics_key(&self) -> String {
        keys::hardware_metrics(self.kind, self.instance)
    }

    /// 从数据源采集指标并保存快照
    pub async fn update_metrics(
        &mut self,
        source: &dyn HardwareSource,
        store: &dyn StateStore,
        timeout: Duration,
    ) -> Result<&HardwareMetrics, MonitorError> {
        let entity = self.name();
        let reading = match tokio::time::timeout(timeout, source.read(self.kind, self.instance)).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout(timeout)),
        };
        let metrics = reading.map_err(|source| MonitorError::SourceUnavailable {
            entity: entity.clone(),
            source,
        })?;
        if metrics.kind() != self.kind {
            return Err(MonitorError::SourceUnavailable {
                entity,
                source: SourceError::Malformed(format!(
                    "expected {} metrics, got {}",
                    self.kind,
                    metrics.kind()
                )),
            });
        }

        let key = self.metrics_key();
        let payload = serde_json::to_string(&metrics).map_err(|source| {
            error!("Failed to marshal {} {} metrics: {}", self.kind, self.instance, source);
            MonitorError::Serialization {
                key: key.clone(),
                source,
            }
        })?;
        if let Err(source) = bounded(timeout, store.set(&key, payload)).await {
            error!(
                "Failed to store {} {} metrics: {}",
                self.kind, self.instance, source
            );
            return Err(MonitorError::StoreUnavailable { key, source });
        }

        info!("Updated {} {} metrics: {}", self.kind, self.instance, metrics);
        Ok(self.last_metrics.insert(metrics))
    }

    /// 采集并评估；不在位时返回 `EntityAbsent`
    pub async fn check(
        &mut self,
        source: &dyn HardwareSource,
        store: &dyn StateStore,
        timeout: Duration,
    ) -> Result<health::Severity, MonitorError> {
        if !self.present {
            return Err(MonitorError::EntityAbsent { entity: self.name() });
        }
        let metrics = self.update_metrics(source, store, timeout).await?;
        Ok(health::evaluate(metrics))
    }

    /// 状态查询：不在位直接判为 CRITICAL，采集失败同样为 CRITICAL 但信号不同
    pub async fn status(
        &mut self,
        source: &dyn HardwareSource,
        store: &dyn StateStore,
        timeout: Duration,
    ) -> Verdict {
        match self.check(source, store, timeout).await {
            Ok(severity) => Verdict::measured(severity),
            Err(e) => self.failure_verdict(&e),
        }
    }

    fn failure_verdict(&self, err: &MonitorError) -> Verdict {
        match err {
            MonitorError::EntityAbsent { .. } => {
                error!(target: CRITICAL_TARGET, "{} {} not present", self.kind, self.instance);
                Verdict::absent()
            }
            _ => {
                error!("Failed to update {} {} metrics: {}", self.kind, self.instance, err);
                Verdict::acquisition_failed()
            }
        }
    }
}

/// 一次状态查询中单个 FRU 的结果
#[derive(Debug, Clone, PartialEq)]
pub struct FruReport {
    pub name: String,
    pub kind: HardwareKind,
    pub verdict: Verdict,
    /// 本次评估所用快照的采集时间
    pub captured_at: Option<String>,
}

/// 配置中的全部 FRU
#[derive(Debug, Clone, Default)]
pub struct FruInventory {
    units: Vec<Fru>,
}

impl FruInventory {
    pub fn new(units: Vec<Fru>) -> Self {
        Self { units }
    }

    pub fn from_config(configs: &[HardwareUnitConfig]) -> Self {
        Self::new(configs.iter().map(Fru::from_config).collect())
    }

    pub fn units(&self) -> &[Fru] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// 按配置名和当前实例号查找
    pub fn find_mut(&mut self, name: &str, instance: u32) -> Option<&mut Fru> {
        self.units
            .iter_mut()
            .find(|u| u.name == name && u.instance == instance)
    }

    pub fn set_instance(&mut self, name: &str, instance: u32, new_instance: u32) -> bool {
        match self.find_mut(name, instance) {
            Some(unit) => {
                METRICS.forget_fru(&unit.name(), unit.kind);
                unit.set_instance(new_instance);
                true
            }
            None => false,
        }
    }

    pub fn set_present(&mut self, name: &str, instance: u32, present: bool) -> bool {
        match self.find_mut(name, instance) {
            Some(unit) => {
                unit.set_present(present);
                true
            }
            None => false,
        }
    }

    /// 依次查询每个 FRU 的状态
    pub async fn query_all(
        &mut self,
        source: &dyn HardwareSource,
        store: &dyn StateStore,
        timeout: Duration,
    ) -> Vec<FruReport> {
        let mut reports = Vec::with_capacity(self.units.len());

        for unit in &mut self.units {
            let name = unit.name();
            let (verdict, captured_at) = match unit.check(source, store, timeout).await {
                Ok(severity) => (
                    Verdict::measured(severity),
                    unit.last_metrics().map(|m| m.timestamp().to_string()),
                ),
                Err(e) => {
                    METRICS
                        .observation_failures
                        .with_label_values(&[name.as_str(), e.kind()])
                        .inc();
                    (unit.failure_verdict(&e), None)
                }
            };
            METRICS.record_fru(&name, unit.kind, unit.available(), &verdict);
            reports.push(FruReport {
                name,
                kind: unit.kind,
                verdict,
                captured_at,
            });
        }

        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::health::{Severity, Signal};
    use crate::models::hardware::capture_timestamp;
    use crate::models::{FanMetrics, PsuMetrics};
    use crate::services::PlaceholderHardwareSource;
    use crate::store::MemoryStore;
    use async_trait::async_trait;

    const TIMEOUT: Duration = Duration::from_secs(5);

    struct FixedSource(HardwareMetrics);

    #[async_trait]
    impl HardwareSource for FixedSource {
        async fn read(&self, _kind: HardwareKind, _instance: u32) -> Result<HardwareMetrics, SourceError> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl HardwareSource for FailingSource {
        async fn read(&self, _kind: HardwareKind, instance: u32) -> Result<HardwareMetrics, SourceError> {
            Err(SourceError::Lookup(format!("i2c read failed on unit {}", instance)))
        }
    }

    struct ReadOnlyStore;

    #[async_trait]
    impl StateStore for ReadOnlyStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }

        async fn set(&self, _key: &str, _value: String) -> Result<(), StoreError> {
            Err(StoreError::Backend("READONLY".to_string()))
        }
    }

    #[tokio::test]
    async fn test_placeholder_fan_is_ok_and_persisted() {
        let store = MemoryStore::new();
        let mut fan = Fru::new(HardwareKind::Fan, "fan", 2);

        let verdict = fan.status(&PlaceholderHardwareSource, &store, TIMEOUT).await;
        assert_eq!(verdict, Verdict::measured(Severity::Ok));

        let stored = store.get("hardware:fan:2:metrics").await.unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&stored).unwrap();
        assert_eq!(json["speed"], 2000);
        assert_eq!(json["duty"], 60);
        assert!(json["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_absent_unit_short_circuits() {
        let store = MemoryStore::new();
        let mut psu = Fru::new(HardwareKind::PowerSupply, "psu", 0);
        psu.set_present(false);

        let verdict = psu.status(&PlaceholderHardwareSource, &store, TIMEOUT).await;
        assert_eq!(verdict.signal, Signal::Absent);
        assert_eq!(verdict.severity, Severity::Critical);
        // 不在位时不会采集也不会写入
        assert!(store.is_empty());
        assert!(psu.last_metrics().is_none());
    }

    #[tokio::test]
    async fn test_source_failure_is_acquisition_failed() {
        let store = MemoryStore::new();
        let mut npu = Fru::new(HardwareKind::NetworkProcessor, "npu", 0);

        let verdict = npu.status(&FailingSource, &store, TIMEOUT).await;
        assert_eq!(verdict, Verdict::acquisition_failed());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_is_acquisition_failed() {
        let mut fan = Fru::new(HardwareKind::Fan, "fan", 0);
        let verdict = fan.status(&PlaceholderHardwareSource, &ReadOnlyStore, TIMEOUT).await;
        assert_eq!(verdict.signal, Signal::AcquisitionFailed);
    }

    #[tokio::test]
    async fn test_measured_critical_psu() {
        let store = MemoryStore::new();
        let source = FixedSource(HardwareMetrics::Psu(PsuMetrics {
            voltage: 10.5,
            current: 40.0,
            power: 420.0,
            timestamp: capture_timestamp(),
        }));
        let mut psu = Fru::new(HardwareKind::PowerSupply, "psu", 1);

        let verdict = psu.status(&source, &store, TIMEOUT).await;
        assert_eq!(verdict, Verdict::measured(Severity::Critical));
        assert!(store.get("hardware:psu:1:metrics").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_mismatched_kind_is_rejected() {
        let store = MemoryStore::new();
        let source = FixedSource(HardwareMetrics::Fan(FanMetrics {
            speed: 1500,
            duty: 40,
            timestamp: capture_timestamp(),
        }));
        let mut npu = Fru::new(HardwareKind::NetworkProcessor, "npu", 0);

        let err = npu.update_metrics(&source, &store, TIMEOUT).await.unwrap_err();
        assert_eq!(err.kind(), "source_unavailable");
    }

    #[tokio::test]
    async fn test_set_instance_moves_snapshot_key() {
        let store = MemoryStore::new();
        let mut inventory = FruInventory::new(vec![Fru::new(HardwareKind::Fan, "fan", 7)]);

        assert!(inventory.set_instance("fan", 7, 3));
        assert!(!inventory.set_instance("fan", 7, 4));
        assert_eq!(inventory.units()[0].name(), "fan-3");

        let reports = inventory.query_all(&PlaceholderHardwareSource, &store, TIMEOUT).await;
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].name, "fan-3");
        assert!(store.get("hardware:fan:3:metrics").await.unwrap().is_some());
        assert!(store.get("hardware:fan:7:metrics").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_query_all_reports_every_unit() {
        let store = MemoryStore::new();
        let mut inventory = FruInventory::new(vec![
            Fru::new(HardwareKind::NetworkProcessor, "npu", 0),
            Fru::new(HardwareKind::PowerSupply, "psu", 0),
            Fru::new(HardwareKind::Fan, "fan", 0),
        ]);
        assert!(inventory.set_present("psu", 0, false));

        let reports = inventory.query_all(&PlaceholderHardwareSource, &store, TIMEOUT).await;
        let verdicts: Vec<_> = reports.iter().map(|r| r.verdict).collect();
        assert_eq!(
            verdicts,
            vec![
                Verdict::measured(Severity::Ok),
                Verdict::absent(),
                Verdict::measured(Severity::Ok),
            ]
        );
        assert_eq!(store.len(), 2);
        assert!(reports[0].captured_at.is_some());
        assert!(reports[1].captured_at.is_none());
    }

    #[tokio::test]
    async fn test_absent_check_is_entity_absent() {
        let store = MemoryStore::new();
        let mut fan = Fru::new(HardwareKind::Fan, "fan", 5);
        fan.set_present(false);

        let err = fan.check(&PlaceholderHardwareSource, &store, TIMEOUT).await.unwrap_err();
        assert_eq!(err.kind(), "entity_absent");
    }

    #[tokio::test]
    async fn test_query_all_counts_failed_units() {
        let store = MemoryStore::new();
        let mut inventory = FruInventory::new(vec![
            Fru::new(HardwareKind::PowerSupply, "psu", 9),
            Fru::new(HardwareKind::NetworkProcessor, "npu", 8),
        ]);
        inventory.set_present("psu", 9, false);

        let absent = METRICS
            .observation_failures
            .with_label_values(&["psu-9", "entity_absent"]);
        let failed = METRICS
            .observation_failures
            .with_label_values(&["npu-8", "source_unavailable"]);
        let (absent_before, failed_before) = (absent.get(), failed.get());

        let reports = inventory.query_all(&FailingSource, &store, TIMEOUT).await;
        assert_eq!(reports[0].verdict, Verdict::absent());
        assert_eq!(reports[1].verdict, Verdict::acquisition_failed());
        assert_eq!(absent.get(), absent_before + 1);
        assert_eq!(failed.get(), failed_before + 1);
    }
}
