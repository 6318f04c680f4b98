use anyhow::Context;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::models::{HardwareKind, ProcessConfig};

const DEFAULT_CALL_TIMEOUT_SECS: u64 = 5;
const DEFAULT_CHECK_PERIOD_SECS: u64 = 60;

/// config.json
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub redis: RedisConfig,

    /// 需要监控的 FRU 列表
    #[serde(default = "default_hardware")]
    pub hardware: Vec<HardwareUnitConfig>,

    /// 单次存储 / 指标源调用的超时时间
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,

    /// 两次进程检查之间的最短间隔
    #[serde(default = "default_check_period_secs")]
    pub check_period_secs: u64,
}

impl Config {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn check_period(&self) -> Duration {
        Duration::from_secs(self.check_period_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub db: i64,
}

impl RedisConfig {
    pub fn url(&self) -> String {
        if self.password.is_empty() {
            format!("redis://{}:{}/{}", self.host, self.port, self.db)
        } else {
            format!(
                "redis://:{}@{}:{}/{}",
                self.password, self.host, self.port, self.db
            )
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HardwareUnitConfig {
    pub kind: HardwareKind,
    pub name: String,
    pub instance: u32,
    #[serde(default = "default_present")]
    pub present: bool,
}

/// processes.json
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessList {
    pub processes: Vec<ProcessConfig>,
}

fn default_hardware() -> Vec<HardwareUnitConfig> {
    let unit = |kind, name: &str, instance| HardwareUnitConfig {
        kind,
        name: name.to_string(),
        instance,
        present: true,
    };
    vec![
        unit(HardwareKind::NetworkProcessor, "npu", 0),
        unit(HardwareKind::PowerSupply, "psu", 0),
        unit(HardwareKind::PowerSupply, "psu", 1),
        unit(HardwareKind::Fan, "fan", 0),
        unit(HardwareKind::Fan, "fan", 1),
    ]
}

fn default_call_timeout_secs() -> u64 {
    DEFAULT_CALL_TIMEOUT_SECS
}

fn default_check_period_secs() -> u64 {
    DEFAULT_CHECK_PERIOD_SECS
}

fn default_present() -> bool {
    true
}

pub fn load_config(path: impl AsRef<Path>) -> anyhow::Result<Config> {
    let path = path.as_ref();
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("error reading config file {}", path.display()))?;
    serde_json::from_str(&data)
        .with_context(|| format!("error parsing config file {}", path.display()))
}

pub fn load_process_list(path: impl AsRef<Path>) -> anyhow::Result<ProcessList> {
    let path = path.as_ref();
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("error reading process config file {}", path.display()))?;
    serde_json::from_str(&data)
        .with_context(|| format!("error parsing process config file {}", path.display()))
}
