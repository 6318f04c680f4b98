use std::time::Duration;
use thiserror::Error;

/// 指标源错误（进程发现 / 硬件读数）
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("lookup failed: {0}")]
    Lookup(String),

    #[error("malformed reading: {0}")]
    Malformed(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// 状态存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backend error: {0}")]
    Backend(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// 单个实体观测过程中可能出现的错误，都不会中断调度循环
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("metric source unavailable for {entity}: {source}")]
    SourceUnavailable {
        entity: String,
        #[source]
        source: SourceError,
    },

    #[error("state store unavailable for {key}: {source}")]
    StoreUnavailable {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to encode or decode {key}: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{entity} is not present")]
    EntityAbsent { entity: String },
}

impl MonitorError {
    /// 用于日志和失败计数器的简短标签
    pub fn kind(&self) -> &'static str {
        match self {
            MonitorError::SourceUnavailable { .. } => "source_unavailable",
            MonitorError::StoreUnavailable { .. } => "store_unavailable",
            MonitorError::Serialization { .. } => "serialization",
            MonitorError::EntityAbsent { .. } => "entity_absent",
        }
    }
}
