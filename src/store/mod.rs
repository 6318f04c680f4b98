//! 状态存储边界：只依赖 get/set 两个原语。

use async_trait::async_trait;

use crate::error::StoreError;

pub mod memory;
pub mod redis_store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

/// 键值存储，值为 UTF-8 JSON 文本
#[async_trait]
pub trait StateStore: Send + Sync {
    /// 键不存在时返回 `Ok(None)`
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;
}

/// 存储键的格式
pub mod keys {
    use crate::models::HardwareKind;

    pub fn process_status(name: &str) -> String {
        format!("process:{}:status", name)
    }

    pub fn hardware_metrics(kind: HardwareKind, instance: u32) -> String {
        format!("hardware:{}:{}:metrics", kind.key_segment(), instance)
    }
}
