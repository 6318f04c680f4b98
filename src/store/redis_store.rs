use async_trait::async_trait;
use log::info;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::time::Duration;

use super::StateStore;
use crate::config::RedisConfig;
use crate::error::StoreError;

/// 基于 Redis 的状态存储，值以字符串形式写入且不设置过期时间
#[derive(Clone)]
pub struct RedisStore {
    connection: MultiplexedConnection,
}

impl RedisStore {
    /// 建立连接并 PING 一次，超过 `timeout` 视为不可用；由调用方决定是否退出
    pub async fn connect(config: &RedisConfig, timeout: Duration) -> Result<Self, StoreError> {
        let client = redis::Client::open(config.url())?;
        let handshake = async {
            let mut connection = client.get_multiplexed_async_connection().await?;
            let _: String = redis::cmd("PING").query_async(&mut connection).await?;
            Ok::<_, StoreError>(connection)
        };
        let connection = tokio::time::timeout(timeout, handshake)
            .await
            .map_err(|_| StoreError::Timeout(timeout))??;

        info!("Connected to Redis at {}:{} (db {})", config.host, config.port, config.db);
        Ok(Self { connection })
    }
}

#[async_trait]
impl StateStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        let _: () = conn.set(key, value).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_host_fails_within_timeout() {
        // TEST-NET-1，不可路由
        let config = RedisConfig {
            host: "192.0.2.1".to_string(),
            port: 6379,
            password: String::new(),
            db: 0,
        };
        let started = std::time::Instant::now();

        let result = RedisStore::connect(&config, Duration::from_millis(200)).await;
        assert!(result.is_err());
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
