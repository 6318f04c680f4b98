use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};

use super::process_checker::{select_main_process, ProcessMatcher};
use super::ProcessSource;
use crate::error::SourceError;
use crate::models::ProcessSample;

/// 基于 sysinfo 的进程指标源
///
/// 扫描进程表是同步操作，放到阻塞线程池执行，调用方的超时才能生效。
pub struct SysinfoProcessSource {
    system: Arc<Mutex<System>>,
}

impl SysinfoProcessSource {
    pub fn new() -> Self {
        Self {
            system: Arc::new(Mutex::new(System::new())),
        }
    }
}

impl Default for SysinfoProcessSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessSource for SysinfoProcessSource {
    async fn sample(&self, name: &str) -> Result<ProcessSample, SourceError> {
        let system = self.system.clone();
        let name = name.to_string();
        tokio::task::spawn_blocking(move || scan(&system, &name))
            .await
            .map_err(|e| SourceError::Lookup(format!("process scan task failed: {}", e)))?
    }
}

fn scan(system: &Mutex<System>, name: &str) -> Result<ProcessSample, SourceError> {
    let mut sys = system
        .lock()
        .map_err(|e| SourceError::Lookup(format!("process table unavailable: {}", e)))?;
    // 默认刷新不包含命令行，新启动的进程需要显式读取
    sys.refresh_processes_specifics(
        ProcessesToUpdate::All,
        true,
        ProcessRefreshKind::nothing()
            .with_memory()
            .with_cmd(UpdateKind::OnlyIfNotSet),
    );

    let matcher = ProcessMatcher::new(name);
    let candidates = matcher.candidates(&sys);

    // 未找到进程不是错误，PID 0 表示未运行
    let Some(pid) = select_main_process(&candidates) else {
        return Ok(ProcessSample::not_running());
    };

    // RSS，单位字节
    let memory_bytes = sys
        .process(Pid::from_u32(pid))
        .map(|p| p.memory())
        .ok_or_else(|| SourceError::Malformed(format!("PID {} vanished during lookup", pid)))?;

    Ok(ProcessSample::running(pid, memory_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unmatched_name_is_not_running() {
        let source = SysinfoProcessSource::new();
        let sample = source
            .sample("hostd-test-no-such-process-7c1e0b")
            .await
            .unwrap();

        assert_eq!(sample, ProcessSample::not_running());
    }

    #[tokio::test]
    async fn test_sample_does_not_block_runtime() {
        let source = SysinfoProcessSource::new();
        let ticker = async {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
            true
        };

        // 单线程运行时上，扫描期间其他任务仍能推进
        let (sample, ticked) = tokio::join!(source.sample("hostd-test-no-such-process-7c1e0b"), ticker);
        assert_eq!(sample.unwrap(), ProcessSample::not_running());
        assert!(ticked);
    }
}
