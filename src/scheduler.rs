//! 周期调度器。
//!
//! 每 `tick_interval`（默认 1 秒）检查一次，距离上次检查达到 `period`
//! （默认 60 秒）时执行一个完整的观测周期。取消信号只在 tick 边界检查，
//! 已经开始的周期总会执行完毕。

use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::monitor::ProcessMonitor;

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);
pub const CHECK_PERIOD: Duration = Duration::from_secs(60);

/// 上次检查时间的共享句柄
///
/// 互斥锁只在调度器“判断并执行周期”时持有；读取方只看周期结束后发布的值，
/// 不会等待正在执行的周期。
#[derive(Debug, Clone)]
pub struct LastCheck {
    guard: Arc<Mutex<Option<Instant>>>,
    published: Arc<watch::Sender<Option<Instant>>>,
}

impl Default for LastCheck {
    fn default() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            guard: Arc::new(Mutex::new(None)),
            published: Arc::new(tx),
        }
    }
}

impl LastCheck {
    /// 最近一次完成的检查时间
    pub fn get(&self) -> Option<Instant> {
        *self.published.borrow()
    }

    pub async fn set(&self, at: Instant) {
        let mut guard = self.guard.lock().await;
        *guard = Some(at);
        self.published.send_replace(Some(at));
    }
}

pub struct Scheduler {
    monitor: Arc<ProcessMonitor>,
    last_check: LastCheck,
    tick_interval: Duration,
    period: Duration,
}

impl Scheduler {
    pub fn new(monitor: Arc<ProcessMonitor>) -> Self {
        Self::with_timing(monitor, TICK_INTERVAL, CHECK_PERIOD)
    }

    pub fn with_timing(monitor: Arc<ProcessMonitor>, tick_interval: Duration, period: Duration) -> Self {
        Self {
            monitor,
            last_check: LastCheck::default(),
            tick_interval,
            period,
        }
    }

    pub fn last_check(&self) -> LastCheck {
        self.last_check.clone()
    }

    /// 处理一次 tick，返回是否执行了观测周期
    pub async fn tick(&self, now: Instant) -> bool {
        let mut last_check = self.last_check.guard.lock().await;

        let due = match *last_check {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.period,
        };
        if !due {
            return false;
        }

        info!("Running periodic process check");
        let report = self.monitor.run_cycle().await;
        debug!(
            "Periodic check finished: {} observed, {} failed",
            report.observed, report.failed
        );

        *last_check = Some(now);
        self.last_check.published.send_replace(Some(now));
        true
    }

    /// 在后台任务中运行调度循环
    pub fn start(self, cancel: CancellationToken) -> SchedulerHandle {
        let token = cancel.clone();
        let task = tokio::spawn(async move { self.run(token).await });
        SchedulerHandle { cancel, task }
    }

    async fn run(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.tick_interval, self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Scheduler started (tick {:?}, period {:?})",
            self.tick_interval, self.period
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Scheduler stopping");
                    break;
                }
                now = ticker.tick() => {
                    self.tick(now).await;
                }
            }
        }
    }
}

/// 调度任务的句柄；只有 `wait` 返回后调度器才算真正停止
pub struct SchedulerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// 发出取消信号，不等待
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// 等待调度循环退出
    pub async fn wait(self) -> Result<(), JoinError> {
        self.task.await
    }
}
