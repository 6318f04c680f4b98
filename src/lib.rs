//! `hostd` 库：进程状态连续性跟踪、硬件 FRU 健康评估和周期调度。
//!
//! 二进制入口在 `main.rs`，这里导出模块供集成测试使用。

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod hardware;
pub mod health;
pub mod metrics;
pub mod models;
pub mod monitor;
pub mod scheduler;
pub mod services;
pub mod state;
pub mod store;
pub mod tracker;
