use actix_web::{web, App, HttpServer};
use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use hostd::api::{get_metrics, health};
use hostd::cli::{Command, CommandArgs};
use hostd::config::{load_config, load_process_list, Config};
use hostd::hardware::FruInventory;
use hostd::monitor::{ProcessMonitor, CRITICAL_TARGET};
use hostd::scheduler::{Scheduler, TICK_INTERVAL};
use hostd::services::{PlaceholderHardwareSource, SysinfoProcessSource};
use hostd::state::new_state;
use hostd::store::{RedisStore, StateStore};

#[actix_web::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CommandArgs::parse();

    let config = match load_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            log::error!(target: CRITICAL_TARGET, "Failed to load config: {:#}", e);
            std::process::exit(1);
        }
    };

    let store: Arc<dyn StateStore> = match RedisStore::connect(&config.redis, config.call_timeout()).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            log::error!(target: CRITICAL_TARGET, "Failed to connect to Redis: {}", e);
            std::process::exit(1);
        }
    };

    let result = match args.command() {
        Command::Hardware => query_hardware(&config, store).await,
        Command::Run => run_daemon(&args, &config, store).await,
    };

    if let Err(e) = result {
        log::error!(target: CRITICAL_TARGET, "{:#}", e);
        std::process::exit(1);
    }
}

/// 一次性查询所有 FRU 的状态
async fn query_hardware(config: &Config, store: Arc<dyn StateStore>) -> anyhow::Result<()> {
    let mut inventory = FruInventory::from_config(&config.hardware);
    let reports = inventory
        .query_all(&PlaceholderHardwareSource, store.as_ref(), config.call_timeout())
        .await;

    for report in reports {
        println!(
            "{:<12} {:<4} {:<26} {}",
            report.name,
            report.kind,
            report.captured_at.as_deref().unwrap_or("-"),
            report.verdict
        );
    }
    Ok(())
}

async fn run_daemon(args: &CommandArgs, config: &Config, store: Arc<dyn StateStore>) -> anyhow::Result<()> {
    let process_list = load_process_list(&args.processes)?;

    let monitor = Arc::new(ProcessMonitor::new(
        process_list.processes,
        store.clone(),
        Arc::new(SysinfoProcessSource::new()),
        config.call_timeout(),
    ));
    log::info!(
        "Tracking processes: {}",
        monitor.process_names().collect::<Vec<_>>().join(", ")
    );

    let inventory = FruInventory::from_config(&config.hardware);
    log::info!("Tracking {} hardware units", inventory.len());

    let scheduler = Scheduler::with_timing(monitor, TICK_INTERVAL, config.check_period());
    let state = new_state(
        inventory,
        Arc::new(PlaceholderHardwareSource),
        store,
        scheduler.last_check(),
        config.call_timeout(),
    );
    let scheduler = scheduler.start(CancellationToken::new());

    let bind_address = format!("{}:{}", args.address, args.port);
    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .route("/metrics", web::get().to(get_metrics))
            .route("/health", web::get().to(health))
    })
        .disable_signals()
        .bind(&bind_address)
        .with_context(|| format!("failed to bind {}", bind_address))?
        .run();
    let server_handle = server.handle();
    let server_task = actix_web::rt::spawn(server);

    log::info!("Host daemon started, exporter listening on http://{}", bind_address);

    shutdown_signal().await;
    log::info!("Shutting down...");

    // 先等调度器跑完当前周期，再停止 HTTP 服务
    scheduler.stop();
    if let Err(e) = scheduler.wait().await {
        log::error!("Scheduler task failed: {}", e);
    }
    server_handle.stop(true).await;
    if let Ok(Err(e)) = server_task.await {
        log::error!("HTTP server error: {}", e);
    }

    log::info!("Shutdown complete");
    Ok(())
}

/// 等待 SIGINT 或 SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to install Ctrl-C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => log::info!("Received SIGINT"),
        _ = terminate => log::info!("Received SIGTERM"),
    }
}
