pub mod metrics;

pub use metrics::get_metrics;

use actix_web::{web, HttpResponse, Responder};
use chrono::Local;

use crate::state::AppState;

pub async fn health(data: web::Data<AppState>) -> impl Responder {
    // tokio Instant 无法直接换算成墙钟时间，按经过的时长回推
    let last_check = data.last_check.get().and_then(|at| {
        chrono::Duration::from_std(at.elapsed())
            .ok()
            .map(|ago| (Local::now() - ago).to_rfc3339())
    });

    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "last_check": last_check
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::hardware::{Fru, FruInventory};
    use crate::models::{HardwareKind, ProcessConfig, ProcessSample};
    use crate::monitor::ProcessMonitor;
    use crate::scheduler::{LastCheck, Scheduler};
    use crate::services::{PlaceholderHardwareSource, ProcessSource};
    use crate::state::new_state;
    use crate::store::MemoryStore;
    use actix_web::{test, App};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    fn state_with(last_check: LastCheck) -> AppState {
        new_state(
            FruInventory::new(vec![Fru::new(HardwareKind::Fan, "fan", 0)]),
            Arc::new(PlaceholderHardwareSource),
            Arc::new(MemoryStore::new()),
            last_check,
            Duration::from_secs(5),
        )
    }

    fn state() -> AppState {
        state_with(LastCheck::default())
    }

    struct SlowSource;

    #[async_trait]
    impl ProcessSource for SlowSource {
        async fn sample(&self, _name: &str) -> Result<ProcessSample, SourceError> {
            tokio::time::sleep(Duration::from_millis(300)).await;
            Ok(ProcessSample::running(42, 1024))
        }
    }

    #[actix_web::test]
    async fn test_health_before_first_check() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state()))
                .route("/health", web::get().to(health)),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], "healthy");
        assert!(body["last_check"].is_null());
    }

    #[actix_web::test]
    async fn test_health_answers_during_slow_cycle() {
        let monitor = ProcessMonitor::new(
            vec![ProcessConfig {
                name: "health-slow".to_string(),
                restart: false,
                max_retries: 0,
            }],
            Arc::new(MemoryStore::new()),
            Arc::new(SlowSource),
            Duration::from_secs(5),
        );
        let scheduler = Scheduler::with_timing(
            Arc::new(monitor),
            Duration::from_millis(10),
            Duration::from_secs(60),
        );
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state_with(scheduler.last_check())))
                .route("/health", web::get().to(health)),
        )
        .await;
        let handle = scheduler.start(CancellationToken::new());

        // 周期在 10ms 时开始，持续约 300ms
        tokio::time::sleep(Duration::from_millis(100)).await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = tokio::time::timeout(
            Duration::from_millis(100),
            test::call_and_read_body_json(&app, req),
        )
        .await
        .expect("/health should not wait for the running cycle");
        assert_eq!(body["status"], "healthy");
        assert!(body["last_check"].is_null());

        handle.stop();
        handle.wait().await.unwrap();

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["last_check"].is_string());
    }

    #[actix_web::test]
    async fn test_metrics_scrape_queries_hardware() {
        let state = state();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .route("/metrics", web::get().to(get_metrics)),
        )
        .await;

        let req = test::TestRequest::get().uri("/metrics").to_request();
        let body = test::call_and_read_body(&app, req).await;
        let text = String::from_utf8(body.to_vec()).unwrap();

        assert!(text.contains("hostd_fru_status{kind=\"fan\",name=\"fan-0\"} 0"));
        assert!(state.store.get("hardware:fan:0:metrics").await.unwrap().is_some());
    }
}
