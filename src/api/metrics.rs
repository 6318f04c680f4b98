use actix_web::{web, HttpResponse, Responder};

use crate::metrics::METRICS;
use crate::state::AppState;

/// 每次抓取都会对所有 FRU 执行一次状态查询，并把快照写入存储
pub async fn get_metrics(data: web::Data<AppState>) -> impl Responder {
    {
        let mut inventory = data.inventory.lock().await;
        let reports = inventory
            .query_all(data.hardware_source.as_ref(), data.store.as_ref(), data.call_timeout)
            .await;
        for report in &reports {
            log::debug!("FRU {} ({}): {}", report.name, report.kind, report.verdict);
        }
    }

    match METRICS.render() {
        Ok(metrics_text) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(metrics_text),
        Err(e) => {
            log::error!("Failed to render metrics: {}", e);
            HttpResponse::InternalServerError().body("Failed to render metrics")
        }
    }
}
