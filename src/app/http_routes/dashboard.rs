use actix_web::web::{get, scope, Data};
use actix_web::{HttpResponse, Scope};

use crate::api::error::ApiResult;
use crate::app::state::AppState;

use super::common::run_blocking;

// ==========================================
// 看板路由
// ==========================================

pub fn configure_routes() -> Scope {
    scope("/api/dashboard").route("/metrics", get().to(metrics))
}

async fn metrics(state: Data<AppState>) -> ApiResult<HttpResponse> {
    let api = state.dashboard_api.clone();
    let metrics = run_blocking(move || api.metrics()).await?;
    Ok(HttpResponse::Ok().json(metrics))
}
