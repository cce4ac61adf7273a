use actix_web::web::{get, put, scope, Data, Json, Path};
use actix_web::{HttpResponse, Scope};
use serde::Deserialize;

use crate::api::error::ApiResult;
use crate::app::state::AppState;

use super::common::run_blocking;

// ==========================================
// 运行期配置路由
// ==========================================

#[derive(Debug, Deserialize)]
pub struct ConfigValueBody {
    pub value: String,
}

pub fn configure_routes() -> Scope {
    scope("/api/config")
        .route("", get().to(list_configs))
        .route("/{key}", put().to(update_config))
}

async fn list_configs(state: Data<AppState>) -> ApiResult<HttpResponse> {
    let api = state.config_api.clone();
    let configs = run_blocking(move || api.list_configs()).await?;
    Ok(HttpResponse::Ok().json(configs))
}

async fn update_config(
    state: Data<AppState>,
    key: Path<String>,
    body: Json<ConfigValueBody>,
) -> ApiResult<HttpResponse> {
    let api = state.config_api.clone();
    let item = run_blocking(move || api.update_config(&key, &body.value)).await?;
    Ok(HttpResponse::Ok().json(item))
}
