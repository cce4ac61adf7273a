use actix_web::web::{delete, get, post, put, scope, Data, Json, Path};
use actix_web::{HttpResponse, Scope};
use serde::Deserialize;

use crate::api::error::ApiResult;
use crate::app::state::AppState;

use super::common::run_blocking;

// ==========================================
// 资产路由
// ==========================================
// 注意: /recompute 必须注册在 /{asset_id} 之前

#[derive(Debug, Deserialize)]
pub struct RenameBody {
    pub name: String,
}

pub fn configure_routes() -> Scope {
    scope("/api/assets")
        .route("/recompute", post().to(recompute_totals))
        .route("", get().to(list_assets))
        .route("/{asset_id}", get().to(get_asset))
        .route("/{asset_id}", put().to(rename_asset))
        .route("/{asset_id}", delete().to(delete_asset))
        .route("/{asset_id}/revenues", get().to(list_revenues))
}

async fn list_assets(state: Data<AppState>) -> ApiResult<HttpResponse> {
    let api = state.asset_api.clone();
    let assets = run_blocking(move || api.list_assets()).await?;
    Ok(HttpResponse::Ok().json(assets))
}

async fn get_asset(state: Data<AppState>, asset_id: Path<String>) -> ApiResult<HttpResponse> {
    let api = state.asset_api.clone();
    let asset = run_blocking(move || api.get_asset(&asset_id)).await?;
    Ok(HttpResponse::Ok().json(asset))
}

async fn rename_asset(
    state: Data<AppState>,
    asset_id: Path<String>,
    body: Json<RenameBody>,
) -> ApiResult<HttpResponse> {
    let api = state.asset_api.clone();
    let asset = run_blocking(move || api.rename_asset(&asset_id, &body.name)).await?;
    Ok(HttpResponse::Ok().json(asset))
}

async fn delete_asset(state: Data<AppState>, asset_id: Path<String>) -> ApiResult<HttpResponse> {
    let api = state.asset_api.clone();
    run_blocking(move || api.delete_asset(&asset_id)).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn list_revenues(state: Data<AppState>, asset_id: Path<String>) -> ApiResult<HttpResponse> {
    let api = state.asset_api.clone();
    let revenues = run_blocking(move || api.list_asset_revenues(&asset_id)).await?;
    Ok(HttpResponse::Ok().json(revenues))
}

async fn recompute_totals(state: Data<AppState>) -> ApiResult<HttpResponse> {
    let api = state.asset_api.clone();
    let changed = run_blocking(move || api.recompute_asset_totals()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "changed": changed })))
}
