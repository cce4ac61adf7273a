use actix_web::web::{delete, get, post, put, scope, Data, Json, Path, Query};
use actix_web::{HttpResponse, Scope};

use crate::api::error::ApiResult;
use crate::app::state::AppState;
use crate::domain::revenue::{RevenueEntryFilter, RevenueEntryInput};

use super::common::run_blocking;

// ==========================================
// 收入来源 / 收入记录路由
// ==========================================

pub fn configure_source_routes() -> Scope {
    scope("/api/revenue-sources").route("", get().to(list_sources))
}

pub fn configure_entry_routes() -> Scope {
    scope("/api/revenue-entries")
        .route("", get().to(list_entries))
        .route("", post().to(create_entry))
        .route("/{entry_id}", get().to(get_entry))
        .route("/{entry_id}", put().to(update_entry))
        .route("/{entry_id}", delete().to(delete_entry))
        .route("/{entry_id}/payload", get().to(get_payload))
}

async fn list_sources(state: Data<AppState>) -> ApiResult<HttpResponse> {
    let api = state.revenue_api.clone();
    let sources = run_blocking(move || api.list_revenue_sources()).await?;
    Ok(HttpResponse::Ok().json(sources))
}

/// 过滤: ?source_id=&year=&template_id=
async fn list_entries(
    state: Data<AppState>,
    filter: Query<RevenueEntryFilter>,
) -> ApiResult<HttpResponse> {
    let api = state.revenue_api.clone();
    let entries = run_blocking(move || api.list_entries(&filter)).await?;
    Ok(HttpResponse::Ok().json(entries))
}

async fn get_entry(state: Data<AppState>, entry_id: Path<String>) -> ApiResult<HttpResponse> {
    let api = state.revenue_api.clone();
    let entry = run_blocking(move || api.get_entry(&entry_id)).await?;
    Ok(HttpResponse::Ok().json(entry))
}

async fn create_entry(
    state: Data<AppState>,
    body: Json<RevenueEntryInput>,
) -> ApiResult<HttpResponse> {
    let api = state.revenue_api.clone();
    let entry = run_blocking(move || api.create_entry(body.into_inner())).await?;
    Ok(HttpResponse::Created().json(entry))
}

async fn update_entry(
    state: Data<AppState>,
    entry_id: Path<String>,
    body: Json<RevenueEntryInput>,
) -> ApiResult<HttpResponse> {
    let api = state.revenue_api.clone();
    let entry = run_blocking(move || api.update_entry(&entry_id, body.into_inner())).await?;
    Ok(HttpResponse::Ok().json(entry))
}

async fn delete_entry(state: Data<AppState>, entry_id: Path<String>) -> ApiResult<HttpResponse> {
    let api = state.revenue_api.clone();
    run_blocking(move || api.delete_entry(&entry_id)).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn get_payload(state: Data<AppState>, entry_id: Path<String>) -> ApiResult<HttpResponse> {
    let api = state.revenue_api.clone();
    let payload = run_blocking(move || api.get_entry_payload(&entry_id)).await?;
    Ok(HttpResponse::Ok().json(payload))
}
