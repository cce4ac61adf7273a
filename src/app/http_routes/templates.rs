use actix_web::web::{delete, get, post, put, scope, Data, Json, Path};
use actix_web::{HttpResponse, Scope};
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::api::error::ApiResult;
use crate::api::TemplateMetaUpdate;
use crate::app::state::AppState;
use crate::domain::template::ImportTemplateInput;
use crate::domain::types::ColumnRole;

use super::common::run_blocking;

// ==========================================
// 导入模板路由
// ==========================================
// 注意: /match 与 /suggest 必须注册在 /{template_id} 之前

#[derive(Debug, Deserialize)]
pub struct HeadersBody {
    pub headers: Vec<String>,
}

pub fn configure_routes() -> Scope {
    scope("/api/templates")
        .route("/match", post().to(match_headers))
        .route("/suggest", post().to(suggest_mappings))
        .route("", get().to(list_templates))
        .route("", post().to(create_template))
        .route("/{template_id}", get().to(get_template))
        .route("/{template_id}", put().to(update_template))
        .route("/{template_id}", delete().to(delete_template))
        .route("/{template_id}/mappings", put().to(update_mappings))
        .route("/{template_id}/history", get().to(template_history))
}

async fn list_templates(state: Data<AppState>) -> ApiResult<HttpResponse> {
    let api = state.template_api.clone();
    let templates = run_blocking(move || api.list_templates()).await?;
    Ok(HttpResponse::Ok().json(templates))
}

async fn get_template(state: Data<AppState>, template_id: Path<String>) -> ApiResult<HttpResponse> {
    let api = state.template_api.clone();
    let template = run_blocking(move || api.get_template(&template_id)).await?;
    Ok(HttpResponse::Ok().json(template))
}

async fn create_template(
    state: Data<AppState>,
    body: Json<ImportTemplateInput>,
) -> ApiResult<HttpResponse> {
    let api = state.template_api.clone();
    let template = run_blocking(move || api.create_template(body.into_inner())).await?;
    Ok(HttpResponse::Created().json(template))
}

async fn update_template(
    state: Data<AppState>,
    template_id: Path<String>,
    body: Json<TemplateMetaUpdate>,
) -> ApiResult<HttpResponse> {
    let api = state.template_api.clone();
    let template =
        run_blocking(move || api.update_template(&template_id, body.into_inner())).await?;
    Ok(HttpResponse::Ok().json(template))
}

async fn update_mappings(
    state: Data<AppState>,
    template_id: Path<String>,
    body: Json<BTreeMap<String, ColumnRole>>,
) -> ApiResult<HttpResponse> {
    let api = state.template_api.clone();
    let template =
        run_blocking(move || api.update_mappings(&template_id, body.into_inner())).await?;
    Ok(HttpResponse::Ok().json(template))
}

async fn delete_template(
    state: Data<AppState>,
    template_id: Path<String>,
) -> ApiResult<HttpResponse> {
    let api = state.template_api.clone();
    run_blocking(move || api.delete_template(&template_id)).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn template_history(
    state: Data<AppState>,
    template_id: Path<String>,
) -> ApiResult<HttpResponse> {
    let api = state.template_api.clone();
    let table = run_blocking(move || api.template_history(&template_id)).await?;
    Ok(HttpResponse::Ok().json(table))
}

async fn match_headers(state: Data<AppState>, body: Json<HeadersBody>) -> ApiResult<HttpResponse> {
    let api = state.template_api.clone();
    let result = run_blocking(move || api.match_headers(body.into_inner().headers)).await?;
    Ok(HttpResponse::Ok().json(result))
}

async fn suggest_mappings(
    state: Data<AppState>,
    body: Json<HeadersBody>,
) -> ApiResult<HttpResponse> {
    let mappings = state.template_api.suggest_mappings(&body.headers);
    Ok(HttpResponse::Ok().json(mappings))
}
