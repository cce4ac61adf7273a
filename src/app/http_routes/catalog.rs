use actix_web::web::{delete, get, post, put, scope, Data, Json, Path, Query};
use actix_web::{HttpResponse, Scope};
use serde::Deserialize;

use crate::api::error::ApiResult;
use crate::app::state::AppState;
use crate::domain::catalog::{AlbumInput, ArtistInput, CampaignInput, TrackInput};

use super::common::run_blocking;

// ==========================================
// 作品目录路由
// ==========================================
// 列表过滤: albums / campaigns 按 ?artist_id，tracks 按 ?album_id

#[derive(Debug, Deserialize)]
pub struct ArtistQuery {
    pub artist_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AlbumQuery {
    pub album_id: Option<String>,
}

pub fn configure_artist_routes() -> Scope {
    scope("/api/artists")
        .route("", get().to(list_artists))
        .route("", post().to(create_artist))
        .route("/{artist_id}", get().to(get_artist))
        .route("/{artist_id}", put().to(update_artist))
        .route("/{artist_id}", delete().to(delete_artist))
}

pub fn configure_album_routes() -> Scope {
    scope("/api/albums")
        .route("", get().to(list_albums))
        .route("", post().to(create_album))
        .route("/{album_id}", get().to(get_album))
        .route("/{album_id}", put().to(update_album))
        .route("/{album_id}", delete().to(delete_album))
}

pub fn configure_track_routes() -> Scope {
    scope("/api/tracks")
        .route("", get().to(list_tracks))
        .route("", post().to(create_track))
        .route("/{track_id}", get().to(get_track))
        .route("/{track_id}", put().to(update_track))
        .route("/{track_id}", delete().to(delete_track))
}

pub fn configure_campaign_routes() -> Scope {
    scope("/api/campaigns")
        .route("", get().to(list_campaigns))
        .route("", post().to(create_campaign))
        .route("/{campaign_id}", get().to(get_campaign))
        .route("/{campaign_id}", put().to(update_campaign))
        .route("/{campaign_id}", delete().to(delete_campaign))
}

// ===== Artist =====

async fn list_artists(state: Data<AppState>) -> ApiResult<HttpResponse> {
    let api = state.catalog_api.clone();
    let artists = run_blocking(move || api.list_artists()).await?;
    Ok(HttpResponse::Ok().json(artists))
}

async fn get_artist(state: Data<AppState>, artist_id: Path<String>) -> ApiResult<HttpResponse> {
    let api = state.catalog_api.clone();
    let artist = run_blocking(move || api.get_artist(&artist_id)).await?;
    Ok(HttpResponse::Ok().json(artist))
}

async fn create_artist(state: Data<AppState>, body: Json<ArtistInput>) -> ApiResult<HttpResponse> {
    let api = state.catalog_api.clone();
    let artist = run_blocking(move || api.create_artist(body.into_inner())).await?;
    Ok(HttpResponse::Created().json(artist))
}

async fn update_artist(
    state: Data<AppState>,
    artist_id: Path<String>,
    body: Json<ArtistInput>,
) -> ApiResult<HttpResponse> {
    let api = state.catalog_api.clone();
    let artist = run_blocking(move || api.update_artist(&artist_id, body.into_inner())).await?;
    Ok(HttpResponse::Ok().json(artist))
}

async fn delete_artist(state: Data<AppState>, artist_id: Path<String>) -> ApiResult<HttpResponse> {
    let api = state.catalog_api.clone();
    run_blocking(move || api.delete_artist(&artist_id)).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ===== Album =====

async fn list_albums(state: Data<AppState>, query: Query<ArtistQuery>) -> ApiResult<HttpResponse> {
    let api = state.catalog_api.clone();
    let albums = run_blocking(move || api.list_albums(query.artist_id.as_deref())).await?;
    Ok(HttpResponse::Ok().json(albums))
}

async fn get_album(state: Data<AppState>, album_id: Path<String>) -> ApiResult<HttpResponse> {
    let api = state.catalog_api.clone();
    let album = run_blocking(move || api.get_album(&album_id)).await?;
    Ok(HttpResponse::Ok().json(album))
}

async fn create_album(state: Data<AppState>, body: Json<AlbumInput>) -> ApiResult<HttpResponse> {
    let api = state.catalog_api.clone();
    let album = run_blocking(move || api.create_album(body.into_inner())).await?;
    Ok(HttpResponse::Created().json(album))
}

async fn update_album(
    state: Data<AppState>,
    album_id: Path<String>,
    body: Json<AlbumInput>,
) -> ApiResult<HttpResponse> {
    let api = state.catalog_api.clone();
    let album = run_blocking(move || api.update_album(&album_id, body.into_inner())).await?;
    Ok(HttpResponse::Ok().json(album))
}

async fn delete_album(state: Data<AppState>, album_id: Path<String>) -> ApiResult<HttpResponse> {
    let api = state.catalog_api.clone();
    run_blocking(move || api.delete_album(&album_id)).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ===== Track =====

async fn list_tracks(state: Data<AppState>, query: Query<AlbumQuery>) -> ApiResult<HttpResponse> {
    let api = state.catalog_api.clone();
    let tracks = run_blocking(move || api.list_tracks(query.album_id.as_deref())).await?;
    Ok(HttpResponse::Ok().json(tracks))
}

async fn get_track(state: Data<AppState>, track_id: Path<String>) -> ApiResult<HttpResponse> {
    let api = state.catalog_api.clone();
    let track = run_blocking(move || api.get_track(&track_id)).await?;
    Ok(HttpResponse::Ok().json(track))
}

async fn create_track(state: Data<AppState>, body: Json<TrackInput>) -> ApiResult<HttpResponse> {
    let api = state.catalog_api.clone();
    let track = run_blocking(move || api.create_track(body.into_inner())).await?;
    Ok(HttpResponse::Created().json(track))
}

async fn update_track(
    state: Data<AppState>,
    track_id: Path<String>,
    body: Json<TrackInput>,
) -> ApiResult<HttpResponse> {
    let api = state.catalog_api.clone();
    let track = run_blocking(move || api.update_track(&track_id, body.into_inner())).await?;
    Ok(HttpResponse::Ok().json(track))
}

async fn delete_track(state: Data<AppState>, track_id: Path<String>) -> ApiResult<HttpResponse> {
    let api = state.catalog_api.clone();
    run_blocking(move || api.delete_track(&track_id)).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ===== Campaign =====

async fn list_campaigns(
    state: Data<AppState>,
    query: Query<ArtistQuery>,
) -> ApiResult<HttpResponse> {
    let api = state.catalog_api.clone();
    let campaigns = run_blocking(move || api.list_campaigns(query.artist_id.as_deref())).await?;
    Ok(HttpResponse::Ok().json(campaigns))
}

async fn get_campaign(state: Data<AppState>, campaign_id: Path<String>) -> ApiResult<HttpResponse> {
    let api = state.catalog_api.clone();
    let campaign = run_blocking(move || api.get_campaign(&campaign_id)).await?;
    Ok(HttpResponse::Ok().json(campaign))
}

async fn create_campaign(
    state: Data<AppState>,
    body: Json<CampaignInput>,
) -> ApiResult<HttpResponse> {
    let api = state.catalog_api.clone();
    let campaign = run_blocking(move || api.create_campaign(body.into_inner())).await?;
    Ok(HttpResponse::Created().json(campaign))
}

async fn update_campaign(
    state: Data<AppState>,
    campaign_id: Path<String>,
    body: Json<CampaignInput>,
) -> ApiResult<HttpResponse> {
    let api = state.catalog_api.clone();
    let campaign =
        run_blocking(move || api.update_campaign(&campaign_id, body.into_inner())).await?;
    Ok(HttpResponse::Ok().json(campaign))
}

async fn delete_campaign(
    state: Data<AppState>,
    campaign_id: Path<String>,
) -> ApiResult<HttpResponse> {
    let api = state.catalog_api.clone();
    run_blocking(move || api.delete_campaign(&campaign_id)).await?;
    Ok(HttpResponse::NoContent().finish())
}
