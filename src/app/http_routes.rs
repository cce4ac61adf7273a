// ==========================================
// 独立音乐人收入看板 - HTTP 路由（按域拆分）
// ==========================================
// 职责: actix-web 路由定义，连接前端与后端 API
// 约定: 处理函数返回 ApiResult<HttpResponse>，错误统一为 ErrorResponse JSON
// ==========================================

mod assets;
mod catalog;
mod common;
mod config;
mod dashboard;
mod health;
mod import;
mod revenue;
mod templates;

pub use common::{run_blocking, ErrorResponse};

use actix_web::web::ServiceConfig;

/// 注册全部路由与请求体解析配置
pub fn configure(cfg: &mut ServiceConfig) {
    cfg.app_data(common::json_config())
        .app_data(common::query_config())
        .app_data(common::path_config())
        .service(health::configure_routes())
        .service(revenue::configure_source_routes())
        .service(revenue::configure_entry_routes())
        .service(catalog::configure_artist_routes())
        .service(catalog::configure_album_routes())
        .service(catalog::configure_track_routes())
        .service(catalog::configure_campaign_routes())
        .service(templates::configure_routes())
        .service(import::configure_routes())
        .service(assets::configure_routes())
        .service(dashboard::configure_routes())
        .service(config::configure_routes());
}
