// ==========================================
// 独立音乐人收入看板 - HTTP 服务主入口
// ==========================================
// 流程: 解析启动参数 → 初始化日志 → 打开/迁移数据库 → 构建 AppState → 启动 HTTP 服务
// ==========================================

use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use artist_revenue::app::{self, AppState};
use artist_revenue::config::ServerConfig;
use artist_revenue::logging;
use clap::Parser;
use std::io;

#[actix_web::main]
async fn main() -> io::Result<()> {
    let config = ServerConfig::parse();

    // 初始化日志系统
    logging::init(config.log_format);

    tracing::info!("==================================================");
    tracing::info!("独立音乐人收入看板 - 后端服务");
    tracing::info!("系统版本: {}", artist_revenue::VERSION);
    tracing::info!("==================================================");

    let db_path = config.resolved_db_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    tracing::info!("使用数据库: {}", db_path.display());

    let app_state = AppState::new(
        &db_path.to_string_lossy(),
        config.resolved_upload_dir(),
        config.max_upload_bytes,
    )
    .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    let app_state = web::Data::new(app_state);

    let (host, port) = config.bind_address();
    tracing::info!("HTTP 服务监听 http://{}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(app_state.clone())
            .configure(app::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await?;

    tracing::info!("HTTP 服务已退出");
    Ok(())
}
