use actix_web::{web, HttpResponse, Scope};

// ==========================================
// 健康检查
// ==========================================

pub fn configure_routes() -> Scope {
    web::scope("/health").route("", web::get().to(health))
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "app": crate::APP_NAME,
        "version": crate::VERSION,
    }))
}
