use actix_multipart::{Field, Multipart, MultipartError};
use actix_web::web::{post, scope, Data, Path};
use actix_web::{HttpResponse, Scope};
use futures_util::StreamExt;
use serde::Deserialize;
use std::path::PathBuf;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::app::state::AppState;
use crate::importer::file_parser::SpreadsheetFormat;
use crate::importer::{ImportOutcome, ImportRequest};

use super::common::run_blocking;

// ==========================================
// 表格导入路由（multipart/form-data）
// ==========================================
// - preview: file
// - upload:  json (ImportRequest) + file
// - annex:   file [+ json (AnnexOptions)]
// 上传文件流式写入暂存目录，超过上限立即中止；请求结束后删除

/// json 字段上限（请求参数，不含文件）
const MAX_JSON_FIELD_BYTES: usize = 64 * 1024;

#[derive(Debug, Default, Deserialize)]
pub struct AnnexOptions {
    pub extract_assets: Option<bool>,
}

pub fn configure_routes() -> Scope {
    scope("/api/import")
        .route("/preview", post().to(preview))
        .route("/upload", post().to(upload))
        .route("/annex/{entry_id}", post().to(annex))
}

async fn preview(state: Data<AppState>, payload: Multipart) -> ApiResult<HttpResponse> {
    let form = read_upload_form(&state, payload).await?;
    let staged = form.require_file()?;

    let api = state.import_api.clone();
    let path = staged.path.clone();
    let report = run_blocking(move || api.preview_file(&path)).await?;
    Ok(HttpResponse::Ok().json(report))
}

async fn upload(state: Data<AppState>, payload: Multipart) -> ApiResult<HttpResponse> {
    let form = read_upload_form(&state, payload).await?;
    let request: ImportRequest = match &form.json {
        Some(bytes) => serde_json::from_slice(bytes)
            .map_err(|e| ApiError::InvalidInput(format!("导入参数格式错误: {}", e)))?,
        None => return Err(ApiError::InvalidInput("缺少 json 字段（导入参数）".to_string())),
    };
    let staged = form.require_file()?;

    let api = state.import_api.clone();
    let path = staged.path.clone();
    let filename = staged.original_filename.clone();
    let outcome = run_blocking(move || api.import_file(&path, &filename, &request)).await?;

    Ok(match outcome {
        ImportOutcome::Imported(_) => HttpResponse::Created().json(outcome),
        ImportOutcome::TemplateRequired { .. } => HttpResponse::Ok().json(outcome),
    })
}

async fn annex(
    state: Data<AppState>,
    entry_id: Path<String>,
    payload: Multipart,
) -> ApiResult<HttpResponse> {
    let form = read_upload_form(&state, payload).await?;
    let options: AnnexOptions = match &form.json {
        Some(bytes) => serde_json::from_slice(bytes)
            .map_err(|e| ApiError::InvalidInput(format!("追加参数格式错误: {}", e)))?,
        None => AnnexOptions::default(),
    };
    let staged = form.require_file()?;

    let api = state.import_api.clone();
    let path = staged.path.clone();
    let filename = staged.original_filename.clone();
    let outcome = run_blocking(move || {
        api.annex_file(&entry_id, &path, &filename, options.extract_assets)
    })
    .await?;
    Ok(HttpResponse::Ok().json(outcome))
}

// ==========================================
// multipart 读取
// ==========================================

/// 暂存的上传文件（离开作用域时删除）
struct StagedUpload {
    path: PathBuf,
    original_filename: String,
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "暂存文件删除失败");
            }
        }
    }
}

struct UploadForm {
    json: Option<Vec<u8>>,
    file: Option<StagedUpload>,
}

impl UploadForm {
    fn require_file(&self) -> ApiResult<&StagedUpload> {
        self.file
            .as_ref()
            .ok_or_else(|| ApiError::InvalidInput("缺少 file 字段".to_string()))
    }
}

fn multipart_error(err: MultipartError) -> ApiError {
    ApiError::InvalidInput(format!("上传数据读取失败: {}", err))
}

fn staging_error(err: std::io::Error) -> ApiError {
    ApiError::InternalError(format!("上传文件暂存失败: {}", err))
}

fn extension_of(format: SpreadsheetFormat) -> &'static str {
    match format {
        SpreadsheetFormat::Csv => "csv",
        SpreadsheetFormat::Xls => "xls",
        SpreadsheetFormat::Xlsx => "xlsx",
    }
}

async fn read_upload_form(state: &AppState, mut payload: Multipart) -> ApiResult<UploadForm> {
    let api = state.import_api.clone();
    let limit = run_blocking(move || Ok(api.max_upload_bytes())).await?;

    let mut form = UploadForm {
        json: None,
        file: None,
    };

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(multipart_error)?;
        let field_name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));

        match field_name.as_deref() {
            Some("file") => {
                let original_filename = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
                    .unwrap_or_default();
                let format = state.import_api.check_filename(&original_filename)?;
                let staged = StagedUpload {
                    path: state
                        .upload_dir
                        .join(format!("{}.{}", Uuid::new_v4(), extension_of(format))),
                    original_filename,
                };
                let size = stream_to_file(&mut field, &staged, limit).await?;
                debug!(
                    file = %staged.original_filename,
                    size,
                    path = %staged.path.display(),
                    "上传文件已暂存"
                );
                form.file = Some(staged);
            }
            Some("json") => {
                let mut bytes = Vec::new();
                while let Some(chunk) = field.next().await {
                    bytes.extend_from_slice(&chunk.map_err(multipart_error)?);
                    if bytes.len() > MAX_JSON_FIELD_BYTES {
                        return Err(ApiError::InvalidInput("json 字段过大".to_string()));
                    }
                }
                form.json = Some(bytes);
            }
            other => {
                debug!(field = ?other, "忽略未知 multipart 字段");
            }
        }
    }

    Ok(form)
}

/// 流式写入暂存文件，返回写入字节数
///
/// 超过上限时返回 PayloadTooLarge，已写入部分随 StagedUpload 一并删除
async fn stream_to_file(field: &mut Field, staged: &StagedUpload, limit: u64) -> ApiResult<u64> {
    let mut file = File::create(&staged.path).await.map_err(staging_error)?;
    let mut written: u64 = 0;

    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(multipart_error)?;
        written += chunk.len() as u64;
        if written > limit {
            return Err(ApiError::PayloadTooLarge {
                size: written,
                limit,
            });
        }
        file.write_all(&chunk).await.map_err(staging_error)?;
    }

    file.flush().await.map_err(staging_error)?;
    Ok(written)
}
