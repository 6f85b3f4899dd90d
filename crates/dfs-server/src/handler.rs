use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Json, Response};
use dfs_store::StoreError;
use serde_json::json;
use tokio::task::spawn_blocking;
use tokio_util::io::ReaderStream;
use tracing::info;

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Multipart field carrying the uploaded file.
pub const UPLOAD_FIELD: &str = "file";

/// POST /dfs/upload
///
/// Streams the `file` part chunk by chunk into a pending upload and commits
/// it under the part's filename. If the client goes away midway the pending
/// upload is dropped, which discards the partial content.
pub async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ServerResult<&'static str> {
    info!("/dfs/upload requested");

    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let name = field
            .file_name()
            .map(str::to_owned)
            .ok_or_else(|| ServerError::BadRequest("file part has no filename".into()))?;

        let store = state.store.clone();
        let mut upload = spawn_blocking(move || store.begin_upload(&name)).await??;

        while let Some(chunk) = field.chunk().await? {
            upload = spawn_blocking(move || {
                upload.write_chunk(&chunk)?;
                Ok::<_, StoreError>(upload)
            })
            .await??;
        }

        let stored = spawn_blocking(move || upload.commit()).await??;
        info!(name = %stored.name, size = stored.size, "file stored");
        return Ok("File uploaded successfully");
    }

    Err(ServerError::BadRequest(format!(
        "missing multipart field `{UPLOAD_FIELD}`"
    )))
}

/// GET /dfs/getfile/:filename
pub async fn download_handler(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ServerResult<Response> {
    info!(%filename, "download requested");

    let store = state.store.clone();
    let lookup = filename.clone();
    let Some((file, stored)) = spawn_blocking(move || store.open_file(&lookup)).await?? else {
        return Err(ServerError::NotFound(filename));
    };

    let stream = ReaderStream::new(tokio::fs::File::from_std(file));
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, stored.size)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition(stored.name.as_str()),
        )
        .body(Body::from_stream(stream))
        .map_err(|e| ServerError::Internal(e.to_string()))
}

/// GET /dfs/file-list
pub async fn list_handler(State(state): State<AppState>) -> ServerResult<Json<Vec<String>>> {
    info!("/dfs/file-list requested");
    let store = state.store.clone();
    let names = spawn_blocking(move || store.list()).await??;
    Ok(Json(names))
}

/// Health check handler.
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Info handler.
pub async fn info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "name": "dfs-server",
        "version": env!("CARGO_PKG_VERSION"),
        "root": state.store.root().display().to_string(),
        "overwrite": state.store.config().overwrite,
    }))
}

/// `Content-Disposition` suggesting the stored name to the recipient.
///
/// Plain ASCII names go in `filename` as-is. Anything else gets an ASCII
/// fallback plus the RFC 5987 `filename*` form.
pub fn content_disposition(name: &str) -> String {
    let plain = name
        .bytes()
        .all(|b| (0x20..0x7f).contains(&b) && b != b'"' && b != b'\\' && b != b'%');
    if plain {
        return format!("attachment; filename=\"{name}\"");
    }

    let fallback: String = name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\' && c != '%') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let mut encoded = String::with_capacity(name.len() * 3);
    for b in name.bytes() {
        if b.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&b) {
            encoded.push(b as char);
        } else {
            encoded.push_str(&format!("%{b:02X}"));
        }
    }
    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}
