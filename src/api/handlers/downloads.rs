use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::api::response::ApiError;
use crate::AppState;

/// Stream a stored attachment.
/// Route: GET /download/:filename
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let path = state.posts.resolve_attachment(&filename).await?;

    let file = tokio::fs::File::open(&path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ApiError::not_found("File not found")
        } else {
            ApiError::internal(format!("Failed to open file: {e}"))
        }
    })?;
    let byte_size = file.metadata().await.ok().map(|m| m.len());

    let body = Body::from_stream(ReaderStream::new(file));
    let mut response = (StatusCode::OK, body).into_response();
    let headers = response.headers_mut();

    let mime_type = mime_guess::from_path(&filename).first_or_octet_stream();
    headers.insert(
        header::CONTENT_TYPE,
        mime_type
            .as_ref()
            .parse()
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );

    if let Some(byte_size) = byte_size {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(byte_size));
    }

    let disposition = format!("attachment; filename=\"{}\"", filename.replace('"', "_"));
    if let Ok(value) = disposition.parse() {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok(response)
}
