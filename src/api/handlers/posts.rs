use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::response::{ApiError, AppJson, JSend};
use crate::api::session::Session;
use crate::attachments::Upload;
use crate::error::BoardError;
use crate::service::NewPost;
use crate::storage::models::{Post, PostPatch};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub author: String,
    pub content: String,
    pub date: String,
    pub files: Vec<String>,
    pub id: Uuid,
    pub title: String,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn list_posts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<Vec<PostResponse>>>, ApiError> {
    let posts = state.posts.list().await?;
    Ok(JSend::success(posts.iter().map(post_to_response).collect()))
}

pub async fn get_post_by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JSend<PostResponse>>, ApiError> {
    let id = parse_id(&id)?;
    let post = state.posts.get_post(id).await?;
    Ok(JSend::success(post_to_response(&post)))
}

pub async fn create_post(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<JSend<PostResponse>>), ApiError> {
    // Refuse before buffering any file bytes
    if session.principal.is_none() {
        return Err(BoardError::Unauthorized.into());
    }

    let limits = state.posts.attachments().limits();
    let mut draft = NewPost::default();
    let mut uploads: Vec<Upload> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart data: {e}")))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "files" | "file" => {
                // Browsers send an empty, unnamed part when no file was chosen
                let original_name = field
                    .file_name()
                    .filter(|name| !name.is_empty())
                    .map(str::to_string);
                let Some(original_name) = original_name else {
                    field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::bad_request(format!("Failed to read file: {e}")))?;
                    continue;
                };

                if uploads.len() >= limits.max_files {
                    return Err(BoardError::TooManyFiles {
                        max: limits.max_files,
                    }
                    .into());
                }

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read file: {e}")))?;

                if data.len() as u64 > limits.max_file_size {
                    return Err(BoardError::FileTooLarge {
                        name: original_name,
                        max: limits.max_file_size,
                    }
                    .into());
                }

                uploads.push(Upload::new(original_name, data));
            }
            "title" => {
                draft.title = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Invalid title: {e}")))?;
            }
            "content" => {
                draft.content = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Invalid content: {e}")))?;
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    let post = state
        .posts
        .create(session.principal.as_ref(), draft, &uploads)
        .await?;

    Ok(JSend::created(post_to_response(&post)))
}

pub async fn update_post_at(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(index): Path<String>,
    AppJson(patch): AppJson<PostPatch>,
) -> Result<Json<JSend<PostResponse>>, ApiError> {
    let index = parse_index(&index)?;
    let post = state
        .posts
        .edit_at(session.principal.as_ref(), index, &patch)
        .await?;
    Ok(JSend::success(post_to_response(&post)))
}

pub async fn update_post_by_id(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<String>,
    AppJson(patch): AppJson<PostPatch>,
) -> Result<Json<JSend<PostResponse>>, ApiError> {
    let id = parse_id(&id)?;
    let post = state
        .posts
        .edit_post(session.principal.as_ref(), id, &patch)
        .await?;
    Ok(JSend::success(post_to_response(&post)))
}

pub async fn delete_post_at(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(index): Path<String>,
) -> Result<Json<JSend<PostResponse>>, ApiError> {
    let index = parse_index(&index)?;
    let post = state
        .posts
        .delete_at(session.principal.as_ref(), index)
        .await?;
    Ok(JSend::success(post_to_response(&post)))
}

pub async fn delete_post_by_id(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<JSend<PostResponse>>, ApiError> {
    let id = parse_id(&id)?;
    let post = state
        .posts
        .delete_post(session.principal.as_ref(), id)
        .await?;
    Ok(JSend::success(post_to_response(&post)))
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_index(raw: &str) -> Result<usize, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request("Invalid post index"))
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found("Post not found"))
}

fn post_to_response(post: &Post) -> PostResponse {
    PostResponse {
        author: post.author.clone(),
        content: post.content.clone(),
        date: post.date.to_rfc3339(),
        files: post.files.clone(),
        id: post.id,
        title: post.title.clone(),
    }
}
