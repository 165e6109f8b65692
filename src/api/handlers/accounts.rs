use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::response::{ApiError, AppJson, JSend};
use crate::api::session::{session_cookie, session_removal, Session};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub username: String,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn register(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CredentialsRequest>,
) -> Result<(StatusCode, Json<JSend<AccountResponse>>), ApiError> {
    if req.username.trim().is_empty() {
        return Err(ApiError::bad_request("username must not be empty"));
    }
    if req.password.is_empty() {
        return Err(ApiError::bad_request("password must not be empty"));
    }

    state
        .credentials
        .register(&req.username, &req.password)
        .await?;

    Ok(JSend::created(AccountResponse {
        username: req.username,
    }))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    AppJson(req): AppJson<CredentialsRequest>,
) -> Result<(CookieJar, Json<JSend<AccountResponse>>), ApiError> {
    let principal = state
        .credentials
        .verify(&req.username, &req.password)
        .await?;
    let token = state.sessions.create(principal.clone()).await?;

    tracing::debug!(username = %principal.username, "Logged in");

    let jar = jar.add(session_cookie(&token, state.config.auth.secure_cookies));
    Ok((
        jar,
        JSend::success(AccountResponse {
            username: principal.username,
        }),
    ))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    session: Session,
) -> (CookieJar, Json<JSend<()>>) {
    if let Some(ref token) = session.token {
        state.sessions.destroy(token).await;
    }

    (jar.remove(session_removal()), JSend::success(()))
}
