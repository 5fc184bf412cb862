//! Session cookie store endpoints.
//!
//! Two cookies, written and cleared only here: `session-token` (`HttpOnly`,
//! proof of identity for server-verified calls) and `session-email` (client
//! readable, the guard's fast-path allow-list hint). Writes follow
//! last-write-wins; the only writers are the authenticated identity's own
//! client through these two endpoints.

use axum::{
    extract::Extension,
    http::{
        header::{InvalidHeaderValue, COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, instrument};
use utoipa::ToSchema;

use crate::piscina::{
    envelope::{self, EnvelopeError},
    handlers::valid_email,
    state::{GatewayConfig, GatewayState},
};

pub(crate) const TOKEN_COOKIE_NAME: &str = "session-token";
pub(crate) const EMAIL_COOKIE_NAME: &str = "session-email";

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct IssueRequest {
    pub token: String,
    /// Companion value for the guard's fast-path check; the token is opaque
    /// to this service, so the client supplies the email alongside it.
    pub email: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[utoipa::path(
    post,
    path = "/auth/session/issue",
    request_body = IssueRequest,
    responses(
        (status = 204, description = "Session cookies set"),
        (status = 400, description = "Missing token or malformed email"),
        (status = 500, description = "Internal failure", body = ErrorResponse),
        (status = 504, description = "Handler budget exceeded", body = ErrorResponse)
    ),
    tag = "session"
)]
#[instrument(skip_all)]
pub async fn issue(
    state: Extension<Arc<GatewayState>>,
    payload: Option<Json<IssueRequest>>,
) -> impl IntoResponse {
    let request: IssueRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    if request.token.is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing token".to_string()).into_response();
    }

    if let Some(email) = request.email.as_deref() {
        if !valid_email(email) {
            return (StatusCode::BAD_REQUEST, "Invalid email".to_string()).into_response();
        }
    }

    let config = state.config().clone();
    let outcome = envelope::with_budget(config.handler_budget(), async move {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, session_cookie(&config, &request.token)?);
        if let Some(email) = request.email.as_deref() {
            headers.append(SET_COOKIE, email_cookie(&config, email)?);
        }
        Ok(headers)
    })
    .await;

    match outcome {
        Ok(outcome) => (StatusCode::NO_CONTENT, outcome.result).into_response(),
        Err(err) => envelope_response(&err, state.config().dev_mode()),
    }
}

#[utoipa::path(
    post,
    path = "/auth/session/revoke",
    responses(
        (status = 204, description = "Session cookies cleared"),
        (status = 500, description = "Internal failure", body = ErrorResponse),
        (status = 504, description = "Handler budget exceeded", body = ErrorResponse)
    ),
    tag = "session"
)]
#[instrument(skip_all)]
pub async fn revoke(state: Extension<Arc<GatewayState>>) -> impl IntoResponse {
    let config = state.config().clone();
    let outcome = envelope::with_budget(config.handler_budget(), async move {
        // Always clear both cookies, even if no session was present.
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, clear_session_cookie(&config)?);
        headers.append(SET_COOKIE, clear_email_cookie(&config)?);
        Ok(headers)
    })
    .await;

    match outcome {
        Ok(outcome) => (StatusCode::NO_CONTENT, outcome.result).into_response(),
        Err(err) => envelope_response(&err, state.config().dev_mode()),
    }
}

fn envelope_response(err: &EnvelopeError, dev_mode: bool) -> axum::response::Response {
    match err {
        EnvelopeError::Timeout { .. } => {
            error!("session handler exceeded its budget: {err}");
            (
                StatusCode::GATEWAY_TIMEOUT,
                Json(ErrorResponse {
                    error: "timeout".to_string(),
                    detail: None,
                }),
            )
                .into_response()
        }
        EnvelopeError::Internal { message } => {
            error!("session handler failed: {message}");
            // Details leave the process only in development mode.
            let detail = dev_mode.then(|| message.clone());
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "internal".to_string(),
                    detail,
                }),
            )
                .into_response()
        }
    }
}

/// Build the secure `HttpOnly` cookie for the session token.
fn session_cookie(config: &GatewayConfig, token: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    let ttl_seconds = config.token_cookie_ttl_seconds();
    let mut cookie = format!(
        "{TOKEN_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}"
    );
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Build the client-readable email companion cookie.
fn email_cookie(config: &GatewayConfig, email: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    let ttl_seconds = config.email_cookie_ttl_seconds();
    HeaderValue::from_str(&format!(
        "{EMAIL_COOKIE_NAME}={email}; Path=/; SameSite=Lax; Max-Age={ttl_seconds}"
    ))
}

fn clear_session_cookie(config: &GatewayConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{TOKEN_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn clear_email_cookie(_config: &GatewayConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format!(
        "{EMAIL_COOKIE_NAME}=; Path=/; SameSite=Lax; Max-Age=0"
    ))
}

/// Read one cookie's value from a request's `Cookie` header.
pub(crate) fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == name {
            return Some(val.to_string());
        }
    }
    None
}
