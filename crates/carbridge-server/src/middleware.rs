use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

/// Dealer id every request runs as when auth is disabled in development.
const DEV_DEALER_ID: Uuid = Uuid::nil();

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// The dealer account resolved for an authenticated request, stored as a
/// request extension by [`require_session_auth`].
#[derive(Debug, Clone, Copy)]
pub struct Dealer(pub Uuid);

/// Session-token auth settings used by middleware.
#[derive(Debug, Clone)]
pub struct AuthState {
    sessions: Arc<HashMap<String, Uuid>>,
    pub enabled: bool,
}

impl AuthState {
    /// Builds auth config from `CARBRIDGE_SESSION_TOKENS`, a comma-separated
    /// list of `token:dealer-uuid` pairs.
    ///
    /// In development, empty/missing tokens disable auth so local requests
    /// run as a fixed dev dealer. In non-development envs, empty/missing
    /// tokens fail startup.
    pub fn from_env(is_development: bool) -> anyhow::Result<Self> {
        let raw = std::env::var("CARBRIDGE_SESSION_TOKENS").unwrap_or_default();
        let sessions = parse_sessions(&raw)?;

        if sessions.is_empty() {
            if is_development {
                tracing::warn!(
                    "CARBRIDGE_SESSION_TOKENS not set; session auth disabled in development environment"
                );
                return Ok(Self::disabled());
            }

            anyhow::bail!(
                "CARBRIDGE_SESSION_TOKENS is required outside development; provide comma-separated token:dealer-uuid pairs"
            );
        }

        Ok(Self::with_sessions(sessions))
    }

    pub(crate) fn with_sessions(sessions: HashMap<String, Uuid>) -> Self {
        Self {
            sessions: Arc::new(sessions),
            enabled: true,
        }
    }

    fn disabled() -> Self {
        Self {
            sessions: Arc::new(HashMap::new()),
            enabled: false,
        }
    }

    fn resolve(&self, token: &str) -> Option<Uuid> {
        self.sessions.get(token).copied()
    }
}

/// Parses `token:dealer-uuid` pairs; entries are never echoed back whole so
/// a malformed one does not leak the token into logs or error text.
fn parse_sessions(raw: &str) -> anyhow::Result<HashMap<String, Uuid>> {
    let mut sessions = HashMap::new();

    for (index, entry) in raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .enumerate()
    {
        let Some((token, dealer)) = entry.split_once(':') else {
            anyhow::bail!("CARBRIDGE_SESSION_TOKENS entry {index} is not a token:dealer-uuid pair");
        };
        let dealer: Uuid = dealer.trim().parse().map_err(|_| {
            anyhow::anyhow!("CARBRIDGE_SESSION_TOKENS entry {index} has an invalid dealer UUID")
        })?;
        sessions.insert(token.trim().to_owned(), dealer);
    }

    Ok(sessions)
}

#[derive(Debug, Serialize)]
struct AuthFailureBody {
    success: bool,
    error: &'static str,
}

impl IntoResponse for AuthFailureBody {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(self)).into_response()
    }
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware resolving the calling dealer from a Bearer session token.
///
/// The dashboard that consumes this API treats every failure as a 400, auth
/// included, so a missing or unknown token answers 400 rather than 401.
pub async fn require_session_auth(
    State(auth): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    if !auth.enabled {
        req.extensions_mut().insert(Dealer(DEV_DEALER_ID));
        return next.run(req).await;
    }

    let dealer = extract_bearer_token(req.headers().get(AUTHORIZATION))
        .and_then(|token| auth.resolve(token));

    match dealer {
        Some(dealer) => {
            req.extensions_mut().insert(Dealer(dealer));
            next.run(req).await
        }
        None => AuthFailureBody {
            success: false,
            error: "Unauthorized",
        }
        .into_response(),
    }
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|s| !s.trim().is_empty())
}
