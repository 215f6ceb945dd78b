mod import;
mod jobs;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use carbridge_import::ImportCoordinator;

use crate::middleware::{request_id, require_session_auth, AuthState};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub importer: Arc<ImportCoordinator>,
}

/// Uniform failure body. The dashboard keys off `success` and displays
/// `error`, so every failure answers with this one shape.
#[derive(Debug, Serialize)]
struct FailureBody {
    success: bool,
    error: String,
}

/// A failed request: the HTTP status plus the message for the failure body.
#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    message: String,
}

impl ApiFailure {
    pub(super) fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub(super) fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(FailureBody {
                success: false,
                error: self.message,
            }),
        )
            .into_response()
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthBody {
    status: &'static str,
    database: &'static str,
}

pub(super) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(20).clamp(1, 100)
}

pub(super) fn map_db_error(error: &carbridge_db::DbError) -> ApiFailure {
    match error {
        carbridge_db::DbError::NotFound => ApiFailure::not_found("Not found"),
        other => {
            tracing::error!(error = %other, "database query failed");
            ApiFailure::internal("database query failed")
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/import", post(import::submit_import))
        .route("/api/v1/import/jobs", get(jobs::list_jobs))
        .route("/api/v1/import/jobs/{job_id}", get(jobs::get_job))
        .layer(axum::middleware::from_fn_with_state(
            auth,
            require_session_auth,
        ))
}

pub fn build_app(state: AppState, auth: AuthState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match carbridge_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthBody {
                status: "ok",
                database: "ok",
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthBody {
                    status: "degraded",
                    database: "unavailable",
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use axum::body::{to_bytes, Body};
    use axum::http::{HeaderValue, Request};
    use rust_decimal::Decimal;
    use serde_json::json;
    use tower::ServiceExt;
    use uuid::Uuid;

    use carbridge_encar::{FixtureExtractor, ListingExtractor, RateProvider, RateProviderConfig};
    use carbridge_import::ImportConfig;

    const SONATA_URL: &str = "https://fem.encar.com/cars/detail/38526217";
    const CATALOG_URL: &str =
        "https://www.encar.com/dc/dc_carsearchlist.do?method=sellcar&sellid=102938";

    fn fixture_importer(pool: &sqlx::PgPool) -> Arc<ImportCoordinator> {
        let rates = RateProvider::new(RateProviderConfig {
            endpoint: None,
            fallback_rate: Decimal::from(1300),
            refresh_secs: 3600,
        })
        .expect("rate provider");
        let extractor: Arc<dyn ListingExtractor> =
            Arc::new(FixtureExtractor::new(Arc::new(rates)));
        Arc::new(ImportCoordinator::new(
            pool.clone(),
            extractor,
            ImportConfig { timeout_secs: 30 },
        ))
    }

    /// App with auth disabled; every request runs as the dev dealer.
    fn open_app(pool: sqlx::PgPool) -> Router {
        let importer = fixture_importer(&pool);
        let auth = AuthState::from_env(true).expect("auth");
        build_app(AppState { pool, importer }, auth)
    }

    /// App with one session token mapped to the given dealer.
    fn token_app(pool: sqlx::PgPool, token: &str, dealer: Uuid) -> Router {
        let importer = fixture_importer(&pool);
        let auth = AuthState::with_sessions(HashMap::from([(token.to_owned(), dealer)]));
        build_app(AppState { pool, importer }, auth)
    }

    fn import_request(body: &serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/import")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&body).expect("json parse")
    }

    #[test]
    fn normalize_limit_applies_defaults_and_bounds() {
        assert_eq!(normalize_limit(None), 20);
        assert_eq!(normalize_limit(Some(0)), 1);
        assert_eq!(normalize_limit(Some(1_000)), 100);
        assert_eq!(normalize_limit(Some(37)), 37);
    }

    #[tokio::test]
    async fn api_failure_answers_with_uniform_body() {
        let response = ApiFailure::bad_request("nope").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["success"], serde_json::Value::Bool(false));
        assert_eq!(json["error"].as_str(), Some("nope"));
    }

    // -------------------------------------------------------------------------
    // POST /api/v1/import
    // -------------------------------------------------------------------------

    #[sqlx::test(migrations = "../../migrations")]
    async fn import_endpoint_imports_a_single_listing(pool: sqlx::PgPool) {
        let app = open_app(pool.clone());
        let response = app
            .oneshot(import_request(&json!({ "type": "single", "url": SONATA_URL })))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], serde_json::Value::Bool(true));
        assert_eq!(json["imported"].as_i64(), Some(1));
        assert_eq!(json["failed"].as_i64(), Some(0));
        assert!(
            json["importJobId"].as_str().is_some(),
            "job id should be present"
        );
        assert!(
            json.get("errors").is_none(),
            "a clean run omits the errors array"
        );

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM car_listings")
            .fetch_one(&pool)
            .await
            .expect("count listings");
        assert_eq!(count, 1);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn import_endpoint_reports_duplicates_in_errors(pool: sqlx::PgPool) {
        let app = open_app(pool.clone());
        let body = json!({ "type": "single", "url": SONATA_URL });

        let first = app
            .clone()
            .oneshot(import_request(&body))
            .await
            .expect("first response");
        assert_eq!(first.status(), StatusCode::OK);

        let second = app
            .oneshot(import_request(&body))
            .await
            .expect("second response");
        assert_eq!(second.status(), StatusCode::OK, "a duplicate is not a request failure");
        let json = body_json(second).await;
        assert_eq!(json["imported"].as_i64(), Some(0));
        assert_eq!(json["failed"].as_i64(), Some(1));
        assert_eq!(json["errors"][0]["car_id"].as_str(), Some("38526217"));
        assert_eq!(
            json["errors"][0]["error"].as_str(),
            Some("Duplicate listing - already imported")
        );
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn import_endpoint_rejects_missing_fields(pool: sqlx::PgPool) {
        let app = open_app(pool.clone());
        let response = app
            .oneshot(import_request(&json!({ "type": "single" })))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["success"], serde_json::Value::Bool(false));
        assert_eq!(json["error"].as_str(), Some("Missing required parameters"));

        let jobs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM import_jobs")
            .fetch_one(&pool)
            .await
            .expect("count jobs");
        assert_eq!(jobs, 0, "validation failures must not leave job rows");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn import_endpoint_rejects_unknown_type(pool: sqlx::PgPool) {
        let app = open_app(pool);
        let response = app
            .oneshot(import_request(
                &json!({ "type": "wholesale", "url": SONATA_URL }),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(
            json["error"].as_str(),
            Some("Invalid import type: wholesale")
        );
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn import_endpoint_rejects_mismatched_url(pool: sqlx::PgPool) {
        let app = open_app(pool.clone());
        let response = app
            .oneshot(import_request(&json!({ "type": "single", "url": CATALOG_URL })))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"].as_str(), Some("Invalid Encar listing URL"));

        let jobs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM import_jobs")
            .fetch_one(&pool)
            .await
            .expect("count jobs");
        assert_eq!(jobs, 0);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn import_endpoint_rejects_malformed_json(pool: sqlx::PgPool) {
        let app = open_app(pool);
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/import")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .expect("request");

        let response = app.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["success"], serde_json::Value::Bool(false));
        assert!(
            json["error"].as_str().is_some_and(|e| !e.is_empty()),
            "the parse failure should be reported"
        );
    }

    // -------------------------------------------------------------------------
    // Session auth
    // -------------------------------------------------------------------------

    #[sqlx::test(migrations = "../../migrations")]
    async fn session_auth_rejects_missing_and_unknown_tokens(pool: sqlx::PgPool) {
        let app = token_app(pool, "s3cr3t", Uuid::new_v4());
        let body = json!({ "type": "single", "url": SONATA_URL });

        let anonymous = app
            .clone()
            .oneshot(import_request(&body))
            .await
            .expect("response");
        assert_eq!(anonymous.status(), StatusCode::BAD_REQUEST);
        let json = body_json(anonymous).await;
        assert_eq!(json["success"], serde_json::Value::Bool(false));
        assert_eq!(json["error"].as_str(), Some("Unauthorized"));

        let mut request = import_request(&body);
        request.headers_mut().insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer wrong"),
        );
        let unknown = app.oneshot(request).await.expect("response");
        assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn session_auth_resolves_the_calling_dealer(pool: sqlx::PgPool) {
        let dealer = Uuid::new_v4();
        let app = token_app(pool.clone(), "s3cr3t", dealer);

        let mut request = import_request(&json!({ "type": "single", "url": SONATA_URL }));
        request.headers_mut().insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer s3cr3t"),
        );
        let response = app.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let owner: Uuid =
            sqlx::query_scalar("SELECT user_id FROM car_listings WHERE encar_id = '38526217'")
                .fetch_one(&pool)
                .await
                .expect("listing owner");
        assert_eq!(owner, dealer, "the listing belongs to the token's dealer");
    }

    // -------------------------------------------------------------------------
    // Job polling, health, CORS
    // -------------------------------------------------------------------------

    #[sqlx::test(migrations = "../../migrations")]
    async fn job_endpoints_return_the_callers_jobs(pool: sqlx::PgPool) {
        let app = open_app(pool.clone());
        let imported = app
            .clone()
            .oneshot(import_request(&json!({ "type": "bulk", "url": CATALOG_URL })))
            .await
            .expect("import response");
        let job_id = body_json(imported).await["importJobId"]
            .as_str()
            .expect("job id")
            .to_owned();

        let listed = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/import/jobs")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("list response");
        assert_eq!(listed.status(), StatusCode::OK);
        let jobs = body_json(listed).await;
        let jobs = jobs.as_array().expect("jobs array");
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0]["id"].as_str(), Some(job_id.as_str()));

        let detail = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/v1/import/jobs/{job_id}"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("detail response");
        assert_eq!(detail.status(), StatusCode::OK);
        let job = body_json(detail).await;
        assert_eq!(job["status"].as_str(), Some("completed"));
        assert_eq!(job["total_items"].as_i64(), Some(2));
        assert_eq!(job["imported_car_ids"].as_array().map(Vec::len), Some(2));

        let missing = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/v1/import/jobs/{}", Uuid::new_v4()))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("missing response");
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        let body = body_json(missing).await;
        assert_eq!(body["success"], serde_json::Value::Bool(false));
        assert_eq!(body["error"].as_str(), Some("Not found"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn health_endpoint_reports_ok(pool: sqlx::PgPool) {
        let app = open_app(pool);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"].as_str(), Some("ok"));
        assert_eq!(json["database"].as_str(), Some("ok"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn preflight_requests_are_answered(pool: sqlx::PgPool) {
        let app = open_app(pool);
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/v1/import")
            .header(header::ORIGIN, "https://dashboard.example.com")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .expect("request");

        let response = app.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK, "preflight must not hit auth");
        assert!(response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn responses_echo_the_request_id(pool: sqlx::PgPool) {
        let app = open_app(pool);
        let request = Request::builder()
            .uri("/api/v1/health")
            .header("x-request-id", "req-123")
            .body(Body::empty())
            .expect("request");

        let response = app.oneshot(request).await.expect("response");
        assert_eq!(
            response
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok()),
            Some("req-123")
        );
    }
}
