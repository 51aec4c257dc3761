//! api-server — HTTP API for the Doctor Directory workspace.
//!
//! Exposes the four directory endpoints over an in-memory store seeded at
//! startup:
//! - GET  /doctors                         list all doctors
//! - GET  /doctors/:doctor_id              one doctor by id
//! - POST /doctors                         create a doctor
//! - GET  /doctors/:doctor_id/locations    the doctor's joined locations
//!
//! Run:
//! ```bash
//! # pretty logs (default); PORT optional
//! cargo run -p api-server
//!
//! # with the corrected (non-inverted) locations join
//! LOCATION_FILTER=matching cargo run -p api-server
//! ```
//!
//! Configuration: See `config.rs` for all environment variables.

mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use domain::adapters::memory_store::InMemoryDirectory;
use domain::{DirectoryError, DirectoryRepository, LocationFilter};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Clone)]
struct AppState {
    store: Arc<InMemoryDirectory>,
    location_filter: LocationFilter,
}

#[tokio::main]
async fn main() {
    // Load and validate config first (fail fast on misconfiguration)
    let cfg = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&cfg);
    cfg.warn_on_startup();

    let state = AppState {
        store: Arc::new(InMemoryDirectory::seeded()),
        location_filter: cfg.location_filter,
    };

    // Request ID header name
    let x_request_id = axum::http::HeaderName::from_static("x-request-id");

    let mut app = router(state)
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid));

    // CORS - already validated in Config::from_env()
    let cors = if cfg.cors_allow_origin == HeaderValue::from_static("*") {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list([cfg.cors_allow_origin]))
            .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
            .allow_headers([axum::http::header::CONTENT_TYPE])
    };
    app = app.layer(cors);

    let addr: SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    info!(%addr, "api-server listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("bind port");
    axum::serve(listener, app).await.expect("server error");
}

fn init_tracing(cfg: &config::Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    match cfg.log_format {
        config::LogFormat::Json => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(fmt::time::SystemTime)
                        .with_writer(std::io::stdout),
                )
                .init();
        }
        config::LogFormat::Pretty => {
            registry
                .with(
                    fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_writer(std::io::stdout),
                )
                .init();
        }
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/doctors", get(list_doctors).post(create_doctor))
        .route("/doctors/:doctor_id", get(get_doctor))
        .route("/doctors/:doctor_id/locations", get(list_doctor_locations))
        .with_state(state)
}

#[derive(Deserialize)]
struct CreateDoctorReq {
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
}

#[derive(Serialize)]
struct CreateDoctorOut {
    id: u64,
}

/// GET /doctors — the full ordered doctor table.
async fn list_doctors(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.list_doctors() {
        Ok(doctors) => (StatusCode::OK, Json(doctors)).into_response(),
        Err(e) => {
            error!(err = ?e, "list error");
            internal_error()
        }
    }
}

/// GET /doctors/:doctor_id — one doctor, 404 when the id is out of range.
async fn get_doctor(
    State(state): State<AppState>,
    Path(doctor_id): Path<i64>,
) -> impl IntoResponse {
    match state.store.get_doctor(doctor_id) {
        Ok(doctor) => (StatusCode::OK, Json(doctor)).into_response(),
        Err(DirectoryError::NotFound) => {
            warn!(doctor_id, "get 404");
            (
                StatusCode::NOT_FOUND,
                Json(http_common::doctor_not_found()),
            )
                .into_response()
        }
        Err(e) => {
            error!(doctor_id, err = ?e, "get error");
            internal_error()
        }
    }
}

/// POST /doctors — append a doctor; replies 200 (not 201) with the new id,
/// preserving the original service's status choice.
async fn create_doctor(
    State(state): State<AppState>,
    body: Result<Json<CreateDoctorReq>, JsonRejection>,
) -> impl IntoResponse {
    let Ok(Json(body)) = body else {
        warn!("create rejected: malformed JSON body");
        return (
            StatusCode::BAD_REQUEST,
            Json(http_common::json_error_detail("Malformed JSON body")),
        )
            .into_response();
    };

    // Presence checks only; no further schema validation is in scope.
    let (Some(first_name), Some(last_name)) = (body.first_name, body.last_name) else {
        warn!("create rejected: missing required field");
        return (
            StatusCode::BAD_REQUEST,
            Json(http_common::missing_required_field()),
        )
            .into_response();
    };

    match state.store.create_doctor(first_name, last_name) {
        Ok(id) => {
            info!(id, "create ok");
            (StatusCode::OK, Json(CreateDoctorOut { id })).into_response()
        }
        Err(e) => {
            error!(err = ?e, "create error");
            internal_error()
        }
    }
}

/// GET /doctors/:doctor_id/locations — the locations joined to the doctor
/// under the configured filter policy.
async fn list_doctor_locations(
    State(state): State<AppState>,
    Path(doctor_id): Path<i64>,
) -> impl IntoResponse {
    match state.store.doctor_locations(doctor_id, state.location_filter) {
        Ok(locations) => (StatusCode::OK, Json(locations)).into_response(),
        Err(DirectoryError::NotFound) => {
            warn!(doctor_id, "locations 404");
            (
                StatusCode::NOT_FOUND,
                Json(http_common::doctor_not_found()),
            )
                .into_response()
        }
        Err(e) => {
            error!(doctor_id, err = ?e, "locations error");
            internal_error()
        }
    }
}

fn internal_error() -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(http_common::json_message("Internal server error")),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::util::ServiceExt;

    fn app(location_filter: LocationFilter) -> Router {
        router(AppState {
            store: Arc::new(InMemoryDirectory::seeded()),
            location_filter,
        })
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn list_doctors_returns_seed_in_order() {
        let resp = app(LocationFilter::Legacy)
            .oneshot(get_req("/doctors"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_json(resp).await,
            serde_json::json!([
                {"id": 0, "first_name": "John", "last_name": "Doe"},
                {"id": 1, "first_name": "Jane", "last_name": "Smith"}
            ])
        );
    }

    #[tokio::test]
    async fn get_doctor_zero() {
        let resp = app(LocationFilter::Legacy)
            .oneshot(get_req("/doctors/0"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_json(resp).await,
            serde_json::json!({"id": 0, "first_name": "John", "last_name": "Doe"})
        );
    }

    #[tokio::test]
    async fn get_doctor_out_of_range_is_404() {
        let resp = app(LocationFilter::Legacy)
            .oneshot(get_req("/doctors/99"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(resp).await,
            serde_json::json!({"message": "Doctor not found"})
        );
    }

    #[tokio::test]
    async fn get_doctor_negative_id_is_404() {
        let resp = app(LocationFilter::Legacy)
            .oneshot(get_req("/doctors/-1"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn get_doctor_non_integer_id_is_rejected_by_router() {
        let resp = app(LocationFilter::Legacy)
            .oneshot(get_req("/doctors/abc"))
            .await
            .unwrap();
        // Path<i64> rejection; never reaches the handler.
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn repeated_gets_are_idempotent() {
        let router = app(LocationFilter::Legacy);
        let first = router.clone().oneshot(get_req("/doctors/1")).await.unwrap();
        let second = router.oneshot(get_req("/doctors/1")).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(second.status(), StatusCode::OK);
        assert_eq!(body_json(first).await, body_json(second).await);
    }

    #[tokio::test]
    async fn create_doctor_assigns_next_id_and_is_resolvable() {
        let router = app(LocationFilter::Legacy);

        let resp = router
            .clone()
            .oneshot(post_json(
                "/doctors",
                r#"{"first_name":"Joe","last_name":"Smith"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, serde_json::json!({"id": 2}));

        let resp = router.oneshot(get_req("/doctors/2")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_json(resp).await,
            serde_json::json!({"id": 2, "first_name": "Joe", "last_name": "Smith"})
        );
    }

    #[tokio::test]
    async fn create_doctor_missing_field_is_400_and_leaves_table_unchanged() {
        let router = app(LocationFilter::Legacy);

        let resp = router
            .clone()
            .oneshot(post_json("/doctors", r#"{"first_name":"Joe"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(resp).await,
            serde_json::json!({"error_detail": "Missing required field"})
        );

        // Length invariant holds: still only the two seeded doctors.
        let resp = router.oneshot(get_req("/doctors")).await.unwrap();
        assert_eq!(body_json(resp).await.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn create_doctor_malformed_json_is_400() {
        let resp = app(LocationFilter::Legacy)
            .oneshot(post_json("/doctors", "not json"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(resp).await,
            serde_json::json!({"error_detail": "Malformed JSON body"})
        );
    }

    #[tokio::test]
    async fn legacy_filter_returns_other_doctors_locations() {
        // Inverted join preserved from the original service: doctor 0 gets
        // the locations of the rows whose doctor_id != 0.
        let resp = app(LocationFilter::Legacy)
            .oneshot(get_req("/doctors/0/locations"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_json(resp).await,
            serde_json::json!([
                {"id": 0, "address": "123 Main St"},
                {"id": 1, "address": "456 Central St"}
            ])
        );
    }

    #[tokio::test]
    async fn matching_filter_returns_requested_doctors_locations() {
        let router = app(LocationFilter::Matching);

        let resp = router
            .clone()
            .oneshot(get_req("/doctors/0/locations"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_json(resp).await,
            serde_json::json!([{"id": 0, "address": "123 Main St"}])
        );

        let resp = router.oneshot(get_req("/doctors/1/locations")).await.unwrap();
        assert_eq!(
            body_json(resp).await,
            serde_json::json!([
                {"id": 0, "address": "123 Main St"},
                {"id": 1, "address": "456 Central St"}
            ])
        );
    }

    #[tokio::test]
    async fn locations_for_unknown_doctor_is_404() {
        let resp = app(LocationFilter::Legacy)
            .oneshot(get_req("/doctors/99/locations"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(resp).await,
            serde_json::json!({"message": "Doctor not found"})
        );
    }
}
