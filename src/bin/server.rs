use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use panel_optimizer::catalog::{BoardSize, Catalog, ColorSwatch, PriceTable};
use panel_optimizer::config::ServiceConfig;
use panel_optimizer::error::{ErrorKind, OptimizeError};
use panel_optimizer::request::CuttingRequest;
use panel_optimizer::{CuttingResult, Limits, optimize};
use serde::Serialize;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

struct AppState {
    catalog: Catalog,
    limits: Limits,
}

#[derive(Debug, Serialize)]
struct ApiError {
    #[serde(skip)]
    status: StatusCode,
    kind: String,
    message: String,
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::ValidationError
        | ErrorKind::InsufficientSuppliedBoards
        | ErrorKind::UnknownCatalogKey => StatusCode::BAD_REQUEST,
        ErrorKind::InfeasiblePiece | ErrorKind::InsufficientStock => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ErrorKind::RequestTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        ErrorKind::InvariantViolation => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<OptimizeError> for ApiError {
    fn from(err: OptimizeError) -> Self {
        let kind = err.kind();
        if kind == ErrorKind::InvariantViolation {
            sentry::capture_message(&err.to_string(), sentry::Level::Error);
        }
        Self {
            status: status_for(kind),
            kind: kind.as_str().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: ErrorKind::ValidationError.as_str().to_string(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct PricingInfo {
    currency: String,
    tax_name: String,
    tax_rate_percent: f64,
    cutting_price_per_board: f64,
    edging_price_per_meter: f64,
    client_edging_price_per_meter: f64,
    default_kerf_mm: u32,
    default_board: BoardSize,
}

#[derive(Serialize)]
struct BoardCatalog<'a> {
    boards: &'a PriceTable,
    colors: &'a BTreeMap<String, Vec<ColorSwatch>>,
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn pricing(State(state): State<Arc<AppState>>) -> Json<PricingInfo> {
    let c = &state.catalog;
    Json(PricingInfo {
        currency: c.currency.clone(),
        tax_name: c.tax_name.clone(),
        tax_rate_percent: c.tax_rate_percent,
        cutting_price_per_board: c.cutting_price_per_board,
        edging_price_per_meter: c.edging_price_per_meter,
        client_edging_price_per_meter: c.client_edging_price_per_meter,
        default_kerf_mm: c.default_kerf_mm,
        default_board: c.default_board,
    })
}

async fn board_catalog(State(state): State<Arc<AppState>>) -> Response {
    Json(BoardCatalog {
        boards: &state.catalog.boards,
        colors: &state.catalog.colors,
    })
    .into_response()
}

async fn optimize_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CuttingRequest>, JsonRejection>,
) -> Result<Json<CuttingResult>, ApiError> {
    let Json(req) = body?;
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /optimize"
    );

    let result = tokio::task::spawn_blocking(move || optimize(&req, &state.catalog, &state.limits))
        .await
        .map_err(|e| {
            sentry::capture_message(&format!("optimizer task failed: {e}"), sentry::Level::Error);
            ApiError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                kind: ErrorKind::InvariantViolation.as_str().to_string(),
                message: "optimizer task failed".to_string(),
            }
        })??;

    Ok(Json(result))
}

fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/health", get(health))
        .route("/pricing", get(pricing))
        .route("/boards/catalog", get(board_catalog))
        .route("/optimize", post(optimize_handler))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

#[tokio::main]
async fn main() {
    let config = ServiceConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .unwrap_or_else(|e| {
            eprintln!("Error: failed to open {}: {e}", config.log_file.display());
            std::process::exit(1);
        });

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .init();

    let _sentry = config.sentry_dsn.clone().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let addr = format!("0.0.0.0:{}", config.port);
    let state = Arc::new(AppState {
        catalog: config.catalog,
        limits: config.limits,
    });

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            eprintln!("Error: failed to bind {addr}: {e}");
            std::process::exit(1);
        });
    eprintln!("Listening on {addr}");
    if let Err(e) = axum::serve(listener, app(state)).await {
        tracing::error!(error = %e, "server stopped");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorKind::ValidationError), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(ErrorKind::InsufficientSuppliedBoards),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_for(ErrorKind::UnknownCatalogKey), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(ErrorKind::InfeasiblePiece),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(ErrorKind::InsufficientStock),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(ErrorKind::RequestTooLarge),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            status_for(ErrorKind::InvariantViolation),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_body() {
        let err = ApiError::from(OptimizeError::InsufficientSuppliedBoards {
            required: 2,
            supplied: 1,
        });
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        let body = serde_json::to_value(&err).unwrap();
        assert_eq!(body["kind"], "insufficient_supplied_boards");
        assert_eq!(body["message"], "insufficient boards: need 2, client supplies 1");
        assert!(body.get("status").is_none());
    }
}
