use crate::error::ImportError;
use crate::pipeline::{EventImporter, ImportRunSummary};
use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Extension, Router,
};
use hyper::Server;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Shared by every request. The mutex keeps imports from overlapping.
pub struct AppState {
    importer: Mutex<EventImporter>,
}

impl AppState {
    pub fn new(importer: EventImporter) -> Self {
        Self {
            importer: Mutex::new(importer),
        }
    }
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "retreat-carpool-importer",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Run an unfiltered import. Record-level failures still answer 200.
async fn run_import(Extension(state): Extension<Arc<AppState>>) -> Response {
    let importer = state.importer.lock().await;
    match importer.import(None).await {
        Ok(summary) => Json::<ImportRunSummary>(summary).into_response(),
        Err(e) => import_failure(e),
    }
}

fn import_failure(e: ImportError) -> Response {
    error!("Import aborted: {}", e);
    let status = match e {
        ImportError::Fetch { .. }
        | ImportError::EmptyCalendar { .. }
        | ImportError::Transport { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(serde_json::json!({ "error": e.to_string() }))).into_response()
}

pub fn create_server(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/import", get(run_import))
        .layer(Extension(state))
        .layer(ServiceBuilder::new().layer(cors))
}

/// Start the HTTP server on the specified port
pub async fn start_server(state: Arc<AppState>, port: u16) -> anyhow::Result<()> {
    let app = create_server(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("HTTP server listening on {}", addr);
    println!("Import trigger: http://localhost:{port}/import");
    println!("Health check:   http://localhost:{port}/health");

    Server::bind(&addr).serve(app.into_make_service()).await?;

    Ok(())
}
