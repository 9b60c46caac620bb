use crate::app_config::AppConfig;
use crate::pipeline::SnapshotPipeline;
use crate::store::SnapshotStore;
use anyhow::Result;
use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

// -----------------------------------------------
// API RESPONSE MODELS
// -----------------------------------------------

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub indices: Vec<IndexCount>,
}

#[derive(Debug, Serialize)]
pub struct IndexCount {
    pub index: String,
    pub contracts: usize,
}

#[derive(Debug, Serialize)]
pub struct SnapshotAck {
    pub submitted: bool,
    pub message: String,
}

// -----------------------------------------------
// APPLICATION STATE
// -----------------------------------------------

#[derive(Clone)]
pub struct AppState {
    config: Arc<AppConfig>,
    store: SnapshotStore,
    // One run at a time; a trigger while one is in flight is refused.
    run_in_flight: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, store: SnapshotStore) -> Self {
        Self {
            config,
            store,
            run_in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Claim the run slot. False means a run is already in flight.
    pub fn begin_run(&self) -> bool {
        !self.run_in_flight.swap(true, Ordering::SeqCst)
    }

    pub fn finish_run(&self) {
        self.run_in_flight.store(false, Ordering::SeqCst);
    }
}

// -----------------------------------------------
// API HANDLERS
// -----------------------------------------------

/// GET /api/health - liveness plus stored contract counts per index
async fn get_health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let mut indices = Vec::new();
    for name in state.store.indices() {
        let contracts = state.store.count(name).await.unwrap_or(0);
        indices.push(IndexCount {
            index: name.to_string(),
            contracts,
        });
    }

    Json(ApiResponse {
        success: true,
        data: Some(HealthResponse {
            status: "ok",
            indices,
        }),
        error: None,
    })
}

/// POST /api/snapshot - submit a snapshot run. The acknowledgment goes out
/// immediately; the run executes in the background and reports only through
/// logs (fire-and-forget by contract).
async fn trigger_snapshot(State(state): State<AppState>) -> Json<ApiResponse<SnapshotAck>> {
    if !state.begin_run() {
        return Json(ApiResponse {
            success: false,
            data: Some(SnapshotAck {
                submitted: false,
                message: "snapshot run already in progress".to_string(),
            }),
            error: None,
        });
    }

    let pipeline = SnapshotPipeline::new(state.config.clone(), state.store.clone());
    let guard = state.clone();
    tokio::spawn(async move {
        pipeline.run().await;
        guard.finish_run();
    });

    info!("snapshot run submitted");
    Json(ApiResponse {
        success: true,
        data: Some(SnapshotAck {
            submitted: true,
            message: "snapshot run submitted".to_string(),
        }),
        error: None,
    })
}

// -----------------------------------------------
// SERVER SETUP
// -----------------------------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(get_health))
        .route("/api/snapshot", post(trigger_snapshot))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(config: Arc<AppConfig>, store: SnapshotStore) -> Result<()> {
    let port = config.port;
    let app = build_router(AppState::new(config, store));

    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!("Greeks snapshot server running on http://{}", addr);
    println!("Available endpoints:");
    println!("   GET  /api/health");
    println!("   POST /api/snapshot");
    println!();

    axum::serve(listener, app).await?;
    Ok(())
}
