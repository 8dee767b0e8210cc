//! HTTP server mode: one migration per request, Cloud Function style.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use mongo_bq_migrate::{Config, MigrateError, MigrationRequest, Orchestrator, RowFailure};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// App state shared across handlers.
///
/// Each request builds its own orchestrator: the source connection is
/// opened for the snapshot fetch and closed right after it, so
/// nothing long-lived is shared between migrations.
struct AppState {
    config: Config,
}

/// Request body for the migrate endpoint.
#[derive(Debug, Deserialize)]
struct MigrateBody {
    source_collection_name: String,
    destination_table_name: String,
}

/// Response body for a failed migration.
#[derive(Debug, Serialize)]
struct FailureBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    failed_rows: Option<Vec<RowFailure>>,
}

/// Start the HTTP server.
pub async fn serve(config: Config, port: u16) -> Result<(), MigrateError> {
    let state = Arc::new(AppState { config });

    let app = Router::new()
        .route("/health", get(health))
        .route("/migrate", post(migrate))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting HTTP server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| MigrateError::Config(format!("Failed to bind to port {port}: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| MigrateError::Config(format!("Server error: {e}")))?;

    Ok(())
}

/// Probe both collaborator connections.
async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match Orchestrator::new(state.config.clone()).await {
        Ok(orchestrator) => {
            let result = orchestrator.health_check().await;
            let status = if result.is_healthy() {
                StatusCode::OK
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, Json(json!(result))).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "status": "unreachable", "error": e.to_string() })),
        )
            .into_response(),
    }
}

/// Run one migration. 200 on success, 500 with the failure cause (and
/// per-row detail for partial insert failures) otherwise.
async fn migrate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<MigrateBody>,
) -> impl IntoResponse {
    let request = MigrationRequest {
        collection: body.source_collection_name,
        table: body.destination_table_name,
    };

    let outcome = match Orchestrator::new(state.config.clone()).await {
        Ok(orchestrator) => orchestrator.run(request).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(result) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Migration completed successfully.",
                "result": result,
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Migration failed: {}", e);
            let failed_rows = e.row_failures().map(<[RowFailure]>::to_vec);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(FailureBody {
                    success: false,
                    error: format!("An error occurred during migration: {e}"),
                    failed_rows,
                }),
            )
                .into_response()
        }
    }
}
