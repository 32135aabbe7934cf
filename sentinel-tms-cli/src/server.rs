//! HTTP tile endpoint.
//!
//! `GET /{generator}/{x}/{y}/{z}?bands=&first_clip=&second_clip=&third_clip=&zone=&date=`
//!
//! | outcome                         | response                                   |
//! |---------------------------------|--------------------------------------------|
//! | tile produced or cached         | `200 image/png`                            |
//! | tile still being produced       | `200 image/png` transparent placeholder, `Cache-Control: max-age=10` |
//! | anything else                   | `404`                                      |
//!
//! Only the `sentinel2` generator exists.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use sentinel_tms::app::TileServiceApp;
use sentinel_tms::imagery::transparent_png;
use sentinel_tms::tile::{ErrorClass, TileError, TileOptions};
use tracing::{debug, info, warn};

use crate::error::CliError;

/// Name of the only registered generator.
pub const GENERATOR: &str = "sentinel2";

/// Client cache lifetime of the placeholder, in seconds.
pub const PLACEHOLDER_MAX_AGE_SECS: u32 = 10;

#[derive(Clone)]
struct ServerState {
    app: Arc<TileServiceApp>,
    placeholder: Arc<Vec<u8>>,
}

/// Builds the tile router. The placeholder tile is encoded once here.
pub fn router(app: Arc<TileServiceApp>) -> Result<Router, CliError> {
    let size = app.config().pipeline.output_size;
    let placeholder = transparent_png(size)
        .map_err(|e| CliError::Server(format!("cannot encode placeholder tile: {}", e)))?;

    Ok(Router::new()
        .route("/:generator/:x/:y/:z", get(tile))
        .with_state(ServerState {
            app,
            placeholder: Arc::new(placeholder),
        }))
}

/// Serves tiles on `bind` until Ctrl-C.
pub async fn serve(app: Arc<TileServiceApp>, bind: SocketAddr) -> Result<(), CliError> {
    let router = router(app)?;
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| CliError::Server(format!("cannot bind {}: {}", bind, e)))?;

    info!(%bind, "Tile server listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| CliError::Server(e.to_string()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn tile(
    State(state): State<ServerState>,
    Path((generator, x, y, z)): Path<(String, String, String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if generator != GENERATOR {
        debug!(generator, "Unknown generator");
        return StatusCode::NOT_FOUND.into_response();
    }

    let (Ok(x), Ok(y), Ok(z)) = (x.parse::<u32>(), y.parse::<u32>(), z.parse::<u32>()) else {
        debug!(x = %x, y = %y, z = %z, "Non-numeric tile index");
        return StatusCode::NOT_FOUND.into_response();
    };

    let result = match TileOptions::from_query(&query) {
        Ok(options) => {
            debug!(x, y, z, ?options, "Tile request");
            state
                .app
                .orchestrator()
                .generate_tile(x, y, z, &options)
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(path) => match tokio::fs::read(&path).await {
            Ok(bytes) => png(bytes),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot read tile");
                StatusCode::NOT_FOUND.into_response()
            }
        },
        Err(e) => error_response(&e, &state.placeholder),
    }
}

fn error_response(error: &TileError, placeholder: &[u8]) -> Response {
    match error.class() {
        ErrorClass::NotYetReady => {
            debug!(error = %error, "Serving placeholder");
            (
                [
                    (header::CONTENT_TYPE, "image/png".to_string()),
                    (
                        header::CACHE_CONTROL,
                        format!("max-age={}", PLACEHOLDER_MAX_AGE_SECS),
                    ),
                ],
                placeholder.to_vec(),
            )
                .into_response()
        }
        ErrorClass::DataCannotBeComputed => {
            if matches!(error, TileError::Internal(_)) {
                warn!(error = %error, "Tile request failed");
            } else {
                debug!(error = %error, "Tile cannot be computed");
            }
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

fn png(bytes: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, "image/png")], bytes).into_response()
}
