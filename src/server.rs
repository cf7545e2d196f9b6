//! HTTP tile endpoint.
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tracing::{debug, warn};

use crate::error::Error;
use crate::renderer::TileRenderer;
use crate::request::TileRequest;

/// Routes `GET /{zoom}/{column}/{row}[@{scale}].{format}` to `renderer`.
pub fn router(renderer: Arc<TileRenderer>) -> Router {
    Router::new()
        .route("/*path", get(tile))
        .with_state(renderer)
}

async fn tile(State(renderer): State<Arc<TileRenderer>>, Path(path): Path<String>) -> Response {
    let result = match TileRequest::parse(&path) {
        Ok(request) => renderer.render(&request).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(tile) => ([(header::CONTENT_TYPE, tile.content_type)], tile.bytes).into_response(),
        Err(e) => {
            let status = status_for(&e);
            if status.is_server_error() {
                warn!(path = %path, error = %e, "Tile request failed");
            } else {
                debug!(path = %path, error = %e, "Rejected tile request");
            }
            (status, e.to_string()).into_response()
        }
    }
}

fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::MalformedPath(_) | Error::UnsupportedFormat(_) => StatusCode::BAD_REQUEST,
        Error::InvalidTile { .. } => StatusCode::NOT_FOUND,
        Error::FetchTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        e if e.is_upstream() => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
