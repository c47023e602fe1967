//!
//! discograph HTTP server
//! ----------------------
//! Axum front-end exposing the catalog through one dispatch surface: an
//! operation name in the path plus a JSON payload. The response body is always
//! the two-element pair `[value_or_null, message]`; the HTTP status comes from
//! the error taxonomy. Unknown operation names are a transport-level failure,
//! not a catalog result.
//!
//! Responsibilities:
//! - Wiring the identity store and entity graph into shared state.
//! - Provisioning the default admin account on startup.
//! - Routing `POST /api/{op}` into the catalog service.

use std::net::SocketAddr;

use anyhow::Context;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::catalog::Catalog;
use crate::error::AppError;
use crate::identity::IdentityStore;
use crate::service::{CatalogService, OpResult};

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub svc: CatalogService,
}

/// Convenience entry point: ports and admin bootstrap from the environment.
pub async fn run() -> anyhow::Result<()> {
    let http_port = std::env::var("DISCOGRAPH_HTTP_PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(7878);
    let admin_user = std::env::var("DISCOGRAPH_ADMIN_USER").unwrap_or_else(|_| "admin".to_string());
    let admin_password =
        std::env::var("DISCOGRAPH_ADMIN_PASSWORD").unwrap_or_else(|_| "discograph".to_string());
    run_with_port(http_port, &admin_user, &admin_password).await
}

pub async fn run_with_port(http_port: u16, admin_user: &str, admin_password: &str) -> anyhow::Result<()> {
    let identity = IdentityStore::new();
    identity
        .ensure_default_admin(admin_user, admin_password)
        .with_context(|| format!("while provisioning default admin '{admin_user}'"))?;
    let svc = CatalogService::new(identity, Catalog::new());
    let state = AppState { svc };

    let app = Router::new()
        .route("/", get(|| async { "discograph ok" }))
        .route("/api/{op}", post(api))
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], http_port));
    info!(target: "discograph", "listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("while binding {addr}"))?;
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

async fn api(
    State(state): State<AppState>,
    Path(op): Path<String>,
    Json(payload): Json<Value>,
) -> impl IntoResponse {
    match dispatch(&state.svc, &op, payload) {
        Some((status, body)) => {
            let code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (code, Json(body))
        }
        None => {
            error!("unknown operation: {}", op);
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "status": "unknown operation", "op": op })),
            )
        }
    }
}

/// Route an operation name to its catalog operation. `None` means the name is
/// unknown — a programmer error surfaced to the transport, never a catalog
/// `[null, message]` pair.
pub fn dispatch(svc: &CatalogService, op: &str, payload: Value) -> Option<(u16, Value)> {
    let outcome = match op {
        // sessions
        "register" => invoke(payload, |r| svc.register(r)),
        "login" => invoke(payload, |r| svc.login(r)),
        "logout" => invoke(payload, |r| svc.logout(r)),
        // artists
        "create_artist" => invoke(payload, |r| svc.create_artist(r)),
        "get_artist" => invoke(payload, |r| svc.get_artist(r)),
        "update_artist" => invoke(payload, |r| svc.update_artist(r)),
        "delete_artist" => invoke(payload, |r| svc.delete_artist(r)),
        "search_artists" => invoke(payload, |r| svc.search_artists(r)),
        // bands
        "create_band" => invoke(payload, |r| svc.create_band(r)),
        "get_band" => invoke(payload, |r| svc.get_band(r)),
        "update_band" => invoke(payload, |r| svc.update_band(r)),
        "delete_band" => invoke(payload, |r| svc.delete_band(r)),
        "search_bands" => invoke(payload, |r| svc.search_bands(r)),
        // songs
        "create_song" => invoke(payload, |r| svc.create_song(r)),
        "get_song" => invoke(payload, |r| svc.get_song(r)),
        "update_song" => invoke(payload, |r| svc.update_song(r)),
        "delete_song" => invoke(payload, |r| svc.delete_song(r)),
        "search_songs" => invoke(payload, |r| svc.search_songs(r)),
        "songs_by_entity" => invoke(payload, |r| svc.songs_by_entity(r)),
        // delegation and ownership
        "add_manager" => invoke(payload, |r| svc.add_manager(r)),
        "check_ownership" => invoke(payload, |r| svc.check_ownership(r)),
        // genres
        "create_genre" => invoke(payload, |r| svc.create_genre(r)),
        "get_genre" => invoke(payload, |r| svc.get_genre(r)),
        "delete_genre" => invoke(payload, |r| svc.delete_genre(r)),
        "list_genres" => invoke(payload, |r| svc.list_genres(r)),
        "search_genres" => invoke(payload, |r| svc.search_genres(r)),
        // analytics
        "rate_song" => invoke(payload, |r| svc.rate_song(r)),
        "song_popularity" => invoke(payload, |r| svc.song_popularity(r)),
        "artist_popularity" => invoke(payload, |r| svc.artist_popularity(r)),
        "recommend_songs" => invoke(payload, |r| svc.recommend_songs(r)),
        "creation_tendency" => invoke(payload, |r| svc.creation_tendency(r)),
        _ => return None,
    };
    Some(respond(outcome))
}

/// Deserialize the payload and invoke the operation. A malformed payload is a
/// validation error, recovered into the uniform response pair like any other.
fn invoke<R: DeserializeOwned>(payload: Value, f: impl FnOnce(R) -> OpResult) -> OpResult {
    let req: R = serde_json::from_value(payload)
        .map_err(|e| AppError::validation("bad_payload".to_string(), e.to_string()))?;
    f(req)
}

fn respond(outcome: OpResult) -> (u16, Value) {
    match outcome {
        Ok((value, message)) => (200, json!([value, message])),
        Err(e) => (e.http_status(), json!([Value::Null, e.message()])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_operation_is_transport_level() {
        let svc = CatalogService::new(IdentityStore::new(), Catalog::new());
        assert!(dispatch(&svc, "no_such_op", json!({})).is_none());
    }

    #[test]
    fn malformed_payload_maps_to_validation() {
        let svc = CatalogService::new(IdentityStore::new(), Catalog::new());
        let (status, body) = dispatch(&svc, "register", json!({ "display_name": 42 })).unwrap();
        assert_eq!(status, 422);
        assert!(body[0].is_null());
        assert!(body[1].is_string());
    }
}
