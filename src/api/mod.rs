//! HTTP surface for the attribute registry
//!
//! The concrete attribute publisher: each registered group is exposed under
//! `/attrs/{group}/{attr}` with sysfs-like semantics — reads return the
//! exact newline-terminated text, writes hand the raw body to the store and
//! always succeed for read-write attrs (malformed input is the component's
//! logged no-op, the way a sysfs store returns `count` regardless).
//!
//! Power events are injected here too, standing in for the platform's
//! suspend/resume notifier.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::attr::{AttrMode, AttrRegistry};
use crate::power::{PowerEvent, PowerMonitor};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Published attribute groups
    pub attrs: Arc<AttrRegistry>,
    /// Power event source
    pub power: Arc<PowerMonitor>,
    /// Server port
    pub port: u16,
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/attrs/:group", get(list_attrs))
        .route("/attrs/:group/:attr", get(read_attr))
        .route("/attrs/:group/:attr", post(write_attr))
        .route("/power/suspend", post(power_suspend))
        .route("/power/resume", post(power_resume))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "module": "sysknobs",
        "version": env!("CARGO_PKG_VERSION"),
        "port": state.port,
    }))
}

/// GET /attrs/:group - List a group's attribute names and modes
async fn list_attrs(
    State(state): State<AppState>,
    Path(group): Path<String>,
) -> Response {
    match state.attrs.group_listing(&group) {
        Some(listing) => {
            let attrs: Vec<_> = listing
                .iter()
                .map(|(name, mode)| {
                    json!({
                        "name": name,
                        "mode": match mode {
                            AttrMode::ReadOnly => "ro",
                            AttrMode::ReadWrite => "rw",
                        },
                    })
                })
                .collect();
            Json(json!({ "group": group, "attrs": attrs })).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// GET /attrs/:group/:attr - Read an attribute (text/plain)
async fn read_attr(
    State(state): State<AppState>,
    Path((group, attr)): Path<(String, String)>,
) -> Response {
    match state.attrs.lookup(&group, &attr) {
        Some(attr) => (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            attr.show(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// POST /attrs/:group/:attr - Write an attribute (raw text body)
///
/// 204 on any dispatched write, 403 for read-only attrs, 404 for unknown
/// names. A 204 does not imply the input was valid.
async fn write_attr(
    State(state): State<AppState>,
    Path((group, attr)): Path<(String, String)>,
    body: String,
) -> StatusCode {
    match state.attrs.lookup(&group, &attr) {
        Some(attr) => {
            if attr.store(&body) {
                StatusCode::NO_CONTENT
            } else {
                StatusCode::FORBIDDEN
            }
        }
        None => StatusCode::NOT_FOUND,
    }
}

/// POST /power/suspend - Inject a suspend notification
async fn power_suspend(State(state): State<AppState>) -> StatusCode {
    state.power.notify(PowerEvent::Suspend);
    StatusCode::NO_CONTENT
}

/// POST /power/resume - Inject a resume notification
async fn power_resume(State(state): State<AppState>) -> StatusCode {
    state.power.notify(PowerEvent::Resume);
    StatusCode::NO_CONTENT
}
