use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::application::version;

use super::AppState;

pub const PING: &str = "/info/ping";
pub const VERSION: &str = "/info/version";
pub const ROUTES: [&str; 2] = [PING, VERSION];

#[derive(Debug, Serialize)]
struct VersionBody {
    version: &'static str,
}

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route(PING, get(ping))
        .route(VERSION, get(service_version))
}

async fn ping() -> Json<&'static str> {
    Json("pong")
}

async fn service_version() -> Json<VersionBody> {
    Json(VersionBody {
        version: version::version(),
    })
}
