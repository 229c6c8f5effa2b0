use std::time::Instant;

use axum::{Json, Router, extract::State, response::Response, routing::post};

use crate::{
    application::error::AppError, domain::render::RenderDotRequest, infra::telemetry,
};

use super::{AppState, response::binary_response};

pub const RENDER_DOT: &str = "/graphviz/render-dot";
pub const ROUTES: [&str; 1] = [RENDER_DOT];

pub(super) fn routes() -> Router<AppState> {
    Router::new().route(RENDER_DOT, post(render_dot))
}

async fn render_dot(
    State(state): State<AppState>,
    Json(request): Json<RenderDotRequest>,
) -> Result<Response, AppError> {
    let started_at = Instant::now();
    let format = request.output_format;
    let renderer = state.graphviz.clone();
    let result = tokio::task::spawn_blocking(move || renderer.render(&request))
        .await
        .map_err(|err| AppError::unexpected(format!("graphviz render task failed: {err}")))?;
    telemetry::record_render("graphviz", format.as_str(), result.is_ok(), started_at.elapsed());

    let bytes = result?;
    Ok(binary_response(bytes, format.content_type(), None))
}
