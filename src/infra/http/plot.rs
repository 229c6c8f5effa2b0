use std::time::Instant;

use axum::{Json, Router, extract::State, response::Response, routing::post};

use crate::{
    application::error::AppError, domain::render::RenderGraphRequest, infra::telemetry,
};

use super::{AppState, response::binary_response};

pub const RENDER_GRAPH: &str = "/matplotlib/render-graph";
pub const ROUTES: [&str; 1] = [RENDER_GRAPH];

pub(super) fn routes() -> Router<AppState> {
    Router::new().route(RENDER_GRAPH, post(render_graph))
}

async fn render_graph(
    State(state): State<AppState>,
    Json(request): Json<RenderGraphRequest>,
) -> Result<Response, AppError> {
    let started_at = Instant::now();
    let format = request.output_format;
    let renderer = state.plot.clone();
    let result = tokio::task::spawn_blocking(move || renderer.render(&request))
        .await
        .map_err(|err| AppError::unexpected(format!("plot render task failed: {err}")))?;
    telemetry::record_render("plot", format.as_str(), result.is_ok(), started_at.elapsed());

    let bytes = result?;
    Ok(binary_response(bytes, format.content_type(), None))
}
