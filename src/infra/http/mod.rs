pub mod graphviz;
pub mod info;
mod middleware;
pub mod plot;
mod response;
pub mod web_root;

use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit, middleware as axum_middleware, routing::get};

use crate::application::{
    browser::WebRootRender, error::AppError, graphviz::GraphvizRenderer, plot::PlotRenderer,
};

use super::assets;

pub use middleware::{REQUEST_ID_HEADER, RequestContext};

pub const STATIC_ROUTE: &str = "/static/{*path}";

#[derive(Clone)]
pub struct AppState {
    pub graphviz: Arc<GraphvizRenderer>,
    pub plot: Arc<PlotRenderer>,
    pub web_root: Arc<WebRootRender>,
}

impl AppState {
    pub fn new(graphviz: GraphvizRenderer, plot: PlotRenderer, web_root: WebRootRender) -> Self {
        Self {
            graphviz: Arc::new(graphviz),
            plot: Arc::new(plot),
            web_root: Arc::new(web_root),
        }
    }
}

pub fn build_router(state: AppState, max_request_bytes: usize) -> Router {
    Router::new()
        .merge(info::routes())
        .merge(graphviz::routes())
        .merge(plot::routes())
        .merge(web_root::routes())
        .route(STATIC_ROUTE, get(assets::serve_static))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(max_request_bytes))
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
        .with_state(state)
}

async fn not_found() -> AppError {
    AppError::NotFound
}
