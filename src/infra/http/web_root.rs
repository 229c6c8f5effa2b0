use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Query, State},
    response::Response,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    application::{
        browser::{
            BrowserError, CaptureKind, CaptureOutput,
            web_root::{DEFAULT_TARGET_PAGE, DEMO_JS, SAMPLE_MERMAID},
        },
        error::AppError,
    },
    infra::telemetry,
};

use super::{AppState, response::binary_response};

pub const RENDER_FILE: &str = "/web_root/render-file";
pub const RENDER_JS: &str = "/web_root/render-js";
pub const RENDER_MERMAID: &str = "/web_root/render-mermaid";
pub const RENDER_CYTOSCAPE: &str = "/web_root/render-cytoscape";
pub const RENDER_PDF: &str = "/web_root/render-pdf";
pub const RENDER_HTML: &str = "/web_root/render-html";
pub const TARGET_URL: &str = "/web_root/target-url";
pub const ROUTES: [&str; 7] = [
    RENDER_FILE,
    RENDER_JS,
    RENDER_MERMAID,
    RENDER_CYTOSCAPE,
    RENDER_PDF,
    RENDER_HTML,
    TARGET_URL,
];

const SCREENSHOT_FILENAME: Option<&str> = Some("screenshot.png");
const PDF_FILENAME: Option<&str> = Some("page.pdf");

#[derive(Debug, Deserialize)]
struct TargetPageQuery {
    #[serde(default = "default_target_page")]
    target_page: String,
}

fn default_target_page() -> String {
    DEFAULT_TARGET_PAGE.to_string()
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MermaidRequest {
    mermaid_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CytoscapeRequest {
    cytoscape_data: Value,
}

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route(RENDER_FILE, get(render_file))
        .route(RENDER_JS, get(render_js))
        .route(RENDER_MERMAID, post(render_mermaid))
        .route(RENDER_CYTOSCAPE, post(render_cytoscape))
        .route(RENDER_PDF, get(render_pdf))
        .route(RENDER_HTML, get(render_html))
        .route(TARGET_URL, get(target_url))
}

async fn render_file(
    State(state): State<AppState>,
    Query(query): Query<TargetPageQuery>,
) -> Result<Response, AppError> {
    let started_at = Instant::now();
    let result = state.web_root.render_file(&query.target_page).await;
    capture_response(result, CaptureKind::Screenshot, started_at, SCREENSHOT_FILENAME)
}

async fn render_js(
    State(state): State<AppState>,
    Query(query): Query<TargetPageQuery>,
) -> Result<Response, AppError> {
    let started_at = Instant::now();
    let result = state.web_root.render_js(&query.target_page, DEMO_JS).await;
    capture_response(result, CaptureKind::Screenshot, started_at, SCREENSHOT_FILENAME)
}

async fn render_mermaid(
    State(state): State<AppState>,
    Json(request): Json<MermaidRequest>,
) -> Result<Response, AppError> {
    let started_at = Instant::now();
    let code = request
        .mermaid_code
        .filter(|code| !code.trim().is_empty())
        .unwrap_or_else(|| SAMPLE_MERMAID.to_string());
    let result = state.web_root.render_mermaid(&code).await;
    capture_response(result, CaptureKind::Screenshot, started_at, SCREENSHOT_FILENAME)
}

async fn render_cytoscape(
    State(state): State<AppState>,
    Json(request): Json<CytoscapeRequest>,
) -> Result<Response, AppError> {
    let started_at = Instant::now();
    let result = state.web_root.render_cytoscape(&request.cytoscape_data).await;
    capture_response(result, CaptureKind::Screenshot, started_at, SCREENSHOT_FILENAME)
}

async fn render_pdf(
    State(state): State<AppState>,
    Query(query): Query<TargetPageQuery>,
) -> Result<Response, AppError> {
    let started_at = Instant::now();
    let result = state.web_root.render_pdf(&query.target_page).await;
    capture_response(result, CaptureKind::Pdf, started_at, PDF_FILENAME)
}

async fn render_html(
    State(state): State<AppState>,
    Query(query): Query<TargetPageQuery>,
) -> Result<Response, AppError> {
    let started_at = Instant::now();
    let result = state.web_root.render_html(&query.target_page).await;
    capture_response(result, CaptureKind::Html, started_at, None)
}

async fn target_url(
    State(state): State<AppState>,
    Query(query): Query<TargetPageQuery>,
) -> Result<Json<String>, AppError> {
    let url = state.web_root.target_url(&query.target_page)?;
    Ok(Json(url.into()))
}

fn capture_response(
    result: Result<CaptureOutput, BrowserError>,
    kind: CaptureKind,
    started_at: Instant,
    filename: Option<&'static str>,
) -> Result<Response, AppError> {
    // Rejected targets never reach the browser and are not counted.
    if !matches!(result, Err(BrowserError::InvalidTarget(_))) {
        telemetry::record_render("browser", kind.as_str(), result.is_ok(), started_at.elapsed());
    }
    let output = result?;
    Ok(binary_response(
        output.bytes,
        output.kind.content_type(),
        filename,
    ))
}
