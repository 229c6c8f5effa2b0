//! Headless-browser page capture.

mod chromium;
pub mod web_root;

use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use thiserror::Error;

pub use chromium::{ChromiumCapture, ChromiumSettings};
pub use web_root::{WebRootRender, WebRootSettings};

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("browser executable unavailable: {0}")]
    Unavailable(String),
    #[error("failed to launch browser: {0}")]
    Launch(String),
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("script evaluation failed: {0}")]
    Script(String),
    #[error("capture failed: {0}")]
    Capture(String),
    #[error("browser did not finish within {0:?}")]
    Timeout(Duration),
    #[error("invalid target page `{0}`")]
    InvalidTarget(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureKind {
    Screenshot,
    Pdf,
    /// Serialized DOM of the loaded page.
    Html,
}

impl CaptureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CaptureKind::Screenshot => "png",
            CaptureKind::Pdf => "pdf",
            CaptureKind::Html => "html",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            CaptureKind::Screenshot => "image/png",
            CaptureKind::Pdf => "application/pdf",
            CaptureKind::Html => "text/html; charset=utf-8",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRequest {
    pub url: String,
    pub js_code: Option<String>,
    pub wait_for: Duration,
    pub kind: CaptureKind,
}

#[derive(Debug, Clone)]
pub struct CaptureOutput {
    pub bytes: Vec<u8>,
    pub kind: CaptureKind,
}

impl CaptureOutput {
    pub fn base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

/// One page visit: navigate, optionally run a script, wait, capture.
#[async_trait]
pub trait PageCapture: Send + Sync {
    async fn capture(&self, request: CaptureRequest) -> Result<CaptureOutput, BrowserError>;
}
