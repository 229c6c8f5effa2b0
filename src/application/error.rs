use std::error::Error as StdError;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::{
    application::{browser::BrowserError, graphviz::GraphvizError, plot::PlotError},
    domain::error::DomainError,
    infra::error::InfraError,
};

pub mod codes {
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const NOT_FOUND: &str = "not_found";
    pub const RENDER: &str = "render_error";
    pub const RENDERER_UNAVAILABLE: &str = "renderer_unavailable";
    pub const INVALID_TARGET: &str = "invalid_target";
    pub const BROWSER: &str = "browser_error";
    pub const BROWSER_UNAVAILABLE: &str = "browser_unavailable";
    pub const INTERNAL: &str = "internal_error";
}

/// Diagnostic chain attached to error responses and drained by the
/// response logging middleware.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
    pub code: &'static str,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Graphviz(#[from] GraphvizError),
    #[error(transparent)]
    Plot(#[from] PlotError),
    #[error(transparent)]
    Browser(#[from] BrowserError),
    #[error("resource not found")]
    NotFound,
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Domain(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Graphviz(GraphvizError::Invalid(_) | GraphvizError::Cli { .. }) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Graphviz(GraphvizError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Graphviz(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Plot(PlotError::Invalid(_)) => StatusCode::BAD_REQUEST,
            AppError::Plot(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Browser(BrowserError::InvalidTarget(_)) => StatusCode::BAD_REQUEST,
            AppError::Browser(BrowserError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Browser(_) => StatusCode::BAD_GATEWAY,
            AppError::Infra(_) | AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Domain(_)
            | AppError::Graphviz(GraphvizError::Invalid(_))
            | AppError::Plot(PlotError::Invalid(_)) => codes::INVALID_INPUT,
            AppError::NotFound => codes::NOT_FOUND,
            AppError::Graphviz(GraphvizError::Cli { .. }) => codes::RENDER,
            AppError::Graphviz(GraphvizError::Unavailable(_)) => codes::RENDERER_UNAVAILABLE,
            AppError::Plot(_) => codes::RENDER,
            AppError::Browser(BrowserError::InvalidTarget(_)) => codes::INVALID_TARGET,
            AppError::Browser(BrowserError::Unavailable(_)) => codes::BROWSER_UNAVAILABLE,
            AppError::Browser(_) => codes::BROWSER,
            AppError::Graphviz(_) | AppError::Infra(_) | AppError::Unexpected(_) => {
                codes::INTERNAL
            }
        }
    }

    /// Client-facing detail. Internal failures are not echoed back.
    pub fn detail(&self) -> String {
        match self.status_code() {
            StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            detail: self.detail(),
            code: self.code(),
        };
        let report = ErrorReport::from_error("application::error::AppError", status, &self);
        let mut response = (status, Json(body)).into_response();
        report.attach(&mut response);
        response
    }
}
