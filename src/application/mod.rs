//! Rendering services behind the HTTP routes.

pub mod browser;
pub mod error;
pub mod graphviz;
pub mod plot;
pub mod version;
