//! Graph rendering service: HTTP routes in front of Graphviz, a layout
//! plotter and a headless browser.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
