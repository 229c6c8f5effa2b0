//! Layout plotting backend: positions nodes, draws a figure and encodes it.

mod encode;
mod figure;
mod layout;

use std::{collections::HashMap, time::Instant};

use petgraph::graph::{NodeIndex, UnGraph};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{
    error::DomainError,
    graph::GraphData,
    render::RenderGraphRequest,
    types::{Layout, OutputFormat},
};

#[derive(Debug, Error)]
pub enum PlotError {
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error("failed to parse generated SVG: {0}")]
    Svg(String),
    #[error("failed to rasterize figure: {0}")]
    Raster(String),
    #[error("failed to convert figure to PDF: {0}")]
    Pdf(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: Option<String>,
    pub label: String,
    pub position: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub edge_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessedGraph {
    pub nodes: Vec<ProcessedNode>,
    pub edges: Vec<ProcessedEdge>,
}

#[derive(Debug, Clone, Default)]
pub struct PlotRenderer;

impl PlotRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Lays out an already validated graph. Edges pointing at unknown nodes
    /// are dropped.
    pub fn process_graph(&self, data: &GraphData, layout: Layout) -> ProcessedGraph {
        let mut graph = UnGraph::<&str, ()>::with_capacity(data.nodes.len(), data.edges.len());
        let index: HashMap<&str, NodeIndex> = data
            .nodes
            .keys()
            .map(|id| (id.as_str(), graph.add_node(id.as_str())))
            .collect();

        let mut edges = Vec::with_capacity(data.edges.len());
        for (id, edge) in &data.edges {
            let (Some(&from), Some(&to)) = (
                index.get(edge.from_node_id.as_str()),
                index.get(edge.to_node_id.as_str()),
            ) else {
                continue;
            };
            graph.add_edge(from, to, ());
            edges.push(ProcessedEdge {
                id: id.clone(),
                source: edge.from_node_id.clone(),
                target: edge.to_node_id.clone(),
                edge_type: edge.short_type().map(str::to_string),
            });
        }

        let positions = layout::compute(&graph, layout);
        let nodes = data
            .nodes
            .iter()
            .zip(positions)
            .map(|((id, node), (x, y))| ProcessedNode {
                id: id.clone(),
                node_type: node.short_type().map(str::to_string),
                label: node.label(),
                position: Point { x, y },
            })
            .collect();

        ProcessedGraph { nodes, edges }
    }

    /// CPU bound; call from `spawn_blocking` inside the runtime.
    pub fn render(&self, request: &RenderGraphRequest) -> Result<Vec<u8>, PlotError> {
        let started_at = Instant::now();
        let (data, domain) = request.validate()?;
        let processed = self.process_graph(data, request.layout);
        let style = figure::FigureStyle {
            figsize: request.figsize,
            node_size: request.node_size,
            node_color: &request.node_color,
        };
        let svg = figure::draw_svg(&processed, &style);

        let dpi = request.effective_dpi();
        let bytes = match request.output_format {
            OutputFormat::Svg => svg.into_bytes(),
            OutputFormat::Png => {
                if dpi < request.dpi {
                    debug!(
                        target = "application::plot",
                        op = "plot::render",
                        requested_dpi = request.dpi,
                        dpi,
                        "Lowered raster dpi for large figure"
                    );
                }
                encode::png(&svg, request.figsize.0 * dpi, request.figsize.1 * dpi)?
            }
            OutputFormat::Pdf => encode::pdf(&svg)?,
        };

        info!(
            target = "application::plot",
            op = "plot::render",
            result = "rendered",
            domain = domain.as_str(),
            layout = request.layout.as_str(),
            format = %request.output_format,
            nodes = processed.nodes.len(),
            edges = processed.edges.len(),
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            output_bytes = bytes.len(),
            "Graph plotted"
        );
        Ok(bytes)
    }
}
