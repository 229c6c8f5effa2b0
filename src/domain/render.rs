//! Render configs accepted by the Graphviz and plot backends.

use serde::{Deserialize, Serialize};

use super::{
    error::DomainError,
    graph::{DomainType, GraphData},
    types::{Layout, LayoutEngine, OutputFormat},
};

pub const GRAPHVIZ_SAMPLE_GRAPH: &str = r#"digraph NodeAttributes {
    A [shape=box, color=blue];
    B [shape=ellipse, color=green];
    C [shape=diamond, color=red];
    A -> B;
    B -> C;
    C -> A;
}"#;

pub const DEFAULT_FIGSIZE: (u32, u32) = (10, 10);
pub const DEFAULT_NODE_SIZE: u32 = 1000;
pub const DEFAULT_NODE_COLOR: &str = "lightblue";
pub const DEFAULT_DPI: u32 = 300;

const FIGSIZE_RANGE: std::ops::RangeInclusive<u32> = 1..=50;
const DPI_RANGE: std::ops::RangeInclusive<u32> = 10..=600;
const NODE_SIZE_RANGE: std::ops::RangeInclusive<u32> = 1..=100_000;
const MAX_PIXELS_PER_SIDE: u32 = 8_000;
const MAX_NODE_COLOR_LEN: usize = 64;
pub const MAX_GRAPH_NODES: usize = 2_000;
pub const MAX_GRAPH_EDGES: usize = 20_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderDotRequest {
    pub dot_source: String,
    pub output_format: OutputFormat,
    pub engine: LayoutEngine,
}

impl Default for RenderDotRequest {
    fn default() -> Self {
        Self {
            dot_source: GRAPHVIZ_SAMPLE_GRAPH.to_string(),
            output_format: OutputFormat::default(),
            engine: LayoutEngine::default(),
        }
    }
}

impl RenderDotRequest {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.dot_source.trim().is_empty() {
            return Err(DomainError::validation("dot_source must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderGraphRequest {
    pub graph_data: Option<GraphData>,
    pub layout: Layout,
    pub figsize: (u32, u32),
    pub node_size: u32,
    pub node_color: String,
    pub output_format: OutputFormat,
    pub dpi: u32,
}

impl Default for RenderGraphRequest {
    fn default() -> Self {
        Self {
            graph_data: None,
            layout: Layout::default(),
            figsize: DEFAULT_FIGSIZE,
            node_size: DEFAULT_NODE_SIZE,
            node_color: DEFAULT_NODE_COLOR.to_string(),
            output_format: OutputFormat::default(),
            dpi: DEFAULT_DPI,
        }
    }
}

impl RenderGraphRequest {
    /// Returns the graph to draw once every parameter checks out.
    pub fn validate(&self) -> Result<(&GraphData, DomainType), DomainError> {
        let graph = self.graph_data.as_ref().ok_or(DomainError::EmptyGraph)?;
        let domain = graph.validate()?;
        if graph.nodes.len() > MAX_GRAPH_NODES || graph.edges.len() > MAX_GRAPH_EDGES {
            return Err(DomainError::validation(format!(
                "graph exceeds {MAX_GRAPH_NODES} nodes or {MAX_GRAPH_EDGES} edges, got {} nodes and {} edges",
                graph.nodes.len(),
                graph.edges.len()
            )));
        }

        let (width, height) = self.figsize;
        if !FIGSIZE_RANGE.contains(&width) || !FIGSIZE_RANGE.contains(&height) {
            return Err(DomainError::validation(format!(
                "figsize must be within {}..={} inches, got ({width}, {height})",
                FIGSIZE_RANGE.start(),
                FIGSIZE_RANGE.end()
            )));
        }
        if !DPI_RANGE.contains(&self.dpi) {
            return Err(DomainError::validation(format!(
                "dpi must be within {}..={}, got {}",
                DPI_RANGE.start(),
                DPI_RANGE.end(),
                self.dpi
            )));
        }
        if !NODE_SIZE_RANGE.contains(&self.node_size) {
            return Err(DomainError::validation(format!(
                "node_size must be within {}..={}, got {}",
                NODE_SIZE_RANGE.start(),
                NODE_SIZE_RANGE.end(),
                self.node_size
            )));
        }
        validate_color(&self.node_color)?;

        Ok((graph, domain))
    }

    /// Raster resolution actually used: `dpi`, lowered so neither side of the
    /// image exceeds `MAX_PIXELS_PER_SIDE`.
    pub fn effective_dpi(&self) -> u32 {
        let longest = self.figsize.0.max(self.figsize.1).max(1);
        self.dpi.min(MAX_PIXELS_PER_SIDE / longest).max(1)
    }
}

// Colors land inside an SVG attribute; only named colors, hex and rgb() pass.
fn validate_color(color: &str) -> Result<(), DomainError> {
    let allowed = |ch: char| ch.is_ascii_alphanumeric() || "#(),. %-".contains(ch);
    if color.trim().is_empty() || color.len() > MAX_NODE_COLOR_LEN || !color.chars().all(allowed)
    {
        return Err(DomainError::validation(format!(
            "node_color `{color}` is not a valid color"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::graph::NodeData;

    fn single_node_graph() -> GraphData {
        let mut graph = GraphData::default();
        graph.nodes.insert("a".to_string(), NodeData::default());
        graph
    }

    #[test]
    fn empty_dot_request_renders_sample_graph_as_png() {
        let request: RenderDotRequest = serde_json::from_str("{}").expect("parse");
        assert_eq!(request, RenderDotRequest::default());
        assert!(request.dot_source.starts_with("digraph NodeAttributes"));
        assert_eq!(request.output_format, OutputFormat::Png);
        assert_eq!(request.engine, LayoutEngine::Dot);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn blank_dot_source_is_rejected() {
        let request = RenderDotRequest {
            dot_source: "  \n".to_string(),
            ..RenderDotRequest::default()
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn graph_request_defaults_match_plot_conventions() {
        let request: RenderGraphRequest = serde_json::from_str("{}").expect("parse");
        assert_eq!(request.layout, Layout::Spring);
        assert_eq!(request.figsize, (10, 10));
        assert_eq!(request.node_size, 1000);
        assert_eq!(request.node_color, "lightblue");
        assert_eq!(request.output_format, OutputFormat::Png);
        assert_eq!(request.dpi, 300);
    }

    #[test]
    fn missing_graph_is_reported_as_empty() {
        let request = RenderGraphRequest::default();
        let err = request.validate().expect_err("no graph");
        assert_eq!(err, DomainError::EmptyGraph);

        let null_graph: RenderGraphRequest =
            serde_json::from_str(r#"{"graph_data": null}"#).expect("parse");
        assert_eq!(null_graph.validate().expect_err("null graph"), DomainError::EmptyGraph);
    }

    #[test]
    fn out_of_range_parameters_are_rejected() {
        let base = RenderGraphRequest {
            graph_data: Some(single_node_graph()),
            ..RenderGraphRequest::default()
        };
        assert!(base.validate().is_ok());

        let cases = [
            RenderGraphRequest { figsize: (0, 10), ..base.clone() },
            RenderGraphRequest { figsize: (10, 51), ..base.clone() },
            RenderGraphRequest { dpi: 5, ..base.clone() },
            RenderGraphRequest { dpi: 601, ..base.clone() },
            RenderGraphRequest { node_size: 0, ..base.clone() },
            RenderGraphRequest { node_color: "red\" onload=\"x".to_string(), ..base.clone() },
            RenderGraphRequest { node_color: String::new(), ..base.clone() },
        ];
        for case in cases {
            assert!(
                matches!(case.validate(), Err(DomainError::Validation { .. })),
                "expected validation failure for {case:?}"
            );
        }
    }

    #[test]
    fn large_figures_lower_the_raster_dpi() {
        let base = RenderGraphRequest {
            graph_data: Some(single_node_graph()),
            ..RenderGraphRequest::default()
        };
        assert_eq!(base.effective_dpi(), 300);

        let boundary = RenderGraphRequest { figsize: (26, 10), ..base.clone() };
        assert!(boundary.validate().is_ok());
        assert_eq!(boundary.effective_dpi(), 300);

        let large = RenderGraphRequest { figsize: (30, 30), ..base.clone() };
        assert!(large.validate().is_ok());
        assert_eq!(large.effective_dpi(), 266);

        let largest = RenderGraphRequest { figsize: (50, 50), dpi: 600, ..base };
        assert!(largest.validate().is_ok());
        assert_eq!(largest.effective_dpi(), 160);
    }

    #[test]
    fn oversized_graphs_are_rejected() {
        let mut graph = GraphData::default();
        for index in 0..=MAX_GRAPH_NODES {
            graph.nodes.insert(format!("n{index}"), NodeData::default());
        }
        let request = RenderGraphRequest {
            graph_data: Some(graph),
            ..RenderGraphRequest::default()
        };
        assert!(matches!(
            request.validate(),
            Err(DomainError::Validation { .. })
        ));
    }

    #[test]
    fn accepts_hex_and_rgb_colors() {
        for color in ["#ff8800", "rgb(10, 20, 30)", "LightBlue"] {
            assert!(validate_color(color).is_ok(), "{color} should be valid");
        }
    }
}
