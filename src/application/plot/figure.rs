//! SVG figure drawing for laid-out graphs.

use std::{collections::HashMap, fmt::Write};

use super::{ProcessedGraph, ProcessedNode};

const POINTS_PER_INCH: f64 = 72.0;
const EDGE_COLOR: &str = "#555555";
const NODE_STROKE: &str = "#333333";
const LABEL_FONT_SIZE: f64 = 12.0;
const LABEL_FONT_FAMILY: &str = "DejaVu Sans, Arial, sans-serif";

#[derive(Debug, Clone)]
pub struct FigureStyle<'a> {
    pub figsize: (u32, u32),
    pub node_size: u32,
    pub node_color: &'a str,
}

impl FigureStyle<'_> {
    pub fn width_pt(&self) -> f64 {
        f64::from(self.figsize.0) * POINTS_PER_INCH
    }

    pub fn height_pt(&self) -> f64 {
        f64::from(self.figsize.1) * POINTS_PER_INCH
    }

    /// Marker radius; `node_size` is the marker area in pt².
    fn node_radius(&self) -> f64 {
        f64::from(self.node_size).sqrt() / 2.0
    }
}

/// Draws edges, then node markers, then labels on a white canvas sized
/// `figsize * 72` points.
pub fn draw_svg(graph: &ProcessedGraph, style: &FigureStyle<'_>) -> String {
    let width = style.width_pt();
    let height = style.height_pt();
    let radius = style.node_radius();
    let half_short_side = width.min(height) / 2.0;
    let margin = (radius + 0.05 * width.min(height)).min(half_short_side - 1.0).max(0.0);
    let inner_w = width - 2.0 * margin;
    let inner_h = height - 2.0 * margin;
    let project = |x: f64, y: f64| {
        (
            margin + (x + 1.0) / 2.0 * inner_w,
            margin + (1.0 - (y + 1.0) / 2.0) * inner_h,
        )
    };

    let mut svg = String::with_capacity(256 + graph.nodes.len() * 256);
    svg.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>"#);
    svg.push('\n');
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );
    let _ = writeln!(
        svg,
        r#"<rect x="0" y="0" width="{width}" height="{height}" fill="white"/>"#
    );

    let by_id: HashMap<&str, &ProcessedNode> = graph
        .nodes
        .iter()
        .map(|node| (node.id.as_str(), node))
        .collect();

    svg.push_str("<g class=\"edges\">\n");
    for edge in &graph.edges {
        let (Some(source), Some(target)) = (
            by_id.get(edge.source.as_str()),
            by_id.get(edge.target.as_str()),
        ) else {
            continue;
        };
        if edge.source == edge.target {
            continue;
        }
        let (x1, y1) = project(source.position.x, source.position.y);
        let (x2, y2) = project(target.position.x, target.position.y);
        let _ = writeln!(
            svg,
            r#"<line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}" stroke="{EDGE_COLOR}" stroke-width="1"/>"#
        );
    }
    svg.push_str("</g>\n<g class=\"nodes\">\n");
    for node in &graph.nodes {
        let (cx, cy) = project(node.position.x, node.position.y);
        let _ = writeln!(
            svg,
            r#"<circle cx="{cx:.2}" cy="{cy:.2}" r="{radius:.2}" fill="{fill}" stroke="{NODE_STROKE}" stroke-width="0.5"/>"#,
            fill = escape_xml(style.node_color),
        );
    }
    svg.push_str("</g>\n<g class=\"labels\">\n");
    for node in &graph.nodes {
        let (x, y) = project(node.position.x, node.position.y);
        let _ = writeln!(
            svg,
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle" dominant-baseline="central" font-family="{LABEL_FONT_FAMILY}" font-size="{LABEL_FONT_SIZE}">{label}</text>"#,
            label = escape_xml(&node.label),
        );
    }
    svg.push_str("</g>\n</svg>\n");
    svg
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::plot::{ProcessedEdge, ProcessedNode, Point};

    fn graph() -> ProcessedGraph {
        ProcessedGraph {
            nodes: vec![
                ProcessedNode {
                    id: "a".to_string(),
                    node_type: None,
                    label: "A & <B>".to_string(),
                    position: Point { x: -1.0, y: 1.0 },
                },
                ProcessedNode {
                    id: "b".to_string(),
                    node_type: None,
                    label: "b".to_string(),
                    position: Point { x: 1.0, y: -1.0 },
                },
            ],
            edges: vec![ProcessedEdge {
                id: "e".to_string(),
                source: "a".to_string(),
                target: "b".to_string(),
                edge_type: None,
            }],
        }
    }

    #[test]
    fn canvas_is_sized_in_points() {
        let style = FigureStyle {
            figsize: (4, 3),
            node_size: 100,
            node_color: "lightblue",
        };
        let svg = draw_svg(&graph(), &style);
        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains(r#"width="288" height="216""#), "{svg}");
    }

    #[test]
    fn draws_one_marker_and_label_per_node() {
        let style = FigureStyle {
            figsize: (10, 10),
            node_size: 1000,
            node_color: "#ff0000",
        };
        let svg = draw_svg(&graph(), &style);
        assert_eq!(svg.matches("<circle").count(), 2);
        assert_eq!(svg.matches("<line").count(), 1);
        assert!(
            svg.contains(r#"x1="51.81" y1="51.81" x2="668.19" y2="668.19""#),
            "{svg}"
        );
        assert!(svg.contains(r##"fill="#ff0000""##));
        assert!(svg.contains("A &amp; &lt;B&gt;"));
    }

    #[test]
    fn top_left_node_maps_inside_the_margin() {
        let style = FigureStyle {
            figsize: (10, 10),
            node_size: 400,
            node_color: "red",
        };
        let svg = draw_svg(&graph(), &style);
        // radius 10pt plus 5% of 720pt gives a 46pt margin.
        assert!(svg.contains(r#"cx="46.00" cy="46.00""#), "{svg}");
    }
}
