//! Serialized graph payload accepted by the plot backend.
//!
//! The shape mirrors the JSON export of the upstream graph library: nodes and
//! edges keyed by id, plus an optional domain type tag. Exported nodes carry
//! `name`/`value` under `node_data`; hand-written payloads may put them at the
//! top level of the node.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::DomainError;

const FALLBACK_NODE_LABEL: &str = "Node";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph_type: Option<String>,
    pub nodes: BTreeMap<String, NodeData>,
    pub edges: BTreeMap<String, EdgeData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_data: Option<NodePayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
}

/// Nested `node_data` block of an exported node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeData {
    pub from_node_id: String,
    pub to_node_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<String>,
}

/// Graph families the upstream library exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainType {
    Simple,
    Json,
    Generic,
}

impl DomainType {
    /// Accepts the short names and the exported schema type paths, e.g.
    /// `mgraph_ai.providers.simple.schemas.Schema__Simple__Graph`.
    pub fn parse(value: Option<&str>) -> Result<Self, DomainError> {
        let Some(raw) = value else {
            return Ok(DomainType::Generic);
        };
        let name = raw
            .trim()
            .rsplit(['.', ':'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match name.as_str() {
            "" | "generic" | "schema__mgraph__graph" => Ok(DomainType::Generic),
            "simple" | "schema__simple__graph" => Ok(DomainType::Simple),
            "json" => Ok(DomainType::Json),
            schema if schema.starts_with("schema__") && schema.ends_with("__graph") => {
                if schema.contains("__json__") {
                    Ok(DomainType::Json)
                } else {
                    Err(DomainError::UnsupportedDomainType(raw.to_string()))
                }
            }
            _ => Err(DomainError::UnsupportedDomainType(raw.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DomainType::Simple => "simple",
            DomainType::Json => "json",
            DomainType::Generic => "generic",
        }
    }
}

impl GraphData {
    /// Check the domain tag, emptiness and edge endpoints, in that order.
    pub fn validate(&self) -> Result<DomainType, DomainError> {
        let domain = DomainType::parse(self.graph_type.as_deref())?;
        if self.nodes.is_empty() {
            return Err(DomainError::EmptyGraph);
        }
        for (edge_id, edge) in &self.edges {
            for node_id in [&edge.from_node_id, &edge.to_node_id] {
                if !self.nodes.contains_key(node_id) {
                    return Err(DomainError::UnknownNode {
                        edge_id: edge_id.clone(),
                        node_id: node_id.clone(),
                    });
                }
            }
        }
        Ok(domain)
    }
}

impl NodeData {
    /// Display label: name, then value, then the short type name. The nested
    /// `node_data` block wins over top-level fields.
    pub fn label(&self) -> String {
        if let Some(name) = self.name() {
            return name.to_string();
        }
        match self.value() {
            None => {}
            Some(Value::String(text)) => return text.clone(),
            Some(other) => return other.to_string(),
        }
        self.short_type()
            .map(str::to_string)
            .unwrap_or_else(|| FALLBACK_NODE_LABEL.to_string())
    }

    pub fn name(&self) -> Option<&str> {
        self.node_data
            .as_ref()
            .and_then(|payload| payload.name.as_deref())
            .filter(|name| !name.is_empty())
            .or_else(|| self.name.as_deref().filter(|name| !name.is_empty()))
    }

    pub fn value(&self) -> Option<&Value> {
        let present = |value: &&Value| !value.is_null();
        self.node_data
            .as_ref()
            .and_then(|payload| payload.value.as_ref())
            .filter(present)
            .or_else(|| self.value.as_ref().filter(present))
    }

    /// Type name without any module path prefix.
    pub fn short_type(&self) -> Option<&str> {
        self.node_type
            .as_deref()
            .map(|full| full.rsplit(['.', ':']).next().unwrap_or(full))
            .filter(|name| !name.is_empty())
    }
}

impl EdgeData {
    pub fn short_type(&self) -> Option<&str> {
        self.edge_type
            .as_deref()
            .map(|full| full.rsplit(['.', ':']).next().unwrap_or(full))
            .filter(|name| !name.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn two_node_graph() -> GraphData {
        serde_json::from_value(json!({
            "graph_type": "simple",
            "nodes": {
                "n1": {"name": "first"},
                "n2": {"value": "second"}
            },
            "edges": {
                "e1": {"from_node_id": "n1", "to_node_id": "n2"}
            }
        }))
        .expect("graph parses")
    }

    #[test]
    fn validates_well_formed_graph() {
        let graph = two_node_graph();
        assert_eq!(graph.validate(), Ok(DomainType::Simple));
    }

    #[test]
    fn rejects_unknown_domain_type_before_emptiness() {
        let graph = GraphData {
            graph_type: Some("InvalidDomainType".to_string()),
            ..GraphData::default()
        };
        let err = graph.validate().expect_err("unsupported type");
        assert_eq!(err.to_string(), "Unsupported domain type: InvalidDomainType");
    }

    #[test]
    fn empty_graph_has_stable_message() {
        let err = GraphData::default().validate().expect_err("empty graph");
        assert_eq!(err.to_string(), "No graph provided for rendering");
    }

    #[test]
    fn rejects_dangling_edges() {
        let mut graph = two_node_graph();
        graph.edges.insert(
            "e2".to_string(),
            EdgeData {
                from_node_id: "n1".to_string(),
                to_node_id: "missing".to_string(),
                edge_type: None,
            },
        );
        let err = graph.validate().expect_err("dangling edge");
        assert_eq!(
            err,
            DomainError::UnknownNode {
                edge_id: "e2".to_string(),
                node_id: "missing".to_string()
            }
        );
    }

    #[test]
    fn label_prefers_name_then_value_then_type() {
        let both = NodeData {
            name: Some("test_name".to_string()),
            value: Some(json!("test_value")),
            ..NodeData::default()
        };
        assert_eq!(both.label(), "test_name");

        let value_only = NodeData {
            value: Some(json!(42)),
            ..NodeData::default()
        };
        assert_eq!(value_only.label(), "42");

        let typed = NodeData {
            value: Some(Value::Null),
            node_type: Some("graphs.schemas.Schema__Simple__Node".to_string()),
            ..NodeData::default()
        };
        assert_eq!(typed.label(), "Schema__Simple__Node");

        assert_eq!(NodeData::default().label(), "Node");
    }

    #[test]
    fn exported_node_data_supplies_labels() {
        let graph: GraphData = serde_json::from_value(json!({
            "graph_id": "g-7",
            "graph_type": "mgraph_ai.providers.simple.schemas.Schema__Simple__Graph",
            "nodes": {
                "n1": {
                    "node_data": {"name": null, "value": "Node 1"},
                    "node_id": "n1",
                    "node_type": "mgraph_ai.providers.simple.schemas.Schema__Simple__Node"
                },
                "n2": {
                    "node_data": {"name": "second", "value": "ignored"},
                    "node_id": "n2",
                    "node_type": "mgraph_ai.providers.simple.schemas.Schema__Simple__Node"
                },
                "n3": {
                    "node_data": {"name": null, "value": null},
                    "node_id": "n3",
                    "node_type": "mgraph_ai.providers.simple.schemas.Schema__Simple__Node"
                }
            },
            "edges": {
                "e1": {
                    "edge_config": {"edge_id": "e1"},
                    "edge_type": "mgraph_ai.mgraph.schemas.Schema__MGraph__Edge",
                    "from_node_id": "n1",
                    "to_node_id": "n2"
                }
            }
        }))
        .expect("export parses");

        assert_eq!(graph.validate(), Ok(DomainType::Simple));
        let labels: Vec<String> = graph.nodes.values().map(NodeData::label).collect();
        assert_eq!(labels, vec!["Node 1", "second", "Schema__Simple__Node"]);
    }

    #[test]
    fn nested_fields_win_over_flat_ones() {
        let node: NodeData = serde_json::from_value(json!({
            "name": "flat",
            "node_data": {"name": "nested"}
        }))
        .expect("node parses");
        assert_eq!(node.label(), "nested");

        let flat_fallback: NodeData = serde_json::from_value(json!({
            "value": 7,
            "node_data": {"value": null}
        }))
        .expect("node parses");
        assert_eq!(flat_fallback.label(), "7");
    }

    #[test]
    fn schema_type_paths_map_to_domains() {
        let cases = [
            ("mgraph_ai.providers.simple.schemas.Schema__Simple__Graph", DomainType::Simple),
            ("mgraph_ai.mgraph.schemas.Schema__MGraph__Graph", DomainType::Generic),
            ("mgraph_ai.providers.json.schemas.Schema__MGraph__Json__Graph", DomainType::Json),
            ("JSON", DomainType::Json),
            ("Simple", DomainType::Simple),
        ];
        for (raw, expected) in cases {
            assert_eq!(DomainType::parse(Some(raw)), Ok(expected), "{raw}");
        }
        for raw in ["InvalidDomainType", "mgraph_ai.providers.file.schemas.Schema__File__Graph"] {
            assert_eq!(
                DomainType::parse(Some(raw)),
                Err(DomainError::UnsupportedDomainType(raw.to_string()))
            );
        }
    }
}
