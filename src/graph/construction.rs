use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use indexmap::{IndexMap, IndexSet};
use petgraph::prelude::NodeIndex;
use petgraph::visit::EdgeRef;

use crate::graph::model::{
    EdgeAttributes, GraphId, GraphInstance, NodeAttributes, RawGraph,
};

/// High-level loader responsible for turning external representations into
/// in-memory graphs.
#[derive(Debug, Default)]
pub struct GraphLoader;

impl GraphLoader {
    /// Parse a JSON string into a graph instance.
    pub fn from_json_str(json: &str) -> Result<GraphInstance> {
        let raw: RawGraph = serde_json::from_str(json)?;
        Self::from_raw_graph(raw)
    }

    /// Read JSON graph data from a reader.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<GraphInstance> {
        let mut buf = String::new();
        reader.read_to_string(&mut buf)?;
        Self::from_json_str(&buf)
    }

    pub fn from_path(path: &Path) -> Result<GraphInstance> {
        let file = File::open(path).with_context(|| format!("open graph file {:?}", path))?;
        Self::from_reader(BufReader::new(file))
            .with_context(|| format!("parse graph file {:?}", path))
    }

    /// Build an unlabeled undirected graph from integer edge pairs. Isolated
    /// endpoints are created on first sight; duplicate edges collapse.
    pub fn from_integer_edges(edges: impl IntoIterator<Item = (u64, u64)>) -> GraphInstance {
        let mut graph = crate::graph::model::LabeledGraph::new();
        let mut node_lookup: IndexMap<GraphId, NodeIndex> = IndexMap::new();
        let mut reverse_lookup = IndexMap::new();
        let mut seen: IndexSet<(u64, u64)> = IndexSet::new();

        let intern = |node: u64,
                          graph: &mut crate::graph::model::LabeledGraph,
                          node_lookup: &mut IndexMap<GraphId, NodeIndex>,
                          reverse_lookup: &mut IndexMap<NodeIndex, GraphId>| {
            let id = node.to_string();
            if let Some(idx) = node_lookup.get(&id) {
                return *idx;
            }
            let idx = graph.add_node(NodeAttributes::default());
            node_lookup.insert(id.clone(), idx);
            reverse_lookup.insert(idx, id);
            idx
        };

        for (a, b) in edges {
            let key = if a <= b { (a, b) } else { (b, a) };
            if !seen.insert(key) {
                continue;
            }
            let source = intern(a, &mut graph, &mut node_lookup, &mut reverse_lookup);
            let target = intern(b, &mut graph, &mut node_lookup, &mut reverse_lookup);
            graph.add_edge(source, target, EdgeAttributes::default());
            if source != target {
                graph.add_edge(target, source, EdgeAttributes::default());
            }
        }

        GraphInstance {
            graph,
            node_lookup,
            reverse_lookup,
            graph_attributes: IndexMap::new(),
            directed: false,
        }
    }

    /// Extract an induced subgraph over the provided node identifiers.
    pub fn induced_subgraph(
        graph: &GraphInstance,
        node_ids: &IndexSet<GraphId>,
    ) -> Result<GraphInstance> {
        let mut retain_indices = IndexSet::new();

        for node_id in node_ids {
            let idx = graph
                .node_lookup
                .get(node_id)
                .ok_or_else(|| anyhow!("Node id '{}' not found in graph", node_id))?;
            retain_indices.insert(*idx);
        }

        let mut new_graph = crate::graph::model::LabeledGraph::with_capacity(
            retain_indices.len(),
            retain_indices.len(),
        );
        let mut node_lookup = IndexMap::new();
        let mut reverse_lookup = IndexMap::new();
        let mut index_mapping: IndexMap<NodeIndex, NodeIndex> = IndexMap::new();

        for idx in &retain_indices {
            if let Some(weight) = graph.graph.node_weight(*idx) {
                let new_idx = new_graph.add_node(weight.clone());
                let node_id = graph
                    .reverse_lookup
                    .get(idx)
                    .cloned()
                    .unwrap_or_else(|| idx.index().to_string());
                node_lookup.insert(node_id.clone(), new_idx);
                reverse_lookup.insert(new_idx, node_id);
                index_mapping.insert(*idx, new_idx);
            }
        }

        for edge in graph.graph.edge_references() {
            if let (Some(&new_source), Some(&new_target)) = (
                index_mapping.get(&edge.source()),
                index_mapping.get(&edge.target()),
            ) {
                new_graph.add_edge(new_source, new_target, edge.weight().clone());
            }
        }

        Ok(GraphInstance {
            graph: new_graph,
            node_lookup,
            reverse_lookup,
            graph_attributes: graph.graph_attributes.clone(),
            directed: graph.directed,
        })
    }

    /// Induced subgraph over the largest connected component.
    pub fn largest_component(graph: &GraphInstance) -> Result<GraphInstance> {
        let mut best: Option<IndexSet<GraphId>> = None;
        let mut visited: IndexSet<NodeIndex> = IndexSet::new();

        for start in graph.graph.node_indices() {
            if visited.contains(&start) {
                continue;
            }
            let component = bfs_component(graph, start);
            for idx in &component {
                visited.insert(*idx);
            }
            let ids: IndexSet<GraphId> = component
                .iter()
                .filter_map(|idx| graph.reverse_lookup.get(idx).cloned())
                .collect();
            if best.as_ref().map(|prev| prev.len()).unwrap_or(0) < ids.len() {
                best = Some(ids);
            }
        }

        match best {
            Some(ids) => Self::induced_subgraph(graph, &ids),
            None => Ok(graph.clone()),
        }
    }

    pub fn is_connected(graph: &GraphInstance) -> bool {
        let Some(start) = graph.graph.node_indices().next() else {
            return true;
        };
        bfs_component(graph, start).len() == graph.node_count()
    }

    /// Map external node ids to internal indexes.
    pub fn resolve_node_id(graph: &GraphInstance, node_id: &GraphId) -> Option<NodeIndex> {
        graph.node_lookup.get(node_id).copied()
    }

    fn from_raw_graph(raw: RawGraph) -> Result<GraphInstance> {
        let node_count = raw.nodes.len();
        let mut graph =
            crate::graph::model::LabeledGraph::with_capacity(node_count, raw.edges.len());
        let mut node_lookup = IndexMap::new();
        let mut reverse_lookup = IndexMap::new();

        for raw_node in raw.nodes {
            let mut attributes = raw_node.attributes;
            let label = extract_label(&mut attributes);
            let weight = extract_weight(&mut attributes);
            let anchor = extract_anchor(&mut attributes);
            let node_attr = NodeAttributes {
                label,
                weight,
                anchor,
                extra: attributes,
            };
            let idx = graph.add_node(node_attr);
            node_lookup.insert(raw_node.id.clone(), idx);
            reverse_lookup.insert(idx, raw_node.id);
        }

        for raw_edge in raw.edges {
            let source_idx = *node_lookup
                .get(&raw_edge.source)
                .ok_or_else(|| anyhow!("Unknown source node id: {}", raw_edge.source))?;
            let target_idx = *node_lookup
                .get(&raw_edge.target)
                .ok_or_else(|| anyhow!("Unknown target node id: {}", raw_edge.target))?;

            let mut attributes = raw_edge.attributes;
            let weight = extract_weight(&mut attributes);
            let edge_attr = EdgeAttributes {
                weight,
                extra: attributes,
            };
            graph.add_edge(source_idx, target_idx, edge_attr.clone());
            if !raw.directed && source_idx != target_idx {
                graph.add_edge(target_idx, source_idx, edge_attr);
            }
        }

        Ok(GraphInstance {
            graph,
            node_lookup,
            reverse_lookup,
            graph_attributes: raw.graph_attributes,
            directed: raw.directed,
        })
    }
}

fn bfs_component(graph: &GraphInstance, start: NodeIndex) -> IndexSet<NodeIndex> {
    let mut visited = IndexSet::new();
    let mut queue = VecDeque::new();
    visited.insert(start);
    queue.push_back(start);

    while let Some(node) = queue.pop_front() {
        for neighbor in graph.graph.neighbors(node) {
            if visited.insert(neighbor) {
                queue.push_back(neighbor);
            }
        }
    }

    visited
}

fn extract_label(attrs: &mut IndexMap<String, serde_json::Value>) -> Option<String> {
    attrs.shift_remove("label").and_then(value_to_string)
}

fn extract_weight(attrs: &mut IndexMap<String, serde_json::Value>) -> Option<f64> {
    attrs.shift_remove("weight").and_then(|value| match value {
        serde_json::Value::Number(num) => num.as_f64(),
        serde_json::Value::String(s) => s.parse::<f64>().ok(),
        serde_json::Value::Bool(b) => Some(if b { 1.0 } else { 0.0 }),
        _ => None,
    })
}

fn extract_anchor(attrs: &mut IndexMap<String, serde_json::Value>) -> bool {
    attrs
        .shift_remove("anchor")
        .map(|value| match value {
            serde_json::Value::Bool(b) => b,
            serde_json::Value::Number(num) => num.as_f64().map(|x| x != 0.0).unwrap_or(false),
            serde_json::Value::String(s) => s == "1" || s.eq_ignore_ascii_case("true"),
            _ => false,
        })
        .unwrap_or(false)
}

fn value_to_string(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(num) => Some(num.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}
