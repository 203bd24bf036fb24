use indexmap::IndexMap;
use petgraph::visit::EdgeRef;
use petgraph::{graph::Graph, prelude::NodeIndex};
use serde::{Deserialize, Serialize};

pub type GraphId = String;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct NodeAttributes {
    pub label: Option<String>,
    pub weight: Option<f64>,
    /// Distinguished-node marker consumed by anchored counting.
    #[serde(default)]
    pub anchor: bool,
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct EdgeAttributes {
    pub weight: Option<f64>,
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawGraph {
    pub nodes: Vec<RawNode>,
    pub edges: Vec<RawEdge>,
    #[serde(default)]
    pub graph_attributes: IndexMap<String, serde_json::Value>,
    #[serde(default)]
    pub directed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawNode {
    pub id: GraphId,
    #[serde(default)]
    pub attributes: IndexMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEdge {
    pub source: GraphId,
    pub target: GraphId,
    #[serde(default)]
    pub attributes: IndexMap<String, serde_json::Value>,
}

pub type QueryGraph = GraphInstance;
pub type TargetGraph = GraphInstance;

pub type LabeledGraph = Graph<NodeAttributes, EdgeAttributes>;

/// In-memory graph plus the id bookkeeping needed to report results in
/// terms of the original node identifiers. Undirected graphs carry both
/// arcs for every edge.
#[derive(Debug, Clone)]
pub struct GraphInstance {
    pub graph: LabeledGraph,
    pub node_lookup: IndexMap<GraphId, NodeIndex>,
    pub reverse_lookup: IndexMap<NodeIndex, GraphId>,
    pub graph_attributes: IndexMap<String, serde_json::Value>,
    pub directed: bool,
}

impl GraphInstance {
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of stored arcs. Undirected edges count twice.
    pub fn arc_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Number of distinct edges, counting each undirected pair once.
    pub fn edge_count(&self) -> usize {
        if self.directed {
            return self.graph.edge_count();
        }
        let mut loops = 0;
        for edge in self.graph.edge_references() {
            if edge.source() == edge.target() {
                loops += 1;
            }
        }
        (self.graph.edge_count() - loops) / 2 + loops
    }

    pub fn degree(&self, node: NodeIndex) -> usize {
        self.graph.neighbors(node).count()
    }

    /// Copy of this graph with every self-loop removed. Counting always
    /// operates on self-loop-free graphs.
    pub fn without_self_loops(&self) -> Self {
        let mut cleaned = self.clone();
        cleaned
            .graph
            .retain_edges(|graph, edge| match graph.edge_endpoints(edge) {
                Some((source, target)) => source != target,
                None => false,
            });
        cleaned
    }

    /// Copy with the anchor flag set on exactly one node.
    pub fn with_anchor(&self, anchor: NodeIndex) -> Self {
        let mut marked = self.clone();
        for idx in marked.graph.node_indices() {
            if let Some(attrs) = marked.graph.node_weight_mut(idx) {
                attrs.anchor = idx == anchor;
            }
        }
        marked
    }

    pub fn anchor_node(&self) -> Option<NodeIndex> {
        self.graph
            .node_indices()
            .find(|idx| self.graph[*idx].anchor)
    }

    pub fn has_anchor(&self) -> bool {
        self.anchor_node().is_some()
    }

    /// Copy with node ids replaced by consecutive integers in index order.
    pub fn relabel_to_integers(&self) -> Self {
        let mut relabeled = self.clone();
        relabeled.node_lookup.clear();
        relabeled.reverse_lookup.clear();
        for (position, idx) in self.graph.node_indices().enumerate() {
            let id = position.to_string();
            relabeled.node_lookup.insert(id.clone(), idx);
            relabeled.reverse_lookup.insert(idx, id);
        }
        relabeled
    }
}
