use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use indexmap::IndexMap;

use crate::graph::model::{EdgeAttributes, LabeledGraph, NodeAttributes};
use crate::graph::GraphInstance;

/// Reader for the TU graph-collection text format: `<DS>_A.txt` holds the
/// global edge list (1-based node ids, "u, v" per line), and
/// `<DS>_graph_indicator.txt` assigns every node to a graph. An optional
/// `<DS>_node_labels.txt` carries one integer label per node.
pub fn load(dir: &Path, name: &str) -> Result<Vec<GraphInstance>> {
    let dir = resolve_raw_dir(dir, name);
    let indicator = read_indicator(&dir.join(format!("{name}_graph_indicator.txt")))?;
    let labels = read_node_labels(&dir.join(format!("{name}_node_labels.txt")))?;
    let edges = read_edges(&dir.join(format!("{name}_A.txt")))?;

    // graph id -> (global node id -> local index), built in node-id order
    let mut builders: BTreeMap<u64, GraphBuilder> = BTreeMap::new();
    for (position, graph_id) in indicator.iter().enumerate() {
        let global_id = position as u64 + 1;
        let builder = builders.entry(*graph_id).or_default();
        let label = labels
            .as_ref()
            .and_then(|all| all.get(position))
            .map(|value| value.to_string());
        builder.add_node(global_id, label);
    }

    for (u, v) in edges {
        let graph_u = node_graph(&indicator, u)?;
        let graph_v = node_graph(&indicator, v)?;
        if graph_u != graph_v {
            bail!(
                "Edge ({}, {}) crosses graph boundary {} / {}",
                u,
                v,
                graph_u,
                graph_v
            );
        }
        let builder = builders
            .get_mut(&graph_u)
            .context("edge references unknown graph")?;
        builder.add_edge(u, v);
    }

    Ok(builders.into_values().map(GraphBuilder::finish).collect())
}

fn resolve_raw_dir(dir: &Path, name: &str) -> PathBuf {
    // TU archives unpack either flat or as <NAME>/raw/<files>.
    let nested = dir.join("raw");
    if nested.join(format!("{name}_A.txt")).is_file() {
        nested
    } else {
        dir.to_path_buf()
    }
}

fn read_indicator(path: &Path) -> Result<Vec<u64>> {
    let file = File::open(path).with_context(|| format!("open graph indicator {:?}", path))?;
    let mut assignments = Vec::new();
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let graph_id: u64 = trimmed
            .parse()
            .with_context(|| format!("parse graph indicator line {}", line_no + 1))?;
        assignments.push(graph_id);
    }
    Ok(assignments)
}

fn read_node_labels(path: &Path) -> Result<Option<Vec<i64>>> {
    if !path.is_file() {
        return Ok(None);
    }
    let file = File::open(path).with_context(|| format!("open node labels {:?}", path))?;
    let mut labels = Vec::new();
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        // Some collections emit several comma-separated label columns;
        // the first one is the node label.
        let first = trimmed.split(',').next().unwrap_or(trimmed).trim();
        let label: i64 = first
            .parse()
            .with_context(|| format!("parse node label line {}", line_no + 1))?;
        labels.push(label);
    }
    Ok(Some(labels))
}

fn read_edges(path: &Path) -> Result<Vec<(u64, u64)>> {
    let file = File::open(path).with_context(|| format!("open adjacency list {:?}", path))?;
    let mut edges = Vec::new();
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let mut parts = trimmed.split(',');
        let (Some(a), Some(b)) = (parts.next(), parts.next()) else {
            bail!("Malformed adjacency line {} in {:?}", line_no + 1, path);
        };
        let u: u64 = a
            .trim()
            .parse()
            .with_context(|| format!("parse edge source on line {}", line_no + 1))?;
        let v: u64 = b
            .trim()
            .parse()
            .with_context(|| format!("parse edge target on line {}", line_no + 1))?;
        edges.push((u, v));
    }
    Ok(edges)
}

fn node_graph(indicator: &[u64], global_id: u64) -> Result<u64> {
    let position = global_id
        .checked_sub(1)
        .map(|value| value as usize)
        .filter(|value| *value < indicator.len());
    match position {
        Some(idx) => Ok(indicator[idx]),
        None => bail!("Node id {} outside graph indicator range", global_id),
    }
}

#[derive(Default)]
struct GraphBuilder {
    graph: LabeledGraph,
    node_lookup: IndexMap<String, petgraph::prelude::NodeIndex>,
    reverse_lookup: IndexMap<petgraph::prelude::NodeIndex, String>,
    global_to_local: IndexMap<u64, petgraph::prelude::NodeIndex>,
    seen_edges: IndexMap<(u64, u64), ()>,
}

impl GraphBuilder {
    fn add_node(&mut self, global_id: u64, label: Option<String>) {
        let local_id = self.node_lookup.len().to_string();
        let idx = self.graph.add_node(NodeAttributes {
            label,
            ..NodeAttributes::default()
        });
        self.node_lookup.insert(local_id.clone(), idx);
        self.reverse_lookup.insert(idx, local_id);
        self.global_to_local.insert(global_id, idx);
    }

    fn add_edge(&mut self, u: u64, v: u64) {
        let key = if u <= v { (u, v) } else { (v, u) };
        if self.seen_edges.insert(key, ()).is_some() {
            return;
        }
        let (Some(&source), Some(&target)) =
            (self.global_to_local.get(&u), self.global_to_local.get(&v))
        else {
            return;
        };
        self.graph
            .add_edge(source, target, EdgeAttributes::default());
        if source != target {
            self.graph
                .add_edge(target, source, EdgeAttributes::default());
        }
    }

    fn finish(self) -> GraphInstance {
        GraphInstance {
            graph: self.graph,
            node_lookup: self.node_lookup,
            reverse_lookup: self.reverse_lookup,
            graph_attributes: IndexMap::new(),
            directed: false,
        }
    }
}
