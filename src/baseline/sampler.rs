use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, bail, Result};
use indexmap::IndexSet;
use log::debug;
use petgraph::prelude::NodeIndex;
use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::graph::{GraphId, GraphInstance, GraphLoader};

const RADIAL_HOPS: usize = 3;
const ESU_KEEP_PROBABILITY: f64 = 0.9;
const ATTEMPTS_PER_NODE: usize = 200;

/// Comparison-query sampling heuristics. `None` keeps the mined queries;
/// `Exact` switches to the exhaustive atlas census instead of sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselineMethod {
    None,
    Exact,
    MFinder,
    RandEsu,
    Radial,
    Tree,
}

impl BaselineMethod {
    pub fn parse(value: &str) -> Result<Self, String> {
        value.parse()
    }
}

impl FromStr for BaselineMethod {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "none" => Ok(Self::None),
            "exact" => Ok(Self::Exact),
            "mfinder" => Ok(Self::MFinder),
            "rand-esu" => Ok(Self::RandEsu),
            "radial" => Ok(Self::Radial),
            "tree" => Ok(Self::Tree),
            other => Err(format!(
                "unknown baseline '{other}' (expected none|exact|mfinder|rand-esu|radial|tree)"
            )),
        }
    }
}

impl fmt::Display for BaselineMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Exact => "exact",
            Self::MFinder => "mfinder",
            Self::RandEsu => "rand-esu",
            Self::Radial => "radial",
            Self::Tree => "tree",
        };
        write!(f, "{name}")
    }
}

/// Draws random connected subgraphs from the targets, size-matched to the
/// queries they replace.
pub struct BaselineSampler {
    rng: Xoshiro256PlusPlus,
    node_anchored: bool,
}

impl BaselineSampler {
    pub fn new(seed: Option<u64>, node_anchored: bool) -> Self {
        Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed.unwrap_or_else(entropy_seed)),
            node_anchored,
        }
    }

    /// One baseline query per input query, matching its node count.
    pub fn generate(
        &mut self,
        method: BaselineMethod,
        queries: &[GraphInstance],
        targets: &[GraphInstance],
    ) -> Result<Vec<GraphInstance>> {
        if targets.is_empty() {
            bail!("Cannot sample baseline queries without target graphs");
        }
        let mut samples = Vec::with_capacity(queries.len());
        for (position, query) in queries.iter().enumerate() {
            let size = query.node_count();
            if size == 0 {
                samples.push(query.clone());
                continue;
            }
            let sample = self.sample_one(method, size, targets).map_err(|err| {
                anyhow!("baseline query #{position} (size {size}): {err}")
            })?;
            samples.push(sample);
        }
        Ok(samples)
    }

    fn sample_one(
        &mut self,
        method: BaselineMethod,
        size: usize,
        targets: &[GraphInstance],
    ) -> Result<GraphInstance> {
        let max_attempts = ATTEMPTS_PER_NODE * size;
        for attempt in 0..max_attempts {
            let target = &targets[self.rng.gen_range(0..targets.len())];
            if target.node_count() < size {
                continue;
            }
            let candidate = match method {
                BaselineMethod::Radial => self.radial(target, size)?,
                BaselineMethod::Tree => self.tree(target, size)?,
                BaselineMethod::MFinder => self.mfinder(target, size)?,
                BaselineMethod::RandEsu => self.rand_esu(target, size)?,
                BaselineMethod::None | BaselineMethod::Exact => {
                    bail!("baseline method {method} does not sample queries")
                }
            };
            if let Some(subgraph) = candidate {
                debug!(
                    "Sampled {} baseline query of size {} after {} attempts",
                    method,
                    size,
                    attempt + 1
                );
                let mut relabeled = subgraph.relabel_to_integers();
                if self.node_anchored {
                    let nodes: Vec<NodeIndex> = relabeled.graph.node_indices().collect();
                    let anchor = nodes[self.rng.gen_range(0..nodes.len())];
                    relabeled = relabeled.with_anchor(anchor);
                }
                return Ok(relabeled);
            }
        }
        bail!(
            "Unable to sample a size-{} subgraph with method {} after {} attempts",
            size,
            method,
            max_attempts
        )
    }

    /// Induced ball of bounded radius around a random node, reduced to its
    /// largest component; accepted only when the size matches exactly.
    fn radial(&mut self, target: &GraphInstance, size: usize) -> Result<Option<GraphInstance>> {
        let Some(start) = self.random_node(target) else {
            return Ok(None);
        };
        let ball = bfs_ball(target, start, RADIAL_HOPS);
        let ids = to_ids(target, &ball);
        let induced = GraphLoader::induced_subgraph(target, &ids)?;
        let component = GraphLoader::largest_component(&induced)?;
        if component.node_count() == size {
            Ok(Some(component))
        } else {
            Ok(None)
        }
    }

    /// Random frontier expansion from a random start node.
    fn tree(&mut self, target: &GraphInstance, size: usize) -> Result<Option<GraphInstance>> {
        let Some(start) = self.random_node(target) else {
            return Ok(None);
        };
        let mut chosen: IndexSet<NodeIndex> = IndexSet::new();
        chosen.insert(start);
        let mut frontier: Vec<NodeIndex> = target
            .graph
            .neighbors(start)
            .filter(|node| !chosen.contains(node))
            .collect();

        while chosen.len() < size && !frontier.is_empty() {
            let pick = frontier.swap_remove(self.rng.gen_range(0..frontier.len()));
            if !chosen.insert(pick) {
                continue;
            }
            for neighbor in target.graph.neighbors(pick) {
                if !chosen.contains(&neighbor) && !frontier.contains(&neighbor) {
                    frontier.push(neighbor);
                }
            }
            frontier.retain(|node| !chosen.contains(node));
        }

        if chosen.len() != size {
            return Ok(None);
        }
        let ids = to_ids(target, &chosen);
        Ok(Some(GraphLoader::induced_subgraph(target, &ids)?))
    }

    /// Edge-growth sampling: start from a random edge and repeatedly add a
    /// random boundary edge until the node set reaches the requested size.
    fn mfinder(&mut self, target: &GraphInstance, size: usize) -> Result<Option<GraphInstance>> {
        let edges: Vec<(NodeIndex, NodeIndex)> = collect_arcs(target);
        if edges.is_empty() {
            return Ok(None);
        }
        let (u, v) = edges[self.rng.gen_range(0..edges.len())];
        let mut chosen: IndexSet<NodeIndex> = IndexSet::new();
        chosen.insert(u);
        chosen.insert(v);

        while chosen.len() < size {
            let boundary: Vec<NodeIndex> = chosen
                .iter()
                .flat_map(|node| target.graph.neighbors(*node))
                .filter(|node| !chosen.contains(node))
                .collect();
            if boundary.is_empty() {
                return Ok(None);
            }
            let pick = boundary[self.rng.gen_range(0..boundary.len())];
            chosen.insert(pick);
        }

        if chosen.len() != size {
            return Ok(None);
        }
        let ids = to_ids(target, &chosen);
        Ok(Some(GraphLoader::induced_subgraph(target, &ids)?))
    }

    /// Randomized ESU descent: extensions stay exclusive to the current
    /// subgraph and are only taken past the root, each with a fixed keep
    /// probability per step.
    fn rand_esu(&mut self, target: &GraphInstance, size: usize) -> Result<Option<GraphInstance>> {
        let Some(root) = self.random_node(target) else {
            return Ok(None);
        };
        let mut chosen: IndexSet<NodeIndex> = IndexSet::new();
        chosen.insert(root);
        let mut extension: Vec<NodeIndex> = target
            .graph
            .neighbors(root)
            .filter(|node| node.index() > root.index())
            .collect();

        while chosen.len() < size && !extension.is_empty() {
            let pick = extension.swap_remove(self.rng.gen_range(0..extension.len()));
            if self.rng.gen::<f64>() > ESU_KEEP_PROBABILITY {
                continue;
            }
            if !chosen.insert(pick) {
                continue;
            }
            for neighbor in target.graph.neighbors(pick) {
                if neighbor.index() > root.index()
                    && !chosen.contains(&neighbor)
                    && !extension.contains(&neighbor)
                {
                    extension.push(neighbor);
                }
            }
        }

        if chosen.len() != size {
            return Ok(None);
        }
        let ids = to_ids(target, &chosen);
        Ok(Some(GraphLoader::induced_subgraph(target, &ids)?))
    }

    fn random_node(&mut self, target: &GraphInstance) -> Option<NodeIndex> {
        let nodes: Vec<NodeIndex> = target.graph.node_indices().collect();
        if nodes.is_empty() {
            return None;
        }
        Some(nodes[self.rng.gen_range(0..nodes.len())])
    }
}

fn collect_arcs(target: &GraphInstance) -> Vec<(NodeIndex, NodeIndex)> {
    use petgraph::visit::EdgeRef;
    target
        .graph
        .edge_references()
        .filter(|edge| edge.source() < edge.target())
        .map(|edge| (edge.source(), edge.target()))
        .collect()
}

fn bfs_ball(target: &GraphInstance, start: NodeIndex, hops: usize) -> IndexSet<NodeIndex> {
    let mut visited = IndexSet::new();
    let mut queue = VecDeque::new();
    visited.insert(start);
    queue.push_back((start, 0usize));

    while let Some((node, depth)) = queue.pop_front() {
        if depth >= hops {
            continue;
        }
        for neighbor in target.graph.neighbors(node) {
            if visited.insert(neighbor) {
                queue.push_back((neighbor, depth + 1));
            }
        }
    }

    visited
}

fn to_ids(target: &GraphInstance, nodes: &IndexSet<NodeIndex>) -> IndexSet<GraphId> {
    nodes
        .iter()
        .filter_map(|idx| target.reverse_lookup.get(idx).cloned())
        .collect()
}

fn entropy_seed() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}
