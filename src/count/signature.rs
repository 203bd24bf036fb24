use std::collections::HashMap;

use indexmap::{map::Entry, IndexMap};
use petgraph::visit::NodeIndexable;

use crate::graph::GraphInstance;

/// Color-refinement equivalence test. A cheap necessary condition for
/// isomorphism used to prune full matcher calls during atlas and baseline
/// deduplication. `match_anchor` folds the anchor flag into the initial
/// coloring so anchored variants refine apart.
pub fn weisfeiler_lehman_equivalent(
    left: &GraphInstance,
    right: &GraphInstance,
    iterations: usize,
    match_anchor: bool,
) -> bool {
    if left.node_count() != right.node_count() {
        return false;
    }
    if left.node_count() == 0 {
        return true;
    }

    let mut left_colors = initial_colors(left, match_anchor);
    let mut right_colors = initial_colors(right, match_anchor);

    for _ in 0..iterations.max(1) {
        left_colors = refine_colors(left, &left_colors);
        right_colors = refine_colors(right, &right_colors);
        if !multiset_equivalent(&left_colors, &right_colors) {
            return false;
        }
    }

    true
}

fn initial_colors(graph: &GraphInstance, match_anchor: bool) -> Vec<u64> {
    let mut palette: IndexMap<(bool, usize), u64> = IndexMap::new();
    let mut colors = Vec::with_capacity(graph.node_count());

    for node in graph.graph.node_indices() {
        let attrs = graph.graph.node_weight(node).expect("node present");
        let anchor = match_anchor && attrs.anchor;
        let degree = graph.graph.neighbors(node).count();
        let key = (anchor, degree);
        let next_value = palette.len() as u64 + 1;
        let color = match palette.entry(key) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => *entry.insert(next_value),
        };
        colors.push(color);
    }

    colors
}

fn refine_colors(graph: &GraphInstance, colors: &[u64]) -> Vec<u64> {
    let mut palette: IndexMap<Vec<u64>, u64> = IndexMap::new();
    let mut next_colors = Vec::with_capacity(colors.len());

    for node in graph.graph.node_indices() {
        let idx = graph.graph.to_index(node);
        let mut signature = Vec::new();
        signature.push(colors[idx]);
        let mut neighbor_colors: Vec<u64> = graph
            .graph
            .neighbors(node)
            .map(|neighbor| colors[graph.graph.to_index(neighbor)])
            .collect();
        neighbor_colors.sort_unstable();
        signature.extend(neighbor_colors);
        let next_value = palette.len() as u64 + 1;
        let color = match palette.entry(signature) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => *entry.insert(next_value),
        };
        next_colors.push(color);
    }

    next_colors
}

fn multiset_equivalent(left: &[u64], right: &[u64]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut freq_left = HashMap::new();
    for value in left {
        *freq_left.entry(*value).or_insert(0usize) += 1;
    }
    let mut freq_right = HashMap::new();
    for value in right {
        *freq_right.entry(*value).or_insert(0usize) += 1;
    }
    freq_left == freq_right
}
