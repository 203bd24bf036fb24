use anyhow::{bail, Result};
use indexmap::IndexMap;
use log::{info, warn};

use crate::count::dispatcher::CountDispatcher;
use crate::count::isomorphism::isomorphic;
use crate::count::signature::weisfeiler_lehman_equivalent;
use crate::graph::model::{EdgeAttributes, LabeledGraph, NodeAttributes};
use crate::graph::{GraphInstance, GraphLoader};

const MAX_ATLAS_ORDER: usize = 6;
const WL_DEDUP_ITERATIONS: usize = 3;
const TOP_SIZE5: usize = 10;
const TOP_SIZE6: usize = 20;

/// All connected graphs on `order` nodes, one representative per
/// isomorphism class, produced by edge-subset enumeration. Orders up to 6
/// are supported (112 classes); beyond that the enumeration blows up.
pub fn connected_atlas(order: usize) -> Result<Vec<GraphInstance>> {
    if order == 0 || order > MAX_ATLAS_ORDER {
        bail!(
            "Atlas enumeration supports orders 1..={}, got {}",
            MAX_ATLAS_ORDER,
            order
        );
    }
    if order == 1 {
        return Ok(vec![single_node()]);
    }

    let pairs: Vec<(usize, usize)> = (0..order)
        .flat_map(|u| ((u + 1)..order).map(move |v| (u, v)))
        .collect();

    let mut representatives: Vec<GraphInstance> = Vec::new();
    for mask in 0u32..(1u32 << pairs.len()) {
        // Fewer than order-1 edges can never connect all nodes.
        if (mask.count_ones() as usize) < order - 1 {
            continue;
        }
        let candidate = build_from_mask(order, &pairs, mask);
        if !GraphLoader::is_connected(&candidate) {
            continue;
        }
        if find_duplicate(&representatives, &candidate, false) {
            continue;
        }
        representatives.push(candidate);
    }

    Ok(representatives)
}

/// Expand atlas representatives into anchored variants, one per node
/// orbit: placing the anchor on symmetric nodes yields the same anchored
/// class and is deduplicated.
pub fn anchored_variants(graphs: &[GraphInstance]) -> Vec<GraphInstance> {
    let mut variants: Vec<GraphInstance> = Vec::new();
    for graph in graphs {
        for node in graph.graph.node_indices() {
            let candidate = graph.with_anchor(node);
            if find_duplicate(&variants, &candidate, true) {
                continue;
            }
            variants.push(candidate);
        }
    }
    variants
}

/// Exhaustive comparison baseline: count every 5-node graphlet orbit and
/// every 6-node atlas query over the targets, and report the strongest
/// counts (top-10 for size 5, top-20 for size 6) with their mean log10.
pub fn count_exact(
    dispatcher: &CountDispatcher,
    targets: &[GraphInstance],
    node_anchored: bool,
) -> Result<Vec<f64>> {
    if !node_anchored {
        warn!("The size-5 orbit census is only defined node-anchored; forcing anchors for it");
    }

    let atlas5 = connected_atlas(5)?;
    let queries5 = anchored_variants(&atlas5);
    info!(
        "Size-5 census: {} graphlets, {} anchored orbits",
        atlas5.len(),
        queries5.len()
    );
    let counts5 = dispatcher.count_with_anchoring(&queries5, targets, true)?;
    let top5 = top_counts(&counts5, TOP_SIZE5);
    for value in &top5 {
        info!("size-5 orbit count {}", value);
    }
    info!("Average for size 5: {:.4}", mean_log10(&top5));

    let atlas6 = connected_atlas(6)?;
    let queries6 = if node_anchored {
        anchored_variants(&atlas6)
    } else {
        atlas6.clone()
    };
    info!(
        "Size-6 census: {} graphlets, {} queries",
        atlas6.len(),
        queries6.len()
    );
    let counts6 = dispatcher.count_with_anchoring(&queries6, targets, node_anchored)?;
    let top6 = top_counts(&counts6, TOP_SIZE6);
    for value in &top6 {
        info!("size-6 atlas count {}", value);
    }
    info!("Average for size 6: {:.4}", mean_log10(&top6));

    let mut baseline = top5;
    baseline.extend(top6);
    Ok(baseline)
}

fn single_node() -> GraphInstance {
    let mut graph = LabeledGraph::new();
    let idx = graph.add_node(NodeAttributes::default());
    let mut node_lookup = IndexMap::new();
    let mut reverse_lookup = IndexMap::new();
    node_lookup.insert("0".to_string(), idx);
    reverse_lookup.insert(idx, "0".to_string());
    GraphInstance {
        graph,
        node_lookup,
        reverse_lookup,
        graph_attributes: IndexMap::new(),
        directed: false,
    }
}

fn build_from_mask(order: usize, pairs: &[(usize, usize)], mask: u32) -> GraphInstance {
    let mut graph = LabeledGraph::with_capacity(order, pairs.len());
    let mut node_lookup = IndexMap::new();
    let mut reverse_lookup = IndexMap::new();
    let mut indices = Vec::with_capacity(order);
    for node in 0..order {
        let idx = graph.add_node(NodeAttributes::default());
        node_lookup.insert(node.to_string(), idx);
        reverse_lookup.insert(idx, node.to_string());
        indices.push(idx);
    }
    for (bit, (u, v)) in pairs.iter().enumerate() {
        if mask & (1 << bit) != 0 {
            graph.add_edge(indices[*u], indices[*v], EdgeAttributes::default());
            graph.add_edge(indices[*v], indices[*u], EdgeAttributes::default());
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

fn find_duplicate(
    kept: &[GraphInstance],
    candidate: &GraphInstance,
    match_anchor: bool,
) -> bool {
    kept.iter().any(|existing| {
        existing.edge_count() == candidate.edge_count()
            && weisfeiler_lehman_equivalent(
                existing,
                candidate,
                WL_DEDUP_ITERATIONS,
                match_anchor,
            )
            && isomorphic(existing, candidate, match_anchor)
    })
}

fn top_counts(counts: &[f64], limit: usize) -> Vec<f64> {
    let mut sorted = counts.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));
    sorted.truncate(limit);
    sorted
}

fn mean_log10(values: &[f64]) -> f64 {
    let positive: Vec<f64> = values.iter().copied().filter(|v| *v > 0.0).collect();
    if positive.is_empty() {
        return f64::NEG_INFINITY;
    }
    positive.iter().map(|v| v.log10()).sum::<f64>() / positive.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::count::dispatcher::{CountConfig, CountDispatcher};

    #[test]
    fn atlas_sizes_match_known_counts() {
        assert_eq!(connected_atlas(1).unwrap().len(), 1);
        assert_eq!(connected_atlas(2).unwrap().len(), 1);
        assert_eq!(connected_atlas(3).unwrap().len(), 2);
        assert_eq!(connected_atlas(4).unwrap().len(), 6);
        assert_eq!(connected_atlas(5).unwrap().len(), 21);
    }

    #[test]
    fn atlas_order_six_has_all_classes() {
        assert_eq!(connected_atlas(6).unwrap().len(), 112);
    }

    #[test]
    fn orbit_counts_match_known_values() {
        // Orbits of connected graphlets: 3 for order 3, 11 for order 4.
        let atlas3 = connected_atlas(3).unwrap();
        assert_eq!(anchored_variants(&atlas3).len(), 3);
        let atlas4 = connected_atlas(4).unwrap();
        assert_eq!(anchored_variants(&atlas4).len(), 11);
        // 58 node orbits across the 21 connected 5-node graphlets.
        let atlas5 = connected_atlas(5).unwrap();
        assert_eq!(anchored_variants(&atlas5).len(), 58);
    }

    #[test]
    fn oversized_order_is_rejected() {
        assert!(connected_atlas(7).is_err());
        assert!(connected_atlas(0).is_err());
    }

    #[test]
    fn exact_baseline_has_fixed_length() {
        let dispatcher = CountDispatcher::new(CountConfig::default());
        // A 7-node target: a 6-cycle with a chord plus a pendant node.
        let target = crate::graph::GraphLoader::from_integer_edges(vec![
            (0, 1),
            (1, 2),
            (2, 3),
            (3, 4),
            (4, 5),
            (5, 0),
            (0, 3),
            (5, 6),
        ]);
        let baseline = count_exact(&dispatcher, &[target], true).unwrap();
        assert_eq!(baseline.len(), TOP_SIZE5 + TOP_SIZE6);
        // Counts are sorted strongest-first within each size block.
        assert!(baseline[0] >= baseline[TOP_SIZE5 - 1]);
    }
}
