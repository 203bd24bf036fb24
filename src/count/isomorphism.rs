use petgraph::algo::isomorphism::is_isomorphic_matching;
use vf2::{isomorphisms, subgraph_isomorphisms};

use crate::graph::model::{EdgeAttributes, NodeAttributes};
use crate::graph::GraphInstance;

/// Induced subgraph-isomorphism checks over the in-memory graph model.
///
/// Counting deliberately ignores node labels and weights; the only
/// attribute that constrains a mapping is the anchor flag, and only in
/// anchored mode.

fn anchor_eq(query: &NodeAttributes, target: &NodeAttributes) -> bool {
    query.anchor == target.anchor
}

fn any_node(_: &NodeAttributes, _: &NodeAttributes) -> bool {
    true
}

fn any_edge(_: &EdgeAttributes, _: &EdgeAttributes) -> bool {
    true
}

/// Does the query embed into the target as an induced subgraph?
pub fn subgraph_present(query: &GraphInstance, target: &GraphInstance, anchored: bool) -> bool {
    if query.node_count() > target.node_count() {
        return false;
    }
    if anchored {
        subgraph_isomorphisms(&query.graph, &target.graph)
            .node_eq(anchor_eq)
            .edge_eq(any_edge)
            .first()
            .is_some()
    } else {
        subgraph_isomorphisms(&query.graph, &target.graph)
            .node_eq(any_node)
            .edge_eq(any_edge)
            .first()
            .is_some()
    }
}

/// Number of induced embeddings of the query into the target, counting
/// every node mapping separately.
pub fn count_embeddings(query: &GraphInstance, target: &GraphInstance, anchored: bool) -> usize {
    if query.node_count() > target.node_count() {
        return 0;
    }
    if anchored {
        subgraph_isomorphisms(&query.graph, &target.graph)
            .node_eq(anchor_eq)
            .edge_eq(any_edge)
            .iter()
            .count()
    } else {
        subgraph_isomorphisms(&query.graph, &target.graph)
            .node_eq(any_node)
            .edge_eq(any_edge)
            .iter()
            .count()
    }
}

/// Number of self-isomorphisms of a query, used to normalize frequency
/// counts. At least 1 for non-empty graphs; anchors do not constrain it.
pub fn automorphism_count(query: &GraphInstance) -> usize {
    if query.node_count() == 0 {
        return 1;
    }
    isomorphisms(&query.graph, &query.graph)
        .node_eq(any_node)
        .edge_eq(any_edge)
        .iter()
        .count()
        .max(1)
}

/// Whole-graph isomorphism used for deduplication. `match_anchor` makes
/// anchored variants of the same graph distinct.
pub fn isomorphic(left: &GraphInstance, right: &GraphInstance, match_anchor: bool) -> bool {
    if left.node_count() != right.node_count() {
        return false;
    }
    if match_anchor {
        is_isomorphic_matching(&left.graph, &right.graph, anchor_eq, any_edge)
    } else {
        is_isomorphic_matching(&left.graph, &right.graph, any_node, any_edge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphLoader;

    fn path(len: usize) -> GraphInstance {
        GraphLoader::from_integer_edges((0..len as u64 - 1).map(|i| (i, i + 1)))
    }

    fn triangle() -> GraphInstance {
        GraphLoader::from_integer_edges(vec![(0, 1), (1, 2), (2, 0)])
    }

    fn square() -> GraphInstance {
        GraphLoader::from_integer_edges(vec![(0, 1), (1, 2), (2, 3), (3, 0)])
    }

    #[test]
    fn triangle_embeds_only_where_present() {
        assert!(subgraph_present(&triangle(), &triangle(), false));
        assert!(!subgraph_present(&triangle(), &square(), false));
        assert!(subgraph_present(&path(3), &square(), false));
    }

    #[test]
    fn induced_semantics_exclude_chords() {
        // A 3-path is not an induced subgraph of a triangle.
        assert!(!subgraph_present(&path(3), &triangle(), false));
    }

    #[test]
    fn embedding_counts_follow_symmetries() {
        // Each of the 3 node rotations times 2 orientations.
        assert_eq!(count_embeddings(&triangle(), &triangle(), false), 6);
        // 4 positions for the middle node, 2 orientations each.
        assert_eq!(count_embeddings(&path(3), &square(), false), 8);
    }

    #[test]
    fn automorphisms_of_standard_shapes() {
        assert_eq!(automorphism_count(&triangle()), 6);
        assert_eq!(automorphism_count(&path(3)), 2);
        assert_eq!(automorphism_count(&square()), 8);
    }

    #[test]
    fn anchored_matching_pins_the_anchor() {
        let query = path(3);
        let query = query.with_anchor(query.node_lookup["1"]);
        let target = square();

        // Anchor on any square node: the path middle must land there.
        let marked = target.with_anchor(target.node_lookup["0"]);
        assert!(subgraph_present(&query, &marked, true));
        assert_eq!(count_embeddings(&query, &marked, true), 2);

        // End-anchored query also matches, but with a different count.
        let end_query = path(3);
        let end_query = end_query.with_anchor(end_query.node_lookup["0"]);
        assert_eq!(count_embeddings(&end_query, &marked, true), 2);
    }

    #[test]
    fn anchored_dedup_distinguishes_orbits() {
        let base = path(3);
        let end = base.with_anchor(base.node_lookup["0"]);
        let other_end = base.with_anchor(base.node_lookup["2"]);
        let middle = base.with_anchor(base.node_lookup["1"]);
        assert!(isomorphic(&end, &other_end, true));
        assert!(!isomorphic(&end, &middle, true));
        assert!(isomorphic(&end, &middle, false));
    }
}
