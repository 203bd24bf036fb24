use anyhow::Result;
use motifcount::graph::GraphLoader;
use motifcount::{
    BaselineMethod, BaselineSampler, CountConfig, CountDispatcher, CountMethod, GraphInstance,
    QuerySet,
};

fn grid_target(side: u64) -> GraphInstance {
    let mut edges = Vec::new();
    for row in 0..side {
        for col in 0..side {
            let node = row * side + col;
            if col < side - 1 {
                edges.push((node, node + 1));
            }
            if row < side - 1 {
                edges.push((node, node + side));
            }
        }
    }
    GraphLoader::from_integer_edges(edges)
}

fn path_query(len: u64) -> GraphInstance {
    GraphLoader::from_integer_edges((0..len - 1).map(|i| (i, i + 1)))
}

/// Every baseline query is sampled out of a target, so binary presence
/// counting over the same targets must find each of them at least once.
#[test]
fn sampled_baselines_are_present_in_their_source() -> Result<()> {
    let targets = vec![grid_target(4)];
    let queries = vec![path_query(3), path_query(4), path_query(5)];

    for method in [
        BaselineMethod::Tree,
        BaselineMethod::MFinder,
        BaselineMethod::RandEsu,
    ] {
        let mut sampler = BaselineSampler::new(Some(17), false);
        let baseline_queries = sampler.generate(method, &queries, &targets)?;

        let dispatcher = CountDispatcher::new(CountConfig::default());
        let counts = dispatcher.count(&baseline_queries, &targets)?;
        for (idx, count) in counts.iter().enumerate() {
            assert!(
                *count >= 1.0,
                "method {method}: baseline query #{idx} not found in its source target"
            );
        }
    }
    Ok(())
}

#[test]
fn anchored_baselines_count_under_freq_semantics() -> Result<()> {
    let targets = vec![grid_target(3)];
    let queries = vec![path_query(3)];

    let mut sampler = BaselineSampler::new(Some(23), true);
    let baseline_queries = sampler.generate(BaselineMethod::Tree, &queries, &targets)?;
    assert!(baseline_queries[0].has_anchor());

    let config = CountConfig {
        method: CountMethod::Freq,
        node_anchored: true,
        workers: 2,
        seed: Some(23),
        ..CountConfig::default()
    };
    let dispatcher = CountDispatcher::new(config);
    let counts = dispatcher.count(&baseline_queries, &targets)?;
    assert_eq!(counts.len(), 1);
    assert!(counts[0] > 0.0, "sampled subgraph must occur somewhere");
    Ok(())
}

#[test]
fn query_lens_track_baseline_sizes() -> Result<()> {
    let targets = vec![grid_target(4)];
    let queries = vec![path_query(5), path_query(3)];

    let mut sampler = BaselineSampler::new(Some(31), false);
    let baseline_queries = sampler.generate(BaselineMethod::MFinder, &queries, &targets)?;
    let lens: Vec<usize> = baseline_queries
        .iter()
        .map(GraphInstance::node_count)
        .collect();
    assert_eq!(lens, vec![5, 3]);

    // Generated baselines roundtrip through the query file format.
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("baseline-queries.json");
    QuerySet::write_to_path(&baseline_queries, &path)?;
    let reloaded = QuerySet::load(&path)?;
    assert_eq!(reloaded.query_lens(), lens);
    Ok(())
}
