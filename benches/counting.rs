use criterion::{black_box, criterion_group, criterion_main, Criterion};
use indexmap::IndexMap;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use motifcount::count::isomorphism::{automorphism_count, count_embeddings, subgraph_present};
use motifcount::graph::model::{EdgeAttributes, GraphInstance, LabeledGraph, NodeAttributes};
use motifcount::graph::GraphLoader;
use motifcount::{CountConfig, CountDispatcher, CountMethod};

fn random_graph(nodes: usize, probability: f64, seed: u64) -> GraphInstance {
    let mut graph = LabeledGraph::with_capacity(nodes, nodes * nodes);
    let mut node_lookup = IndexMap::new();
    let mut reverse_lookup = IndexMap::new();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);

    for i in 0..nodes {
        let idx = graph.add_node(NodeAttributes::default());
        let id = i.to_string();
        node_lookup.insert(id.clone(), idx);
        reverse_lookup.insert(idx, id);
    }

    for i in 0..nodes {
        for j in (i + 1)..nodes {
            if rng.gen::<f64>() <= probability {
                let source = node_lookup[&i.to_string()];
                let target = node_lookup[&j.to_string()];
                graph.add_edge(source, target, EdgeAttributes::default());
                graph.add_edge(target, source, EdgeAttributes::default());
            }
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

fn bench_counting(c: &mut Criterion) {
    let target_small = random_graph(64, 0.08, 42);
    let target_medium = random_graph(192, 0.04, 7);
    let triangle = GraphLoader::from_integer_edges(vec![(0, 1), (1, 2), (2, 0)]);
    let path5 = GraphLoader::from_integer_edges(vec![(0, 1), (1, 2), (2, 3), (3, 4)]);

    let mut group = c.benchmark_group("counting");

    group.bench_function("presence_64", |b| {
        b.iter(|| {
            let hit = subgraph_present(&triangle, &target_small, false);
            black_box(hit);
        });
    });

    group.bench_function("embeddings_64", |b| {
        b.iter(|| {
            let count = count_embeddings(&triangle, &target_small, false);
            black_box(count);
        });
    });

    group.bench_function("automorphisms_path5", |b| {
        b.iter(|| {
            let count = automorphism_count(&path5);
            black_box(count);
        });
    });

    group.bench_function("dispatch_bin_192", |b| {
        let dispatcher = CountDispatcher::new(CountConfig {
            workers: 4,
            ..CountConfig::default()
        });
        let queries = vec![triangle.clone(), path5.clone()];
        let targets = vec![target_medium.clone()];
        b.iter(|| {
            let counts = dispatcher.count(&queries, &targets).expect("counts");
            black_box(counts);
        });
    });

    group.bench_function("dispatch_freq_64", |b| {
        let dispatcher = CountDispatcher::new(CountConfig {
            method: CountMethod::Freq,
            workers: 4,
            ..CountConfig::default()
        });
        let queries = vec![triangle.clone()];
        let targets = vec![target_small.clone()];
        b.iter(|| {
            let counts = dispatcher.count(&queries, &targets).expect("counts");
            black_box(counts);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_counting);
criterion_main!(benches);
