use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use motifcount::count::count_exact;
use motifcount::{
    BaselineMethod, BaselineSampler, CountConfig, CountDispatcher, CountMethod, CountReport,
    DatasetLoader, ExternalMatcher, QuerySet,
};

const ANALYZE_QUERY_CAP: usize = 200;

#[derive(Debug, Parser)]
#[command(name = "motifcount", about = "Count query motifs inside target graphs")]
struct Args {
    /// Named dataset providing the target graphs.
    #[arg(long, default_value = "enzymes")]
    dataset: String,
    /// JSON file with previously mined candidate motifs.
    #[arg(long, default_value = "results/out-patterns.json")]
    queries_path: PathBuf,
    /// Where the (query_lens, counts, []) triple is written.
    #[arg(long, default_value = "results/counts.json")]
    out_path: PathBuf,
    /// Worker threads for the counting pool.
    #[arg(long, default_value_t = 1)]
    n_workers: usize,
    /// bin: binary presence per unit; freq: embeddings over automorphisms.
    #[arg(long, default_value = "bin", value_parser = CountMethod::parse)]
    count_method: CountMethod,
    /// none, exact, or a sampling heuristic replacing the queries.
    #[arg(long, default_value = "none", value_parser = BaselineMethod::parse)]
    baseline: BaselineMethod,
    /// Count around a distinguished anchor node per work unit.
    #[arg(long)]
    node_anchored: bool,
    /// Anchors sampled per target in anchored mode; all nodes when absent.
    #[arg(long)]
    anchor_samples: Option<usize>,
    /// Seed for anchor and baseline sampling.
    #[arg(long)]
    seed: Option<u64>,
    /// Root directory for dataset files.
    #[arg(long, default_value = "data")]
    data_root: PathBuf,
    /// Path to a native subgraph-isomorphism engine; in-process when absent.
    #[arg(long)]
    external_binary: Option<PathBuf>,
}

fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();
    info!("Using {} workers", args.n_workers);
    info!("Baseline: {}", args.baseline);

    let loader = DatasetLoader::new(&args.data_root);
    let (targets, queries) = if args.dataset == "analyze" {
        let targets = loader.load("enzymes").context("load analyze targets")?;
        let queries = QuerySet::load_scored(&args.queries_path, ANALYZE_QUERY_CAP)
            .context("load scored candidate queries")?;
        (targets, queries)
    } else {
        let targets = loader
            .load(&args.dataset)
            .with_context(|| format!("load dataset '{}'", args.dataset))?;
        let queries = QuerySet::load(&args.queries_path).context("load queries")?;
        (targets, queries)
    };

    let config = CountConfig {
        method: args.count_method,
        node_anchored: args.node_anchored,
        workers: args.n_workers,
        anchor_samples: args.anchor_samples,
        seed: args.seed,
    };
    let dispatcher = match &args.external_binary {
        Some(binary) => {
            let matcher = ExternalMatcher::new(binary)
                .with_context(|| format!("set up external matcher {:?}", binary))?;
            CountDispatcher::with_external(config, matcher)
        }
        None => CountDispatcher::new(config),
    };

    let mut query_lens = queries.query_lens();
    let counts = match args.baseline {
        BaselineMethod::None => dispatcher.count(&queries.graphs, &targets)?,
        BaselineMethod::Exact => {
            let baseline = count_exact(&dispatcher, &targets, args.node_anchored)
                .context("run exact baseline census")?;
            let capped = queries.graphs.len().min(baseline.len());
            dispatcher.count(&queries.graphs[..capped], &targets)?
        }
        method => {
            let mut sampler = BaselineSampler::new(args.seed, args.node_anchored);
            let baseline_queries = sampler
                .generate(method, &queries.graphs, &targets)
                .with_context(|| format!("generate {method} baseline queries"))?;
            query_lens = baseline_queries
                .iter()
                .map(|graph| graph.node_count())
                .collect();
            dispatcher.count(&baseline_queries, &targets)?
        }
    };

    CountReport::new(query_lens, counts)
        .write_to_path(&args.out_path)
        .context("write count report")?;
    Ok(())
}
