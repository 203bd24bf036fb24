use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use petgraph::prelude::NodeIndex;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::count::external::{ExternalMatcher, TargetArtifact};
use crate::count::isomorphism::{automorphism_count, count_embeddings, subgraph_present};
use crate::graph::GraphInstance;

/// Counting semantics for one work unit.
///
/// `Bin` adds binary presence; `Freq` adds the number of embeddings
/// normalized by the query's automorphism count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountMethod {
    Bin,
    Freq,
}

impl CountMethod {
    pub fn parse(value: &str) -> Result<Self, String> {
        value.parse()
    }
}

impl FromStr for CountMethod {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "bin" => Ok(Self::Bin),
            "freq" => Ok(Self::Freq),
            other => Err(format!("unknown count method '{other}' (expected bin|freq)")),
        }
    }
}

impl fmt::Display for CountMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bin => write!(f, "bin"),
            Self::Freq => write!(f, "freq"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CountConfig {
    pub method: CountMethod,
    pub node_anchored: bool,
    pub workers: usize,
    /// Anchors drawn per target in anchored mode; `None` visits every node.
    pub anchor_samples: Option<usize>,
    pub seed: Option<u64>,
}

impl Default for CountConfig {
    fn default() -> Self {
        Self {
            method: CountMethod::Bin,
            node_anchored: false,
            workers: 1,
            anchor_samples: None,
            seed: None,
        }
    }
}

enum WorkUnit {
    /// One query against one target (in-process, unanchored).
    PerQuery { query: usize, target: usize },
    /// The whole query set against one prepared target. Used for every
    /// anchored unit and for every external-backend unit, so the target
    /// preparation cost is amortized across the batch.
    PerTarget {
        target: usize,
        anchor: Option<NodeIndex>,
    },
}

/// Fans (query-set × target × anchor) work units out over a worker pool
/// and folds partial counts back into one `f64` per query.
pub struct CountDispatcher {
    config: CountConfig,
    external: Option<ExternalMatcher>,
}

impl CountDispatcher {
    pub fn new(config: CountConfig) -> Self {
        Self {
            config,
            external: None,
        }
    }

    pub fn with_external(config: CountConfig, matcher: ExternalMatcher) -> Self {
        Self {
            config,
            external: Some(matcher),
        }
    }

    pub fn config(&self) -> &CountConfig {
        &self.config
    }

    pub fn count(
        &self,
        queries: &[GraphInstance],
        targets: &[GraphInstance],
    ) -> Result<Vec<f64>> {
        self.count_with_anchoring(queries, targets, self.config.node_anchored)
    }

    /// Same as [`count`](Self::count) with the anchoring mode overridden;
    /// the exact baseline needs anchored counts regardless of the run
    /// configuration.
    pub fn count_with_anchoring(
        &self,
        queries: &[GraphInstance],
        targets: &[GraphInstance],
        node_anchored: bool,
    ) -> Result<Vec<f64>> {
        if queries.is_empty() {
            return Ok(Vec::new());
        }
        if targets.is_empty() {
            bail!("No target graphs to count against");
        }
        if self.external.is_some() && self.config.method == CountMethod::Freq {
            bail!("The external matcher backend reports presence only; use the bin method");
        }

        let queries: Vec<Arc<GraphInstance>> = queries
            .iter()
            .map(|query| Arc::new(query.without_self_loops()))
            .collect();
        let targets: Vec<Arc<GraphInstance>> = targets
            .iter()
            .map(|target| Arc::new(target.without_self_loops()))
            .collect();

        let automorphisms: Vec<f64> = match self.config.method {
            CountMethod::Freq => queries
                .iter()
                .map(|query| automorphism_count(query) as f64)
                .collect(),
            CountMethod::Bin => Vec::new(),
        };

        let artifacts: Vec<Arc<TargetArtifact>> = if self.external.is_some() {
            targets
                .iter()
                .map(|target| Arc::new(TargetArtifact::from_graph(target)))
                .collect()
        } else {
            Vec::new()
        };

        let units = self.build_units(&queries, &targets, node_anchored);
        info!(
            "Dispatching {} work units ({} queries x {} targets, anchored={})",
            units.len(),
            queries.len(),
            targets.len(),
            node_anchored
        );

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.config.workers.max(1))
            .build()
            .context("build counting worker pool")?;

        let progress = ProgressBar::new(units.len() as u64);
        progress.set_style(
            ProgressStyle::with_template(
                "Counting [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let totals = pool.install(|| {
            units
                .into_par_iter()
                .map(|unit| {
                    let partial =
                        self.evaluate(&unit, &queries, &targets, &artifacts, &automorphisms);
                    progress.inc(1);
                    partial
                })
                .try_fold(
                    || vec![0.0f64; queries.len()],
                    |mut acc, partial: Result<Vec<(usize, f64)>>| -> Result<Vec<f64>> {
                        for (query, value) in partial? {
                            acc[query] += value;
                        }
                        Ok(acc)
                    },
                )
                .try_reduce(
                    || vec![0.0f64; queries.len()],
                    |mut left, right| {
                        for (query, value) in right.into_iter().enumerate() {
                            left[query] += value;
                        }
                        Ok(left)
                    },
                )
        })?;
        progress.finish_and_clear();

        Ok(totals)
    }

    fn build_units(
        &self,
        queries: &[Arc<GraphInstance>],
        targets: &[Arc<GraphInstance>],
        node_anchored: bool,
    ) -> Vec<WorkUnit> {
        let mut units = Vec::new();

        if node_anchored {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(
                self.config.seed.unwrap_or_else(entropy_seed),
            );
            for (target_idx, target) in targets.iter().enumerate() {
                for anchor in self.select_anchors(target, &mut rng) {
                    units.push(WorkUnit::PerTarget {
                        target: target_idx,
                        anchor: Some(anchor),
                    });
                }
            }
        } else if self.external.is_some() {
            for target_idx in 0..targets.len() {
                units.push(WorkUnit::PerTarget {
                    target: target_idx,
                    anchor: None,
                });
            }
        } else {
            for query_idx in 0..queries.len() {
                for target_idx in 0..targets.len() {
                    units.push(WorkUnit::PerQuery {
                        query: query_idx,
                        target: target_idx,
                    });
                }
            }
        }

        units
    }

    fn select_anchors(
        &self,
        target: &GraphInstance,
        rng: &mut Xoshiro256PlusPlus,
    ) -> Vec<NodeIndex> {
        let all: Vec<NodeIndex> = target.graph.node_indices().collect();
        match self.config.anchor_samples {
            Some(samples) if samples < all.len() => {
                let chosen = rand::seq::index::sample(rng, all.len(), samples);
                debug!(
                    "Sampling {} of {} anchors for target",
                    samples,
                    all.len()
                );
                chosen.into_iter().map(|position| all[position]).collect()
            }
            _ => all,
        }
    }

    fn evaluate(
        &self,
        unit: &WorkUnit,
        queries: &[Arc<GraphInstance>],
        targets: &[Arc<GraphInstance>],
        artifacts: &[Arc<TargetArtifact>],
        automorphisms: &[f64],
    ) -> Result<Vec<(usize, f64)>> {
        match unit {
            WorkUnit::PerQuery { query, target } => {
                let value = self.evaluate_pair(&queries[*query], &targets[*target], false, *query, automorphisms);
                Ok(vec![(*query, value)])
            }
            WorkUnit::PerTarget { target, anchor } => {
                if let Some(matcher) = &self.external {
                    let presence = matcher.match_queries(
                        &artifacts[*target],
                        anchor.map(NodeIndex::index),
                        queries,
                    )?;
                    return Ok(presence
                        .into_iter()
                        .enumerate()
                        .map(|(query, hit)| (query, hit as f64))
                        .collect());
                }

                let prepared = match anchor {
                    Some(anchor) => Arc::new(targets[*target].with_anchor(*anchor)),
                    None => Arc::clone(&targets[*target]),
                };
                let anchored = anchor.is_some();
                Ok(queries
                    .iter()
                    .enumerate()
                    .map(|(query_idx, query)| {
                        (
                            query_idx,
                            self.evaluate_pair(
                                query,
                                &prepared,
                                anchored,
                                query_idx,
                                automorphisms,
                            ),
                        )
                    })
                    .collect())
            }
        }
    }

    fn evaluate_pair(
        &self,
        query: &GraphInstance,
        target: &GraphInstance,
        anchored: bool,
        query_idx: usize,
        automorphisms: &[f64],
    ) -> f64 {
        match self.config.method {
            CountMethod::Bin => u64::from(subgraph_present(query, target, anchored)) as f64,
            CountMethod::Freq => {
                let embeddings = count_embeddings(query, target, anchored) as f64;
                embeddings / automorphisms[query_idx]
            }
        }
    }
}

fn entropy_seed() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}
