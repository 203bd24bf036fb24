use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{bail, Context, Result};
use log::info;
use serde::Deserialize;

use crate::graph::model::RawGraph;
use crate::graph::{GraphInstance, GraphLoader, GraphWriter};

/// Candidate motif list produced by an upstream mining stage.
///
/// Two file shapes are accepted: a bare JSON array of graphs, or a scored
/// form `{"candidates": [[score, graph], ...]}` from which the top-ranked
/// entries are taken.
#[derive(Debug)]
pub struct QuerySet {
    pub graphs: Vec<GraphInstance>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QueriesFile {
    Plain(Vec<RawGraph>),
    Scored { candidates: Vec<(f64, RawGraph)> },
}

impl QuerySet {
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with_cap(path, None)
    }

    /// Load the scored form keeping only the `cap` best-scoring candidates.
    pub fn load_scored(path: &Path, cap: usize) -> Result<Self> {
        Self::load_with_cap(path, Some(cap))
    }

    fn load_with_cap(path: &Path, cap: Option<usize>) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("open queries file {:?}", path))?;
        let parsed: QueriesFile = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parse queries file {:?}", path))?;

        let raw_graphs = match parsed {
            QueriesFile::Plain(graphs) => graphs,
            QueriesFile::Scored { mut candidates } => {
                candidates.sort_by(|a, b| b.0.total_cmp(&a.0));
                if let Some(cap) = cap {
                    candidates.truncate(cap);
                }
                candidates.into_iter().map(|(_, graph)| graph).collect()
            }
        };

        if raw_graphs.is_empty() {
            bail!("Queries file {:?} contains no graphs", path);
        }

        let mut graphs = Vec::with_capacity(raw_graphs.len());
        for (position, raw) in raw_graphs.into_iter().enumerate() {
            let json = serde_json::to_string(&raw)?;
            let graph = GraphLoader::from_json_str(&json)
                .with_context(|| format!("build query graph #{position}"))?;
            graphs.push(graph);
        }
        info!("Loaded {} query graphs from {:?}", graphs.len(), path);
        Ok(Self { graphs })
    }

    /// Node counts in input order; reported alongside counts in the output.
    pub fn query_lens(&self) -> Vec<usize> {
        self.graphs.iter().map(GraphInstance::node_count).collect()
    }

    pub fn write_to_path(graphs: &[GraphInstance], path: &Path) -> Result<()> {
        let raw: Vec<RawGraph> = graphs.iter().map(GraphWriter::to_raw_graph).collect();
        let json = serde_json::to_string_pretty(&raw)?;
        std::fs::write(path, json).with_context(|| format!("write queries to {:?}", path))?;
        Ok(())
    }
}
