pub mod edgelist;
pub mod gexf;
pub mod tudataset;

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::info;

use crate::graph::{GraphInstance, GraphLoader};

const DEFAULT_ROOT: &str = "data";

const KNOWN_DATASETS: &[&str] = &[
    "enzymes",
    "cox2",
    "reddit-binary",
    "coil",
    "ppi-pathways",
    "diseasome",
    "usroads",
    "mn-roads",
    "infect",
    "arxiv",
    "data-<name>",
    "json-<name>",
];

/// Materializes target graphs from a named source under a data root.
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    root: PathBuf,
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT)
    }
}

impl DatasetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a dataset name to a list of target graphs.
    pub fn load(&self, name: &str) -> Result<Vec<GraphInstance>> {
        let targets = match name {
            "enzymes" => tudataset::load(&self.root.join("ENZYMES"), "ENZYMES")?,
            "cox2" => tudataset::load(&self.root.join("COX2"), "COX2")?,
            "reddit-binary" => {
                tudataset::load(&self.root.join("REDDIT-BINARY"), "REDDIT-BINARY")?
            }
            "coil" => tudataset::load(&self.root.join("COIL-DEL"), "COIL-DEL")?,
            "ppi-pathways" => {
                vec![edgelist::load_csv(&self.root.join("ppi-pathways.csv"))?]
            }
            "diseasome" | "usroads" | "mn-roads" | "infect" => {
                let file = match name {
                    "diseasome" => "bio-diseasome.mtx",
                    "usroads" => "road-usroads.mtx",
                    "mn-roads" => "mn-roads.mtx",
                    _ => "infect-dublin.edges",
                };
                vec![edgelist::load_whitespace(&self.root.join(file))?]
            }
            "arxiv" => {
                let path = self.root.join("ogbn-arxiv").join("raw").join("edge.csv");
                vec![edgelist::load_csv(&path)?]
            }
            custom if custom.starts_with("data-") => {
                let dir = self.root.join(custom.trim_start_matches("data-"));
                gexf::load_directory(&dir)?
            }
            custom if custom.starts_with("json-") => {
                let dir = self.root.join(custom.trim_start_matches("json-"));
                load_json_directory(&dir)?
            }
            other => bail!(
                "Unknown dataset '{}'; known datasets: {}",
                other,
                KNOWN_DATASETS.join(", ")
            ),
        };

        if targets.is_empty() {
            bail!("Dataset '{}' produced no target graphs", name);
        }
        let nodes: usize = targets.iter().map(GraphInstance::node_count).sum();
        let edges: usize = targets.iter().map(GraphInstance::edge_count).sum();
        info!(
            "Dataset {}: {} target graphs, {} nodes, {} edges",
            name,
            targets.len(),
            nodes,
            edges
        );
        Ok(targets)
    }
}

fn load_json_directory(dir: &Path) -> Result<Vec<GraphInstance>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("list dataset directory {:?}", dir))?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(OsStr::to_str)
                    .map(|ext| ext.eq_ignore_ascii_case("json"))
                    .unwrap_or(false)
        })
        .collect();
    paths.sort();

    let mut graphs = Vec::with_capacity(paths.len());
    for path in paths {
        graphs.push(GraphLoader::from_path(&path)?);
    }
    Ok(graphs)
}
