use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use log::{debug, warn};
use petgraph::visit::EdgeRef;
use tempfile::TempDir;

use crate::graph::GraphInstance;

const OUTPUT_HEADER_LINES: usize = 4;
const TIMING_SENTINEL: &str = "ms";

/// Edge list of a target rendered once per dispatch, so that per-anchor
/// invocations only pay for writing the file, not for re-walking the graph.
/// The digest keys the on-disk target cache.
#[derive(Debug, Clone)]
pub struct TargetArtifact {
    node_count: usize,
    edges: Vec<(usize, usize)>,
    digest: String,
}

impl TargetArtifact {
    pub fn from_graph(target: &GraphInstance) -> Self {
        let mut edges = Vec::with_capacity(target.arc_count() / 2);
        for edge in target.graph.edge_references() {
            let source = edge.source().index();
            let dest = edge.target().index();
            if source < dest {
                edges.push((source, dest));
            }
        }
        edges.sort_unstable();

        let mut hasher = blake3::Hasher::new();
        hasher.update(&(target.node_count() as u64).to_le_bytes());
        for (u, v) in &edges {
            hasher.update(&(*u as u64).to_le_bytes());
            hasher.update(&(*v as u64).to_le_bytes());
        }

        Self {
            node_count: target.node_count(),
            edges,
            digest: hasher.finalize().to_hex().to_string(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }
}

/// Adapter around a native subgraph-isomorphism engine driven through
/// temporary files: one target file per (target, anchor), one query file
/// per batch, textual embedding counts on stdout. Only binary presence is
/// reported, so this backend serves the `bin` counting method.
pub struct ExternalMatcher {
    binary: PathBuf,
    workdir: TempDir,
    written_targets: Mutex<HashSet<PathBuf>>,
    query_serial: AtomicU64,
}

impl ExternalMatcher {
    pub fn new(binary: impl Into<PathBuf>) -> Result<Self> {
        let binary = binary.into();
        if !binary.is_file() {
            bail!("External matcher binary {:?} does not exist", binary);
        }
        let workdir = TempDir::new().context("create external matcher work directory")?;
        Ok(Self {
            binary,
            workdir,
            written_targets: Mutex::new(HashSet::new()),
            query_serial: AtomicU64::new(0),
        })
    }

    /// Run the engine over one (target, anchor) and the whole query batch,
    /// returning 0/1 presence per query.
    pub fn match_queries(
        &self,
        target: &TargetArtifact,
        anchor: Option<usize>,
        queries: &[Arc<GraphInstance>],
    ) -> Result<Vec<u64>> {
        let anchored = anchor.is_some();
        let target_path = self.ensure_target_file(target, anchor)?;
        let query_path = self.write_query_file(queries, anchored)?;

        let output = Command::new(&self.binary)
            .arg("-d")
            .arg(&target_path)
            .arg("-q")
            .arg(&query_path)
            .arg("-n")
            .arg(queries.len().to_string())
            .arg("-m")
            .arg("1")
            .output()
            .with_context(|| format!("spawn external matcher {:?}", self.binary))?;

        let cleanup = fs::remove_file(&query_path);
        if let Err(err) = cleanup {
            debug!("Failed to remove query file {:?}: {}", query_path, err);
        }

        if !output.status.success() {
            bail!(
                "External matcher exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_output(&stdout, queries.len())
    }

    fn ensure_target_file(
        &self,
        target: &TargetArtifact,
        anchor: Option<usize>,
    ) -> Result<PathBuf> {
        let suffix = match anchor {
            Some(node) => format!("a{node}"),
            None => "plain".to_string(),
        };
        let path = self
            .workdir
            .path()
            .join(format!("target-{}-{}.graph", target.digest, suffix));

        {
            let written = self
                .written_targets
                .lock()
                .expect("target cache lock poisoned");
            if written.contains(&path) {
                return Ok(path);
            }
        }

        let file =
            File::create(&path).with_context(|| format!("create target file {:?}", path))?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "t 1 {}", target.node_count)?;
        for node in 0..target.node_count {
            let flag = u64::from(anchor == Some(node));
            writeln!(writer, "v {} {}", node, flag)?;
        }
        for (u, v) in &target.edges {
            writeln!(writer, "e {} {} 0", u, v)?;
        }
        writer.flush()?;

        self.written_targets
            .lock()
            .expect("target cache lock poisoned")
            .insert(path.clone());
        Ok(path)
    }

    fn write_query_file(&self, queries: &[Arc<GraphInstance>], anchored: bool) -> Result<PathBuf> {
        let serial = self.query_serial.fetch_add(1, Ordering::Relaxed);
        let path = self.workdir.path().join(format!("queries-{serial}.graph"));
        let file =
            File::create(&path).with_context(|| format!("create query file {:?}", path))?;
        let mut writer = BufWriter::new(file);

        for (index, query) in queries.iter().enumerate() {
            write_query(&mut writer, index, query, anchored)?;
        }
        writer.flush()?;
        Ok(path)
    }
}

fn write_query(
    writer: &mut impl Write,
    index: usize,
    query: &GraphInstance,
    anchored: bool,
) -> Result<()> {
    writeln!(
        writer,
        "t {} {} {}",
        index,
        query.node_count(),
        query.arc_count()
    )?;
    for (position, node) in query.graph.node_indices().enumerate() {
        let attrs = &query.graph[node];
        let flag = u64::from(anchored && attrs.anchor);
        let mut neighbors: Vec<usize> = query
            .graph
            .neighbors(node)
            .map(|neighbor| neighbor.index())
            .collect();
        neighbors.sort_unstable();
        let rendered: Vec<String> = neighbors.iter().map(usize::to_string).collect();
        writeln!(
            writer,
            "{} {} {} {}",
            position,
            flag,
            neighbors.len(),
            rendered.join(" ")
        )?;
    }
    Ok(())
}

/// The engine prints a fixed banner, then one line per query whose
/// second-to-last column is the embedding count, then timing lines whose
/// last token is `ms`.
fn parse_output(stdout: &str, num_queries: usize) -> Result<Vec<u64>> {
    let mut counts = vec![0u64; num_queries];
    let mut parsed = 0usize;

    for (line_no, line) in stdout.lines().enumerate() {
        if line_no < OUTPUT_HEADER_LINES {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(last) = tokens.last() else {
            continue;
        };
        if *last == TIMING_SENTINEL {
            break;
        }
        let query_index = line_no - OUTPUT_HEADER_LINES;
        if query_index >= num_queries {
            break;
        }
        if tokens.len() < 2 {
            bail!("Unparseable matcher output line: '{}'", line);
        }
        let embeddings: u64 = tokens[tokens.len() - 2]
            .parse()
            .with_context(|| format!("parse embedding count from line '{}'", line))?;
        counts[query_index] = u64::from(embeddings > 0);
        parsed += 1;
    }

    if parsed < num_queries {
        warn!(
            "External matcher reported {} of {} queries; missing entries count as 0",
            parsed, num_queries
        );
    }
    Ok(counts)
}
