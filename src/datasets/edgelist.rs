use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::graph::{GraphInstance, GraphLoader};

/// Comma-separated edge list, one `u,v` pair per line.
pub fn load_csv(path: &Path) -> Result<GraphInstance> {
    parse(path, ",")
}

/// Whitespace-separated edge list (`.edges`, Matrix-Market-style `.mtx`).
/// `%`/`#` comment lines are skipped, as is a leading dimensions header of
/// three numeric fields.
pub fn load_whitespace(path: &Path) -> Result<GraphInstance> {
    parse(path, " ")
}

fn parse(path: &Path, separator: &str) -> Result<GraphInstance> {
    let file = File::open(path).with_context(|| format!("open edge list {:?}", path))?;
    let mut edges = Vec::new();
    let mut saw_data_line = false;

    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('%') || trimmed.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = if separator == "," {
            trimmed.split(',').map(str::trim).collect()
        } else {
            trimmed.split_whitespace().collect()
        };

        if !saw_data_line && fields.len() == 3 && fields.iter().all(|f| f.parse::<u64>().is_ok())
        {
            // Matrix-Market size header: rows cols entries.
            saw_data_line = true;
            continue;
        }
        saw_data_line = true;

        if fields.len() < 2 {
            bail!("Malformed edge on line {} of {:?}", line_no + 1, path);
        }
        let u: u64 = fields[0]
            .parse()
            .with_context(|| format!("parse edge source on line {} of {:?}", line_no + 1, path))?;
        let v: u64 = fields[1]
            .parse()
            .with_context(|| format!("parse edge target on line {} of {:?}", line_no + 1, path))?;
        edges.push((u, v));
    }

    if edges.is_empty() {
        bail!("Edge list {:?} contains no edges", path);
    }
    Ok(GraphLoader::from_integer_edges(edges))
}
