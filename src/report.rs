use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

/// Output triple `(query_lens, counts, extras)`, serialized as a JSON
/// array so downstream tooling can index it positionally. The third slot
/// is reserved and currently always empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CountReport(
    pub Vec<usize>,
    pub Vec<f64>,
    pub Vec<serde_json::Value>,
);

impl CountReport {
    pub fn new(query_lens: Vec<usize>, counts: Vec<f64>) -> Self {
        Self(query_lens, counts, Vec::new())
    }

    pub fn query_lens(&self) -> &[usize] {
        &self.0
    }

    pub fn counts(&self) -> &[f64] {
        &self.1
    }

    pub fn write_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create output directory {:?}", parent))?;
            }
        }
        let file =
            File::create(path).with_context(|| format!("create output file {:?}", path))?;
        serde_json::to_writer(BufWriter::new(file), self)
            .with_context(|| format!("serialize counts to {:?}", path))?;
        info!(
            "Wrote {} counts for {} queries to {:?}",
            self.1.len(),
            self.0.len(),
            path
        );
        Ok(())
    }

    pub fn read_from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("open report file {:?}", path))?;
        serde_json::from_reader(std::io::BufReader::new(file))
            .with_context(|| format!("parse report file {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_positional_triple() {
        let report = CountReport::new(vec![3, 5], vec![12.0, 0.5]);
        let json = serde_json::to_string(&report).unwrap();
        assert_eq!(json, "[[3,5],[12.0,0.5],[]]");
    }

    #[test]
    fn roundtrips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("counts.json");
        let report = CountReport::new(vec![6], vec![42.0]);
        report.write_to_path(&path).unwrap();
        let loaded = CountReport::read_from_path(&path).unwrap();
        assert_eq!(loaded, report);
    }
}
