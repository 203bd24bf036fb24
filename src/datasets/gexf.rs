use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use petgraph::prelude::NodeIndex;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::graph::model::{EdgeAttributes, LabeledGraph, NodeAttributes};
use crate::graph::GraphInstance;

/// Load every `*.gexf` file in a directory, one target graph per file.
/// Node ids are remapped to consecutive integers in declaration order.
pub fn load_directory(dir: &Path) -> Result<Vec<GraphInstance>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("list gexf dataset directory {:?}", dir))?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(OsStr::to_str)
                    .map(|ext| ext.eq_ignore_ascii_case("gexf"))
                    .unwrap_or(false)
        })
        .collect();
    paths.sort();

    if paths.is_empty() {
        bail!("No .gexf files found under {:?}", dir);
    }

    let mut graphs = Vec::with_capacity(paths.len());
    for path in paths {
        let xml = fs::read_to_string(&path)
            .with_context(|| format!("read gexf file {:?}", path))?;
        graphs.push(parse(&xml).with_context(|| format!("parse gexf file {:?}", path))?);
    }
    Ok(graphs)
}

pub fn parse(xml: &str) -> Result<GraphInstance> {
    let mut reader = Reader::from_str(xml);

    let mut builder = GexfBuilder::default();
    loop {
        match reader.read_event()? {
            Event::Start(element) | Event::Empty(element) => {
                match element.local_name().as_ref() {
                    b"graph" => builder.configure(&element)?,
                    b"node" => builder.add_node(&element)?,
                    b"edge" => builder.add_edge(&element)?,
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    builder.finish()
}

#[derive(Default)]
struct GexfBuilder {
    graph: LabeledGraph,
    interned: IndexMap<String, NodeIndex>,
    directed: bool,
    saw_node: bool,
}

impl GexfBuilder {
    fn configure(&mut self, element: &BytesStart<'_>) -> Result<()> {
        if let Some(value) = attribute(element, b"defaultedgetype")? {
            self.directed = value == "directed";
        }
        Ok(())
    }

    fn add_node(&mut self, element: &BytesStart<'_>) -> Result<()> {
        let Some(id) = attribute(element, b"id")? else {
            bail!("gexf node element without id attribute");
        };
        let label = attribute(element, b"label")?;
        let idx = self.intern(&id);
        if let Some(attrs) = self.graph.node_weight_mut(idx) {
            attrs.label = label;
        }
        self.saw_node = true;
        Ok(())
    }

    fn add_edge(&mut self, element: &BytesStart<'_>) -> Result<()> {
        let (Some(source), Some(target)) =
            (attribute(element, b"source")?, attribute(element, b"target")?)
        else {
            bail!("gexf edge element without source/target attributes");
        };
        let weight = attribute(element, b"weight")?
            .map(|value| {
                value
                    .parse::<f64>()
                    .with_context(|| format!("parse gexf edge weight '{}'", value))
            })
            .transpose()?;
        let source = self.intern(&source);
        let target = self.intern(&target);
        let attrs = EdgeAttributes {
            weight,
            ..EdgeAttributes::default()
        };
        self.graph.add_edge(source, target, attrs.clone());
        if !self.directed && source != target {
            self.graph.add_edge(target, source, attrs);
        }
        Ok(())
    }

    fn intern(&mut self, id: &str) -> NodeIndex {
        if let Some(idx) = self.interned.get(id) {
            return *idx;
        }
        let idx = self.graph.add_node(NodeAttributes::default());
        self.interned.insert(id.to_string(), idx);
        idx
    }

    fn finish(self) -> Result<GraphInstance> {
        if !self.saw_node {
            bail!("gexf document declared no nodes");
        }
        let mut node_lookup = IndexMap::new();
        let mut reverse_lookup = IndexMap::new();
        for (position, idx) in self.interned.values().enumerate() {
            let local_id = position.to_string();
            node_lookup.insert(local_id.clone(), *idx);
            reverse_lookup.insert(*idx, local_id);
        }
        Ok(GraphInstance {
            graph: self.graph,
            node_lookup,
            reverse_lookup,
            graph_attributes: IndexMap::new(),
            directed: self.directed,
        })
    }
}

fn attribute(element: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gexf xmlns="http://www.gexf.net/1.2draft" version="1.2">
  <graph mode="static" defaultedgetype="undirected">
    <nodes>
      <node id="n0" label="alpha"/>
      <node id="n1" label="beta"/>
      <node id="n2" label="gamma"/>
    </nodes>
    <edges>
      <edge id="0" source="n0" target="n1"/>
      <edge id="1" source="n1" target="n2" weight="2.5"/>
    </edges>
  </graph>
</gexf>"#;

    #[test]
    fn parses_nodes_and_edges() {
        let graph = parse(SAMPLE).expect("parse gexf");
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert!(!graph.directed);
        assert_eq!(
            graph.graph.node_weights().next().and_then(|a| a.label.clone()),
            Some("alpha".to_string())
        );
    }

    #[test]
    fn node_ids_are_relabeled_to_integers() {
        let graph = parse(SAMPLE).expect("parse gexf");
        let ids: Vec<_> = graph.node_lookup.keys().cloned().collect();
        assert_eq!(ids, vec!["0", "1", "2"]);
    }

    #[test]
    fn directed_graphs_keep_single_arcs() {
        let xml = SAMPLE.replace("undirected", "directed");
        let graph = parse(&xml).expect("parse gexf");
        assert!(graph.directed);
        assert_eq!(graph.arc_count(), 2);
    }
}
