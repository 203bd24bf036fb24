use std::fs;
use std::path::Path;

use anyhow::Result;
use motifcount::graph::GraphLoader;
use motifcount::DatasetLoader;

fn write_tu_fixture(root: &Path) -> Result<()> {
    let dir = root.join("ENZYMES");
    fs::create_dir_all(&dir)?;
    // Two graphs: a triangle and a single edge.
    fs::write(
        dir.join("ENZYMES_A.txt"),
        "1, 2\n2, 1\n2, 3\n3, 2\n1, 3\n3, 1\n4, 5\n5, 4\n",
    )?;
    fs::write(dir.join("ENZYMES_graph_indicator.txt"), "1\n1\n1\n2\n2\n")?;
    Ok(())
}

#[test]
fn tu_collection_loads_per_graph_targets() -> Result<()> {
    let root = tempfile::tempdir()?;
    write_tu_fixture(root.path())?;

    let loader = DatasetLoader::new(root.path());
    let targets = loader.load("enzymes")?;
    assert_eq!(targets.len(), 2);
    assert_eq!(targets[0].node_count(), 3);
    assert_eq!(targets[0].edge_count(), 3);
    assert_eq!(targets[1].node_count(), 2);
    assert!(targets.iter().all(GraphLoader::is_connected));
    Ok(())
}

#[test]
fn mtx_single_graph_dataset_loads() -> Result<()> {
    let root = tempfile::tempdir()?;
    fs::write(
        root.path().join("bio-diseasome.mtx"),
        "%%MatrixMarket matrix coordinate pattern symmetric\n5 5 4\n1 2\n2 3\n3 4\n4 5\n",
    )?;

    let loader = DatasetLoader::new(root.path());
    let targets = loader.load("diseasome")?;
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].node_count(), 5);
    assert_eq!(targets[0].edge_count(), 4);
    Ok(())
}

#[test]
fn csv_edge_list_dataset_loads() -> Result<()> {
    let root = tempfile::tempdir()?;
    fs::write(root.path().join("ppi-pathways.csv"), "10,20\n20,30\n30,10\n")?;

    let loader = DatasetLoader::new(root.path());
    let targets = loader.load("ppi-pathways")?;
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].node_count(), 3);
    assert_eq!(targets[0].edge_count(), 3);
    Ok(())
}

#[test]
fn gexf_directory_dataset_loads_every_file() -> Result<()> {
    let root = tempfile::tempdir()?;
    let dir = root.path().join("synthetic");
    fs::create_dir_all(&dir)?;
    let gexf = r#"<?xml version="1.0" encoding="UTF-8"?>
<gexf xmlns="http://www.gexf.net/1.2draft" version="1.2">
  <graph mode="static" defaultedgetype="undirected">
    <nodes>
      <node id="a" label="A"/>
      <node id="b" label="B"/>
      <node id="c" label="C"/>
    </nodes>
    <edges>
      <edge id="0" source="a" target="b"/>
      <edge id="1" source="b" target="c"/>
    </edges>
  </graph>
</gexf>"#;
    fs::write(dir.join("g0.gexf"), gexf)?;
    fs::write(dir.join("g1.gexf"), gexf)?;

    let loader = DatasetLoader::new(root.path());
    let targets = loader.load("data-synthetic")?;
    assert_eq!(targets.len(), 2);
    for target in &targets {
        assert_eq!(target.node_count(), 3);
        assert_eq!(target.edge_count(), 2);
        // Ids are remapped to consecutive integers.
        assert!(target.node_lookup.contains_key("0"));
    }
    Ok(())
}

#[test]
fn json_directory_dataset_uses_loader_format() -> Result<()> {
    let root = tempfile::tempdir()?;
    let dir = root.path().join("mined");
    fs::create_dir_all(&dir)?;
    fs::write(
        dir.join("target.json"),
        r#"{
            "directed": false,
            "nodes": [{"id": "x", "attributes": {}}, {"id": "y", "attributes": {}}],
            "edges": [{"source": "x", "target": "y", "attributes": {}}]
        }"#,
    )?;

    let loader = DatasetLoader::new(root.path());
    let targets = loader.load("json-mined")?;
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].edge_count(), 1);
    Ok(())
}

#[test]
fn arxiv_style_edge_csv_loads_one_big_target() -> Result<()> {
    let root = tempfile::tempdir()?;
    let dir = root.path().join("ogbn-arxiv").join("raw");
    fs::create_dir_all(&dir)?;
    fs::write(dir.join("edge.csv"), "0,1\n1,2\n2,3\n3,0\n0,2\n")?;

    let loader = DatasetLoader::new(root.path());
    let targets = loader.load("arxiv")?;
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].node_count(), 4);
    assert_eq!(targets[0].edge_count(), 5);
    Ok(())
}
