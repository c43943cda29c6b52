//! End-to-end tests for reading evidence files and writing maps.
//!
//! Each test writes its inputs into a temporary directory, runs the full
//! pipeline and inspects the rendered output.

use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use semantic_map::export::{self, DotOptions};
use semantic_map::io::{read_coordinates_file, read_evidence_file, read_name_list_file};
use semantic_map::{Error, Inference, InferenceConfig, Seeding, infer};

// ============================================================================
// Helper: a small isolectic-set file
// ============================================================================

const SETS: &str = "\
deu\tHolz\t[TREE, WOOD]
deu\tWald\t[FOREST]
fra\tbois\t[FOREST, WOOD]
fra\tarbre\t[TREE]
rus\tderevo\t[TREE, WOOD]
rus\tles\t[FOREST]
";

fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn render(f: impl FnOnce(&mut dyn std::io::Write) -> semantic_map::Result<()>) -> String {
    let mut buf = Vec::new();
    f(&mut buf).unwrap();
    String::from_utf8(buf).unwrap()
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_evidence_file_to_text_listing() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "sets.tsv", SETS);

    let records = read_evidence_file(&path).unwrap();
    assert_eq!(records.len(), 6);

    let outcome = infer(&records, InferenceConfig::default()).unwrap();
    let text = render(|w| export::write_text(&outcome.graph.unwrap(), w));
    assert_eq!(
        text,
        "\
Variables (3):
     0  FOREST
     1  TREE
     2  WOOD

Links (2):
  FOREST --- WOOD
  TREE --- WOOD
"
    );
}

#[test]
fn test_dot_output_with_coordinates() {
    let dir = TempDir::new().unwrap();
    let sets = write(dir.path(), "sets.tsv", SETS);
    let coords = write(dir.path(), "coords.tsv", "FOREST\t0\t1\nTREE\t1\t0\nWOOD\t0.5\t0.5\n");

    let records = read_evidence_file(&sets).unwrap();
    let coordinates = read_coordinates_file(&coords).unwrap();
    let outcome = infer(&records, InferenceConfig::default()).unwrap();
    let graph = outcome.graph.unwrap();

    let out = dir.path().join("map-map.dot");
    let mut file = fs::File::create(&out).unwrap();
    export::write_dot(&graph, Some(&coordinates), &DotOptions::default(), &mut file).unwrap();
    drop(file);

    let dot = fs::read_to_string(&out).unwrap();
    assert!(dot.contains("\"WOOD\" [pos=\"25.00,25.00!\"];"));
    assert!(dot.contains("\"FOREST\" -> \"WOOD\" [dir=both, arrowtail=none, arrowhead=none];"));
    assert_eq!(dot.matches(" -> ").count(), 2);
}

#[test]
fn test_language_list_and_concept_list_files() {
    let dir = TempDir::new().unwrap();
    let sets = write(dir.path(), "sets.tsv", SETS);
    let languages = write(dir.path(), "langs.txt", "# subset\nrus\nfra\n");
    let concepts = write(dir.path(), "concepts.txt", "TREE\nWOOD\n");

    let config = InferenceConfig {
        languages: Some(read_name_list_file(&languages).unwrap()),
        concepts: Some(read_name_list_file(&concepts).unwrap()),
        ..Default::default()
    };
    let inference = Inference::prepare(&read_evidence_file(&sets).unwrap(), config).unwrap();
    assert_eq!(inference.samples().language_names(), vec!["rus", "fra"]);
    assert_eq!(inference.registry().names(), &["TREE".to_string(), "WOOD".to_string()]);

    let graph = inference.run().unwrap().graph.unwrap();
    assert_eq!(graph.pairs(), vec![(0, 1)]);
}

#[test]
fn test_json_config_file_drives_run() {
    let dir = TempDir::new().unwrap();
    let sets = write(dir.path(), "sets.tsv", SETS);
    let config_path = write(
        dir.path(),
        "run.json",
        r#"{ "bootstrap": true, "runs": 40, "seed": 3, "seeding": "Complete" }"#,
    );

    let config = InferenceConfig::from_path(&config_path).unwrap();
    assert_eq!(config.seeding, Seeding::Complete);
    let outcome = infer(&read_evidence_file(&sets).unwrap(), config).unwrap();
    let summary = outcome.summary.unwrap();
    assert_eq!(summary.graphs(), 40);

    let json = export::summary_to_json(&summary).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["graphs"], 40);
    assert_eq!(value["variables"][2], "WOOD");

    let text = render(|w| export::write_summary_text(&summary, w));
    assert!(text.contains("observed over 40 graphs"));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = read_evidence_file(dir.path().join("absent.tsv")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_truncated_row_is_malformed() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "bad.tsv", "deu\tHolz\t[TREE, WOOD]\nfra\n");
    let err = read_evidence_file(&path).unwrap_err();
    assert!(matches!(err, Error::MalformedInput { line: 2, .. }));
    assert!(err.to_string().contains("bad.tsv"));
}
