//! Rendering maps and consensus summaries.
//!
//! ```text
//!   CandidateGraph ─┬─ write_text()  → variable listing + `A o-> B` lines
//!                   ├─ write_dot()   → Graphviz digraph, marks as arrow shapes
//!                   └─ to_json()     → serde view for downstream tooling
//!   GraphSummary   ─┬─ write_summary_text()
//!                   ├─ write_summary_dot()  (edges below min_confidence dropped)
//!                   └─ summary_to_json()
//! ```

use std::io::Write;

use serde::Serialize;

use crate::ensemble::GraphSummary;
use crate::graph::CandidateGraph;
use crate::io::Coordinates;
use crate::model::{ConceptRegistry, Mark};
use crate::Result;

/// Layout knobs for the Graphviz writers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DotOptions {
    /// Multiplier applied to supplied coordinates.
    pub coordinate_scale: f64,
    /// Summary edges with lower presence confidence are omitted.
    pub min_confidence: f64,
}

impl Default for DotOptions {
    fn default() -> Self {
        Self { coordinate_scale: 50.0, min_confidence: 0.25 }
    }
}

// ============================================================================
// Text
// ============================================================================

fn write_variables(registry: &ConceptRegistry, writer: &mut dyn Write) -> Result<()> {
    writeln!(writer, "Variables ({}):", registry.len())?;
    for (var, name) in registry.names().iter().enumerate() {
        writeln!(writer, "  {var:>4}  {name}")?;
    }
    Ok(())
}

/// Variable listing followed by one line per link.
pub fn write_text(graph: &CandidateGraph, writer: &mut dyn Write) -> Result<()> {
    let registry = graph.registry();
    write_variables(registry, writer)?;
    writeln!(writer)?;

    let links = graph.links();
    writeln!(writer, "Links ({}):", links.len())?;
    for link in &links {
        writeln!(
            writer,
            "  {} {} {}",
            registry.name(link.a)?,
            link.connector(),
            registry.name(link.b)?
        )?;
    }

    let ambiguous: Vec<_> = graph.ambiguous_triples().collect();
    if !ambiguous.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "Ambiguous triples ({}):", ambiguous.len())?;
        for &&(a, k, b) in &ambiguous {
            writeln!(writer, "  {} - {} - {}", registry.name(a)?, registry.name(k)?, registry.name(b)?)?;
        }
    }
    Ok(())
}

/// Consensus listing: presence confidence per link, then the observed mark
/// configurations.
pub fn write_summary_text(summary: &GraphSummary, writer: &mut dyn Write) -> Result<()> {
    let registry = summary.registry();
    write_variables(registry, writer)?;
    writeln!(writer)?;

    let edges = summary.edges();
    writeln!(writer, "Links ({} observed over {} graphs):", edges.len(), summary.graphs())?;
    for edge in &edges {
        let marks: Vec<String> = edge
            .marks
            .iter()
            .map(|((mark_a, mark_b), fraction)| format!("{} {fraction:.3}", Mark::connector(*mark_a, *mark_b)))
            .collect();
        writeln!(
            writer,
            "  {} - {}  {:.3}  [{}]",
            registry.name(edge.a)?,
            registry.name(edge.b)?,
            edge.confidence,
            marks.join(", ")
        )?;
    }
    Ok(())
}

// ============================================================================
// Graphviz
// ============================================================================

fn quote(name: &str) -> String {
    format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
}

fn write_nodes(
    registry: &ConceptRegistry,
    coordinates: Option<&Coordinates>,
    options: &DotOptions,
    writer: &mut dyn Write,
) -> Result<()> {
    for name in registry.names() {
        match coordinates.and_then(|c| c.get(name)) {
            Some(&(x, y)) => writeln!(
                writer,
                "  {} [pos=\"{:.2},{:.2}!\"];",
                quote(name),
                x * options.coordinate_scale,
                y * options.coordinate_scale
            )?,
            None => writeln!(writer, "  {};", quote(name))?,
        }
    }
    Ok(())
}

fn edge_attributes(mark_a: Mark, mark_b: Mark) -> String {
    format!("dir=both, arrowtail={}, arrowhead={}", mark_a.dot_shape(), mark_b.dot_shape())
}

/// Graphviz rendering of a single map. Nodes with coordinates are pinned.
pub fn write_dot(
    graph: &CandidateGraph,
    coordinates: Option<&Coordinates>,
    options: &DotOptions,
    writer: &mut dyn Write,
) -> Result<()> {
    let registry = graph.registry();
    writeln!(writer, "digraph semantic_map {{")?;
    writeln!(writer, "  node [shape=plaintext];")?;
    write_nodes(registry, coordinates, options, writer)?;
    for link in graph.links() {
        writeln!(
            writer,
            "  {} -> {} [{}];",
            quote(registry.name(link.a)?),
            quote(registry.name(link.b)?),
            edge_attributes(link.mark_a, link.mark_b)
        )?;
    }
    writeln!(writer, "}}")?;
    Ok(())
}

/// Graphviz rendering of a consensus: dominant marks per link, pen width
/// proportional to confidence.
pub fn write_summary_dot(
    summary: &GraphSummary,
    coordinates: Option<&Coordinates>,
    options: &DotOptions,
    writer: &mut dyn Write,
) -> Result<()> {
    let registry = summary.registry();
    writeln!(writer, "digraph semantic_map_consensus {{")?;
    writeln!(writer, "  node [shape=plaintext];")?;
    write_nodes(registry, coordinates, options, writer)?;
    for edge in summary.edges() {
        if edge.confidence < options.min_confidence {
            continue;
        }
        let (mark_a, mark_b) = edge.dominant_marks().unwrap_or((Mark::Tail, Mark::Tail));
        writeln!(
            writer,
            "  {} -> {} [{}, penwidth={:.2}];",
            quote(registry.name(edge.a)?),
            quote(registry.name(edge.b)?),
            edge_attributes(mark_a, mark_b),
            edge.confidence * 4.0
        )?;
    }
    writeln!(writer, "}}")?;
    Ok(())
}

// ============================================================================
// JSON
// ============================================================================

#[derive(Debug, Serialize)]
struct LinkView<'a> {
    a: &'a str,
    b: &'a str,
    mark_a: Mark,
    mark_b: Mark,
}

#[derive(Debug, Serialize)]
struct GraphView<'a> {
    variables: &'a [String],
    links: Vec<LinkView<'a>>,
    ambiguous_triples: Vec<[&'a str; 3]>,
}

#[derive(Debug, Serialize)]
struct MarkShare {
    mark_a: Mark,
    mark_b: Mark,
    fraction: f64,
}

#[derive(Debug, Serialize)]
struct SummaryEdgeView<'a> {
    a: &'a str,
    b: &'a str,
    confidence: f64,
    marks: Vec<MarkShare>,
}

#[derive(Debug, Serialize)]
struct SummaryView<'a> {
    graphs: usize,
    variables: &'a [String],
    edges: Vec<SummaryEdgeView<'a>>,
}

/// Pretty-printed JSON with concept names in place of indices.
pub fn to_json(graph: &CandidateGraph) -> Result<String> {
    let registry = graph.registry();
    let links = graph
        .links()
        .into_iter()
        .map(|link| -> Result<LinkView<'_>> {
            Ok(LinkView {
                a: registry.name(link.a)?,
                b: registry.name(link.b)?,
                mark_a: link.mark_a,
                mark_b: link.mark_b,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let ambiguous_triples = graph
        .ambiguous_triples()
        .map(|&(a, k, b)| -> Result<[&str; 3]> { Ok([registry.name(a)?, registry.name(k)?, registry.name(b)?]) })
        .collect::<Result<Vec<_>>>()?;
    let view = GraphView { variables: registry.names(), links, ambiguous_triples };
    Ok(serde_json::to_string_pretty(&view)?)
}

pub fn summary_to_json(summary: &GraphSummary) -> Result<String> {
    let registry = summary.registry();
    let edges = summary
        .edges()
        .into_iter()
        .map(|edge| -> Result<SummaryEdgeView<'_>> {
            Ok(SummaryEdgeView {
                a: registry.name(edge.a)?,
                b: registry.name(edge.b)?,
                confidence: edge.confidence,
                marks: edge
                    .marks
                    .iter()
                    .map(|&((mark_a, mark_b), fraction)| MarkShare { mark_a, mark_b, fraction })
                    .collect(),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let view = SummaryView { graphs: summary.graphs(), variables: registry.names(), edges };
    Ok(serde_json::to_string_pretty(&view)?)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn oriented() -> CandidateGraph {
        let registry = Arc::new(ConceptRegistry::new(["ARM", "HAND", "FINGER"]));
        let mut graph = CandidateGraph::empty(registry);
        graph.add_link(0, 1);
        graph.add_link(1, 2);
        graph.set_mark(0, 1, Mark::Arrow);
        graph.set_mark(2, 1, Mark::Arrow);
        graph
    }

    fn render(f: impl FnOnce(&mut dyn Write) -> Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_text_uses_mark_glyphs() {
        let text = render(|w| write_text(&oriented(), w));
        assert!(text.contains("Variables (3):"));
        assert!(text.contains("  ARM o-> HAND"));
        assert!(text.contains("  HAND <-o FINGER"));
    }

    #[test]
    fn test_dot_pins_coordinates() {
        let mut coords = Coordinates::new();
        coords.insert("ARM".into(), (1.0, 2.0));
        let dot = render(|w| write_dot(&oriented(), Some(&coords), &DotOptions::default(), w));
        assert!(dot.starts_with("digraph semantic_map {"));
        assert!(dot.contains("\"ARM\" [pos=\"50.00,100.00!\"];"));
        assert!(dot.contains("\"HAND\";"));
        assert!(dot.contains("\"ARM\" -> \"HAND\" [dir=both, arrowtail=odot, arrowhead=normal];"));
    }

    #[test]
    fn test_summary_dot_drops_weak_edges() {
        let graph = oriented();
        let mut summary = GraphSummary::new(graph.shared_registry());
        summary.fold_in(&graph);
        let mut partial = graph.clone();
        partial.remove_link(1, 2);
        for _ in 0..4 {
            summary.fold_in(&partial);
        }
        // HAND — FINGER present in 1 of 5 graphs
        let dot = render(|w| write_summary_dot(&summary, None, &DotOptions::default(), w));
        assert!(dot.contains("\"ARM\" -> \"HAND\""));
        assert!(dot.contains("penwidth=4.00"));
        assert!(!dot.contains("\"FINGER\" ->"));
        assert!(!dot.contains("-> \"FINGER\""));
    }

    #[test]
    fn test_json_names_variables() {
        let json = to_json(&oriented()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["variables"][0], "ARM");
        assert_eq!(value["links"][0]["b"], "HAND");
        assert_eq!(value["links"][0]["mark_b"], "Arrow");
    }
}
