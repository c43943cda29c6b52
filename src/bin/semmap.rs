//! `semmap`: infer a semantic map from a file of isolectic sets.
//!
//! ```text
//! semmap --input isolectic_sets.tsv --directionality --vis-output out/map
//!   → prints the map, writes out/map-map.dot
//! semmap --input sets.tsv --bootstrap --runs 200 --vis-output out/map
//!   → prints the consensus, writes out/map-consensus.dot
//! ```
//!
//! Log verbosity is read from `SEMMAP_LOG` (default `semantic_map=info`).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Once;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use semantic_map::export::{self, DotOptions};
use semantic_map::io::{self as evidence_io, Coordinates};
use semantic_map::{Inference, InferenceConfig};

/// Semantic map inference from cross-linguistic colexification data
#[derive(Parser, Debug)]
#[command(name = "semmap")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Isolectic sets: language <TAB> lemma <TAB> [concept, ...]
    #[arg(short, long)]
    input: PathBuf,

    /// Concept vocabulary, one name per line
    #[arg(long)]
    concepts: Option<PathBuf>,

    /// Languages to include, one per line, in sample order
    #[arg(long)]
    languages: Option<PathBuf>,

    /// Concept coordinates for rendering: name <TAB> x <TAB> y
    #[arg(long)]
    coordinates: Option<PathBuf>,

    /// Prefix for Graphviz output files
    #[arg(long)]
    vis_output: Option<PathBuf>,

    /// Resample languages in every run and report a consensus
    #[arg(long)]
    bootstrap: bool,

    /// Orient links instead of drawing plain lines
    #[arg(long)]
    directionality: bool,

    /// Shuffle the link processing order in every pass
    #[arg(long)]
    random_order: bool,

    /// Search for the map with the fewest links
    #[arg(long)]
    minimal_map: bool,

    /// Print the map of every run
    #[arg(long)]
    all_samples: bool,

    /// Number of runs
    #[arg(long)]
    runs: Option<usize>,

    /// Seed for resampling and random order
    #[arg(long)]
    seed: Option<u64>,

    /// Unexplained colexifications a link must exceed
    #[arg(long)]
    link_threshold: Option<f64>,

    /// Drop languages missing more vocabulary concepts than this
    #[arg(long)]
    gap_threshold: Option<usize>,

    /// Keep concepts attested in at least this many isolectic sets
    #[arg(long)]
    min_occurrences: Option<usize>,

    /// JSON run configuration; flags override its fields
    #[arg(long)]
    config: Option<PathBuf>,
}

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("SEMMAP_LOG")
            .unwrap_or_else(|_| EnvFilter::new("semantic_map=info"));

        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .with(filter)
            .init();
    });
}

impl Cli {
    fn inference_config(&self) -> semantic_map::Result<InferenceConfig> {
        let mut config = match &self.config {
            Some(path) => InferenceConfig::from_path(path)?,
            None => InferenceConfig::default(),
        };

        config.bootstrap |= self.bootstrap;
        config.directionality |= self.directionality;
        config.random_order |= self.random_order;
        config.minimize |= self.minimal_map;
        config.keep_runs |= self.all_samples;
        if self.runs.is_some() {
            config.runs = self.runs;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(threshold) = self.link_threshold {
            config.link_threshold = threshold;
        }
        if self.gap_threshold.is_some() {
            config.gap_threshold = self.gap_threshold;
        }
        if self.min_occurrences.is_some() {
            config.min_concept_occurrences = self.min_occurrences;
        }
        if let Some(path) = &self.concepts {
            config.concepts = Some(evidence_io::read_name_list_file(path)?);
        }
        if let Some(path) = &self.languages {
            config.languages = Some(evidence_io::read_name_list_file(path)?);
        }
        Ok(config)
    }
}

fn dot_path(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = prefix.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn write_file<F>(path: &Path, render: F) -> semantic_map::Result<()>
where
    F: FnOnce(&mut dyn Write) -> semantic_map::Result<()>,
{
    let mut out = BufWriter::new(File::create(path)?);
    render(&mut out)?;
    out.flush()?;
    tracing::info!(path = %path.display(), "wrote");
    Ok(())
}

fn heading(out: &mut dyn Write, title: &str) -> std::io::Result<()> {
    writeln!(out, "\n{title}")?;
    writeln!(out, "{}\n", "=".repeat(title.chars().count()))
}

fn run(cli: &Cli) -> semantic_map::Result<()> {
    let config = cli.inference_config()?;
    let records = evidence_io::read_evidence_file(&cli.input)?;
    let coordinates: Option<Coordinates> = cli
        .coordinates
        .as_ref()
        .map(evidence_io::read_coordinates_file)
        .transpose()?;

    let inference = Inference::prepare(&records, config)?;
    let outcome = inference.run()?;
    let runs = outcome.stats.runs;
    let options = DotOptions::default();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    for (index, graph) in outcome.runs.iter().enumerate() {
        heading(&mut out, &format!("SAMPLE {}", index + 1))?;
        export::write_text(graph, &mut out)?;
    }

    if let Some(graph) = &outcome.graph {
        heading(&mut out, "RESULT")?;
        export::write_text(graph, &mut out)?;
        if let Some(prefix) = &cli.vis_output {
            write_file(&dot_path(prefix, "-map.dot"), |w| {
                export::write_dot(graph, coordinates.as_ref(), &options, w)
            })?;
        }
    }

    if let Some(minimal) = &outcome.minimal {
        heading(&mut out, &format!("MINIMAL MAP (among {runs} runs, {} links)", minimal.size()))?;
        export::write_text(&minimal.graph, &mut out)?;
        if let Some(prefix) = &cli.vis_output {
            write_file(&dot_path(prefix, "-minimal-map.dot"), |w| {
                export::write_dot(&minimal.graph, coordinates.as_ref(), &options, w)
            })?;
        }
    }

    if let Some(summary) = &outcome.summary {
        heading(&mut out, &format!("SEMANTIC MAP CONSENSUS (based on {runs} runs)"))?;
        export::write_summary_text(summary, &mut out)?;
        if let Some(prefix) = &cli.vis_output {
            write_file(&dot_path(prefix, "-consensus.dot"), |w| {
                export::write_summary_dot(summary, coordinates.as_ref(), &options, w)
            })?;
        }
    }

    out.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("semmap: {err}");
            ExitCode::FAILURE
        }
    }
}
