//! Command-line interface for record-marshal
//!
//! # Usage Examples
//!
//! ```bash
//! # Marshal a document of articles
//! record-marshal --schema schema.yaml --entity Article --input articles.json
//!
//! # Read from stdin, settings from a config file
//! cat articles.json | record-marshal --config marshal.toml --input -
//!
//! # Environment variables work as well
//! MARSHAL_SCHEMA=schema.yaml MARSHAL_ENTITY=Article MARSHAL_STRICT=true \
//!   record-marshal --input articles.json
//! ```

use anyhow::Context;
use clap::Parser;
use marshal_core::SchemaRegistry;
use marshal_json::{render_record, CoercionMode};
use record_marshal::{DocumentDriver, MarshalOpts};
use record_marshaler::Marshaler;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "record-marshal")]
#[command(about = "Populate typed, connected records from JSON documents")]
#[command(long_about = None)]
struct Cli {
    /// Input JSON document: an object or an array of objects ("-" for stdin)
    #[arg(long, env = "MARSHAL_INPUT")]
    input: PathBuf,

    /// Pretty-print each record instead of one JSON line per record
    #[arg(long)]
    pretty: bool,

    #[command(flatten)]
    opts: MarshalOpts,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.opts.load()?;

    let schema_path = config
        .schema
        .context("No schema given: pass --schema or set it in the config file")?;
    let entity = config
        .entity
        .context("No entity given: pass --entity or set it in the config file")?;

    let registry = SchemaRegistry::from_file(&schema_path)
        .with_context(|| format!("Failed to load schema from {schema_path:?}"))?;
    info!("Loaded {} entities from {schema_path:?}", registry.len());

    let document = read_document(&cli.input)?;
    let strict = config.coercion.mode == CoercionMode::Strict;
    let mut driver = DocumentDriver::new(registry, Marshaler::new(config.coercion));
    let roots = driver.marshal_all(&entity, &document)?;

    let (graph, report) = driver.into_parts();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for root in roots {
        let Some(rendered) = render_record(&graph, root) else {
            continue;
        };
        let line = if cli.pretty {
            serde_json::to_string_pretty(&rendered)?
        } else {
            serde_json::to_string(&rendered)?
        };
        writeln!(out, "{line}").context("Failed to write output")?;
    }

    for diagnostic in &report.diagnostics {
        warn!("{diagnostic}");
    }
    info!(
        "{} attribute(s) set, {} edge(s) assigned, {} inserted, {} diagnostic(s)",
        report.attributes_set,
        report.edges_assigned,
        report.edges_inserted,
        report.diagnostics.len()
    );

    if strict && report.has_errors() {
        anyhow::bail!(
            "{} value(s) could not be coerced in strict mode",
            report.errors().count()
        );
    }
    Ok(())
}

fn read_document(input: &Path) -> anyhow::Result<serde_json::Value> {
    let content = if input.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read input from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read input file {input:?}"))?
    };

    serde_json::from_str(&content).with_context(|| format!("Input {input:?} is not valid JSON"))
}
