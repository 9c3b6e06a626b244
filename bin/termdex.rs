use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use termdex::{Document, IndexMapping, IndexSettings, QueryParser, SearchEngine};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "termdex")]
#[command(about = "In-memory full-text search over JSON documents", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the tokens an analyzer produces for a text
    Analyze {
        /// Analyzer name (built-in or defined in --settings)
        #[arg(long, default_value = "standard")]
        analyzer: String,

        /// Index settings JSON with custom analysis definitions
        #[arg(long, env = "TERMDEX_SETTINGS")]
        settings: Option<PathBuf>,

        /// Text to analyze
        text: String,
    },

    /// Index NDJSON documents and run one search request against them
    Search {
        /// Mapping JSON: {"properties": {"name": {"type": "keyword"}}}
        #[arg(long, env = "TERMDEX_MAPPING")]
        mapping: PathBuf,

        /// Index settings JSON
        #[arg(long, env = "TERMDEX_SETTINGS")]
        settings: Option<PathBuf>,

        /// Documents, one JSON object per line
        #[arg(long)]
        docs: PathBuf,

        /// Search request body JSON
        #[arg(long)]
        query: PathBuf,
    },
}

fn read_json(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn load_settings(path: Option<&Path>) -> Result<IndexSettings> {
    match path {
        Some(path) => Ok(IndexSettings::from_json(&read_json(path)?)?),
        None => Ok(IndexSettings::default()),
    }
}

fn load_documents(path: &Path) -> Result<Vec<Document>> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            let value: Value = serde_json::from_str(line)
                .with_context(|| format!("{}:{}: invalid JSON", path.display(), i + 1))?;
            Document::from_json(&value)
                .with_context(|| format!("{}:{}: invalid document", path.display(), i + 1))
        })
        .collect()
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    info!("termdex v{}", termdex::VERSION);

    let engine = SearchEngine::default();

    match args.command {
        Command::Analyze {
            analyzer,
            settings,
            text,
        } => {
            let settings = load_settings(settings.as_deref())?;
            let scratch = engine.create_index_with_settings("analyze", IndexMapping::new(), settings)?;
            let tokens = engine.analyze(&scratch, &analyzer, &text)?;
            println!("{}", serde_json::to_string_pretty(&tokens)?);
        }
        Command::Search {
            mapping,
            settings,
            docs,
            query,
        } => {
            let mapping = IndexMapping::from_json(&read_json(&mapping)?)?;
            let settings = load_settings(settings.as_deref())?;
            let index = engine.create_index_with_settings("cli", mapping, settings)?;

            let bulk = engine.index_documents(&index, load_documents(&docs)?)?;
            for failure in bulk.failures() {
                if let Some(error) = &failure.error {
                    warn!("Document {} rejected ({:?}): {}", failure.id, error.kind, error.reason);
                }
            }
            info!("Indexed {} documents", bulk.indexed_count());

            let request = QueryParser::parse_search_request(&read_json(&query)?)?;
            let response = engine.search(&index, &request)?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
