use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use coursegen_pipeline::{CoursePipeline, DocumentMetadata, PipelineConfig};
use coursegen_synthesis::{CancellationToken, GenerativeBackend, OpenAiBackend};
use serde::Serialize;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "coursegen",
    version,
    about = "Turn educational documents into structured courses"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Infer the outline of a text or markdown file.
    Structure(StructureArgs),
    /// Rewrite a text or markdown file into a course with the generative backend.
    Synthesize(SynthesizeArgs),
}

#[derive(Args, Debug, Clone)]
struct StructureArgs {
    /// Input file.
    file: PathBuf,

    /// Course topic; defaults to the file name.
    #[arg(long)]
    topic: Option<String>,

    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct SynthesizeArgs {
    /// Input file.
    file: PathBuf,

    /// Document name used when the backend cannot title the course.
    #[arg(long)]
    name: Option<String>,

    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(err) = run().await {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Structure(args) => structure(args),
        Commands::Synthesize(args) => synthesize(args).await,
    }
}

fn structure(args: StructureArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let pipeline = CoursePipeline::builder().with_config(config).build()?;

    let mut metadata = DocumentMetadata::from_path(&args.file);
    let text = read_input(&args.file, &metadata)?;
    if let Some(topic) = args.topic {
        metadata.title = topic;
    }

    print_json(&pipeline.structure(text, &metadata))
}

async fn synthesize(args: SynthesizeArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let backend = OpenAiBackend::new();
    if !backend.is_available() {
        bail!("OPENAI_API_KEY is not set");
    }
    info!("Synthesizing with model {}", backend.model());
    let backend: Arc<dyn GenerativeBackend> = Arc::new(backend);
    let pipeline = CoursePipeline::builder()
        .with_config(config)
        .with_backend(backend)
        .build()?;

    let mut metadata = DocumentMetadata::from_path(&args.file);
    let text = read_input(&args.file, &metadata)?;
    if let Some(name) = args.name {
        metadata.title = name;
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling synthesis");
            on_interrupt.cancel();
        }
    });

    let document = pipeline
        .synthesize(&text, &metadata, &cancel)
        .await
        .with_context(|| format!("synthesizing {}", args.file.display()))?;
    print_json(&document)
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::from_toml_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn read_input(path: &Path, metadata: &DocumentMetadata) -> Result<String> {
    if metadata.source_format.has_layout() {
        bail!(
            "{} is a {:?} document; extract its text first",
            path.display(),
            metadata.source_format
        );
    }
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
