mod inspect;

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use newsfact_ai::{CheckpointLoader, OnnxClassifier};
use newsfact_core::AnalysisResult;
use newsfact_core::report::UNKNOWN_SOURCE;
use newsfact_server::{AppState, ModelSlot};
use tracing::{info, warn};

/// Fake-news detection service backed by a fine-tuned BERT classifier.
#[derive(Parser, Debug)]
#[command(name = "newsfact", version, about, args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// `serve` options, used when no subcommand is given.
    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve /analyze and /health over HTTP (default)
    Serve(ServeArgs),
    /// Classify one text and print the result as JSON
    Analyze(AnalyzeArgs),
    /// Resolve a checkpoint and print its config without loading the model
    Inspect(ModelArgs),
}

#[derive(Args, Debug, Clone)]
struct ModelArgs {
    /// Checkpoint directory, or any file inside it
    #[arg(long, env = "NEWSFACT_MODEL", default_value = "bert_liar_model")]
    model: PathBuf,
}

#[derive(Args, Debug, Clone)]
struct ServeArgs {
    /// Interface to bind
    #[arg(long, env = "NEWSFACT_HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    port: u16,

    #[command(flatten)]
    model: ModelArgs,
}

#[derive(Args, Debug, Clone)]
struct AnalyzeArgs {
    /// Text to classify
    text: String,

    /// Reported back as `source_url`
    #[arg(long)]
    source_url: Option<String>,

    #[command(flatten)]
    model: ModelArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Serve(cli.serve)) {
        Command::Serve(args) => serve(args).await,
        Command::Analyze(args) => analyze(&args),
        Command::Inspect(args) => inspect::run(&args.model),
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    info!("newsfact v{}", env!("CARGO_PKG_VERSION"));

    let slot = ModelSlot::new(Arc::new(CheckpointLoader::new(&args.model.model)));

    // A missing model is not fatal: /health reports it and each request retries.
    match slot.get_or_load().await {
        Ok(_) => info!("model initialized at startup"),
        Err(e) => warn!(error = %e, "could not initialize model at startup, serving anyway"),
    }

    let addr = SocketAddr::new(args.host, args.port);
    newsfact_server::serve(addr, AppState::new(slot))
        .await
        .with_context(|| format!("serving on {addr}"))
}

fn analyze(args: &AnalyzeArgs) -> anyhow::Result<()> {
    let classifier = OnnxClassifier::load(&args.model.model)
        .with_context(|| format!("loading model from {}", args.model.model.display()))?;
    let prediction = classifier.analyze(&args.text).context("running inference")?;

    let source_url = args.source_url.as_deref().unwrap_or(UNKNOWN_SOURCE);
    let result = AnalysisResult::new(prediction, &args.text, source_url);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
