//! voxguard - Detect AI-generated speech in uploaded audio.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{AnalyzeCommand, ConfigCommand, ServeCommand};

/// voxguard - Detect AI-generated speech in uploaded audio.
///
/// Audio is decoded from base64, converted to 16kHz mono PCM with ffmpeg
/// and classified as HUMAN or AI_GENERATED by the configured backend.
///
/// Configuration is stored in ~/.voxguard/voxguard/ and supports multiple
/// contexts, similar to kubectl's context management.
#[derive(Parser)]
#[command(name = "voxguard")]
#[command(about = "Voice authenticity detection")]
#[command(version)]
pub struct Cli {
    /// Config file (default is ~/.voxguard/voxguard/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Context name to use
    #[arg(short = 'c', long, global = true)]
    pub context: Option<String>,

    /// Output file (default: stdout)
    #[arg(short = 'o', long, global = true)]
    pub output: Option<String>,

    /// Output as JSON (for piping)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage CLI configuration
    Config(ConfigCommand),
    /// Classify a local audio file
    Analyze(AnalyzeCommand),
    /// Run the HTTP detection service
    Serve(ServeCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Config(cmd) => cmd.run(&cli).await,
        Commands::Analyze(cmd) => cmd.run(&cli).await,
        Commands::Serve(cmd) => cmd.run(&cli).await,
    }
}
