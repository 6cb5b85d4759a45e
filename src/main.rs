use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use tracing::info;

use coach_voice::{PipelineConfig, SynthesisPipeline, SynthesisRequest};

/// coach-voice - chunked text-to-speech with a two-tier audio cache
#[derive(Parser, Debug)]
#[command(name = "coach-voice")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Text to synthesize (reads --file when omitted)
    text: Option<String>,

    /// Read the text to synthesize from a file
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    file: Option<PathBuf>,

    /// Voice ID (defaults to the configured VOICE_ID)
    #[arg(long = "voice")]
    voice: Option<String>,

    /// Output path for the assembled audio
    #[arg(short = 'o', long = "out", default_value = "speech.mp3")]
    out: PathBuf,

    /// Subcommand to run
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Empty the memory tier and delete every durable cache entry
    ClearCache,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let config = PipelineConfig::from_env()?;
    let pipeline = Arc::new(SynthesisPipeline::from_config(&config)?);

    if let Some(Commands::ClearCache) = cli.command {
        let removed = pipeline.cache().clear().await?;
        println!("Cache cleared ({removed} durable entries removed)");
        return Ok(());
    }

    let text = match (cli.text, cli.file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, None) => {
            return Err(anyhow!("no input: pass text as an argument or use --file"));
        }
    };

    let request = SynthesisRequest {
        text,
        voice_id: cli.voice.unwrap_or_else(|| config.voice_id.clone()),
        settings: config.voice_settings.clone(),
    };

    let audio = pipeline.speak(&request).await?;
    std::fs::write(&cli.out, &audio.bytes)
        .with_context(|| format!("failed to write {}", cli.out.display()))?;

    info!(
        out = %cli.out.display(),
        audio_bytes = audio.bytes.len(),
        content_type = %audio.content_type,
        "audio written"
    );
    println!("Wrote {} bytes to {}", audio.bytes.len(), cli.out.display());

    Ok(())
}
