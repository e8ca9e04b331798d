use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use trimwave::app::{self, Launch};
use trimwave::TrimConfig;

fn main() -> trimwave::Result<()> {
    let cli = Cli::parse();

    let mut config = TrimConfig::load(cli.config.as_deref())?;
    if let Some(buckets) = cli.buckets {
        config.bucket_count = buckets;
    }
    init_tracing(&config.log_filter);

    let bytes = std::fs::read(&cli.file)?;
    let file_name = cli
        .file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    tracing::info!(file = ?cli.file, bytes = bytes.len(), "opening audio file");

    app::run(config, Launch { file_name, bytes })
}

fn init_tracing(default_filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Pick a clip out of an audio file", long_about = None)]
struct Cli {
    /// Audio file to open.
    file: PathBuf,
    /// TOML file with editor settings.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Number of waveform bars, overriding the config file.
    #[arg(long)]
    buckets: Option<usize>,
}
