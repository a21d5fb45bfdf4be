use bpx::cli::{self, Action};
use bpx_core::config::Config;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "bpx", about = "Blueprint explorer: search and navigate blueprint dumps")]
struct Cli {
    /// Blueprint dump to load (JSON Lines). Overrides `[dataset] path`.
    #[arg(long, global = true)]
    dataset: Option<PathBuf>,

    /// Write debug logs to the `[logging] debug_file` path (tail -f to inspect).
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    action: Action,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(run(cli));
    // A pending stdin read cannot be interrupted; don't wait for it.
    runtime.shutdown_background();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load().unwrap_or_else(|err| {
        eprintln!("bpx: ignoring config file: {err:#}");
        Config::defaults()
    });

    if cli.debug {
        let path = &config.logging.debug_file;
        let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
        tracing_subscriber::fmt()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .init();
        tracing::info!(path = %path.display(), "bpx debug log started");
    }

    let dataset = cli::dataset_path(cli.dataset, &config)?;
    let db = Arc::new(cli::load(&dataset, &config).await?);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    cli::run(cli.action, db, &config, &mut out).await
}
