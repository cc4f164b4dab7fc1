use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::BufReader;

use docindex::client::DocumentClient;
use docindex::config::{Config, ConfigStore};
use docindex::logging::init_tracing;
use docindex::shell::{Shell, ShellOptions};

#[derive(Parser)]
#[command(
    name = "docindex",
    version,
    about = "Terminal client for the document indexing service"
)]
struct Cli {
    /// Config file (default: <config_dir>/docindex/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override [api].base_url
    #[arg(long)]
    base_url: Option<String>,

    /// Override [documents].default_page_size
    #[arg(long)]
    page_size: Option<u32>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Interactive shell (default)
    Shell,
    /// Print the effective configuration
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let path = cli.config.clone().unwrap_or_else(Config::config_path);
    let store = ConfigStore::open(path)?;
    store.update(|config| {
        if let Some(base_url) = &cli.base_url {
            config.api.base_url = base_url.clone();
        }
        if let Some(page_size) = cli.page_size {
            config.documents.default_page_size = page_size;
        }
    })?;
    let config = store.get();
    tracing::debug!(path = %store.path().display(), base_url = %config.api.base_url, "Config loaded");

    match cli.command.unwrap_or(Command::Shell) {
        Command::Config => {
            println!("# {}", store.path().display());
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        Command::Shell => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("Failed to start async runtime")?;
            runtime.block_on(run_shell(config))
        }
    }
}

async fn run_shell(config: Config) -> anyhow::Result<()> {
    let client = Arc::new(DocumentClient::from_config(&config)?);
    let shell = Shell::new(
        client,
        ShellOptions::from(&config.documents),
        tokio::io::stdout(),
    );
    shell.run(BufReader::new(tokio::io::stdin())).await?;
    Ok(())
}
