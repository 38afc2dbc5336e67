use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use devkit_tools::config::{ConfigLoader, Format};
use devkit_tools::network::{mask_url, NetworkKind};
use devkit_tools::{logging, rpc};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "devkit")]
#[command(about = "Inspect and check smart-contract project configuration")]
struct Cli {
    /// Config file (default: DEVKIT_CONFIG, then devkit.toml / devkit.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Network to resolve (default: DEVKIT_NETWORK, then defaultNetwork)
    #[arg(short, long, global = true)]
    network: Option<String>,
    /// Debug logging unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Toml,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve and print the configuration
    Config {
        /// Only validate the document; do not resolve secrets
        #[arg(long)]
        validate: bool,
        /// Print as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// List network profiles
    Networks,
    /// Show the signer a named account maps to on the active network
    Account {
        /// Role name, e.g. deployer
        role: String,
    },
    /// Re-emit the config document
    Export {
        #[arg(short, long, value_enum, default_value = "toml")]
        format: ExportFormat,
    },
    /// Query the active network's endpoint and compare it with the config
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    // Load .env file if it exists (non-fatal)
    if let Ok(path) = dotenvy::dotenv() {
        info!("Loaded environment from {}", path.display());
    }

    let mut loader = ConfigLoader::new();
    if let Some(path) = cli.config {
        loader = loader.with_path(path);
    }
    if let Some(network) = cli.network {
        loader = loader.with_network(network);
    }

    match cli.command {
        Commands::Config { validate, json } => {
            if validate {
                let (path, _) = loader
                    .load_document()
                    .context("configuration is invalid")?;
                println!("{} is valid", path.display());
                return Ok(());
            }
            let config = loader.load().context("failed to resolve configuration")?;
            if json {
                println!("{}", config.to_json()?);
            } else {
                config.print_summary();
            }
            Ok(())
        }
        Commands::Networks => {
            let (_, document) = loader.load_document()?;
            let active = loader.active_network(&document);
            for name in document.network_names() {
                let profile = document.profile(name)?;
                let kind = NetworkKind::of(name);
                let chain_id = profile
                    .effective_chain_id(name)
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "?".to_string());
                let endpoint = match (&profile.url, &profile.forking) {
                    (Some(url), _) if url.is_reference_only() => url.to_string(),
                    (Some(url), _) => mask_url(url.template()),
                    (None, Some(fork)) => format!("fork of {}", fork.url),
                    (None, None) => "-".to_string(),
                };
                let marker = if name == active { "*" } else { " " };
                println!("{} {:<12} {:<7} {:>9}  {}", marker, name, kind.as_str(), chain_id, endpoint);
            }
            Ok(())
        }
        Commands::Account { role } => {
            let config = loader.load().context("failed to resolve configuration")?;
            let account = config.named_account(&role)?;
            println!("{} on {}: {}", role, config.network.name, account);
            Ok(())
        }
        Commands::Export { format } => {
            let (_, document) = loader.load_document()?;
            let format = match format {
                ExportFormat::Toml => Format::Toml,
                ExportFormat::Json => Format::Json,
            };
            println!("{}", document.to_string_as(format)?);
            Ok(())
        }
        Commands::Check => {
            let config = loader.load().context("failed to resolve configuration")?;
            match rpc::probe(&config).await? {
                None => {
                    println!("{} has no endpoint to check", config.network.name);
                    Ok(())
                }
                Some(report) => {
                    println!(
                        "{} via {}: chain id {}, head block {}",
                        report.network, report.endpoint, report.remote_chain_id, report.head_block
                    );
                    for problem in &report.problems {
                        println!("  ✗ {}", problem);
                    }
                    if !report.is_ok() {
                        bail!("{} problem(s) found", report.problems.len());
                    }
                    println!("  ✓ configuration matches endpoint");
                    Ok(())
                }
            }
        }
    }
}
