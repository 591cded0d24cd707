use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use idresolve::app::App;
use idresolve::config::{Config, FollowMode, DEFAULT_SERVICE_BASE_URL};
use idresolve::logging;
use idresolve::lookup::resolve_once;
use idresolve::navigator::{Navigator, SystemBrowser};
use idresolve::resolver::http::HttpResolver;
use idresolve::resolver::identifier::clean_igsn;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "idresolve", version, about = "Resolve IGSN and DOI identifiers as you type")]
struct Cli {
    /// Path to the config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the resolver dashboard (default)
    Tui,
    /// Resolve one identifier and print the first record
    Resolve {
        identifier: String,
        /// Resolution service base URL
        #[arg(long)]
        service: Option<String>,
        /// Open the target in the browser
        #[arg(long)]
        follow: bool,
        /// Reuse the current browser window when following
        #[arg(long)]
        same_tab: bool,
        /// Normalize the identifier as an IGSN first
        #[arg(long)]
        normalize_igsn: bool,
    },
    /// Write the default config file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging() {
        eprintln!("idresolve: logging disabled: {:#}", e);
    }

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path().context("could not determine config directory")?,
    };

    match cli.command.unwrap_or(Command::Tui) {
        Command::Tui => run_tui(&config_path).await,
        Command::Resolve {
            identifier,
            service,
            follow,
            same_tab,
            normalize_igsn,
        } => {
            let config = Config::load(&config_path)?;
            let service = service
                .or_else(|| config.resolvers.first().map(|r| r.service_base_url.clone()))
                .unwrap_or_else(|| DEFAULT_SERVICE_BASE_URL.to_string());
            let identifier = if normalize_igsn {
                clean_igsn(&identifier)
            } else {
                identifier
            };
            let mode = if same_tab {
                FollowMode::SameTab
            } else {
                FollowMode::NewTab
            };

            let resolver = HttpResolver::new(service, config.general.request_timeout());
            let resolution = resolve_once(&resolver, &identifier).await?;
            println!("{}", resolution.display_text(&identifier));

            if follow {
                match resolution.target() {
                    Some(target) => SystemBrowser.open(target, mode)?,
                    None => eprintln!("No target to follow for {}", identifier),
                }
            }
            Ok(())
        }
        Command::InitConfig { force } => {
            if config_path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    config_path.display()
                );
            }
            Config::default().save(&config_path)?;
            println!("Wrote {}", config_path.display());
            Ok(())
        }
    }
}

async fn run_tui(config_path: &std::path::Path) -> Result<()> {
    let config = Config::load(config_path)?;
    let mut app = App::new(config, Arc::new(SystemBrowser));

    let mut terminal = ratatui::init();
    let result = app.run(&mut terminal).await;
    ratatui::restore();

    if let Err(ref e) = result {
        tracing::error!(error = %e, "dashboard exited with an error");
    }
    result
}
