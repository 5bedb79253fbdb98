//! CLI parser and dispatch.

mod config_cmd;
mod extract;
#[cfg(feature = "browser")]
mod scrape;
mod validate;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use feedharvest::config::Config;

use super::helpers::ExportTargets;

#[derive(Parser)]
#[command(name = "harvest")]
#[command(about = "Collect posts from a social profile feed by scrolling it")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Open a profile in Chrome and scroll its feed until a stop condition
    #[cfg(feature = "browser")]
    Scrape {
        /// Profile page address, e.g. https://x.com/someone
        profile_url: String,
        /// Stop after this many posts (10-1000)
        #[arg(short, long)]
        max_posts: Option<usize>,
        /// Delay between scroll passes in milliseconds (500-10000)
        #[arg(short, long)]
        scroll_delay_ms: Option<u64>,
        /// Attach to a running browser instead of launching one
        #[arg(long, env = "BROWSER_URL")]
        remote_url: Option<String>,
        /// Show the browser window
        #[arg(long)]
        no_headless: bool,
        /// Write the JSON export here
        #[arg(long)]
        json: Option<PathBuf>,
        /// Write the CSV export here
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Extract posts from a saved HTML page without scrolling
    Extract {
        /// Saved page to read
        html_file: PathBuf,
        /// Address the page was saved from (resolves relative links)
        #[arg(short, long, default_value = "https://x.com/")]
        url: String,
        /// Write the JSON export here
        #[arg(long)]
        json: Option<PathBuf>,
        /// Write the CSV export here
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Check whether an address is a profile page
    Validate {
        /// Address to check
        url: String,
    },

    /// Show the effective configuration
    Config {
        /// Output as JSON instead of TOML
        #[arg(long)]
        json: bool,
    },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(path) => Config::load_from_path(&path)
            .await
            .with_context(|| format!("Failed to load config from {}", path.display()))?
            .with_env_overrides(),
        None => Config::load().await,
    };

    match cli.command {
        #[cfg(feature = "browser")]
        Commands::Scrape {
            profile_url,
            max_posts,
            scroll_delay_ms,
            remote_url,
            no_headless,
            json,
            csv,
        } => {
            let mut config = config;
            if let Some(max_posts) = max_posts {
                config.run.max_posts = max_posts;
            }
            if let Some(delay) = scroll_delay_ms {
                config.run.scroll_delay_ms = delay;
            }
            if remote_url.is_some() {
                config.browser.remote_url = remote_url;
            }
            if no_headless {
                config.browser.headless = false;
            }
            scrape::cmd_scrape(&config, &profile_url, ExportTargets { json, csv }).await
        }
        Commands::Extract {
            html_file,
            url,
            json,
            csv,
        } => extract::cmd_extract(&config, &html_file, &url, ExportTargets { json, csv }).await,
        Commands::Validate { url } => validate::cmd_validate(&config, &url),
        Commands::Config { json } => config_cmd::cmd_config_show(&config, json),
    }
}
