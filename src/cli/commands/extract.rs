//! Snapshot extraction from a saved page.

use std::path::Path;

use anyhow::Context;
use console::style;

use feedharvest::address::profile_handle;
use feedharvest::config::Config;
use feedharvest::page::FixturePage;
use feedharvest::run::Harvester;

use crate::cli::helpers::{print_summary, write_exports, ExportTargets};

pub async fn cmd_extract(
    config: &Config,
    html_file: &Path,
    url: &str,
    targets: ExportTargets,
) -> anyhow::Result<()> {
    let html = tokio::fs::read_to_string(html_file)
        .await
        .with_context(|| format!("Failed to read {}", html_file.display()))?;

    let harvester = Harvester::new(FixturePage::single(url, html)).with_tuning(config.tuning);
    let result = harvester
        .snapshot()
        .await
        .with_context(|| format!("Failed to extract posts from {}", html_file.display()))?;

    if result.posts.is_empty() {
        println!(
            "{} No posts found in {}",
            style("!").yellow(),
            html_file.display()
        );
        return Ok(());
    }

    let handle = profile_handle(url, config.browser.allowed_hosts.as_slice()).unwrap_or_else(|| {
        html_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    let written = write_exports(config, url, &handle, config.run, &result, targets).await?;
    print_summary(&result, &written);
    Ok(())
}
