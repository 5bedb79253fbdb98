//! Live scrape of a profile feed through Chrome.

use anyhow::{anyhow, Context};
use console::style;

use feedharvest::address::profile_handle;
use feedharvest::config::Config;
use feedharvest::models::RunEvent;
use feedharvest::page::browser::ChromePage;
use feedharvest::run::{Harvester, SpawnedRun};

use crate::cli::helpers::{print_summary, write_exports, ExportTargets};
use crate::cli::progress::RunProgress;

pub async fn cmd_scrape(
    config: &Config,
    profile_url: &str,
    targets: ExportTargets,
) -> anyhow::Result<()> {
    let settings = config.run;
    settings.validate()?;
    let profile = profile_handle(profile_url, config.browser.allowed_hosts.as_slice())
        .ok_or_else(|| anyhow!("Not a profile page: {}", profile_url))?;

    println!("{} Opening {}", style("→").cyan(), profile_url);
    let page = ChromePage::open(&config.browser, profile_url)
        .await
        .context("Failed to open the profile in Chrome")?;

    let harvester = Harvester::new(page)
        .with_tuning(config.tuning)
        .with_allowed_hosts(config.browser.allowed_hosts.clone());
    let SpawnedRun {
        handle,
        mut events,
        task,
    } = harvester.spawn(settings);

    let progress = RunProgress::new(settings.max_posts);
    let mut stopping = false;
    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                if event.is_terminal() {
                    break;
                }
                if let RunEvent::Progress(update) = &event {
                    progress.update(update);
                }
            }
            _ = tokio::signal::ctrl_c(), if !stopping => {
                stopping = true;
                progress.println("Stopping, keeping the posts found so far...");
                handle.cancel();
            }
        }
    }
    progress.finish();

    let (harvester, outcome) = task.await.context("Harvest task panicked")?;
    harvester.into_page().close().await;
    let result = outcome.context("Harvest failed")?;

    if result.posts.is_empty() {
        println!("{} {}, no posts collected", style("!").yellow(), result.status);
        return Ok(());
    }

    let written = write_exports(config, profile_url, &profile, settings, &result, targets).await?;
    print_summary(&result, &written);
    Ok(())
}
