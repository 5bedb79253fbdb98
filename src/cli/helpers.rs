//! Shared helpers for CLI commands.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use console::style;

use feedharvest::config::Config;
use feedharvest::export::{default_file_stem, write_csv, write_json, ExportDocument};
use feedharvest::models::{RunResult, RunSettings, StopReason};

/// Export destinations requested on the command line.
#[derive(Debug, Default)]
pub struct ExportTargets {
    pub json: Option<PathBuf>,
    pub csv: Option<PathBuf>,
}

impl ExportTargets {
    /// With no explicit target, both formats go to the output directory
    /// under `<handle>_<timestamp>` names.
    fn resolve(self, output_dir: &Path, handle: &str) -> (Option<PathBuf>, Option<PathBuf>) {
        if self.json.is_none() && self.csv.is_none() {
            let stem = default_file_stem(handle, Utc::now());
            return (
                Some(output_dir.join(format!("{}.json", stem))),
                Some(output_dir.join(format!("{}.csv", stem))),
            );
        }
        (self.json, self.csv)
    }
}

/// Write the requested exports, returning the files written.
pub async fn write_exports(
    config: &Config,
    profile_url: &str,
    handle: &str,
    settings: RunSettings,
    result: &RunResult,
    targets: ExportTargets,
) -> anyhow::Result<Vec<PathBuf>> {
    let (json, csv) = targets.resolve(&config.output_dir(), handle);
    let mut written = Vec::new();

    if let Some(path) = json {
        ensure_parent(&path).await?;
        let document = ExportDocument::new(profile_url, handle, settings, result, Utc::now());
        write_json(&path, &document)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
    }

    if let Some(path) = csv {
        ensure_parent(&path).await?;
        write_csv(&path, &result.posts)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
    }

    Ok(written)
}

async fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    Ok(())
}

/// Print the outcome of a run.
pub fn print_summary(result: &RunResult, written: &[PathBuf]) {
    let marker = match result.stop_reason {
        StopReason::Cancelled | StopReason::PageSignal | StopReason::ScrollFailed(_) => {
            style("!").yellow()
        }
        _ => style("✓").green(),
    };
    println!("{} {}", marker, result.status);

    let stats = &result.stats;
    println!("\n{}", style("Harvest Summary").bold());
    println!("{}", "-".repeat(40));
    println!("{:<16} {}", "Posts:", stats.total);
    println!("{:<16} {}", "Scroll passes:", result.total_scroll_passes);
    println!("{:<16} {}", "With media:", stats.with_media);
    println!("{:<16} {}", "Retweets:", stats.retweets);
    println!("{:<16} {}", "Replies:", stats.replies);
    println!("{:<16} {}", "Threads:", stats.threads);
    if !stats.languages.is_empty() {
        let languages: Vec<&str> = stats.languages.iter().map(String::as_str).collect();
        println!("{:<16} {}", "Languages:", languages.join(", "));
    }
    if let (Some(earliest), Some(latest)) = (stats.earliest, stats.latest) {
        println!(
            "{:<16} {} to {}",
            "Time span:",
            earliest.format("%Y-%m-%d %H:%M"),
            latest.format("%Y-%m-%d %H:%M")
        );
    }

    for path in written {
        println!("{} Wrote {}", style("→").cyan(), path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_targets() {
        let (json, csv) = ExportTargets::default().resolve(Path::new("out"), "someone");
        let json = json.unwrap();
        let csv = csv.unwrap();
        assert!(json.starts_with("out"));
        assert!(json.to_string_lossy().ends_with(".json"));
        assert!(csv.to_string_lossy().ends_with(".csv"));
        assert!(json
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("someone_"));
    }

    #[test]
    fn test_explicit_targets_only() {
        let targets = ExportTargets {
            json: None,
            csv: Some(PathBuf::from("posts.csv")),
        };
        let (json, csv) = targets.resolve(Path::new("out"), "someone");
        assert!(json.is_none());
        assert_eq!(csv, Some(PathBuf::from("posts.csv")));
    }
}
