//! Scroll-drive loop.
//!
//! A run alternates between scraping the rendered feed and scrolling it
//! until the post limit is reached, the feed stops producing posts, the
//! page reports an error, scrolling fails, or the run is cancelled. Every
//! stop except an initialization failure finalizes what was collected.

mod events;
mod handle;
mod phase;
mod policy;
mod wait;

use chrono::Utc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub use events::EventSink;
pub use handle::RunHandle;
pub use phase::RunPhase;
pub use policy::{SilenceWindow, StopPolicy};
pub use wait::{interruptible_sleep, wait_for_new_content, Baseline, WaitOutcome};

use crate::address::{is_profile_url, DEFAULT_ALLOWED_HOSTS};
use crate::config::LoopTuning;
use crate::dedup::PostTable;
use crate::error::HarvestError;
use crate::extract::{extract, ExtractContext};
use crate::finalize::finalize;
use crate::models::{ProgressEvent, RunEvent, RunResult, RunSettings, StopReason};
use crate::page::{find_candidate_posts, find_page_signal, FeedPage, ScrollAction, SignalKind};
use phase::PhaseTracker;

/// Drives one feed page through harvest runs.
pub struct Harvester<P> {
    page: P,
    tuning: LoopTuning,
    allowed_hosts: Vec<String>,
    handle: RunHandle,
}

/// A run executing on its own task.
pub struct SpawnedRun<P> {
    pub handle: RunHandle,
    pub events: UnboundedReceiver<RunEvent>,
    pub task: JoinHandle<(Harvester<P>, Result<RunResult, HarvestError>)>,
}

impl<P: FeedPage> Harvester<P> {
    pub fn new(page: P) -> Self {
        Self {
            page,
            tuning: LoopTuning::default(),
            allowed_hosts: DEFAULT_ALLOWED_HOSTS.iter().map(|h| h.to_string()).collect(),
            handle: RunHandle::new(),
        }
    }

    pub fn with_tuning(mut self, tuning: LoopTuning) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn with_allowed_hosts(mut self, hosts: Vec<String>) -> Self {
        self.allowed_hosts = hosts;
        self
    }

    /// Handle for cancelling runs of this harvester.
    pub fn handle(&self) -> RunHandle {
        self.handle.clone()
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn into_page(self) -> P {
        self.page
    }

    /// Run to completion, reporting progress to `sink`.
    ///
    /// The last event sent is always `Completed` or `Failed`. Only an
    /// invalid start (bad settings, wrong page, page never ready, another
    /// run active) fails; every later stop completes with the posts
    /// gathered so far.
    pub async fn run(
        &self,
        settings: RunSettings,
        sink: &EventSink,
    ) -> Result<RunResult, HarvestError> {
        if !self.handle.try_activate() {
            let err = HarvestError::AlreadyRunning;
            sink.emit(RunEvent::Failed {
                error: err.to_string(),
            });
            return Err(err);
        }

        let outcome = self.drive(settings, sink).await;
        self.handle.deactivate();

        match outcome {
            Ok(result) => {
                sink.emit(RunEvent::Completed(result.clone()));
                Ok(result)
            }
            Err(e) => {
                warn!("Harvest failed: {}", e);
                sink.emit(RunEvent::Failed {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Extract whatever is rendered right now, without scrolling.
    pub async fn snapshot(&self) -> Result<RunResult, HarvestError> {
        self.page
            .wait_ready(self.tuning.ready_timeout())
            .await
            .map_err(|e| {
                debug!("Page not ready: {}", e);
                HarvestError::PageNotReady {
                    timeout: self.tuning.ready_timeout(),
                }
            })?;
        let page_url = self.page.current_url().await?;

        let mut table = PostTable::new();
        let salt = Uuid::new_v4().to_string();
        let added = self.scrape_pass(&page_url, &salt, 0, &mut table).await;
        info!("Snapshot extracted {} posts", added);

        Ok(self.complete(table, 0, StopReason::Snapshot))
    }

    async fn drive(
        &self,
        settings: RunSettings,
        sink: &EventSink,
    ) -> Result<RunResult, HarvestError> {
        let mut phase = PhaseTracker::default();
        phase.enter(RunPhase::Initializing);

        let page_url = match self.initialize(&settings).await {
            Ok(url) => url,
            Err(e) => {
                phase.enter(RunPhase::Idle);
                return Err(e);
            }
        };

        info!(
            "Starting harvest of {} (max {} posts, {}ms delay)",
            page_url, settings.max_posts, settings.scroll_delay_ms
        );

        let mut table = PostTable::new();
        let salt = Uuid::new_v4().to_string();
        let mut policy = StopPolicy::new(
            settings.max_posts,
            self.tuning.max_empty_passes,
            self.tuning.silence_window(),
        );
        let mut scrolls: u64 = 0;

        let stop_reason = loop {
            if !self.handle.is_active() {
                break StopReason::Cancelled;
            }
            phase.enter(RunPhase::Scraping);

            let added = self
                .scrape_pass(&page_url, &salt, scrolls, &mut table)
                .await;
            policy.record_pass(added, Instant::now());
            sink.emit(RunEvent::Progress(progress(
                table.len(),
                settings.max_posts,
                scrolls,
            )));

            if let Some(reason) = policy.limit_reached(table.len()) {
                break reason;
            }
            if find_page_signal(&self.page, SignalKind::Error).await {
                warn!("Page shows an error or rate-limit notice, stopping");
                break StopReason::PageSignal;
            }
            if let Some(reason) = policy.exhausted(Instant::now()) {
                break reason;
            }

            // before scroll
            if !self.handle.is_active() {
                break StopReason::Cancelled;
            }
            let before = Baseline::capture(&self.page).await;
            if let Err(e) = self.scroll_once().await {
                warn!("Scroll failed after {} scrolls: {}", scrolls, e);
                break StopReason::ScrollFailed(e.to_string());
            }
            scrolls += 1;

            // after scroll
            if !self.handle.is_active() {
                break StopReason::Cancelled;
            }
            phase.enter(RunPhase::Waiting);
            match wait_for_new_content(&self.page, before, &self.tuning, &self.handle).await {
                WaitOutcome::Cancelled => break StopReason::Cancelled,
                WaitOutcome::Grew => debug!("New content after scroll {}", scrolls),
                WaitOutcome::TimedOut => debug!("No new content after scroll {}", scrolls),
            }

            // after wait, and throughout the delay
            if !interruptible_sleep(
                settings.delay(),
                self.tuning.cancel_check(),
                &self.handle,
            )
            .await
            {
                break StopReason::Cancelled;
            }
        };

        if stop_reason == StopReason::Cancelled {
            phase.enter(RunPhase::Cancelled);
        }
        phase.enter(RunPhase::Completing);
        info!(
            "Harvest stopped after {} scrolls with {} posts: {}",
            scrolls,
            table.len(),
            stop_reason
        );

        let result = self.complete(table, scrolls, stop_reason);
        phase.enter(RunPhase::Idle);
        Ok(result)
    }

    /// Validate settings and page, then wait for the document.
    async fn initialize(&self, settings: &RunSettings) -> Result<String, HarvestError> {
        settings.validate()?;

        let url = self.page.current_url().await?;
        if !is_profile_url(&url, self.allowed_hosts.as_slice()) {
            return Err(HarvestError::WrongPage { url });
        }

        let timeout = self.tuning.ready_timeout();
        if let Err(e) = self.page.wait_ready(timeout).await {
            debug!("Page not ready: {}", e);
            return Err(HarvestError::PageNotReady { timeout });
        }
        Ok(url)
    }

    /// One query, extract and admit pass. Returns how many posts were new.
    async fn scrape_pass(
        &self,
        page_url: &str,
        salt: &str,
        scroll_index: u64,
        table: &mut PostTable,
    ) -> usize {
        let candidates = find_candidate_posts(&self.page).await;
        let ctx = ExtractContext::new(scroll_index, page_url, salt);
        let found = candidates.len();

        let added = table.admit_all(candidates.iter().filter_map(|node| extract(node, &ctx)));
        debug!(
            "Pass {}: {} candidates, {} new, {} total",
            scroll_index,
            found,
            added,
            table.len()
        );
        added
    }

    async fn scroll_once(&self) -> Result<(), crate::error::PageError> {
        let action = match self.page.metrics().await {
            Ok(metrics) => ScrollAction::choose(
                &metrics,
                self.tuning.bottom_threshold_px,
                self.tuning.nudge_px,
            ),
            Err(e) => {
                debug!("Could not read scroll metrics, jumping to bottom: {}", e);
                ScrollAction::ToBottom
            }
        };
        self.page.scroll(action).await
    }

    fn complete(&self, table: PostTable, scrolls: u64, stop_reason: StopReason) -> RunResult {
        let (posts, stats) = finalize(table.into_records(), Utc::now());
        RunResult {
            posts,
            total_scroll_passes: scrolls,
            stats,
            status: stop_reason.to_string(),
            stop_reason,
        }
    }
}

impl<P: FeedPage + 'static> Harvester<P> {
    /// Start a run on a new task. The harvester is handed back when the
    /// run ends.
    pub fn spawn(self, settings: RunSettings) -> SpawnedRun<P> {
        let handle = self.handle();
        let (sink, events) = EventSink::channel();
        let task = tokio::spawn(async move {
            let result = self.run(settings, &sink).await;
            (self, result)
        });
        SpawnedRun {
            handle,
            events,
            task,
        }
    }
}

fn progress(found: usize, max_posts: usize, scrolls: u64) -> ProgressEvent {
    let percentage = if max_posts == 0 {
        100.0
    } else {
        (found as f64 / max_posts as f64).min(1.0) * 100.0
    };
    ProgressEvent {
        posts_found: found,
        percentage,
        scroll_passes: scrolls,
        status: format!("Found {} posts after {} scrolls", found, scrolls),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percentage_is_capped() {
        assert_eq!(progress(5, 10, 1).percentage, 50.0);
        assert_eq!(progress(12, 10, 3).percentage, 100.0);
        assert_eq!(progress(0, 10, 0).percentage, 0.0);
    }
}
