//! Waiting for lazily loaded content, and delays that yield to
//! cancellation.

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

use super::RunHandle;
use crate::config::LoopTuning;
use crate::page::{count_candidates, find_page_signal, FeedPage, SignalKind};

/// Page size before a scroll, compared against afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    pub scroll_height: f64,
    pub node_count: usize,
}

impl Baseline {
    pub async fn capture<P: FeedPage + ?Sized>(page: &P) -> Self {
        let scroll_height = match page.metrics().await {
            Ok(m) => m.scroll_height,
            Err(e) => {
                debug!("Could not read scroll metrics: {}", e);
                0.0
            }
        };
        Self {
            scroll_height,
            node_count: count_candidates(page).await,
        }
    }

    fn grown(&self, now: &Baseline) -> bool {
        now.scroll_height > self.scroll_height || now.node_count > self.node_count
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Page height or post count increased.
    Grew,
    /// Nothing changed within the timeout and grace period.
    TimedOut,
    Cancelled,
}

/// Poll until the page grows past `before`, the timeout passes, or the run
/// is cancelled. A loading indicator at the timeout buys one grace period.
pub async fn wait_for_new_content<P: FeedPage + ?Sized>(
    page: &P,
    before: Baseline,
    tuning: &LoopTuning,
    handle: &RunHandle,
) -> WaitOutcome {
    let deadline = Instant::now() + tuning.new_content_timeout();

    loop {
        sleep(tuning.poll_interval()).await;
        if !handle.is_active() {
            return WaitOutcome::Cancelled;
        }
        if before.grown(&Baseline::capture(page).await) {
            return WaitOutcome::Grew;
        }
        if Instant::now() >= deadline {
            break;
        }
    }

    if !find_page_signal(page, SignalKind::Loading).await {
        return WaitOutcome::TimedOut;
    }

    debug!(
        "Still loading after {:?}, waiting {:?} more",
        tuning.new_content_timeout(),
        tuning.loading_grace()
    );
    if !interruptible_sleep(tuning.loading_grace(), tuning.cancel_check(), handle).await {
        return WaitOutcome::Cancelled;
    }
    if before.grown(&Baseline::capture(page).await) {
        WaitOutcome::Grew
    } else {
        WaitOutcome::TimedOut
    }
}

/// Sleep for `total` in steps of `step`, returning false as soon as the
/// run is no longer active.
pub async fn interruptible_sleep(total: Duration, step: Duration, handle: &RunHandle) -> bool {
    let deadline = Instant::now() + total;
    loop {
        if !handle.is_active() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        sleep(step.min(deadline - now)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{FixturePage, ScrollAction};

    const PROFILE: &str = "https://x.com/someone";

    fn frame(body: &str) -> String {
        format!(
            r#"<html><body><article data-testid="tweet"><div data-testid="tweetText">hello</div></article>{}</body></html>"#,
            body
        )
    }

    fn active() -> RunHandle {
        let handle = RunHandle::new();
        assert!(handle.try_activate());
        handle
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out_without_loader() {
        let page = FixturePage::single(PROFILE, frame(""));
        let before = Baseline::capture(&page).await;
        let start = Instant::now();

        let outcome = wait_for_new_content(&page, before, &LoopTuning::default(), &active()).await;
        assert_eq!(outcome, WaitOutcome::TimedOut);
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_grants_grace_while_loading() {
        let page = FixturePage::single(PROFILE, frame(r#"<div role="progressbar"></div>"#));
        let before = Baseline::capture(&page).await;
        let start = Instant::now();

        let outcome = wait_for_new_content(&page, before, &LoopTuning::default(), &active()).await;
        assert_eq!(outcome, WaitOutcome::TimedOut);
        assert_eq!(start.elapsed(), Duration::from_secs(12));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_sees_growth_on_first_poll() {
        let page = FixturePage::new(PROFILE, vec![frame(""), frame("<p>more</p>")]);
        let before = Baseline::capture(&page).await;
        page.scroll(ScrollAction::ToBottom).await.unwrap();
        let start = Instant::now();

        let outcome = wait_for_new_content(&page, before, &LoopTuning::default(), &active()).await;
        assert_eq!(outcome, WaitOutcome::Grew);
        assert_eq!(start.elapsed(), Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_cancelled_within_one_poll() {
        let page = FixturePage::single(PROFILE, frame(""));
        let before = Baseline::capture(&page).await;
        let handle = active();

        let canceller = handle.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(1100)).await;
            canceller.cancel();
        });

        let start = Instant::now();
        let outcome = wait_for_new_content(&page, before, &LoopTuning::default(), &handle).await;
        assert_eq!(outcome, WaitOutcome::Cancelled);
        assert!(start.elapsed() <= Duration::from_millis(1100 + 250));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_cancelled_during_grace() {
        let page = FixturePage::single(PROFILE, frame(r#"<div role="progressbar"></div>"#));
        let before = Baseline::capture(&page).await;
        let handle = active();

        let canceller = handle.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(10_550)).await;
            canceller.cancel();
        });

        let start = Instant::now();
        let outcome = wait_for_new_content(&page, before, &LoopTuning::default(), &handle).await;
        assert_eq!(outcome, WaitOutcome::Cancelled);
        assert!(start.elapsed() <= Duration::from_millis(10_550 + 100));
    }

    #[tokio::test]
    async fn test_hidden_placeholders_do_not_count_as_growth() {
        let page = FixturePage::new(
            PROFILE,
            vec![
                frame(""),
                frame(r#"<article data-testid="tweet" style="display: none"></article>"#),
            ],
        );
        let before = Baseline::capture(&page).await;
        page.scroll(ScrollAction::ToBottom).await.unwrap();
        let after = Baseline::capture(&page).await;

        assert_eq!(before.node_count, 1);
        assert_eq!(after.node_count, 1);
        // same height, one more hidden container: not growth
        let same_height = Baseline {
            scroll_height: before.scroll_height,
            ..after
        };
        assert!(!before.grown(&same_height));
        assert!(before.grown(&after));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_completes() {
        let handle = RunHandle::new();
        assert!(handle.try_activate());
        let start = Instant::now();
        assert!(
            interruptible_sleep(Duration::from_secs(2), Duration::from_millis(100), &handle).await
        );
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_interrupted_within_one_step() {
        let handle = RunHandle::new();
        assert!(handle.try_activate());

        let canceller = handle.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(250)).await;
            canceller.cancel();
        });

        let start = Instant::now();
        assert!(
            !interruptible_sleep(Duration::from_secs(10), Duration::from_millis(100), &handle)
                .await
        );
        assert!(start.elapsed() <= Duration::from_millis(300));
    }
}
