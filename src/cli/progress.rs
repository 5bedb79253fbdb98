//! Progress bar for a running harvest.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use feedharvest::models::ProgressEvent;

/// A bar counting admitted posts up to the run's limit.
pub struct RunProgress {
    bar: ProgressBar,
}

impl RunProgress {
    pub fn new(max_posts: usize) -> Self {
        let bar = ProgressBar::new(max_posts as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} {msg} [{bar:30.cyan/blue}] {pos}/{len}")
                .unwrap()
                .progress_chars("█▓░"),
        );
        bar.set_message("Loading profile");
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    pub fn update(&self, event: &ProgressEvent) {
        let len = self.bar.length().unwrap_or(0);
        self.bar.set_position((event.posts_found as u64).min(len));
        self.bar.set_message(event.status.clone());
    }

    pub fn println(&self, message: &str) {
        self.bar.println(message);
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
