use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Displays a progress bar while the suite is running to show the user how many scenarios are
/// left.
pub(crate) struct ScenarioProgress {
    pb: ProgressBar,
}

impl ScenarioProgress {
    pub(crate) fn new(scenario_count: usize, hidden: bool) -> Self {
        if hidden {
            return Self {
                pb: ProgressBar::hidden(),
            };
        }

        let pb = ProgressBar::new(scenario_count as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{wide_bar:.cyan/blue}] {pos}/{len} [{elapsed_precise}] {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );
        pb.enable_steady_tick(Duration::from_millis(250));

        Self { pb }
    }

    pub(crate) fn start(&self, name: &str) {
        self.pb.set_message(name.to_string());
    }

    pub(crate) fn finish_one(&self) {
        self.pb.inc(1);
    }

    pub(crate) fn finish(&self) {
        log::trace!("Progress bar finished");
        self.pb.finish_and_clear();
    }
}
