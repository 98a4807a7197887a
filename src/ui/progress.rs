use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const SPINNER_TEMPLATE: &str = "{spinner:.blue} {msg} [{elapsed}]";

/// Terminal progress feedback for a single review run
pub struct ProgressManager {
    show_progress: bool,
}

impl ProgressManager {
    /// `show_progress` is false for machine-readable output
    pub fn new(show_progress: bool) -> Self {
        Self { show_progress }
    }

    /// Starts a ticking spinner; hidden when progress output is disabled
    pub fn create_spinner(&self, message: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template(SPINNER_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(style);
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    }
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new(true)
    }
}
