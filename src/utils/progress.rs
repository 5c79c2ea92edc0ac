//! Spinner shown while waiting on the media server.
//!
//! Catalog requests are blocking, so a spinner ticks on its own thread while
//! the request runs and is cleared before the selector takes the terminal.

use crate::constants::SPINNER_CHARS;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a standard progress spinner with consistent styling.
///
/// # Example
///
/// ```ignore
/// use jly_fin::utils::progress::create_progress_spinner;
///
/// let spinner = create_progress_spinner();
/// spinner.set_message("Fetching albums...");
/// // ... do work ...
/// spinner.finish_and_clear();
/// ```
pub fn create_progress_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(SPINNER_CHARS);
    spinner.set_style(style);
    spinner
}

/// Run `work` behind a ticking spinner labelled `message`
pub fn with_spinner<T>(message: &str, work: impl FnOnce() -> T) -> T {
    let spinner = create_progress_spinner();
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    let result = work();
    spinner.finish_and_clear();
    result
}
