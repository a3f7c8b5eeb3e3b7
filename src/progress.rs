//! Progress bars for extraction and consolidation

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({percent}%) {msg}";

/// Create a progress bar over `len` items, or a hidden one when disabled
pub fn create_progress_bar(len: u64, message: &str, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new(len);
    bar.set_style(
        ProgressStyle::with_template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_bar_is_hidden() {
        let bar = create_progress_bar(10, "chunks", false);
        assert!(bar.is_hidden());
        bar.inc(3);
        assert_eq!(bar.position(), 3);
    }

    #[test]
    fn test_enabled_bar_tracks_length() {
        let bar = create_progress_bar(7, "files", true);
        assert_eq!(bar.length(), Some(7));
        bar.finish_and_clear();
    }
}
