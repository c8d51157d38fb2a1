use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

pub fn create_playback_progress(total_millis: u64) -> ProgressBar {
    let pb = ProgressBar::with_draw_target(Some(total_millis), ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{prefix:.bold} [{bar:40.cyan}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("⣀⣤⣦⣶⣷⣿ "),
    );
    pb.set_prefix("Playing");
    pb
}

/// `m:ss` for a position in milliseconds.
pub fn format_clock(millis: u64) -> String {
    let seconds = millis / 1000;
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
