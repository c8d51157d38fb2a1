//! Terminal output during playback
//!
//! A progress bar built with indicatif tracks the playback position
//! reported by the sequencer; lyrics and text events are printed above
//! it when requested.

mod progress;

pub use progress::{create_playback_progress, format_clock};

use crate::scheduler::{PlaybackEvent, PlaybackSummary};
use crossbeam::channel::Receiver;
use log::info;

/// Renders playback events until the sequencer finishes or goes away.
pub fn run_progress(events: Receiver<PlaybackEvent>, show_lyrics: bool) -> Option<PlaybackSummary> {
    let mut total = 0;
    let pb = create_playback_progress(0);

    for event in events.iter() {
        match event {
            PlaybackEvent::Started {
                total_micros,
                events,
            } => {
                total = total_micros / 1000;
                pb.set_length(total);
                pb.set_message(format!("0:00 / {} ({} events)", format_clock(total), events));
            }
            PlaybackEvent::Position { absolute_micros } => {
                let position = absolute_micros / 1000;
                pb.set_position(position);
                pb.set_message(format!("{} / {}", format_clock(position), format_clock(total)));
            }
            PlaybackEvent::Lyrics(text) => {
                if show_lyrics {
                    pb.println(text);
                }
            }
            PlaybackEvent::Text(text) => {
                info!("Text: {}", text);
                if show_lyrics {
                    pb.println(format!("[{}]", text));
                }
            }
            PlaybackEvent::Finished(summary) => {
                pb.finish_with_message(format!(
                    "{} / {} ({} notes, {} dropped)",
                    format_clock(total),
                    format_clock(total),
                    summary.notes_played,
                    summary.notes_dropped
                ));
                return Some(summary);
            }
        }
    }

    pb.abandon();
    None
}
