//! Real-time playback of a merged track

use crate::drive::{DrivePool, Voice};
use crate::midi::{mpqn_to_bpm, EventKind, Track};
use crossbeam::channel::Sender;
use log::{debug, info};
use std::thread;
use std::time::Duration;

/// Blocking wait between events.
pub trait Delay {
    fn wait(&self, duration: Duration);
}

pub struct ThreadDelay;

impl ThreadDelay {
    pub fn new() -> Self {
        ThreadDelay
    }
}

impl Default for ThreadDelay {
    fn default() -> Self {
        Self::new()
    }
}

impl Delay for ThreadDelay {
    fn wait(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackSummary {
    pub events: usize,
    pub notes_played: usize,
    pub notes_dropped: usize,
    pub notes_released: usize,
}

/// What the sequencer reports while it plays.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    Started { total_micros: u64, events: usize },
    Position { absolute_micros: u64 },
    Text(String),
    Lyrics(String),
    Finished(PlaybackSummary),
}

/// Walks a merged track in real time, dispatching notes to a pool.
///
/// The sequencer is the only writer of pool bindings; it waits each
/// event's `relative_micros` before dispatching it.
pub struct Sequencer<'p, V: Voice, D: Delay> {
    pool: &'p mut DrivePool<V>,
    delay: D,
    progress: Option<Sender<PlaybackEvent>>,
}

impl<'p, V: Voice, D: Delay> Sequencer<'p, V, D> {
    pub fn new(pool: &'p mut DrivePool<V>, delay: D) -> Self {
        Self {
            pool,
            delay,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: Sender<PlaybackEvent>) -> Self {
        self.progress = Some(progress);
        self
    }

    fn report(&self, event: PlaybackEvent) {
        if let Some(progress) = &self.progress {
            // A closed receiver only means nobody is watching.
            let _ = progress.send(event);
        }
    }

    pub fn play(&mut self, track: &Track) -> PlaybackSummary {
        let mut summary = PlaybackSummary::default();
        info!(
            "Playing {} events over {:.1}s on {} drives",
            track.len(),
            track.duration_micros() as f64 / 1_000_000.0,
            self.pool.len()
        );
        self.report(PlaybackEvent::Started {
            total_micros: track.duration_micros(),
            events: track.len(),
        });

        for event in track.events() {
            if event.relative_micros > 0 {
                self.delay.wait(Duration::from_micros(event.relative_micros));
                self.report(PlaybackEvent::Position {
                    absolute_micros: event.absolute_micros,
                });
            }
            summary.events += 1;

            match &event.kind {
                EventKind::NoteOn { channel, note, .. } => {
                    match self.pool.note_on(*channel, *note) {
                        Some(_) => summary.notes_played += 1,
                        None => summary.notes_dropped += 1,
                    }
                }
                EventKind::NoteOff { channel, .. } => {
                    if self.pool.note_off(*channel).is_some() {
                        summary.notes_released += 1;
                    }
                }
                EventKind::Text(text) => self.report(PlaybackEvent::Text(text.clone())),
                EventKind::Lyrics(text) => self.report(PlaybackEvent::Lyrics(text.clone())),
                EventKind::Tempo { micros_per_quarter } => {
                    debug!(
                        "Tempo {:.2} BPM at {}us",
                        mpqn_to_bpm(*micros_per_quarter),
                        event.absolute_micros
                    );
                }
                EventKind::Generic { .. } => {}
            }
        }

        self.pool.release_all();
        info!(
            "Playback finished: {} notes played, {} dropped",
            summary.notes_played, summary.notes_dropped
        );
        self.report(PlaybackEvent::Finished(summary));
        summary
    }
}
