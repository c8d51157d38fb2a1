//! Standard MIDI file support
//!
//! This module turns raw SMF bytes into a single, time-ordered stream of
//! note events:
//! - [`ByteCursor`] reads big-endian integers and variable length quantities
//! - [`MidiFile::parse`] decodes the header and every track chunk
//! - [`tempo`] converts tick deltas to microseconds using the tempo map of
//!   the first track
//! - [`merge_tracks`] interleaves all tracks, remapping and muting channels
//!
pub mod cursor;
mod error;
pub mod event;
mod merge;
mod reader;
pub mod tempo;

pub use cursor::{write_vlq, ByteCursor};
pub use error::{MidiError, Result};
pub use event::{bpm_to_mpqn, mpqn_to_bpm, Event, EventKind, DEFAULT_MICROS_PER_QUARTER};
pub use merge::{merge_tracks, MuteSet};
pub use reader::{Format, MidiFile, Track, TrackHeader, TrackSummary};
pub use tempo::{TempoChange, TempoMap};
