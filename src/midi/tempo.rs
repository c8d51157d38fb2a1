//! Tick to microsecond conversion

use super::error::{MidiError, Result};
use super::event::{EventKind, DEFAULT_MICROS_PER_QUARTER};
use super::reader::Track;

/// A tempo change on the timeline track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoChange {
    pub absolute_ticks: u64,
    pub micros_per_quarter: f64,
}

/// Ordered tempo changes, keyed by absolute tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TempoMap {
    changes: Vec<TempoChange>,
}

impl TempoMap {
    pub fn from_track(track: &Track) -> Self {
        let changes = track
            .events
            .iter()
            .filter_map(|event| match event.kind {
                EventKind::Tempo { micros_per_quarter } => Some(TempoChange {
                    absolute_ticks: event.absolute_ticks,
                    micros_per_quarter,
                }),
                _ => None,
            })
            .collect();
        Self { changes }
    }

    pub fn changes(&self) -> &[TempoChange] {
        &self.changes
    }

    /// Tempo in effect at `ticks`.
    pub fn tempo_at(&self, ticks: u64) -> f64 {
        self.changes
            .iter()
            .take_while(|change| change.absolute_ticks <= ticks)
            .last()
            .map_or(DEFAULT_MICROS_PER_QUARTER, |change| change.micros_per_quarter)
    }
}

/// Validates a header time division as ticks per quarter note.
pub fn ticks_per_quarter(time_division: u16) -> Result<u16> {
    if time_division & 0x8000 != 0 {
        return Err(MidiError::SmpteUnsupported(time_division));
    }
    if time_division == 0 {
        return Err(MidiError::ZeroTimeDivision);
    }
    Ok(time_division)
}

/// `micros_per_quarter * ticks / division`, truncated.
pub fn ticks_to_micros(ticks: u64, micros_per_quarter: f64, time_division: u16) -> Result<u64> {
    let division = ticks_per_quarter(time_division)?;
    Ok(convert(ticks, micros_per_quarter, division))
}

fn convert(ticks: u64, micros_per_quarter: f64, division: u16) -> u64 {
    (micros_per_quarter * ticks as f64 / f64::from(division)) as u64
}

/// Fills `relative_micros`/`absolute_micros` of `track`.
///
/// Each delta is converted with the tempo in effect at the event it
/// leads up to; an event at or past a change point uses the new tempo.
pub fn resolve_track(track: &mut Track, timeline: &TempoMap, time_division: u16) -> Result<()> {
    let division = ticks_per_quarter(time_division)?;
    let mut tempo = DEFAULT_MICROS_PER_QUARTER;
    let mut pending = timeline.changes.iter().peekable();
    let mut absolute = 0u64;

    for event in &mut track.events {
        while let Some(change) = pending.next_if(|c| event.absolute_ticks >= c.absolute_ticks) {
            tempo = change.micros_per_quarter;
        }
        event.relative_micros = convert(event.relative_ticks, tempo, division);
        absolute += event.relative_micros;
        event.absolute_micros = absolute;
    }
    Ok(())
}

/// Resolves every track against the tempo changes of the first one.
pub fn resolve_tracks(tracks: &mut [Track], time_division: u16) -> Result<()> {
    ticks_per_quarter(time_division)?;
    let Some(first) = tracks.first() else {
        return Ok(());
    };
    let timeline = TempoMap::from_track(first);
    for track in tracks.iter_mut() {
        resolve_track(track, &timeline, time_division)?;
    }
    Ok(())
}
