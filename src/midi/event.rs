/// Default tempo when a file never sets one: 120 BPM.
pub const DEFAULT_MICROS_PER_QUARTER: f64 = 500_000.0;

const MICROSECONDS_PER_MINUTE: f64 = 60_000_000.0;

pub fn bpm_to_mpqn(bpm: f64) -> f64 {
    MICROSECONDS_PER_MINUTE / bpm
}

pub fn mpqn_to_bpm(mpqn: f64) -> f64 {
    MICROSECONDS_PER_MINUTE / mpqn
}

/// Kind-specific part of an [`Event`].
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    NoteOn { channel: u16, note: u8, velocity: u8 },
    NoteOff { channel: u16, note: u8 },
    Text(String),
    Lyrics(String),
    Tempo { micros_per_quarter: f64 },
    /// Anything else that occupies time in a track. Carries the status
    /// nibble (0xA..=0xE) for channel messages.
    Generic { status: u8 },
}

/// A decoded track event with both musical and real time positions.
///
/// `relative_*` are deltas from the previous event in the same track
/// (or merged stream), `absolute_*` are running sums from track start.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub relative_ticks: u64,
    pub absolute_ticks: u64,
    pub relative_micros: u64,
    pub absolute_micros: u64,
    pub kind: EventKind,
}

impl Event {
    pub fn new(relative_ticks: u64, absolute_ticks: u64, kind: EventKind) -> Self {
        Self {
            relative_ticks,
            absolute_ticks,
            relative_micros: 0,
            absolute_micros: 0,
            kind,
        }
    }

    /// Channel of a note event.
    pub fn channel(&self) -> Option<u16> {
        match self.kind {
            EventKind::NoteOn { channel, .. } | EventKind::NoteOff { channel, .. } => {
                Some(channel)
            }
            _ => None,
        }
    }

    pub(crate) fn set_channel(&mut self, new_channel: u16) {
        match &mut self.kind {
            EventKind::NoteOn { channel, .. } | EventKind::NoteOff { channel, .. } => {
                *channel = new_channel
            }
            _ => {}
        }
    }

    pub fn is_note(&self) -> bool {
        self.channel().is_some()
    }
}
