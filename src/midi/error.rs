use thiserror::Error;

/// Reasons a MIDI file is rejected.
///
/// Any of these aborts decoding of the whole file; no partially decoded
/// track list is handed out.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MidiError {
    #[error("invalid midi file, wrong header id (expected \"MThd\")")]
    BadHeaderMagic,

    #[error("invalid midi file, wrong header size ({0} instead of 6)")]
    BadHeaderSize(u32),

    #[error("invalid format type ({0})")]
    BadFormat(u16),

    #[error("invalid midi track {track}, expected \"MTrk\"")]
    BadTrackMagic { track: usize },

    #[error("variable length quantity longer than 4 bytes at offset {offset}")]
    VlqOverflow { offset: usize },

    #[error("unexpected end of data at offset {offset}: needed {needed} more byte(s)")]
    Truncated { offset: usize, needed: usize },

    #[error("track {track}: data byte at offset {offset} without a preceding status byte")]
    MissingRunningStatus { track: usize, offset: usize },

    #[error("SMPTE time division {0:#06x} is not supported")]
    SmpteUnsupported(u16),

    #[error("time division of zero ticks per quarter note")]
    ZeroTimeDivision,
}

pub type Result<T> = std::result::Result<T, MidiError>;
