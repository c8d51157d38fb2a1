//! Standard MIDI file decoder

use super::cursor::ByteCursor;
use super::error::{MidiError, Result};
use super::event::{Event, EventKind, DEFAULT_MICROS_PER_QUARTER};
use super::merge::{merge_tracks, MuteSet};
use super::tempo;
use log::debug;
use std::collections::BTreeSet;
use std::path::Path;

const HEADER_MAGIC: &[u8] = b"MThd";
const TRACK_MAGIC: &[u8] = b"MTrk";
const HEADER_SIZE: u32 = 6;

const NOTE_OFF: u8 = 0x8;
const NOTE_ON: u8 = 0x9;
const PROGRAM_CHANGE: u8 = 0xC;
const CHANNEL_AFTERTOUCH: u8 = 0xD;
const SYSTEM: u8 = 0xF;

const META: u8 = 0xFF;
const SYSEX: u8 = 0xF0;
const SYSEX_ESCAPE: u8 = 0xF7;

const META_SEQUENCE_NUMBER: u8 = 0x00;
const META_TEXT: u8 = 0x01;
const META_TRACK_NAME: u8 = 0x03;
const META_LYRICS: u8 = 0x05;
const META_END_OF_TRACK: u8 = 0x2F;
const META_SET_TEMPO: u8 = 0x51;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    SingleTrack,
    Parallel,
    Sequential,
}

impl TryFrom<u16> for Format {
    type Error = MidiError;

    fn try_from(raw: u16) -> Result<Self> {
        match raw {
            0 => Ok(Format::SingleTrack),
            1 => Ok(Format::Parallel),
            2 => Ok(Format::Sequential),
            other => Err(MidiError::BadFormat(other)),
        }
    }
}

impl From<Format> for u16 {
    fn from(format: Format) -> Self {
        match format {
            Format::SingleTrack => 0,
            Format::Parallel => 1,
            Format::Sequential => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackHeader {
    pub chunk_size: u32,
    pub sequence_number: Option<u16>,
    pub sequence_name: Option<String>,
    /// Microseconds per quarter note of the first tempo change, or 120 BPM.
    pub tempo: f64,
    /// Copied from the file header. Bit 15 set means SMPTE timing.
    pub time_division: u16,
}

impl TrackHeader {
    pub fn new(time_division: u16) -> Self {
        Self {
            chunk_size: 0,
            sequence_number: None,
            sequence_name: None,
            tempo: DEFAULT_MICROS_PER_QUARTER,
            time_division,
        }
    }

    pub fn is_smpte(&self) -> bool {
        self.time_division & 0x8000 != 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub header: TrackHeader,
    pub events: Vec<Event>,
}

impl Track {
    pub fn new(header: TrackHeader, events: Vec<Event>) -> Self {
        Self { header, events }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn duration_micros(&self) -> u64 {
        self.events.last().map_or(0, |e| e.absolute_micros)
    }

    /// Distinct channels used by note events, ascending.
    pub fn channels(&self) -> BTreeSet<u16> {
        self.events.iter().filter_map(Event::channel).collect()
    }
}

/// Overview of one decoded track.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSummary {
    pub index: usize,
    pub name: Option<String>,
    pub events: usize,
    pub notes: usize,
    pub channels: BTreeSet<u16>,
    pub duration_micros: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MidiFile {
    pub format: Format,
    pub track_count: u16,
    pub time_division: u16,
    pub tracks: Vec<Track>,
}

impl MidiFile {
    /// Reads, decodes and tempo-resolves the file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        let mut file = Self::parse(&bytes)?;
        file.resolve_tempo()?;
        Ok(file)
    }

    /// Decodes header and tracks. Real time fields stay zero until
    /// [`MidiFile::resolve_tempo`] runs.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut cursor = ByteCursor::new(bytes);
        match cursor.read_bytes(HEADER_MAGIC.len()) {
            Ok(magic) if magic == HEADER_MAGIC => {}
            _ => return Err(MidiError::BadHeaderMagic),
        }

        let header_size = cursor.read_u32_be()?;
        if header_size != HEADER_SIZE {
            return Err(MidiError::BadHeaderSize(header_size));
        }

        let format = Format::try_from(cursor.read_u16_be()?)?;
        let track_count = cursor.read_u16_be()?;
        let time_division = cursor.read_u16_be()?;
        debug!(
            "MIDI header: format={:?}, tracks={}, division={:#06x}",
            format, track_count, time_division
        );

        let tracks = (0..usize::from(track_count))
            .map(|index| read_track(index, &mut cursor, time_division))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            format,
            track_count,
            time_division,
            tracks,
        })
    }

    /// Fills in the microsecond fields of every track, using the tempo
    /// changes of the first track as the timeline.
    pub fn resolve_tempo(&mut self) -> Result<()> {
        tempo::resolve_tracks(&mut self.tracks, self.time_division)
    }

    /// Consumes the file and merges all tracks into one stream.
    pub fn into_merged(self, muted: &MuteSet) -> Track {
        merge_tracks(self.tracks, muted)
    }

    pub fn summaries(&self) -> Vec<TrackSummary> {
        self.tracks
            .iter()
            .enumerate()
            .map(|(index, track)| TrackSummary {
                index,
                name: track.header.sequence_name.clone(),
                events: track.len(),
                notes: track
                    .events
                    .iter()
                    .filter(|e| matches!(e.kind, EventKind::NoteOn { .. }))
                    .count(),
                channels: track.channels(),
                duration_micros: track.duration_micros(),
            })
            .collect()
    }
}

fn read_track(index: usize, cursor: &mut ByteCursor<'_>, time_division: u16) -> Result<Track> {
    match cursor.read_bytes(TRACK_MAGIC.len()) {
        Ok(magic) if magic == TRACK_MAGIC => {}
        Ok(_) => return Err(MidiError::BadTrackMagic { track: index }),
        Err(e) => return Err(e),
    }
    let chunk_size = cursor.read_u32_be()?;
    let chunk_start = cursor.offset();
    let chunk = cursor.read_bytes(chunk_size as usize)?;

    let mut header = TrackHeader::new(time_division);
    header.chunk_size = chunk_size;
    let track = TrackDecoder::new(index, ByteCursor::at(chunk, chunk_start), header).decode()?;
    debug!(
        "Track {} ({:?}): {} bytes, {} events",
        index,
        track.header.sequence_name,
        chunk_size,
        track.len()
    );
    Ok(track)
}

enum Meta {
    Event(EventKind),
    Skip,
    EndOfTrack,
}

struct TrackDecoder<'a> {
    index: usize,
    cursor: ByteCursor<'a>,
    header: TrackHeader,
    events: Vec<Event>,
    ticks: u64,
    stored_ticks: u64,
    running_status: Option<u8>,
    seen_tempo: bool,
}

impl<'a> TrackDecoder<'a> {
    fn new(index: usize, cursor: ByteCursor<'a>, header: TrackHeader) -> Self {
        Self {
            index,
            cursor,
            header,
            events: Vec::new(),
            ticks: 0,
            stored_ticks: 0,
            running_status: None,
            seen_tempo: false,
        }
    }

    fn decode(mut self) -> Result<Track> {
        while !self.cursor.is_empty() {
            let delta = self.cursor.read_vlq()?;
            // Skipped events still advance time; the next stored event
            // absorbs their delta.
            self.ticks += u64::from(delta);

            let status = self.read_status()?;
            let kind = if status >> 4 != SYSTEM {
                Some(self.read_channel_message(status)?)
            } else {
                match status {
                    META => match self.read_meta()? {
                        Meta::Event(kind) => Some(kind),
                        Meta::Skip => None,
                        Meta::EndOfTrack => break,
                    },
                    SYSEX | SYSEX_ESCAPE => {
                        let len = self.cursor.read_vlq()?;
                        self.cursor.skip(len as usize)?;
                        None
                    }
                    other => {
                        self.skip_system_common(other)?;
                        None
                    }
                }
            };

            if let Some(kind) = kind {
                self.push(kind);
            }
        }
        Ok(Track::new(self.header, self.events))
    }

    fn push(&mut self, kind: EventKind) {
        let relative = self.ticks - self.stored_ticks;
        self.stored_ticks = self.ticks;
        self.events.push(Event::new(relative, self.ticks, kind));
    }

    /// Returns the status for the next event. A data byte in status
    /// position repeats the previous channel message status without
    /// consuming anything.
    fn read_status(&mut self) -> Result<u8> {
        let offset = self.cursor.offset();
        let byte = self
            .cursor
            .peek()
            .ok_or(MidiError::Truncated { offset, needed: 1 })?;
        if byte & 0x80 == 0 {
            return self.running_status.ok_or(MidiError::MissingRunningStatus {
                track: self.index,
                offset,
            });
        }
        self.cursor.read_u8()?;
        if byte >> 4 != SYSTEM {
            self.running_status = Some(byte);
        }
        Ok(byte)
    }

    fn read_channel_message(&mut self, status: u8) -> Result<EventKind> {
        let message = status >> 4;
        let channel = u16::from(status & 0x0F);
        let first = self.cursor.read_u8()? & 0x7F;
        let kind = match message {
            NOTE_OFF => {
                self.cursor.read_u8()?;
                EventKind::NoteOff {
                    channel,
                    note: first,
                }
            }
            NOTE_ON => {
                let velocity = self.cursor.read_u8()? & 0x7F;
                if velocity == 0 {
                    EventKind::NoteOff {
                        channel,
                        note: first,
                    }
                } else {
                    EventKind::NoteOn {
                        channel,
                        note: first,
                        velocity,
                    }
                }
            }
            PROGRAM_CHANGE | CHANNEL_AFTERTOUCH => EventKind::Generic { status: message },
            _ => {
                self.cursor.read_u8()?;
                EventKind::Generic { status: message }
            }
        };
        Ok(kind)
    }

    fn read_meta(&mut self) -> Result<Meta> {
        let meta_type = self.cursor.read_u8()?;
        let len = self.cursor.read_vlq()? as usize;
        let payload_offset = self.cursor.offset();
        let payload = self.cursor.read_bytes(len)?;

        let meta = match meta_type {
            META_SEQUENCE_NUMBER => {
                if let [high, low, ..] = *payload {
                    self.header.sequence_number = Some(u16::from_be_bytes([high, low]));
                }
                Meta::Skip
            }
            META_TEXT => Meta::Event(EventKind::Text(text(payload))),
            META_TRACK_NAME => {
                self.header.sequence_name = Some(text(payload));
                Meta::Skip
            }
            META_LYRICS => Meta::Event(EventKind::Lyrics(text(payload))),
            META_END_OF_TRACK => Meta::EndOfTrack,
            META_SET_TEMPO => {
                let [a, b, c, ..] = *payload else {
                    return Err(MidiError::Truncated {
                        offset: payload_offset + len,
                        needed: 3 - len,
                    });
                };
                let micros_per_quarter = f64::from(u32::from_be_bytes([0, a, b, c]));
                if micros_per_quarter == 0.0 {
                    Meta::Skip
                } else {
                    if !self.seen_tempo {
                        self.header.tempo = micros_per_quarter;
                        self.seen_tempo = true;
                    }
                    Meta::Event(EventKind::Tempo { micros_per_quarter })
                }
            }
            _ => Meta::Skip,
        };
        Ok(meta)
    }

    /// System common and real-time bytes have no business in a file,
    /// but their data length is known so they can be stepped over.
    fn skip_system_common(&mut self, status: u8) -> Result<()> {
        let len = match status {
            0xF1 | 0xF3 => 1,
            0xF2 => 2,
            _ => 0,
        };
        self.cursor.skip(len)
    }
}

fn text(payload: &[u8]) -> String {
    String::from_utf8_lossy(payload).into_owned()
}
