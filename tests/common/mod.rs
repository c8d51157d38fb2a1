#![allow(dead_code)]

use floppymusic::drive::Voice;
use floppymusic::midi::write_vlq;
use floppymusic::scheduler::Delay;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Builds the body of one `MTrk` chunk.
#[derive(Default)]
pub struct TrackBuilder {
    bytes: Vec<u8>,
}

impl TrackBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a delta time followed by raw event bytes.
    pub fn event(mut self, delta: u32, data: &[u8]) -> Self {
        write_vlq(delta, &mut self.bytes);
        self.bytes.extend_from_slice(data);
        self
    }

    pub fn note_on(self, delta: u32, channel: u8, note: u8, velocity: u8) -> Self {
        self.event(delta, &[0x90 | channel, note, velocity])
    }

    pub fn note_off(self, delta: u32, channel: u8, note: u8) -> Self {
        self.event(delta, &[0x80 | channel, note, 0x40])
    }

    pub fn meta(mut self, delta: u32, meta_type: u8, payload: &[u8]) -> Self {
        write_vlq(delta, &mut self.bytes);
        self.bytes.extend_from_slice(&[0xFF, meta_type]);
        write_vlq(payload.len() as u32, &mut self.bytes);
        self.bytes.extend_from_slice(payload);
        self
    }

    pub fn tempo(self, delta: u32, micros_per_quarter: u32) -> Self {
        let [_, a, b, c] = micros_per_quarter.to_be_bytes();
        self.meta(delta, 0x51, &[a, b, c])
    }

    pub fn name(self, delta: u32, name: &str) -> Self {
        self.meta(delta, 0x03, name.as_bytes())
    }

    pub fn text(self, delta: u32, text: &str) -> Self {
        self.meta(delta, 0x01, text.as_bytes())
    }

    pub fn lyrics(self, delta: u32, text: &str) -> Self {
        self.meta(delta, 0x05, text.as_bytes())
    }

    pub fn sysex(mut self, delta: u32, payload: &[u8]) -> Self {
        write_vlq(delta, &mut self.bytes);
        self.bytes.push(0xF0);
        write_vlq(payload.len() as u32, &mut self.bytes);
        self.bytes.extend_from_slice(payload);
        self
    }

    /// Closes the track with an end-of-track meta event.
    pub fn end(self, delta: u32) -> Vec<u8> {
        self.meta(delta, 0x2F, &[]).bytes
    }

    /// Track body without an end-of-track marker.
    pub fn raw(self) -> Vec<u8> {
        self.bytes
    }
}

/// Wraps track bodies into a complete file.
pub fn smf(format: u16, time_division: u16, tracks: &[Vec<u8>]) -> Vec<u8> {
    let mut bytes = b"MThd".to_vec();
    bytes.extend_from_slice(&6u32.to_be_bytes());
    bytes.extend_from_slice(&format.to_be_bytes());
    bytes.extend_from_slice(&(tracks.len() as u16).to_be_bytes());
    bytes.extend_from_slice(&time_division.to_be_bytes());
    for track in tracks {
        bytes.extend_from_slice(b"MTrk");
        bytes.extend_from_slice(&(track.len() as u32).to_be_bytes());
        bytes.extend_from_slice(track);
    }
    bytes
}

/// Records every frequency it is given.
#[derive(Debug, Default)]
pub struct RecordingVoice {
    pub frequencies: Mutex<Vec<f64>>,
}

impl RecordingVoice {
    pub fn history(&self) -> Vec<f64> {
        self.frequencies.lock().unwrap().clone()
    }

    pub fn current(&self) -> f64 {
        self.history().last().copied().unwrap_or(0.0)
    }
}

impl Voice for RecordingVoice {
    fn set_frequency(&self, frequency: f64) {
        self.frequencies.lock().unwrap().push(frequency);
    }
}

pub fn voices(count: usize) -> Vec<RecordingVoice> {
    (0..count).map(|_| RecordingVoice::default()).collect()
}

/// Records requested waits instead of sleeping.
#[derive(Debug, Clone, Default)]
pub struct RecordingDelay {
    pub waits: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingDelay {
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().unwrap().clone()
    }
}

impl Delay for RecordingDelay {
    fn wait(&self, duration: Duration) {
        self.waits.lock().unwrap().push(duration);
    }
}
