use super::{ActuatorOptions, Drive, DrivePins, PitchTable, Voice};
use crate::gpio::PinBus;
use log::{debug, trace};
use std::collections::HashMap;
use std::sync::Arc;

/// Fixed set of voices plus the channel bindings of active notes.
///
/// Allocation is first-fit in index order. When every voice is busy a
/// new note is dropped, never queued.
pub struct DrivePool<V: Voice> {
    voices: Vec<V>,
    bindings: HashMap<u16, usize>,
    in_use: Vec<bool>,
    pitch: PitchTable,
}

impl<V: Voice> DrivePool<V> {
    pub fn new(voices: Vec<V>, pitch: PitchTable) -> Self {
        let in_use = vec![false; voices.len()];
        Self {
            voices,
            bindings: HashMap::new(),
            in_use,
            pitch,
        }
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn voices(&self) -> &[V] {
        &self.voices
    }

    pub fn pitch(&self) -> PitchTable {
        self.pitch
    }

    /// Number of voices currently bound to a channel.
    pub fn active(&self) -> usize {
        self.in_use.iter().filter(|used| **used).count()
    }

    pub fn is_in_use(&self, index: usize) -> bool {
        self.in_use.get(index).copied().unwrap_or(false)
    }

    pub fn binding(&self, channel: u16) -> Option<usize> {
        self.bindings.get(&channel).copied()
    }

    /// Starts `note` on `channel`. Returns the voice index, or `None` if
    /// the note was dropped because no voice is free.
    ///
    /// A channel that already holds a voice is retuned in place, so one
    /// channel never occupies two voices.
    pub fn note_on(&mut self, channel: u16, note: u8) -> Option<usize> {
        let frequency = self.pitch.frequency(note);
        if let Some(index) = self.binding(channel) {
            trace!("Channel {} retuned on drive {} ({:.3} Hz)", channel, index, frequency);
            self.voices[index].set_frequency(frequency);
            return Some(index);
        }

        let Some(index) = self.in_use.iter().position(|used| !used) else {
            debug!("No free drive for note {} on channel {}, dropped", note, channel);
            return None;
        };
        self.bindings.insert(channel, index);
        self.in_use[index] = true;
        trace!("Channel {} -> drive {} ({:.3} Hz)", channel, index, frequency);
        self.voices[index].set_frequency(frequency);
        Some(index)
    }

    /// Releases the voice bound to `channel`, if any.
    pub fn note_off(&mut self, channel: u16) -> Option<usize> {
        let index = self.bindings.remove(&channel)?;
        self.voices[index].set_frequency(0.0);
        self.in_use[index] = false;
        trace!("Channel {} released drive {}", channel, index);
        Some(index)
    }

    /// Silences every voice and forgets all bindings.
    pub fn release_all(&mut self) {
        for (voice, used) in self.voices.iter().zip(self.in_use.iter_mut()) {
            if *used {
                voice.set_frequency(0.0);
                *used = false;
            }
        }
        self.bindings.clear();
    }

    pub fn into_voices(self) -> Vec<V> {
        self.voices
    }
}

impl DrivePool<Drive> {
    /// Homes and starts one drive per pin pair, in order.
    pub fn with_drives(
        pins: &[DrivePins],
        bus: Arc<dyn PinBus>,
        options: ActuatorOptions,
        pitch: PitchTable,
    ) -> std::io::Result<Self> {
        let drives = pins
            .iter()
            .enumerate()
            .map(|(index, pins)| Drive::spawn(index, *pins, Arc::clone(&bus), options))
            .collect::<std::io::Result<Vec<_>>>()?;
        Ok(Self::new(drives, pitch))
    }

    /// Stops and joins every drive thread.
    pub fn shutdown(&mut self) {
        self.release_all();
        for drive in &mut self.voices {
            drive.shutdown();
        }
    }
}
