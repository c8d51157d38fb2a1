//! k-way merge of decoded tracks into one playback stream

use super::event::Event;
use super::reader::{Track, TrackHeader};
use log::{debug, info};
use std::collections::{HashMap, HashSet};

/// `(track << 4) | channel` combinations whose notes are left out of a
/// merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MuteSet {
    combinations: HashSet<u32>,
}

impl MuteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn combination(track: usize, channel: u16) -> u32 {
        ((track as u32) << 4) | u32::from(channel & 0x0F)
    }

    pub fn mute(&mut self, track: usize, channel: u16) {
        self.combinations.insert(Self::combination(track, channel));
    }

    /// Mutes all sixteen channels of `track`.
    pub fn mute_track(&mut self, track: usize) {
        for channel in 0..16 {
            self.mute(track, channel);
        }
    }

    pub fn is_muted(&self, track: usize, channel: u16) -> bool {
        self.combinations
            .contains(&Self::combination(track, channel))
    }

    pub fn contains(&self, combination: u32) -> bool {
        self.combinations.contains(&combination)
    }

    pub fn len(&self) -> usize {
        self.combinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combinations.is_empty()
    }
}

impl FromIterator<u32> for MuteSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self {
            combinations: iter.into_iter().collect(),
        }
    }
}

/// Merges `tracks` into a single stream ordered by `absolute_micros`.
///
/// Ties go to the lower track index. Note events get a dense channel id
/// per `(track, channel)` pair in first-seen order; notes of muted pairs
/// are dropped. Relative fields of the result are deltas between
/// consecutive merged events.
pub fn merge_tracks(tracks: Vec<Track>, muted: &MuteSet) -> Track {
    let header = tracks
        .first()
        .map(|first| TrackHeader {
            chunk_size: 0,
            ..first.header.clone()
        })
        .unwrap_or_else(|| TrackHeader::new(0));
    let track_count = tracks.len();
    let capacity = tracks.iter().map(Track::len).sum();

    let mut cursors: Vec<_> = tracks
        .into_iter()
        .map(|track| track.events.into_iter().peekable())
        .collect();
    let mut channels: HashMap<u32, u16> = HashMap::new();
    let mut merged: Vec<Event> = Vec::with_capacity(capacity);
    let mut muted_events = 0usize;

    loop {
        let mut next: Option<(usize, u64)> = None;
        for (index, cursor) in cursors.iter_mut().enumerate() {
            if let Some(event) = cursor.peek() {
                if next.map_or(true, |(_, at)| event.absolute_micros < at) {
                    next = Some((index, event.absolute_micros));
                }
            }
        }
        let Some((index, _)) = next else {
            break;
        };
        let Some(mut event) = cursors[index].next() else {
            break;
        };

        if let Some(channel) = event.channel() {
            let combination = MuteSet::combination(index, channel);
            if muted.contains(combination) {
                muted_events += 1;
                continue;
            }
            let next_channel = channels.len() as u16;
            let merged_channel = *channels.entry(combination).or_insert_with(|| {
                debug!(
                    "Track {} channel {} -> merged channel {}",
                    index, channel, next_channel
                );
                next_channel
            });
            event.set_channel(merged_channel);
        }
        merged.push(event);
    }

    let mut previous_ticks = 0;
    let mut previous_micros = 0;
    for event in &mut merged {
        event.relative_ticks = event.absolute_ticks.saturating_sub(previous_ticks);
        event.relative_micros = event.absolute_micros - previous_micros;
        previous_ticks = event.absolute_ticks;
        previous_micros = event.absolute_micros;
    }

    info!(
        "Merged {} tracks into {} events on {} channels ({} muted events)",
        track_count,
        merged.len(),
        channels.len(),
        muted_events
    );
    Track::new(header, merged)
}
