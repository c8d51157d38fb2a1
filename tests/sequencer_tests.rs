mod common;

#[cfg(test)]
mod tests {
    use super::common::{smf, voices, RecordingDelay, TrackBuilder};
    use approx::assert_relative_eq;
    use crossbeam::channel;
    use floppymusic::drive::{DrivePool, PitchTable, BASE_FREQUENCIES};
    use floppymusic::midi::{MidiFile, MuteSet, Track};
    use floppymusic::scheduler::{PlaybackEvent, PlaybackSummary, Sequencer};
    use std::time::Duration;

    fn merged(bytes: &[u8]) -> Track {
        let mut file = MidiFile::parse(bytes).unwrap();
        file.resolve_tempo().unwrap();
        file.into_merged(&MuteSet::new())
    }

    fn song() -> Track {
        merged(&smf(
            1,
            480,
            &[
                TrackBuilder::new()
                    .tempo(0, 500_000)
                    .note_on(0, 0, 60, 64)
                    .lyrics(0, "Hel")
                    .note_off(480, 0, 60)
                    .end(0),
                TrackBuilder::new()
                    .note_on(240, 1, 64, 64)
                    .text(0, "chorus")
                    .note_off(480, 1, 64)
                    .end(0),
            ],
        ))
    }

    #[test]
    fn test_waits_follow_relative_micros() {
        let mut pool = DrivePool::new(voices(2), PitchTable::default());
        let delay = RecordingDelay::default();
        let summary = Sequencer::new(&mut pool, delay.clone()).play(&song());

        assert_eq!(
            delay.waits(),
            vec![
                Duration::from_micros(250_000),
                Duration::from_micros(250_000),
                Duration::from_micros(250_000),
            ]
        );
        assert_eq!(
            summary,
            PlaybackSummary {
                events: 7,
                notes_played: 2,
                notes_dropped: 0,
                notes_released: 2,
            }
        );
    }

    #[test]
    fn test_notes_reach_the_voices() {
        let mut pool = DrivePool::new(voices(2), PitchTable::default());
        Sequencer::new(&mut pool, RecordingDelay::default()).play(&song());

        let voices = pool.into_voices();
        let first = voices[0].history();
        let second = voices[1].history();
        assert_eq!(first.len(), 2);
        assert_relative_eq!(first[0], BASE_FREQUENCIES[0]);
        assert_eq!(first[1], 0.0);
        assert_eq!(second.len(), 2);
        assert_relative_eq!(second[0], BASE_FREQUENCIES[4]);
        assert_eq!(second[1], 0.0);
    }

    #[test]
    fn test_single_drive_drops_overlapping_note() {
        let mut pool = DrivePool::new(voices(1), PitchTable::default());
        let summary = Sequencer::new(&mut pool, RecordingDelay::default()).play(&song());
        assert_eq!(summary.notes_played, 1);
        assert_eq!(summary.notes_dropped, 1);
        assert_eq!(summary.notes_released, 1);
        assert_eq!(pool.active(), 0);
    }

    #[test]
    fn test_progress_events() {
        let mut pool = DrivePool::new(voices(2), PitchTable::default());
        let (tx, rx) = channel::unbounded();
        let summary = Sequencer::new(&mut pool, RecordingDelay::default())
            .with_progress(tx)
            .play(&song());

        let events: Vec<PlaybackEvent> = rx.iter().collect();
        assert_eq!(
            events,
            vec![
                PlaybackEvent::Started {
                    total_micros: 750_000,
                    events: 7
                },
                PlaybackEvent::Lyrics("Hel".into()),
                PlaybackEvent::Position {
                    absolute_micros: 250_000
                },
                PlaybackEvent::Text("chorus".into()),
                PlaybackEvent::Position {
                    absolute_micros: 500_000
                },
                PlaybackEvent::Position {
                    absolute_micros: 750_000
                },
                PlaybackEvent::Finished(summary),
            ]
        );
    }

    #[test]
    fn test_progress_receiver_may_go_away() {
        let mut pool = DrivePool::new(voices(2), PitchTable::default());
        let (tx, rx) = channel::unbounded();
        drop(rx);
        let summary = Sequencer::new(&mut pool, RecordingDelay::default())
            .with_progress(tx)
            .play(&song());
        assert_eq!(summary.notes_played, 2);
    }

    #[test]
    fn test_empty_track() {
        let mut pool = DrivePool::new(voices(1), PitchTable::default());
        let delay = RecordingDelay::default();
        let summary = Sequencer::new(&mut pool, delay.clone()).play(&merged(&smf(0, 96, &[])));
        assert_eq!(summary, PlaybackSummary::default());
        assert!(delay.waits().is_empty());
    }
}
