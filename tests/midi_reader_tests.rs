mod common;

#[cfg(test)]
mod tests {
    use super::common::{smf, TrackBuilder};
    use floppymusic::midi::{EventKind, Format, MidiError, MidiFile, DEFAULT_MICROS_PER_QUARTER};

    fn kinds(file: &MidiFile, track: usize) -> Vec<EventKind> {
        file.tracks[track]
            .events()
            .iter()
            .map(|e| e.kind.clone())
            .collect()
    }

    #[test]
    fn test_header_fields() {
        let bytes = smf(1, 96, &[TrackBuilder::new().end(0), TrackBuilder::new().end(0)]);
        let file = MidiFile::parse(&bytes).unwrap();
        assert_eq!(file.format, Format::Parallel);
        assert_eq!(u16::from(file.format), 1);
        assert_eq!(Format::try_from(u16::from(Format::Sequential)), Ok(Format::Sequential));
        assert_eq!(file.track_count, 2);
        assert_eq!(file.time_division, 96);
        assert_eq!(file.tracks.len(), 2);
        assert_eq!(file.tracks[1].header.time_division, 96);
        assert_eq!(file.tracks[0].header.tempo, DEFAULT_MICROS_PER_QUARTER);
    }

    #[test]
    fn test_bad_header_magic() {
        let mut bytes = smf(0, 96, &[TrackBuilder::new().end(0)]);
        bytes[..4].copy_from_slice(b"RIFF");
        assert_eq!(MidiFile::parse(&bytes), Err(MidiError::BadHeaderMagic));
        assert_eq!(MidiFile::parse(b"MTh"), Err(MidiError::BadHeaderMagic));
    }

    #[test]
    fn test_bad_header_size_and_format() {
        let mut bytes = smf(0, 96, &[TrackBuilder::new().end(0)]);
        bytes[7] = 7;
        assert_eq!(MidiFile::parse(&bytes), Err(MidiError::BadHeaderSize(7)));

        let mut bytes = smf(0, 96, &[TrackBuilder::new().end(0)]);
        bytes[9] = 3;
        assert_eq!(MidiFile::parse(&bytes), Err(MidiError::BadFormat(3)));
    }

    #[test]
    fn test_bad_track_magic() {
        let mut bytes = smf(1, 96, &[TrackBuilder::new().end(0), TrackBuilder::new().end(0)]);
        // Second chunk starts after the header (14) and the first chunk (8 + 4).
        bytes[26..30].copy_from_slice(b"MTrX");
        assert_eq!(
            MidiFile::parse(&bytes),
            Err(MidiError::BadTrackMagic { track: 1 })
        );
    }

    #[test]
    fn test_running_status_matches_explicit_status() {
        let explicit = smf(
            0,
            96,
            &[TrackBuilder::new()
                .note_on(0, 2, 60, 100)
                .note_on(10, 2, 62, 90)
                .note_on(10, 2, 64, 0)
                .end(0)],
        );
        let running = smf(
            0,
            96,
            &[TrackBuilder::new()
                .note_on(0, 2, 60, 100)
                .event(10, &[62, 90])
                .event(10, &[64, 0])
                .end(0)],
        );
        let explicit = MidiFile::parse(&explicit).unwrap();
        let running = MidiFile::parse(&running).unwrap();
        assert_eq!(explicit.tracks[0].events(), running.tracks[0].events());
        assert_eq!(running.tracks[0].len(), 3);
    }

    #[test]
    fn test_zero_velocity_note_on_is_note_off() {
        let bytes = smf(
            0,
            96,
            &[TrackBuilder::new()
                .note_on(0, 0, 60, 64)
                .note_on(96, 0, 60, 0)
                .note_off(0, 1, 61)
                .end(0)],
        );
        let file = MidiFile::parse(&bytes).unwrap();
        assert_eq!(
            kinds(&file, 0),
            vec![
                EventKind::NoteOn {
                    channel: 0,
                    note: 60,
                    velocity: 64
                },
                EventKind::NoteOff {
                    channel: 0,
                    note: 60
                },
                EventKind::NoteOff {
                    channel: 1,
                    note: 61
                },
            ]
        );
    }

    #[test]
    fn test_skipped_events_carry_their_delta() {
        let bytes = smf(
            0,
            96,
            &[TrackBuilder::new()
                .note_on(4, 0, 60, 64)
                .name(5, "Lead")
                .sysex(7, &[0x7E, 0x7F, 0x09, 0x01, 0xF7])
                .meta(2, 0x7F, &[1, 2, 3])
                .note_off(3, 0, 60)
                .end(0)],
        );
        let file = MidiFile::parse(&bytes).unwrap();
        let track = &file.tracks[0];
        assert_eq!(track.header.sequence_name.as_deref(), Some("Lead"));
        assert_eq!(track.len(), 2);

        let events = track.events();
        assert_eq!((events[0].relative_ticks, events[0].absolute_ticks), (4, 4));
        assert_eq!((events[1].relative_ticks, events[1].absolute_ticks), (17, 21));
    }

    #[test]
    fn test_sequence_number_text_and_lyrics() {
        let bytes = smf(
            0,
            96,
            &[TrackBuilder::new()
                .meta(0, 0x00, &[0x01, 0x02])
                .text(0, "verse")
                .lyrics(48, "la")
                .end(0)],
        );
        let file = MidiFile::parse(&bytes).unwrap();
        let track = &file.tracks[0];
        assert_eq!(track.header.sequence_number, Some(0x0102));
        assert_eq!(
            kinds(&file, 0),
            vec![EventKind::Text("verse".into()), EventKind::Lyrics("la".into())]
        );
        assert_eq!(track.events()[1].absolute_ticks, 48);
    }

    #[test]
    fn test_tempo_event_sets_header_tempo_once() {
        let bytes = smf(
            0,
            96,
            &[TrackBuilder::new()
                .tempo(0, 400_000)
                .tempo(96, 300_000)
                .end(0)],
        );
        let file = MidiFile::parse(&bytes).unwrap();
        assert_eq!(file.tracks[0].header.tempo, 400_000.0);
        assert_eq!(
            kinds(&file, 0),
            vec![
                EventKind::Tempo {
                    micros_per_quarter: 400_000.0
                },
                EventKind::Tempo {
                    micros_per_quarter: 300_000.0
                },
            ]
        );
    }

    #[test]
    fn test_single_data_byte_messages() {
        let bytes = smf(
            0,
            96,
            &[TrackBuilder::new()
                .event(0, &[0xC3, 5])
                .event(0, &[0xD3, 40])
                .event(0, &[0xB3, 7, 100])
                .note_on(0, 3, 60, 64)
                .end(0)],
        );
        let file = MidiFile::parse(&bytes).unwrap();
        assert_eq!(
            kinds(&file, 0),
            vec![
                EventKind::Generic { status: 0xC },
                EventKind::Generic { status: 0xD },
                EventKind::Generic { status: 0xB },
                EventKind::NoteOn {
                    channel: 3,
                    note: 60,
                    velocity: 64
                },
            ]
        );
    }

    #[test]
    fn test_end_of_track_stops_decoding() {
        let mut body = TrackBuilder::new().note_on(0, 0, 60, 64).end(0);
        body.extend_from_slice(&[0x00, 0x90, 0x40]);
        let file = MidiFile::parse(&smf(0, 96, &[body])).unwrap();
        assert_eq!(file.tracks[0].len(), 1);
    }

    #[test]
    fn test_truncated_event() {
        let body = TrackBuilder::new().event(0, &[0x90, 60]).raw();
        let result = MidiFile::parse(&smf(0, 96, &[body]));
        assert!(
            matches!(result, Err(MidiError::Truncated { .. })),
            "unexpected result {:?}",
            result
        );
    }

    #[test]
    fn test_truncated_chunk() {
        let mut bytes = smf(0, 96, &[TrackBuilder::new().note_on(0, 0, 60, 64).end(0)]);
        bytes.truncate(bytes.len() - 2);
        assert!(matches!(
            MidiFile::parse(&bytes),
            Err(MidiError::Truncated { .. })
        ));
    }

    #[test]
    fn test_vlq_overflow_reports_offset() {
        let body = vec![0x81, 0x81, 0x81, 0x81, 0x00, 0x90, 60, 64];
        // Track data starts after the 14 byte header and the 8 byte chunk header.
        assert_eq!(
            MidiFile::parse(&smf(0, 96, &[body])),
            Err(MidiError::VlqOverflow { offset: 22 })
        );
    }

    #[test]
    fn test_data_byte_without_status() {
        let body = TrackBuilder::new().event(0, &[60, 64]).end(0);
        assert_eq!(
            MidiFile::parse(&smf(0, 96, &[body])),
            Err(MidiError::MissingRunningStatus {
                track: 0,
                offset: 23
            })
        );
    }

    #[test]
    fn test_track_summaries() {
        let bytes = smf(
            1,
            480,
            &[
                TrackBuilder::new().name(0, "Conductor").tempo(0, 500_000).end(0),
                TrackBuilder::new()
                    .name(0, "Bass")
                    .note_on(0, 1, 40, 64)
                    .note_on(0, 2, 43, 64)
                    .note_off(480, 1, 40)
                    .note_off(0, 2, 43)
                    .end(0),
            ],
        );
        let mut file = MidiFile::parse(&bytes).unwrap();
        file.resolve_tempo().unwrap();
        let summaries = file.summaries();

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].name.as_deref(), Some("Conductor"));
        assert_eq!(summaries[0].notes, 0);
        assert_eq!(summaries[1].name.as_deref(), Some("Bass"));
        assert_eq!(summaries[1].events, 4);
        assert_eq!(summaries[1].notes, 2);
        assert_eq!(summaries[1].channels.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(summaries[1].duration_micros, 500_000);
    }

    #[test]
    fn test_open_missing_file() {
        let result = MidiFile::open("/nonexistent/song.mid");
        assert!(matches!(result, Err(floppymusic::Error::Io(_))));
    }
}
