//! Integration test: build SMF bytes in memory → validate layout → walk tracks.

use opfm_formats::{parse_smf, SmfError, TrackEvent, TrackReader};

fn smf(format: u16, division: u16, tracks: &[&[u8]]) -> Vec<u8> {
    let mut v = b"MThd".to_vec();
    v.extend_from_slice(&6u32.to_be_bytes());
    v.extend_from_slice(&format.to_be_bytes());
    v.extend_from_slice(&(tracks.len() as u16).to_be_bytes());
    v.extend_from_slice(&division.to_be_bytes());
    for body in tracks {
        v.extend_from_slice(b"MTrk");
        v.extend_from_slice(&(body.len() as u32).to_be_bytes());
        v.extend_from_slice(body);
    }
    v
}

/// Collect (delta, event) pairs until the track ends.
fn walk(data: &[u8], range: std::ops::Range<usize>) -> Vec<(u32, TrackEvent)> {
    let mut reader = TrackReader::new(data, range.start, range.end);
    let mut events = Vec::new();
    while let Some(delta) = reader.read_vlq() {
        let Some(event) = reader.read_event() else {
            break;
        };
        if let TrackEvent::Midi(_) = event {
            // Two data bytes for every channel message used here.
            reader.skip(2);
        }
        events.push((delta, event));
        if event == TrackEvent::EndOfTrack {
            break;
        }
    }
    events
}

#[test]
fn resolution_480_header() {
    let data = smf(0, 480, &[&[0x00, 0xFF, 0x2F, 0x00]]);
    assert_eq!(&data[12..14], &[0x01, 0xE0]);
    let layout = parse_smf(&data).unwrap();
    assert_eq!(layout.track_count(), 1);
    assert_eq!(layout.resolution, 480);
}

#[test]
fn rejects_malformed_headers() {
    assert_eq!(parse_smf(b"MThd\0\0\0\x06\0"), Err(SmfError::TooShort));

    let mut bad = smf(0, 480, &[]);
    bad[1] = b't';
    assert_eq!(parse_smf(&bad), Err(SmfError::BadHeaderMagic));

    assert_eq!(
        parse_smf(&smf(3, 480, &[])),
        Err(SmfError::UnsupportedFormat(3))
    );
}

#[test]
fn walk_format_one_file() {
    let tempo: &[u8] = &[
        0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20, // 120 bpm
        0x00, 0xFF, 0x2F, 0x00,
    ];
    let notes: &[u8] = &[
        0x00, 0x90, 60, 100, //
        0x83, 0x60, 0x80, 60, 0, // 480 ticks later
        0x00, 0xF0, 0x02, 0x7E, 0xF7, //
        0x00, 0xFF, 0x2F, 0x00,
    ];
    let data = smf(1, 480, &[tempo, notes]);
    let layout = parse_smf(&data).unwrap();
    assert_eq!(layout.format, 1);

    assert_eq!(
        walk(&data, layout.tracks[0].clone()),
        vec![(0, TrackEvent::Tempo(500_000)), (0, TrackEvent::EndOfTrack)]
    );
    assert_eq!(
        walk(&data, layout.tracks[1].clone()),
        vec![
            (0, TrackEvent::Midi(0x90)),
            (480, TrackEvent::Midi(0x80)),
            (0, TrackEvent::SysEx),
            (0, TrackEvent::EndOfTrack),
        ]
    );
}

#[test]
fn truncated_body_ends_quietly() {
    // Delta-time cut off mid-VLQ.
    let data = smf(0, 96, &[&[0x00, 0x90, 60, 100, 0x81]]);
    let layout = parse_smf(&data).unwrap();
    let events = walk(&data, layout.tracks[0].clone());
    assert_eq!(events, vec![(0, TrackEvent::Midi(0x90))]);
}

#[test]
fn trailing_bytes_after_tracks_are_ignored() {
    let mut data = smf(0, 96, &[&[0x00, 0xFF, 0x2F, 0x00]]);
    data.extend_from_slice(b"junk");
    let layout = parse_smf(&data).unwrap();
    assert_eq!(layout.tracks, vec![22..26]);
}
