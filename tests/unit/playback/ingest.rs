use super::*;

fn face_batch(indices: &[u64]) -> Vec<RawFrame> {
    indices
        .iter()
        .map(|&i| RawFrame::Face {
            frame_index: i,
            payload: Bytes::from_static(b"pose"),
        })
        .collect()
}

#[test]
fn batches_land_on_their_tracks() {
    let mut cache = MultiTrackCache::new();
    let stored = ingest(&mut cache, face_batch(&[10, 11, 12]), TrackKind::Face).unwrap();
    assert_eq!(stored, 3);
    assert_eq!(cache.face.len(), 3);
    assert!(cache.body.is_empty());

    let stored = ingest(
        &mut cache,
        vec![RawFrame::Event {
            start: 10,
            end: 40,
            speech_id: 1,
            directives: vec![],
        }],
        TrackKind::Event,
    )
    .unwrap();
    assert_eq!(stored, 1);
    assert!(cache.event.get_interval(FrameIndex(25)).is_some());
}

#[test]
fn mixed_track_batch_is_rejected_whole() {
    let mut cache = MultiTrackCache::new();
    let mut frames = face_batch(&[10]);
    frames.push(RawFrame::Audio {
        start: 10,
        end: 20,
        speech_id: 1,
        pcm: Bytes::new(),
    });
    assert!(ingest(&mut cache, frames, TrackKind::Face).is_err());
    assert!(cache.face.is_empty());
    assert!(cache.audio.is_empty());
}

#[test]
fn batch_behind_watermark_invalidates_first() {
    let mut cache = MultiTrackCache::new();
    ingest(&mut cache, face_batch(&[100, 110, 120]), TrackKind::Face).unwrap();
    assert!(cache.face.get(FrameIndex(110)).is_some());

    // Seek: a batch re-starting at 10 must reopen the window below the
    // old watermark; entries at or above the new minimum stay retrievable.
    ingest(&mut cache, face_batch(&[10, 20]), TrackKind::Face).unwrap();
    assert!(cache.face.get(FrameIndex(10)).is_some());
    assert!(cache.face.get(FrameIndex(20)).is_some());
    assert!(cache.face.peek(FrameIndex(120)).is_some());
}

#[test]
fn empty_batch_is_a_no_op() {
    let mut cache = MultiTrackCache::new();
    assert_eq!(ingest(&mut cache, vec![], TrackKind::Audio).unwrap(), 0);
}

#[test]
fn body_batch_builds_descriptors() {
    let mut cache = MultiTrackCache::new();
    ingest(
        &mut cache,
        vec![RawFrame::Body {
            clip_name: "wave".into(),
            start: 0,
            end: 60,
            payload: Bytes::from_static(b"mp4"),
            high_frame_density: true,
            body_id: 7,
        }],
        TrackKind::Body,
    )
    .unwrap();
    let descriptor = cache.body.get(FrameIndex(0)).unwrap();
    assert_eq!(descriptor.clip_name, "wave");
    assert_eq!(descriptor.range.len_frames(), 60);
    assert!(descriptor.high_frame_density);
    assert_eq!(descriptor.body_id, 7);
}

#[test]
fn inverted_range_is_rejected() {
    let mut cache = MultiTrackCache::new();
    let err = ingest(
        &mut cache,
        vec![RawFrame::Audio {
            start: 20,
            end: 10,
            speech_id: 1,
            pcm: Bytes::new(),
        }],
        TrackKind::Audio,
    );
    assert!(err.is_err());
    assert!(cache.audio.is_empty());
}
