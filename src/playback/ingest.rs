use bytes::Bytes;

use crate::cache::frames::{
    AudioFrame, BodyFrameDescriptor, EventFrame, FaceFrameData, MultiTrackCache, TrackKind,
    WidgetDirective,
};
use crate::foundation::core::{FrameIndex, FrameRange};
use crate::foundation::error::{AnimaError, AnimaResult};

/// One wire frame as delivered by the session layer.
///
/// The wire format mixes several frame shapes under one message type; they
/// are resolved into this tagged union once, here at the ingestion
/// boundary, so the rest of the core operates on strongly typed per-track
/// records.
#[derive(Clone, Debug)]
pub enum RawFrame {
    /// Body clip descriptor.
    Body {
        /// Clip name.
        clip_name: String,
        /// First frame of the clip.
        start: u64,
        /// One past the last frame.
        end: u64,
        /// Container bytes.
        payload: Bytes,
        /// High-frame-density flag.
        high_frame_density: bool,
        /// Owning body id.
        body_id: u64,
    },
    /// Face codec payload for one frame.
    Face {
        /// Target frame.
        frame_index: u64,
        /// Binary pose payload.
        payload: Bytes,
    },
    /// Speech audio segment.
    Audio {
        /// First frame of the segment.
        start: u64,
        /// One past the last frame.
        end: u64,
        /// Owning speech id.
        speech_id: u64,
        /// PCM payload.
        pcm: Bytes,
    },
    /// Widget directive batch.
    Event {
        /// First frame of the window.
        start: u64,
        /// One past the last frame.
        end: u64,
        /// Owning speech id.
        speech_id: u64,
        /// Directives for the widget renderer.
        directives: Vec<WidgetDirective>,
    },
}

impl RawFrame {
    fn track(&self) -> TrackKind {
        match self {
            RawFrame::Body { .. } => TrackKind::Body,
            RawFrame::Face { .. } => TrackKind::Face,
            RawFrame::Audio { .. } => TrackKind::Audio,
            RawFrame::Event { .. } => TrackKind::Event,
        }
    }

    fn check_range(&self) -> AnimaResult<()> {
        match self {
            RawFrame::Body { start, end, .. }
            | RawFrame::Audio { start, end, .. }
            | RawFrame::Event { start, end, .. } => {
                FrameRange::new(FrameIndex(*start), FrameIndex(*end)).map(|_| ())
            }
            RawFrame::Face { .. } => Ok(()),
        }
    }

    fn start_index(&self) -> u64 {
        match self {
            RawFrame::Body { start, .. }
            | RawFrame::Audio { start, .. }
            | RawFrame::Event { start, .. } => *start,
            RawFrame::Face { frame_index, .. } => *frame_index,
        }
    }
}

/// Normalize a wire batch and store it on `track`.
///
/// When the batch's minimum index precedes the track's consumption
/// watermark, a seek or reordering happened upstream: the track is
/// invalidated down to that minimum first so stale entries cannot shadow
/// the new authoritative window. Frames tagged for a different track, or
/// carrying an inverted range, are a structural error; nothing from such a
/// batch is stored.
pub fn ingest(
    cache: &mut MultiTrackCache,
    frames: Vec<RawFrame>,
    track: TrackKind,
) -> AnimaResult<usize> {
    if frames.is_empty() {
        return Ok(0);
    }
    for frame in &frames {
        if frame.track() != track {
            return Err(AnimaError::validation(format!(
                "batch for {track:?} track contains a {:?} frame",
                frame.track()
            )));
        }
        frame.check_range()?;
    }

    let batch_min = frames.iter().map(RawFrame::start_index).min().unwrap_or(0);
    let watermark = match track {
        TrackKind::Body => cache.body.watermark(),
        TrackKind::Face => cache.face.watermark(),
        TrackKind::Audio => cache.audio.watermark(),
        TrackKind::Event => None,
    };
    if watermark.is_some_and(|w| batch_min < w.0) {
        tracing::warn!(
            ?track,
            batch_min,
            watermark = watermark.map(|w| w.0),
            "batch precedes watermark, invalidating track"
        );
        cache.invalidate(track, FrameIndex(batch_min));
    }

    let count = frames.len();
    for frame in frames {
        store(cache, frame)?;
    }
    Ok(count)
}

fn store(cache: &mut MultiTrackCache, frame: RawFrame) -> AnimaResult<()> {
    match frame {
        RawFrame::Body {
            clip_name,
            start,
            end,
            payload,
            high_frame_density,
            body_id,
        } => {
            let range = FrameRange::new(FrameIndex(start), FrameIndex(end))?;
            cache.body.put(
                range.start,
                BodyFrameDescriptor {
                    clip_name,
                    range,
                    payload,
                    high_frame_density,
                    body_id,
                },
            );
        }
        RawFrame::Face {
            frame_index,
            payload,
        } => {
            cache
                .face
                .put(FrameIndex(frame_index), FaceFrameData { payload });
        }
        RawFrame::Audio {
            start,
            end,
            speech_id,
            pcm,
        } => {
            let range = FrameRange::new(FrameIndex(start), FrameIndex(end))?;
            cache.audio.put(
                range.start,
                AudioFrame {
                    range,
                    speech_id,
                    pcm,
                },
            );
        }
        RawFrame::Event {
            start,
            end,
            speech_id,
            directives,
        } => {
            let range = FrameRange::new(FrameIndex(start), FrameIndex(end))?;
            cache.event.put(
                range,
                EventFrame {
                    range,
                    speech_id,
                    directives,
                },
            );
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/playback/ingest.rs"]
mod tests;
