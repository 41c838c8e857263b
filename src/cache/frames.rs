use std::collections::BTreeMap;

use bytes::Bytes;

use crate::foundation::core::{FrameIndex, FrameRange};

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
/// The four data streams synchronized by the shared frame clock.
pub enum TrackKind {
    /// Pre-rendered body video clip descriptors.
    Body,
    /// Face pose codec payloads.
    Face,
    /// Speech audio segments.
    Audio,
    /// UI widget directive batches.
    Event,
}

#[derive(Clone, Debug)]
/// Reference to one contiguous body video clip awaiting decode.
pub struct BodyFrameDescriptor {
    /// Clip name from the session layer.
    pub clip_name: String,
    /// Frames the clip covers.
    pub range: FrameRange,
    /// Container bytes handed to the external decoder.
    pub payload: Bytes,
    /// Clip was authored at the high frame density.
    pub high_frame_density: bool,
    /// Owning body/session id.
    pub body_id: u64,
}

#[derive(Clone, Debug)]
/// Raw face codec payload for one frame, decoded lazily by the scheduler.
pub struct FaceFrameData {
    /// Binary frame payload for `decode_frame`.
    pub payload: Bytes,
}

#[derive(Clone, Debug)]
/// Speech audio segment.
pub struct AudioFrame {
    /// Frames the segment covers.
    pub range: FrameRange,
    /// Owning speech segment; superseded ids are purged wholesale.
    pub speech_id: u64,
    /// Raw or compressed PCM payload.
    pub pcm: Bytes,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// One UI widget directive (subtitle, image, ...), opaque to the core.
pub struct WidgetDirective {
    /// Widget kind identifier.
    pub kind: String,
    /// Renderer-specific parameters.
    pub params: serde_json::Value,
}

#[derive(Clone, Debug)]
/// Batch of widget directives active across a frame range.
pub struct EventFrame {
    /// Frames during which the widgets stay visible.
    pub range: FrameRange,
    /// Owning speech segment.
    pub speech_id: u64,
    /// Directives to forward to the widget renderer.
    pub directives: Vec<WidgetDirective>,
}

#[derive(Clone, Debug)]
/// One rasterized body frame delivered by the external decode worker.
pub struct DecodedBodyFrame {
    /// Display frame this image belongs to.
    pub frame_index: FrameIndex,
    /// Clip the image was decoded from; used to drop late deliveries.
    pub video_id: u64,
    /// Opaque image handle/payload for the render collaborator.
    pub image: Bytes,
}

/// Point-lookup queue for one track, keyed by [`FrameIndex`].
///
/// Insertion order is irrelevant and duplicate keys replace (re-delivery
/// after reconnect is expected). Consumption is monotonic: once index `k`
/// has been handed out, every index ≤ `k` reads as "not found" no matter
/// when it was inserted. A miss is not an error, it means "not arrived yet".
#[derive(Debug)]
pub struct FrameQueue<T> {
    entries: BTreeMap<u64, T>,
    watermark: Option<u64>,
}

impl<T> Default for FrameQueue<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            watermark: None,
        }
    }
}

impl<T> FrameQueue<T> {
    /// Insert or replace one entry. Never blocks, no side effects beyond
    /// storage.
    pub fn put(&mut self, index: FrameIndex, value: T) {
        self.entries.insert(index.0, value);
    }

    /// Remove and return the entry at `index` (at-most-once delivery).
    ///
    /// On a hit the consumption watermark advances to `index` and stale
    /// entries below it are evicted.
    pub fn get(&mut self, index: FrameIndex) -> Option<T> {
        if self.watermark.is_some_and(|w| index.0 <= w) {
            return None;
        }
        let value = self.entries.remove(&index.0)?;
        self.watermark = Some(index.0);
        self.entries = self.entries.split_off(&index.0);
        Some(value)
    }

    /// Peek without consuming; watermark rules still apply.
    pub fn peek(&self, index: FrameIndex) -> Option<&T> {
        if self.watermark.is_some_and(|w| index.0 <= w) {
            return None;
        }
        self.entries.get(&index.0)
    }

    /// Smallest retrievable index, if any.
    pub fn first_index(&self) -> Option<FrameIndex> {
        self.entries.keys().next().map(|&k| FrameIndex(k))
    }

    /// Smallest stored index strictly greater than `index`.
    pub fn next_index_after(&self, index: FrameIndex) -> Option<FrameIndex> {
        self.entries
            .range(index.0.saturating_add(1)..)
            .next()
            .map(|(&k, _)| FrameIndex(k))
    }

    /// Largest retrievable index at or below `index`, if any.
    pub fn latest_at_or_before(&self, index: FrameIndex) -> Option<FrameIndex> {
        let (&key, _) = self.entries.range(..=index.0).next_back()?;
        if self.watermark.is_some_and(|w| key <= w) {
            return None;
        }
        Some(FrameIndex(key))
    }

    /// Purge entries below `min_index` after a seek or reordering was
    /// detected. Entries at or above `min_index` stay retrievable.
    pub fn invalidate(&mut self, min_index: FrameIndex) {
        self.entries = self.entries.split_off(&min_index.0);
        // A seek moves the authoritative window; a watermark from the old
        // window must not shadow the new one.
        self.watermark = self.watermark.filter(|&w| w < min_index.0);
    }

    /// Invalidation for tracks whose entries span frame ranges: drops
    /// entries the predicate rejects and reopens the consumption window at
    /// `min_index`, same as [`FrameQueue::invalidate`].
    pub fn invalidate_ranges(
        &mut self,
        min_index: FrameIndex,
        mut keep: impl FnMut(&T) -> bool,
    ) {
        self.entries.retain(|_, v| keep(v));
        self.watermark = self.watermark.filter(|&w| w < min_index.0);
    }

    /// Release everything at or below `processed`, consumed or not.
    pub fn clear_old_frames(&mut self, processed: FrameIndex) {
        self.entries = self.entries.split_off(&(processed.0.saturating_add(1)));
    }

    /// Drop entries failing the predicate (speech-id purges and the like).
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        self.entries.retain(|_, v| keep(v));
    }

    /// Remove every entry and forget the watermark.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.watermark = None;
    }

    /// Highest consumed index, if anything was consumed.
    pub fn watermark(&self) -> Option<FrameIndex> {
        self.watermark.map(FrameIndex)
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Range-lookup queue for the Event track.
///
/// Entries are queried by containment and stay resident across their whole
/// range: widgets persist and are re-queried every tick.
#[derive(Debug)]
pub struct IntervalQueue<T> {
    entries: BTreeMap<u64, (FrameRange, T)>,
}

impl<T> Default for IntervalQueue<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T> IntervalQueue<T> {
    /// Insert or replace the entry starting at `range.start`.
    pub fn put(&mut self, range: FrameRange, value: T) {
        self.entries.insert(range.start.0, (range, value));
    }

    /// Entry whose interval contains `at`, without removal.
    pub fn get_interval(&self, at: FrameIndex) -> Option<&T> {
        self.entries
            .range(..=at.0)
            .next_back()
            .filter(|(_, (range, _))| range.contains(at))
            .map(|(_, (_, value))| value)
    }

    /// Purge entries that end before `min_index`.
    pub fn invalidate(&mut self, min_index: FrameIndex) {
        self.entries.retain(|_, (range, _)| range.end.0 > min_index.0);
    }

    /// Release entries fully behind `processed`.
    pub fn clear_old_frames(&mut self, processed: FrameIndex) {
        self.entries.retain(|_, (range, _)| range.end.0 > processed.0);
    }

    /// Drop entries failing the predicate.
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        self.entries.retain(|_, (_, v)| keep(v));
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All four per-track queues plus the decoded-body-frame store.
///
/// This is the sole synchronization point between producers (network
/// delivery, the video-decode worker) and the tick loop: producers push
/// completed data in, the scheduler pulls by frame index. Tracks are fully
/// independent; invalidating one never touches the others.
#[derive(Debug, Default)]
pub struct MultiTrackCache {
    /// Body clip descriptors keyed by clip start frame.
    pub body: FrameQueue<BodyFrameDescriptor>,
    /// Face codec payloads keyed by frame.
    pub face: FrameQueue<FaceFrameData>,
    /// Audio segments keyed by segment start frame.
    pub audio: FrameQueue<AudioFrame>,
    /// Widget batches queried by interval.
    pub event: IntervalQueue<EventFrame>,
    /// Rasterized body frames keyed by frame.
    pub decoded_body: FrameQueue<DecodedBodyFrame>,
}

impl MultiTrackCache {
    /// Fresh, empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Purge one track's entries below `min_index`. Explicit and separately
    /// callable so ingestion and tests can drive it independently of `put`.
    pub fn invalidate(&mut self, track: TrackKind, min_index: FrameIndex) {
        tracing::debug!(?track, min = min_index.0, "invalidating track below index");
        match track {
            TrackKind::Body => {
                // A body descriptor is stale only once its whole range is
                // behind the window.
                self.body
                    .invalidate_ranges(min_index, |d| d.range.end.0 > min_index.0);
                self.decoded_body.invalidate(min_index);
            }
            TrackKind::Face => self.face.invalidate(min_index),
            TrackKind::Audio => self
                .audio
                .invalidate_ranges(min_index, |a| a.range.end.0 > min_index.0),
            TrackKind::Event => self.event.invalidate(min_index),
        }
    }

    /// Release everything processed up to `frame` across all tracks,
    /// consumed or not. Body payload bytes dominate memory; the session
    /// layer calls this to bound it without waiting for natural draining.
    pub fn clear_old_frames(&mut self, frame: FrameIndex) {
        self.body.retain(|d| d.range.end.0 > frame.0);
        self.face.clear_old_frames(frame);
        self.audio.retain(|a| a.range.end.0 > frame.0);
        self.event.clear_old_frames(frame);
        self.decoded_body.clear_old_frames(frame);
    }

    /// Purge audio and event entries tagged with a superseded speech id,
    /// consumed or not, so two overlapping speeches can never mix.
    pub fn purge_speech(&mut self, superseded: u64) {
        tracing::debug!(speech_id = superseded, "purging superseded speech");
        self.audio.retain(|a| a.speech_id != superseded);
        self.event.retain(|e| e.speech_id != superseded);
    }

    /// Drop every entry on every track.
    pub fn clear_all(&mut self) {
        self.body.clear();
        self.face.clear();
        self.audio.clear();
        self.event.clear();
        self.decoded_body.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/frames.rs"]
mod tests;
