use std::sync::Arc;

use crate::cache::frames::{
    AudioFrame, BodyFrameDescriptor, DecodedBodyFrame, MultiTrackCache, TrackKind, WidgetDirective,
};
use crate::codec::character::decode_character;
use crate::codec::frame::{FacePoseFrame, decode_frame};
use crate::foundation::core::{Clock, Fps, FrameIndex};
use crate::foundation::error::{AnimaResult, ErrorCode, ErrorEvent};
use crate::playback::ingest::{RawFrame, ingest};
use crate::playback::session::{PlayState, PlaybackSession, ResumeParams, SpeechState};
use crate::rig::model::CharacterRig;
use crate::rig::pose::{Pose, evaluate_pose, interpolate};

/// Scheduler construction parameters.
#[derive(Clone, Copy, Debug)]
pub struct SchedulerConfig {
    /// Session frame rate; one [`FrameIndex`] unit per display frame.
    pub fps: Fps,
    /// Seconds to wait for body data before reporting
    /// [`ErrorCode::BodyDataExpired`] and continuing background-only.
    pub body_wait_budget_secs: f64,
}

impl SchedulerConfig {
    /// Config at the given frame rate with the default 2 s body wait budget.
    pub fn with_fps(fps: Fps) -> Self {
        Self {
            fps,
            body_wait_budget_secs: 2.0,
        }
    }
}

/// How the face state for the tick was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaceSource {
    /// Exact keyframe for the target index.
    Exact,
    /// Blend between the last keyframe and the next available one.
    Interpolated,
    /// No data for the target; previous pose held.
    Held,
}

/// Resolved face state for one tick.
#[derive(Clone, Debug)]
pub struct ResolvedFace {
    /// Decoded (or blended) frame state.
    pub frame: FacePoseFrame,
    /// World-space joint transforms for the renderer.
    pub pose: Pose,
    /// Provenance of the state.
    pub source: FaceSource,
}

/// Per-tick render payload handed to the external collaborators.
///
/// The scheduler itself performs no draw calls or audio IO; the host
/// forwards these fields to the GL pipeline, audio player and widget
/// renderers.
#[derive(Debug, Default)]
pub struct TickOutput {
    /// Target frame this tick resolved.
    pub frame: FrameIndex,
    /// Face state, when one could be resolved.
    pub face: Option<ResolvedFace>,
    /// Rasterized body frame for the target index.
    pub body_image: Option<DecodedBodyFrame>,
    /// Clip descriptors handed to the video decode subsystem this tick.
    pub new_clips: Vec<BodyFrameDescriptor>,
    /// Audio segment starting at the target index.
    pub audio: Option<AudioFrame>,
    /// Widget directives active at the target index.
    pub widgets: Vec<WidgetDirective>,
    /// Play state after the tick.
    pub play_state: PlayState,
    /// Speech state after the tick.
    pub speech_state: SpeechState,
}

type ErrorHandler = Box<dyn FnMut(ErrorEvent)>;

/// The playback control loop.
///
/// Driven once per display refresh by the host's render-loop callback.
/// Single-threaded and non-blocking: producers push into the cache from
/// outside, the tick pulls by frame index, and every internal failure is
/// reported through the registered error handler instead of unwinding.
pub struct Scheduler {
    config: SchedulerConfig,
    clock: Arc<dyn Clock>,
    cache: MultiTrackCache,
    rig: Option<Arc<CharacterRig>>,
    session: PlaybackSession,
    /// Hold-last-frame state. Fallback order on a miss: exact match →
    /// interpolation between neighbors → last known → none.
    last_pose: Option<ResolvedFace>,
    /// Last exact keyframe, kept as the left endpoint for interpolation.
    last_key: Option<(FrameIndex, FacePoseFrame)>,
    error_handler: Option<ErrorHandler>,
}

impl Scheduler {
    /// Create a scheduler over an injected clock.
    pub fn new(config: SchedulerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            cache: MultiTrackCache::new(),
            rig: None,
            session: PlaybackSession::new(),
            last_pose: None,
            last_key: None,
            error_handler: None,
        }
    }

    /// Register the single error-event handler. Replaces any previous one.
    pub fn set_error_handler(&mut self, handler: impl FnMut(ErrorEvent) + 'static) {
        self.error_handler = Some(Box::new(handler));
    }

    /// Decode and install the character rig for this session.
    ///
    /// A rig that fails to decode is an unrecoverable session-level
    /// failure, so this is the one place a decode error surfaces as `Err`
    /// to the host instead of an error event.
    pub fn load_character(&mut self, buf: &[u8]) -> AnimaResult<Arc<CharacterRig>> {
        let rig = Arc::new(decode_character(buf)?);
        self.rig = Some(Arc::clone(&rig));
        Ok(rig)
    }

    /// The installed rig, if one was loaded.
    pub fn rig(&self) -> Option<&Arc<CharacterRig>> {
        self.rig.as_ref()
    }

    /// Direct cache access for the session layer (pruning, inspection).
    pub fn cache_mut(&mut self) -> &mut MultiTrackCache {
        &mut self.cache
    }

    /// Current play state.
    pub fn play_state(&self) -> PlayState {
        self.session.play_state
    }

    /// Current speech state.
    pub fn speech_state(&self) -> SpeechState {
        self.session.speech_state
    }

    /// Reconnect snapshot for the session layer.
    pub fn resume_params(&self) -> ResumeParams {
        self.session.resume_params()
    }

    // ---- lifecycle -------------------------------------------------------

    /// Enter `Playing`. Starting fresh pins the clock origin; resuming from
    /// `Paused` shifts it by the pause duration; resuming from `Invisible`
    /// drops cached face state so no frame computed while hidden is shown.
    pub fn play(&mut self) {
        if self.session.is_destroyed() {
            return;
        }
        match self.session.play_state {
            PlayState::Init | PlayState::Stopped => {
                self.session.started_at_secs = Some(self.clock.now_secs());
                self.session.play_state = PlayState::Playing;
            }
            PlayState::Paused => {
                if let (Some(started), Some(paused)) =
                    (self.session.started_at_secs, self.session.paused_at_secs)
                {
                    self.session.started_at_secs =
                        Some(started + (self.clock.now_secs() - paused));
                }
                self.session.paused_at_secs = None;
                self.session.play_state = PlayState::Playing;
            }
            PlayState::Invisible => {
                self.last_pose = None;
                self.last_key = None;
                self.cache.face.clear();
                self.session.play_state = PlayState::Playing;
            }
            PlayState::Playing | PlayState::Destroyed => {}
        }
        tracing::debug!(state = ?self.session.play_state, "play");
    }

    /// Enter `Paused` from `Playing` or `Invisible`.
    pub fn pause(&mut self) {
        if matches!(
            self.session.play_state,
            PlayState::Playing | PlayState::Invisible
        ) {
            self.session.paused_at_secs = Some(self.clock.now_secs());
            self.session.play_state = PlayState::Paused;
        }
    }

    /// Toggle invisible mode. While invisible, face and body tracks stop
    /// advancing but audio and events continue.
    pub fn set_visible(&mut self, visible: bool) {
        match (visible, self.session.play_state) {
            (false, PlayState::Playing) => self.session.play_state = PlayState::Invisible,
            (true, PlayState::Invisible) => self.play(),
            _ => {}
        }
    }

    /// Stop playback and release all track data. The session may `play()`
    /// again from scratch.
    pub fn stop(&mut self) {
        if self.session.is_destroyed() {
            return;
        }
        self.cache.clear_all();
        self.session = PlaybackSession::new();
        self.session.play_state = PlayState::Stopped;
        self.last_pose = None;
        self.last_key = None;
    }

    /// Tear the session down. Idempotent and safe from any state; all
    /// track memory is released immediately and every later operation on
    /// this scheduler is a no-op.
    pub fn destroy(&mut self) {
        self.cache.clear_all();
        self.last_pose = None;
        self.last_key = None;
        self.rig = None;
        self.session = PlaybackSession::new();
        self.session.play_state = PlayState::Destroyed;
    }

    // ---- inbound ---------------------------------------------------------

    /// Accept a wire batch from the session layer.
    pub fn handle_data(&mut self, frames: Vec<RawFrame>, track: TrackKind) {
        if self.session.is_destroyed() {
            return;
        }
        if let Err(err) = ingest(&mut self.cache, frames, track) {
            self.report(ErrorEvent::with_source(
                ErrorCode::InvalidDataStructure,
                format!("rejected batch for {track:?} track"),
                err,
            ));
        }
    }

    /// Accept one rasterized body frame from the decode worker.
    ///
    /// Frames from clips no longer current or queued are late deliveries
    /// after an abort and are dropped without effect.
    pub fn on_video_frame_decoded(&mut self, frame: DecodedBodyFrame) {
        if self.session.is_destroyed() {
            return;
        }
        let live = |d: &BodyFrameDescriptor| d.body_id == frame.video_id;
        let accepted = self.session.current_body.as_ref().is_some_and(live)
            || self.session.next_body.as_ref().is_some_and(live);
        if !accepted {
            tracing::debug!(
                video_id = frame.video_id,
                frame = frame.frame_index.0,
                "dropping stale decoded frame"
            );
            return;
        }
        self.cache.decoded_body.put(frame.frame_index, frame);
    }

    /// Switch to a new speech segment, purging all cache entries tagged
    /// with the superseded id even if they were never consumed.
    pub fn interrupt_speech(&mut self, new_speech_id: u64) {
        if self.session.is_destroyed() {
            return;
        }
        if let Some(old) = self.session.active_speech
            && old != new_speech_id
        {
            self.cache.purge_speech(old);
            self.session.speech_state = SpeechState::Interrupted;
        }
        self.session.active_speech = Some(new_speech_id);
    }

    // ---- tick ------------------------------------------------------------

    /// Run one tick of the control loop and return the render payload.
    ///
    /// Never blocks and never panics on expected failures (stale data,
    /// cache miss, malformed single frame): those degrade per-track and go
    /// through the error handler.
    #[tracing::instrument(skip(self))]
    pub fn tick(&mut self) -> TickOutput {
        let mut out = TickOutput {
            play_state: self.session.play_state,
            speech_state: self.session.speech_state,
            ..TickOutput::default()
        };
        if !matches!(
            self.session.play_state,
            PlayState::Playing | PlayState::Invisible
        ) {
            out.frame = self.session.last_resolved.unwrap_or(FrameIndex(0));
            return out;
        }

        let target = self.target_frame();
        out.frame = target;

        let visible = self.session.play_state == PlayState::Playing;
        if visible {
            self.advance_body(target, &mut out);
            self.resolve_face(target, &mut out);
        }
        self.resolve_audio(target, &mut out);
        out.widgets = self
            .cache
            .event
            .get_interval(target)
            .map(|e| e.directives.clone())
            .unwrap_or_default();

        self.session.last_resolved = Some(target);
        out.play_state = self.session.play_state;
        out.speech_state = self.session.speech_state;
        out
    }

    /// Target frame from elapsed session time, clamped at zero.
    fn target_frame(&self) -> FrameIndex {
        let started = self.session.started_at_secs.unwrap_or(0.0);
        let elapsed = (self.clock.now_secs() - started).max(0.0);
        FrameIndex(self.config.fps.secs_to_frames_floor(elapsed))
    }

    fn advance_body(&mut self, target: FrameIndex, out: &mut TickOutput) {
        // Swap a drained current clip for the preloaded next one.
        if self
            .session
            .current_body
            .as_ref()
            .is_some_and(|b| target.0 >= b.range.end.0)
        {
            self.session.current_body = self.session.next_body.take();
        }

        // Keep at most one clip current and one preloading; any further
        // descriptors wait in the queue.
        while self.session.current_body.is_none() || self.session.next_body.is_none() {
            let Some(start) = self.cache.body.first_index() else {
                break;
            };
            let Some(descriptor) = self.cache.body.get(start) else {
                break;
            };
            if descriptor.range.end.0 <= target.0 {
                tracing::warn!(
                    clip = %descriptor.clip_name,
                    end = descriptor.range.end.0,
                    target = target.0,
                    "dropping stale body clip"
                );
                continue;
            }
            out.new_clips.push(descriptor.clone());
            if self.session.current_body.is_none() {
                self.session.current_body = Some(descriptor);
            } else {
                self.session.next_body = Some(descriptor);
            }
        }

        let covered = self
            .session
            .current_body
            .as_ref()
            .is_some_and(|b| b.range.contains(target) || b.range.start.0 > target.0);
        if covered {
            self.session.body_wait_since = None;
            self.session.body_expired_reported = false;
            out.body_image = self.cache.decoded_body.get(target);
            return;
        }

        // No clip covers the target; start (or continue) the wait budget.
        let since = *self.session.body_wait_since.get_or_insert(target);
        let budget_frames = self
            .config
            .fps
            .secs_to_frames_floor(self.config.body_wait_budget_secs);
        if target.0.saturating_sub(since.0) >= budget_frames && !self.session.body_expired_reported
        {
            self.session.body_expired_reported = true;
            self.report(ErrorEvent::new(
                ErrorCode::BodyDataExpired,
                format!("no body clip arrived for frame {} within budget", target.0),
            ));
        }
    }

    fn resolve_face(&mut self, target: FrameIndex, out: &mut TickOutput) {
        let Some(rig) = self.rig.clone() else {
            return;
        };

        if let Some(data) = self.cache.face.get(target) {
            match decode_frame(&data.payload, &rig) {
                Ok(frame) => {
                    let resolved = ResolvedFace {
                        pose: evaluate_pose(&rig, &frame),
                        frame: frame.clone(),
                        source: FaceSource::Exact,
                    };
                    self.last_key = Some((target, frame));
                    self.last_pose = Some(resolved.clone());
                    out.face = Some(resolved);
                    return;
                }
                Err(err) => {
                    self.report(ErrorEvent::with_source(
                        ErrorCode::FaceDecode,
                        format!("dropping face frame {}", target.0),
                        err,
                    ));
                }
            }
        }

        // Miss: blend toward the next keyframe when both endpoints exist.
        if let Some(face) = self.interpolated_face(target, &rig) {
            self.last_pose = Some(face.clone());
            out.face = Some(face);
            return;
        }

        // Otherwise hold the last good pose rather than flicker.
        out.face = self.last_pose.clone().map(|mut held| {
            held.source = FaceSource::Held;
            held
        });
    }

    fn interpolated_face(&mut self, target: FrameIndex, rig: &CharacterRig) -> Option<ResolvedFace> {
        let (key_index, key_frame) = self.last_key.clone()?;
        if key_index.0 >= target.0 {
            return None;
        }
        let next_index = self.cache.face.next_index_after(target)?;
        let next_payload = self.cache.face.peek(next_index)?.payload.clone();
        let next_frame = match decode_frame(&next_payload, rig) {
            Ok(frame) => frame,
            Err(err) => {
                self.report(ErrorEvent::with_source(
                    ErrorCode::FaceDecode,
                    format!("dropping undecodable future face frame {}", next_index.0),
                    err,
                ));
                return None;
            }
        };

        let span = (next_index.0 - key_index.0) as f32;
        let t = (target.0 - key_index.0) as f32 / span;
        let movable: Vec<_> = rig.skeleton.movable_joints().collect();
        match interpolate(&key_frame, &next_frame, &key_frame, t, &movable, rig) {
            Ok(frame) => Some(ResolvedFace {
                pose: evaluate_pose(rig, &frame),
                frame,
                source: FaceSource::Interpolated,
            }),
            Err(err) => {
                self.report(ErrorEvent::with_source(
                    ErrorCode::Evaluation,
                    format!("interpolation failed at frame {}", target.0),
                    err,
                ));
                None
            }
        }
    }

    fn resolve_audio(&mut self, target: FrameIndex, out: &mut TickOutput) {
        // Tick targets skip frames, so a segment start is rarely hit
        // exactly; resolve the newest segment starting at or before the
        // target.
        let Some(start) = self.cache.audio.latest_at_or_before(target) else {
            return;
        };
        let Some(audio) = self.cache.audio.get(start) else {
            return;
        };
        if audio.range.end.0 <= target.0 {
            self.report(ErrorEvent::new(
                ErrorCode::AudioDataExpired,
                format!(
                    "audio segment [{}, {}) is behind frame {}",
                    audio.range.start.0, audio.range.end.0, target.0
                ),
            ));
            return;
        }
        self.session.active_speech = Some(audio.speech_id);
        self.session.speech_state = SpeechState::Speaking;
        out.audio = Some(audio);
    }

    fn report(&mut self, event: ErrorEvent) {
        tracing::warn!(code = ?event.code, message = %event.message, "playback error");
        if let Some(handler) = self.error_handler.as_mut() {
            handler(event);
        }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("config", &self.config)
            .field("play_state", &self.session.play_state)
            .field("speech_state", &self.session.speech_state)
            .field("last_resolved", &self.session.last_resolved)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/scheduler.rs"]
mod tests;
