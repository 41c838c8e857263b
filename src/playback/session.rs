use crate::cache::frames::BodyFrameDescriptor;
use crate::foundation::core::FrameIndex;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
/// Session lifecycle states.
///
/// `Init → Playing ⇄ Paused/Invisible → Stopped → Destroyed`. Invisible is
/// the backgrounded mode: face/body tracks stop advancing while audio and
/// events continue.
pub enum PlayState {
    /// Created, not yet started.
    #[default]
    Init,
    /// Clock running, all tracks advancing.
    Playing,
    /// Clock held, nothing advancing.
    Paused,
    /// Rendering suppressed; audio/event tracks still advancing.
    Invisible,
    /// Playback ended; restartable state released.
    Stopped,
    /// Session torn down; every operation is a no-op.
    Destroyed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
/// Speech (TTSA) progress within the session.
pub enum SpeechState {
    /// No speech active.
    #[default]
    Idle,
    /// A speech segment is playing.
    Speaking,
    /// The active speech was interrupted and its data purged.
    Interrupted,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// Snapshot handed to the session layer for reconnect-and-resume.
pub struct ResumeParams {
    /// Frame the client has played up to.
    pub client_frame: u64,
    /// Name of the draining body clip, when one is active.
    pub current_animation: Option<String>,
    /// Progress within the current clip, in frames.
    pub current_animation_frame: u64,
    /// Play state the session should re-enter after reconnect.
    pub next_state: PlayState,
}

#[derive(Debug)]
/// Mutable per-session playback state, touched only by the tick loop.
pub struct PlaybackSession {
    /// Wall-clock seconds at which playback started, in the injected
    /// clock's timebase.
    pub started_at_secs: Option<f64>,
    /// Clock reading when the session was last paused; playback start is
    /// shifted by the pause duration on resume.
    pub paused_at_secs: Option<f64>,
    /// Clip currently draining.
    pub current_body: Option<BodyFrameDescriptor>,
    /// Clip preloading behind the current one. At most one; further
    /// descriptors for the same body wait in the cache.
    pub next_body: Option<BodyFrameDescriptor>,
    /// Current lifecycle state.
    pub play_state: PlayState,
    /// Current speech state.
    pub speech_state: SpeechState,
    /// Active speech id, if any.
    pub active_speech: Option<u64>,
    /// Last frame index the tick loop resolved.
    pub last_resolved: Option<FrameIndex>,
    /// Frame at which the ongoing body-data outage started, if one is
    /// being tracked.
    pub body_wait_since: Option<FrameIndex>,
    /// The current outage has already been reported.
    pub body_expired_reported: bool,
}

impl PlaybackSession {
    /// Fresh session in `Init`.
    pub fn new() -> Self {
        Self {
            started_at_secs: None,
            paused_at_secs: None,
            current_body: None,
            next_body: None,
            play_state: PlayState::Init,
            speech_state: SpeechState::Idle,
            active_speech: None,
            last_resolved: None,
            body_wait_since: None,
            body_expired_reported: false,
        }
    }

    /// True once `destroy()` has run.
    pub fn is_destroyed(&self) -> bool {
        self.play_state == PlayState::Destroyed
    }

    /// Build the reconnect snapshot for the session layer.
    pub fn resume_params(&self) -> ResumeParams {
        let client_frame = self.last_resolved.map_or(0, |f| f.0);
        let (current_animation, current_animation_frame) = match &self.current_body {
            Some(body) => (
                Some(body.clip_name.clone()),
                client_frame.saturating_sub(body.range.start.0),
            ),
            None => (None, 0),
        };
        ResumeParams {
            client_frame,
            current_animation,
            current_animation_frame,
            next_state: self.play_state,
        }
    }
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::new()
    }
}
