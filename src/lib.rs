//! Anima drives a real-time "digital human" presentation: a talking avatar
//! whose body (pre-rendered video clips), face (procedurally skinned 3D
//! mesh), audio and on-screen widgets all stay synchronized to one
//! authoritative playback clock while frame data streams in over an
//! unreliable network and decodes asynchronously.
//!
//! # Engine overview
//!
//! 1. **Ingest**: wire batches are resolved into typed per-track records
//!    and stored in the [`MultiTrackCache`], keyed by [`FrameIndex`]
//! 2. **Tick**: the [`Scheduler`] derives the target frame from the
//!    injected [`Clock`], drains the caches and hands a [`TickOutput`]
//!    render payload to the host's collaborators
//! 3. **Evaluate**: the animation codec decodes the binary character and
//!    frame formats and evaluates skeleton poses, blendshapes and linear
//!    blend skinning into renderable geometry
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic-by-default**: the scheduler runs off an injected
//!   clock, so every tick sequence is reproducible in tests.
//! - **No IO in the core**: rasterization, audio output, demuxing and the
//!   network transport live behind the [`TickOutput`] boundary.
//! - **Degrade, don't halt**: stale data, cache misses and malformed
//!   single frames are reported as [`ErrorEvent`]s while playback
//!   continues with the last good state.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod cache;
mod codec;
#[cfg(test)]
mod fixtures;
mod foundation;
mod playback;
mod rig;

pub use cache::frames::{
    AudioFrame, BodyFrameDescriptor, DecodedBodyFrame, EventFrame, FaceFrameData, FrameQueue,
    IntervalQueue, MultiTrackCache, TrackKind, WidgetDirective,
};
pub use codec::character::decode_character;
pub use codec::frame::{FacePoseFrame, JointPose, TextureSelection, decode_frame};
pub use codec::reader::CODEC_VERSION;
pub use foundation::core::{Clock, Fps, FrameIndex, FrameRange, ManualClock, SystemClock};
pub use foundation::error::{AnimaError, AnimaResult, ErrorCode, ErrorEvent};
pub use foundation::math::RigidTransform;
pub use playback::ingest::RawFrame;
pub use playback::scheduler::{
    FaceSource, ResolvedFace, Scheduler, SchedulerConfig, TickOutput,
};
pub use playback::session::{PlayState, PlaybackSession, ResumeParams, SpeechState};
pub use rig::model::{
    BlendshapeBasis, Camera, CharacterRig, Joint, JointIndex, MAX_SKIN_INFLUENCES, Mesh, Skeleton,
    SkinBinding, SkinInfluence, TextureModel,
};
pub use rig::pose::{Pose, evaluate_pose, evaluate_rest_pose, interpolate};
pub use rig::skin::skin_mesh;
