use std::time::Instant;

use crate::foundation::error::{AnimaError, AnimaResult};

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
/// Integer tick of the shared playback clock. All tracks are indexed by it.
pub struct FrameIndex(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// Half-open frame interval `[start, end)`.
pub struct FrameRange {
    /// First frame covered by the range.
    pub start: FrameIndex,
    /// One past the last covered frame.
    pub end: FrameIndex, // exclusive
}

impl FrameRange {
    /// Construct a range, rejecting `start > end`.
    pub fn new(start: FrameIndex, end: FrameIndex) -> AnimaResult<Self> {
        if start.0 > end.0 {
            return Err(AnimaError::validation("FrameRange start must be <= end"));
        }
        Ok(Self { start, end })
    }

    /// Number of frames covered.
    pub fn len_frames(self) -> u64 {
        self.end.0.saturating_sub(self.start.0)
    }

    /// True when the range covers no frames.
    pub fn is_empty(self) -> bool {
        self.start.0 == self.end.0
    }

    /// True when `f` lies inside the half-open interval.
    pub fn contains(self, f: FrameIndex) -> bool {
        self.start.0 <= f.0 && f.0 < self.end.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// Rational frames-per-second.
pub struct Fps {
    /// Numerator, must be > 0.
    pub num: u32,
    /// Denominator, must be > 0.
    pub den: u32,
}

impl Fps {
    /// Construct a frame rate, rejecting zero terms.
    pub fn new(num: u32, den: u32) -> AnimaResult<Self> {
        if den == 0 {
            return Err(AnimaError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(AnimaError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Frame rate as a float.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Seconds covered by one frame.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Convert a frame count to seconds.
    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * self.frame_duration_secs()
    }

    /// Convert elapsed seconds to a frame count, flooring and clamping at 0.
    pub fn secs_to_frames_floor(self, secs: f64) -> u64 {
        (secs * self.as_f64()).floor().max(0.0) as u64
    }
}

/// Injected time source driving the scheduler.
///
/// The scheduler never touches wall-clock globals; hosts pass a
/// [`SystemClock`] and tests pass a [`ManualClock`] so tick behavior is
/// reproducible frame by frame.
pub trait Clock {
    /// Seconds elapsed since an arbitrary fixed origin.
    fn now_secs(&self) -> f64;
}

/// Monotonic wall-clock backed by [`std::time::Instant`].
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is the moment of construction.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_secs(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Hand-advanced clock for deterministic tests. Stored as f64 bits so a
/// shared handle can advance it while the scheduler reads it.
#[derive(Debug, Default)]
pub struct ManualClock {
    bits: std::sync::atomic::AtomicU64,
}

impl ManualClock {
    /// Create a clock at t = 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by `secs`.
    pub fn advance(&self, secs: f64) {
        self.set(self.now_secs() + secs);
    }

    /// Set the clock to an absolute time.
    pub fn set(&self, secs: f64) {
        self.bits
            .store(secs.to_bits(), std::sync::atomic::Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> f64 {
        f64::from_bits(self.bits.load(std::sync::atomic::Ordering::Relaxed))
    }
}

impl<T: Clock + ?Sized> Clock for std::sync::Arc<T> {
    fn now_secs(&self) -> f64 {
        (**self).now_secs()
    }
}
