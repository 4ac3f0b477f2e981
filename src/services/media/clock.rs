use std::time::{Duration, SystemTime};

/// Source of wall-clock time for the tracker.
pub trait Clock: Send + Sync + 'static {
    /// Current wall-clock instant
    fn now(&self) -> SystemTime;
}

/// The real system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Position reached after `elapsed` of playback from `reported`.
///
/// Paused or stopped sessions keep the reported position. The result never
/// exceeds `duration` when the duration is known.
pub fn extrapolate_position(
    reported: Duration,
    duration: Duration,
    playing: bool,
    elapsed: Duration,
) -> Duration {
    let position = if playing {
        reported.saturating_add(elapsed)
    } else {
        reported
    };

    if duration > Duration::ZERO {
        position.min(duration)
    } else {
        position
    }
}
