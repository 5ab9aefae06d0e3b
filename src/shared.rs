//! Shared state between the perception and follow threads.
//!
//! - `SharedBehavior`: pursuit intent, written only by the perception thread
//! - `RangingSlot`: latest beacon estimate, written by the beacon subscriber
//! - `CancelToken`: shutdown signal observed by every loop
//!
//! The behavior record is always replaced as a whole so the follow thread
//! never sees a mode paired with another mode's velocities.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::core::{BoundingBox, PixelRect, RangingEstimate};

/// Pursuit behavior mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BehaviorMode {
    /// Following the beacon, searching for a target
    #[default]
    Follow,
    /// Closing in on a locked target
    Approach,
    /// Paused at the target
    Hold,
}

impl BehaviorMode {
    /// Whether the perception thread's velocities replace the beacon controller's.
    pub fn overrides_follow(&self) -> bool {
        matches!(self, BehaviorMode::Approach | BehaviorMode::Hold)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BehaviorMode::Follow => "FOLLOW",
            BehaviorMode::Approach => "APPROACH",
            BehaviorMode::Hold => "HOLD",
        }
    }
}

impl std::fmt::Display for BehaviorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of pursuit intent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BehaviorState {
    pub mode: BehaviorMode,
    /// Override forward velocity (m/s), used when mode is not Follow
    pub vx: f32,
    /// Override yaw rate (rad/s), used when mode is not Follow
    pub wz: f32,
    /// Box of the locked target
    pub target_box: Option<BoundingBox>,
    /// Region of interest of the last processed frame
    pub roi_px: PixelRect,
    /// Acquisition is blocked until this instant
    pub cooldown_until: Option<Instant>,
}

impl BehaviorState {
    /// Whether acquisition is allowed at `now`.
    pub fn cooldown_elapsed(&self, now: Instant) -> bool {
        self.cooldown_until.is_none_or(|until| now >= until)
    }
}

/// Behavior state published by the perception thread.
#[derive(Debug, Default)]
pub struct SharedBehavior {
    inner: RwLock<BehaviorState>,
}

impl SharedBehavior {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole record.
    pub fn publish(&self, state: BehaviorState) {
        *self.inner.write() = state;
    }

    /// Copy of the latest record.
    pub fn snapshot(&self) -> BehaviorState {
        *self.inner.read()
    }
}

/// Single-slot holder for the latest beacon estimate.
#[derive(Debug, Default)]
pub struct RangingSlot {
    latest: RwLock<Option<RangingEstimate>>,
}

impl RangingSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the stored estimate.
    pub fn store(&self, estimate: RangingEstimate) {
        *self.latest.write() = Some(estimate);
    }

    /// Latest estimate, `None` before the first sample.
    pub fn latest(&self) -> Option<RangingEstimate> {
        *self.latest.read()
    }
}

/// Cooperative cancellation signal.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Sleep for `duration`, waking early on cancellation.
    ///
    /// Returns true if cancelled.
    pub fn sleep(&self, duration: Duration) -> bool {
        const SLICE: Duration = Duration::from_millis(10);
        let deadline = Instant::now() + duration;
        loop {
            if self.is_cancelled() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            std::thread::sleep(SLICE.min(deadline - now));
        }
    }
}

/// Everything the two loops share, passed explicitly to each.
#[derive(Debug, Clone, Default)]
pub struct PursuitContext {
    pub behavior: Arc<SharedBehavior>,
    pub ranging: Arc<RangingSlot>,
    pub cancel: CancelToken,
    /// Set by the follow loop once its final stop has been dispatched
    follow_stopped: Arc<AtomicBool>,
}

impl PursuitContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_follow_stopped(&self) {
        self.follow_stopped.store(true, Ordering::Release);
    }

    pub fn is_follow_stopped(&self) -> bool {
        self.follow_stopped.load(Ordering::Acquire)
    }

    /// Wait up to `timeout` for the follow loop's final stop.
    pub fn wait_follow_stopped(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !self.is_follow_stopped() {
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_override() {
        assert!(!BehaviorMode::Follow.overrides_follow());
        assert!(BehaviorMode::Approach.overrides_follow());
        assert!(BehaviorMode::Hold.overrides_follow());
    }

    #[test]
    fn test_publish_replaces_snapshot() {
        let shared = SharedBehavior::new();
        assert_eq!(shared.snapshot().mode, BehaviorMode::Follow);

        let state = BehaviorState {
            mode: BehaviorMode::Approach,
            vx: 0.3,
            wz: -0.2,
            target_box: Some(BoundingBox::new(1.0, 2.0, 3.0, 4.0)),
            ..Default::default()
        };
        shared.publish(state);
        assert_eq!(shared.snapshot(), state);
    }

    #[test]
    fn test_cooldown_elapsed() {
        let now = Instant::now();
        let mut state = BehaviorState::default();
        assert!(state.cooldown_elapsed(now));

        state.cooldown_until = Some(now + Duration::from_secs(1));
        assert!(!state.cooldown_elapsed(now));
        assert!(state.cooldown_elapsed(now + Duration::from_secs(1)));
    }

    #[test]
    fn test_ranging_slot_latest_wins() {
        let slot = RangingSlot::new();
        assert!(slot.latest().is_none());

        slot.store(RangingEstimate {
            distance_est: 1.0,
            orientation_est: 0.1,
        });
        slot.store(RangingEstimate {
            distance_est: 2.0,
            orientation_est: -0.1,
        });
        assert_eq!(slot.latest().map(|r| r.distance_est), Some(2.0));
    }

    #[test]
    fn test_cancel_token_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
        assert!(clone.sleep(Duration::from_secs(5)));
    }

    #[test]
    fn test_wait_follow_stopped() {
        let context = PursuitContext::new();
        assert!(!context.wait_follow_stopped(Duration::from_millis(20)));
        context.mark_follow_stopped();
        assert!(context.wait_follow_stopped(Duration::from_millis(20)));
    }
}
