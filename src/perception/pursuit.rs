//! Pursuit behavior state machine.
//!
//! Runs once per processed frame and turns the filtered candidates into
//! velocity intent:
//!
//! ```text
//!            acquire (cooldown over)          size error < tol
//!   FOLLOW ───────────────────────▶ APPROACH ─────────────────▶ HOLD
//!     ▲                                │                          │
//!     └──────────── lock lost ─────────┘                          │
//!     └──────────── hold timer expired, cooldown armed ───────────┘
//! ```
//!
//! Only the handler for the mode observed at the start of a cycle runs, so
//! a transition takes effect from the following frame.

use std::time::{Duration, Instant};

use crate::config::LakshyaConfig;
use crate::core::{BoundingBox, Candidate, PixelRect};
use crate::shared::{BehaviorMode, BehaviorState};
use crate::utils::{clamp_symmetric, deadline_after};

use super::target_lock::{TargetLock, TargetLockConfig};

/// Approach and timing parameters.
#[derive(Clone, Debug)]
pub struct PursuitConfig {
    /// Size error treated as "arrived"
    pub size_tol: f32,
    /// Horizontal error treated as "centered"
    pub center_tol: f32,
    /// Yaw rate ceiling while approaching (rad/s)
    pub max_wz: f32,
    /// Forward gain on size error
    pub k_vx_fwd: f32,
    /// Reverse gain on size error
    pub k_vx_back: f32,
    /// Time spent in HOLD
    pub hold: Duration,
    /// Acquisition block after HOLD
    pub cooldown: Duration,
}

impl Default for PursuitConfig {
    fn default() -> Self {
        Self {
            size_tol: 0.08,
            center_tol: 0.10,
            max_wz: 0.96,
            k_vx_fwd: 0.8,
            k_vx_back: 0.4,
            hold: Duration::from_secs(3),
            cooldown: Duration::from_secs(15),
        }
    }
}

impl PursuitConfig {
    pub fn from_config(config: &LakshyaConfig) -> Self {
        Self {
            size_tol: config.approach.size_tol,
            center_tol: config.approach.center_tol,
            max_wz: config.approach.max_wz,
            k_vx_fwd: config.approach.k_vx_fwd,
            k_vx_back: config.approach.k_vx_back,
            hold: Duration::from_secs_f32(config.behavior.hold_seconds),
            cooldown: Duration::from_secs_f32(config.behavior.cooldown_seconds),
        }
    }
}

/// FOLLOW / APPROACH / HOLD state machine.
pub struct PursuitStateMachine {
    config: PursuitConfig,
    lock: TargetLock,
    state: BehaviorState,
    hold_until: Option<Instant>,
}

impl PursuitStateMachine {
    pub fn new(config: PursuitConfig, lock_config: TargetLockConfig) -> Self {
        Self {
            config,
            lock: TargetLock::new(lock_config),
            state: BehaviorState::default(),
            hold_until: None,
        }
    }

    /// Build from application configuration.
    pub fn from_config(config: &LakshyaConfig) -> Self {
        let lock_config = TargetLockConfig {
            iou_min: config.lock.lock_iou_min,
            max_miss_frames: config.lock.lock_max_miss_fr,
            prefer_roi: config.lock.prefer_roi,
        };
        Self::new(PursuitConfig::from_config(config), lock_config)
    }

    pub fn mode(&self) -> BehaviorMode {
        self.state.mode
    }

    /// Latest behavior record.
    pub fn state(&self) -> &BehaviorState {
        &self.state
    }

    pub fn lock(&self) -> &TargetLock {
        &self.lock
    }

    /// End of the current hold, if holding.
    pub fn hold_until(&self) -> Option<Instant> {
        self.hold_until
    }

    /// Advance one perception cycle and return the record to publish.
    pub fn step(&mut self, candidates: &[Candidate], roi: PixelRect, now: Instant) -> BehaviorState {
        self.state.roi_px = roi;

        match self.state.mode {
            BehaviorMode::Follow => self.step_follow(candidates, roi, now),
            BehaviorMode::Approach => self.step_approach(candidates, roi, now),
            BehaviorMode::Hold => self.step_hold(now),
        }

        self.state
    }

    fn step_follow(&mut self, candidates: &[Candidate], roi: PixelRect, now: Instant) {
        if self.lock.is_active() || !self.state.cooldown_elapsed(now) {
            return;
        }

        if self.lock.acquire(candidates, Some(roi)) {
            tracing::info!("Target acquired ({} candidates) → APPROACH", candidates.len());
            self.state.mode = BehaviorMode::Approach;
            self.state.target_box = self.lock.bbox();
            self.state.vx = 0.0;
            self.state.wz = 0.0;
        }
    }

    fn step_approach(&mut self, candidates: &[Candidate], roi: PixelRect, now: Instant) {
        if self.lock.is_active() {
            self.lock.update(candidates);
        }

        let target = match (self.lock.is_active(), self.lock.bbox()) {
            (true, Some(bbox)) => bbox,
            _ => {
                tracing::info!("Target lost → FOLLOW");
                self.state.mode = BehaviorMode::Follow;
                self.state.target_box = None;
                self.state.vx = 0.0;
                self.state.wz = 0.0;
                return;
            }
        };

        let (ex, ey) = approach_errors(&target, &roi);
        tracing::debug!("Approach errors: ex={:.3}, ey={:.3}", ex, ey);

        let yaw = if ex.abs() < self.config.center_tol {
            0.0
        } else {
            -ex
        };

        if ey.abs() < self.config.size_tol {
            let hold_until = deadline_after(now, self.config.hold);
            tracing::info!(
                "Target reached → HOLD for {:.1}s",
                self.config.hold.as_secs_f32()
            );
            self.state.mode = BehaviorMode::Hold;
            self.state.vx = 0.0;
            self.state.wz = 0.0;
            self.hold_until = Some(hold_until);
        } else {
            let vx = if ey > 0.0 {
                self.config.k_vx_fwd * ey.min(1.0)
            } else {
                -self.config.k_vx_back * (-ey).min(1.0)
            };
            self.state.vx = vx;
            self.state.wz = clamp_symmetric(yaw, self.config.max_wz);
        }

        self.state.target_box = Some(target);
    }

    fn step_hold(&mut self, now: Instant) {
        self.state.vx = 0.0;
        self.state.wz = 0.0;

        if self.hold_until.is_none_or(|until| now >= until) {
            tracing::info!(
                "Hold complete → FOLLOW, acquisition paused for {:.1}s",
                self.config.cooldown.as_secs_f32()
            );
            self.state.mode = BehaviorMode::Follow;
            self.state.cooldown_until = Some(deadline_after(now, self.config.cooldown));
            self.state.target_box = None;
            self.hold_until = None;
            self.lock.reset();
        }
    }
}

/// Horizontal and size error of `target` against the region of interest.
///
/// `ex` is the center offset in ROI widths (positive = target to the right),
/// `ey` is `1 - box_height / roi_height` (positive = target too small).
pub fn approach_errors(target: &BoundingBox, roi: &PixelRect) -> (f32, f32) {
    let roi_w = roi.width().max(2.0);
    let roi_h = roi.height().max(1.0);
    let (cx, _) = target.center();

    let ex = (cx - roi.center_x()) / roi_w;
    let ey = 1.0 - target.height() / roi_h;
    (ex, ey)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const ROI: PixelRect = PixelRect::new(0, 0, 100, 100);

    fn machine() -> PursuitStateMachine {
        PursuitStateMachine::new(PursuitConfig::default(), TargetLockConfig::default())
    }

    fn candidate(x1: f32, y1: f32, x2: f32, y2: f32) -> Candidate {
        Candidate::new(0.9, BoundingBox::new(x1, y1, x2, y2))
    }

    #[test]
    fn test_starts_in_follow() {
        let sm = machine();
        assert_eq!(sm.mode(), BehaviorMode::Follow);
        assert!(!sm.lock().is_active());
    }

    #[test]
    fn test_follow_without_candidates_stays() {
        let mut sm = machine();
        let state = sm.step(&[], ROI, Instant::now());
        assert_eq!(state.mode, BehaviorMode::Follow);
        assert_eq!(state.roi_px, ROI);
    }

    #[test]
    fn test_follow_to_approach() {
        let mut sm = machine();
        let state = sm.step(&[candidate(30.0, 40.0, 70.0, 80.0)], ROI, Instant::now());

        assert_eq!(state.mode, BehaviorMode::Approach);
        assert_eq!(state.target_box, Some(BoundingBox::new(30.0, 40.0, 70.0, 80.0)));
        assert_eq!((state.vx, state.wz), (0.0, 0.0));
    }

    #[test]
    fn test_approach_drives_forward_when_small() {
        let mut sm = machine();
        let t0 = Instant::now();
        let target = candidate(30.0, 40.0, 70.0, 80.0);
        sm.step(&[target], ROI, t0);

        let state = sm.step(&[target], ROI, t0 + Duration::from_millis(60));
        // ey = 1 - 40/100 = 0.6 → 0.8 * 0.6
        assert_eq!(state.mode, BehaviorMode::Approach);
        assert_relative_eq!(state.vx, 0.48, epsilon = 1e-6);
        assert_eq!(state.wz, 0.0);
    }

    #[test]
    fn test_approach_backs_off_when_large() {
        let mut sm = machine();
        let t0 = Instant::now();
        let target = candidate(30.0, -10.0, 70.0, 110.0);
        sm.step(&[target], ROI, t0);

        let state = sm.step(&[target], ROI, t0 + Duration::from_millis(60));
        // ey = 1 - 120/100 = -0.2 → -0.4 * 0.2
        assert_relative_eq!(state.vx, -0.08, epsilon = 1e-6);
    }

    #[test]
    fn test_approach_yaw_toward_target() {
        let mut sm = machine();
        let t0 = Instant::now();
        // Center at x=80: ex = 0.3, target to the right → negative yaw
        let target = candidate(70.0, 40.0, 90.0, 80.0);
        sm.step(&[target], ROI, t0);

        let state = sm.step(&[target], ROI, t0 + Duration::from_millis(60));
        assert_relative_eq!(state.wz, -0.3, epsilon = 1e-6);

        // Within center tolerance: no yaw
        let mut sm = machine();
        let target = candidate(35.0, 40.0, 75.0, 80.0);
        sm.step(&[target], ROI, t0);
        let state = sm.step(&[target], ROI, t0 + Duration::from_millis(60));
        assert_eq!(state.wz, 0.0);
    }

    #[test]
    fn test_approach_to_hold() {
        let mut sm = machine();
        let t0 = Instant::now();
        // Height 95 of 100: ey = 0.05
        let target = candidate(30.0, 2.0, 70.0, 97.0);
        sm.step(&[target], ROI, t0);

        let now = t0 + Duration::from_millis(60);
        let state = sm.step(&[target], ROI, now);

        assert_eq!(state.mode, BehaviorMode::Hold);
        assert_eq!((state.vx, state.wz), (0.0, 0.0));
        assert_eq!(sm.hold_until(), Some(now + Duration::from_secs(3)));
        assert_eq!(state.target_box, Some(target.bbox));
    }

    #[test]
    fn test_approach_lock_loss_reverts() {
        let config = TargetLockConfig {
            max_miss_frames: 1,
            ..Default::default()
        };
        let mut sm = PursuitStateMachine::new(PursuitConfig::default(), config);
        let t0 = Instant::now();
        sm.step(&[candidate(30.0, 40.0, 70.0, 80.0)], ROI, t0);

        let state = sm.step(&[], ROI, t0 + Duration::from_millis(60));
        assert_eq!(state.mode, BehaviorMode::Approach);

        let state = sm.step(&[], ROI, t0 + Duration::from_millis(120));
        assert_eq!(state.mode, BehaviorMode::Follow);
        assert!(state.target_box.is_none());
        assert!(!sm.lock().is_active());
    }

    #[test]
    fn test_hold_expiry_arms_cooldown() {
        let mut sm = machine();
        let t0 = Instant::now();
        let target = candidate(30.0, 2.0, 70.0, 97.0);
        sm.step(&[target], ROI, t0);
        sm.step(&[target], ROI, t0 + Duration::from_millis(60));
        let hold_until = sm.hold_until().unwrap();

        let state = sm.step(&[target], ROI, hold_until - Duration::from_millis(1));
        assert_eq!(state.mode, BehaviorMode::Hold);

        let state = sm.step(&[target], ROI, hold_until);
        assert_eq!(state.mode, BehaviorMode::Follow);
        assert_eq!(state.cooldown_until, Some(hold_until + Duration::from_secs(15)));
        assert!(state.target_box.is_none());
        assert!(!sm.lock().is_active());
    }

    #[test]
    fn test_cooldown_blocks_acquisition() {
        let mut sm = machine();
        let t0 = Instant::now();
        let target = candidate(30.0, 2.0, 70.0, 97.0);
        sm.step(&[target], ROI, t0);
        sm.step(&[target], ROI, t0 + Duration::from_millis(60));
        let hold_until = sm.hold_until().unwrap();
        let state = sm.step(&[target], ROI, hold_until);
        let cooldown_until = state.cooldown_until.unwrap();

        let state = sm.step(&[target], ROI, cooldown_until - Duration::from_millis(1));
        assert_eq!(state.mode, BehaviorMode::Follow);

        let state = sm.step(&[target], ROI, cooldown_until);
        assert_eq!(state.mode, BehaviorMode::Approach);
    }

    #[test]
    fn test_unbounded_timers_do_not_overflow() {
        let mut sm = PursuitStateMachine::new(
            PursuitConfig {
                hold: Duration::MAX,
                cooldown: Duration::MAX,
                ..Default::default()
            },
            TargetLockConfig::default(),
        );
        let t0 = Instant::now();
        let target = candidate(30.0, 2.0, 70.0, 97.0);
        sm.step(&[target], ROI, t0);
        let state = sm.step(&[target], ROI, t0);
        assert_eq!(state.mode, BehaviorMode::Hold);

        let hold_until = sm.hold_until().unwrap();
        assert!(hold_until > t0 + Duration::from_secs(86_400));

        let state = sm.step(&[target], ROI, hold_until);
        assert_eq!(state.mode, BehaviorMode::Follow);
        let cooldown_until = state.cooldown_until.unwrap();
        assert!(cooldown_until > hold_until);

        let state = sm.step(&[target], ROI, hold_until + Duration::from_secs(3600));
        assert_eq!(state.mode, BehaviorMode::Follow);
    }

    #[test]
    fn test_approach_errors_floor_degenerate_roi() {
        let target = BoundingBox::new(0.0, 0.0, 4.0, 4.0);
        let (ex, ey) = approach_errors(&target, &PixelRect::new(10, 10, 10, 10));
        assert!(ex.is_finite());
        assert!(ey.is_finite());
        assert_relative_eq!(ex, -4.0);
        assert_relative_eq!(ey, -3.0);
    }
}
