//! Beacon-following controller.
//!
//! Computes a saturating proportional command from the beacon's range and
//! bearing, then lets the pursuit behavior override it while a target is
//! being approached or held.

use std::time::Duration;

use crate::config::LakshyaConfig;
use crate::core::{RangingEstimate, VelocityCommand};
use crate::shared::BehaviorState;
use crate::utils::clamp_symmetric;

/// Configuration for beacon following.
#[derive(Clone, Debug)]
pub struct FollowConfig {
    /// Control period
    pub period: Duration,
    /// Distance error ignored around zero (m)
    pub dead_band_d: f32,
    /// Distance error at which full speed is commanded (m)
    pub dist_slowdown: f32,
    /// Bearing error ignored around zero (rad)
    pub dead_band_o: f32,
    /// Bearing error at which full yaw rate is commanded (rad)
    pub slowdown_angle: f32,
    /// Maximum forward speed (m/s)
    pub max_vx: f32,
    /// Maximum yaw rate (rad/s)
    pub max_wz: f32,
}

impl Default for FollowConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(40),
            dead_band_d: 1.2,
            dist_slowdown: 1.0,
            dead_band_o: 0.20,
            slowdown_angle: 60f32.to_radians(),
            max_vx: 0.9,
            max_wz: 0.96,
        }
    }
}

impl FollowConfig {
    pub fn from_config(config: &LakshyaConfig) -> Self {
        Self {
            period: config.follow_period(),
            dead_band_d: config.follow.dead_band_d,
            dist_slowdown: config.follow.dist_slowdown,
            dead_band_o: config.follow.dead_band_o,
            slowdown_angle: config.follow.slowdown_angle,
            max_vx: config.follow.max_vx_follow,
            max_wz: config.follow.max_wz_follow,
        }
    }
}

/// Blends beacon following with the pursuit override.
#[derive(Clone, Debug)]
pub struct FollowController {
    config: FollowConfig,
}

impl FollowController {
    pub fn new(config: FollowConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FollowConfig {
        &self.config
    }

    /// Beacon-following command as (vx, wz); zero without an estimate.
    pub fn baseline(&self, ranging: Option<RangingEstimate>) -> (f32, f32) {
        let Some(estimate) = ranging else {
            return (0.0, 0.0);
        };

        let vx = saturating_term(
            estimate.distance_est,
            self.config.dead_band_d,
            self.config.dist_slowdown,
            self.config.max_vx,
        );
        let wz = saturating_term(
            estimate.orientation_est,
            self.config.dead_band_o,
            self.config.slowdown_angle,
            self.config.max_wz,
        );
        (vx, wz)
    }

    /// Command to dispatch this tick.
    pub fn command(
        &self,
        behavior: &BehaviorState,
        ranging: Option<RangingEstimate>,
    ) -> VelocityCommand {
        if behavior.mode.overrides_follow() {
            VelocityCommand::planar(behavior.vx, behavior.wz)
        } else {
            let (vx, wz) = self.baseline(ranging);
            VelocityCommand::planar(vx, wz)
        }
    }
}

/// Dead-banded proportional term that saturates at `error == slowdown`.
fn saturating_term(error: f32, dead_band: f32, slowdown: f32, max: f32) -> f32 {
    if !error.is_finite() || error.abs() <= dead_band {
        return 0.0;
    }
    let scale = (error.abs() / slowdown).min(1.0);
    clamp_symmetric((max * scale).copysign(error), max)
}
