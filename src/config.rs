//! Configuration loading for Lakshya
//!
//! Every section is optional in the TOML file. The upper-case tuning names
//! (`MIN_CONF`, `LOCK_IOU_MIN`, ...) are accepted as aliases so existing
//! tuning sheets can be pasted in unchanged.

use crate::core::geometry::NormalizedRoi;
use crate::error::{LakshyaError, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::{Duration, Instant};

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize)]
pub struct LakshyaConfig {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub approach: ApproachConfig,
    #[serde(default)]
    pub follow: FollowSettings,
    #[serde(default)]
    pub lock: LockConfig,
    #[serde(default)]
    pub behavior: BehaviorConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Camera acquisition settings
#[derive(Clone, Debug, Deserialize)]
pub struct CameraConfig {
    /// Frame request timeout in seconds (default: 2.0)
    #[serde(default = "default_camera_timeout", alias = "CAM_TIMEOUT_SEC")]
    pub timeout_secs: f32,
}

/// Detector output filtering
#[derive(Clone, Debug, Deserialize)]
pub struct DetectionConfig {
    /// Class name of the object to pursue (default: "chair")
    #[serde(default = "default_target_class")]
    pub target_class: String,

    /// Minimum detector confidence (default: 0.35)
    #[serde(default = "default_min_conf", alias = "MIN_CONF")]
    pub min_conf: f32,

    /// Minimum box height as a fraction of frame height (default: 0.05)
    #[serde(default = "default_min_box_frac", alias = "MIN_BOX_FRAC")]
    pub min_box_frac: f32,
}

/// Visual approach tuning
#[derive(Clone, Debug, Deserialize)]
pub struct ApproachConfig {
    /// Region of interest as normalized (x1, y1, x2, y2)
    #[serde(default = "default_roi_norm", alias = "ROI_NORM")]
    pub roi_norm: [f32; 4],

    /// Size error below which the target counts as reached (default: 0.08)
    #[serde(default = "default_size_tol", alias = "SIZE_TOL")]
    pub size_tol: f32,

    /// Horizontal error below which no yaw is commanded (default: 0.10)
    #[serde(default = "default_center_tol", alias = "CENTER_TOL")]
    pub center_tol: f32,

    /// Approach speed from the tuning sheet in m/s (default: 0.40). Accepted but
    /// not applied: the approach speed comes from the gains alone
    #[serde(default = "default_max_vx", alias = "MAX_VX")]
    pub max_vx: f32,

    /// Yaw rate ceiling while approaching in rad/s (default: 0.96)
    #[serde(default = "default_max_wz", alias = "MAX_WZ")]
    pub max_wz: f32,

    /// Forward gain on size error (default: 0.8)
    #[serde(default = "default_k_vx_fwd", alias = "K_VX_FWD")]
    pub k_vx_fwd: f32,

    /// Reverse gain on size error (default: 0.4)
    #[serde(default = "default_k_vx_back", alias = "K_VX_BACK")]
    pub k_vx_back: f32,
}

/// Beacon-following controller tuning
#[derive(Clone, Debug, Deserialize)]
pub struct FollowSettings {
    /// Control period in seconds (default: 0.04, 25Hz)
    #[serde(default = "default_follow_dt", alias = "FOLLOW_DT")]
    pub follow_dt: f32,

    /// Distance dead-band in meters (default: 1.2)
    #[serde(default = "default_dead_band_d", alias = "DEAD_BAND_D")]
    pub dead_band_d: f32,

    /// Distance error at which full speed is reached (default: 1.0)
    #[serde(default = "default_dist_slowdown", alias = "DIST_SLOWDOWN")]
    pub dist_slowdown: f32,

    /// Bearing dead-band in radians (default: 0.20)
    #[serde(default = "default_dead_band_o", alias = "DEAD_BAND_O")]
    pub dead_band_o: f32,

    /// Bearing error at which full yaw rate is reached, radians (default: 60°)
    #[serde(default = "default_slowdown_angle", alias = "SLOWDOWN_ANGLE")]
    pub slowdown_angle: f32,

    /// Maximum following speed in m/s (default: 0.9)
    #[serde(default = "default_max_vx_follow", alias = "MAX_VX_FOLLOW")]
    pub max_vx_follow: f32,

    /// Maximum following yaw rate in rad/s (default: 0.96)
    #[serde(default = "default_max_wz_follow", alias = "MAX_WZ_FOLLOW")]
    pub max_wz_follow: f32,
}

/// Target lock tuning
#[derive(Clone, Debug, Deserialize)]
pub struct LockConfig {
    /// Minimum IoU to keep the lock (default: 0.25)
    #[serde(default = "default_lock_iou_min", alias = "LOCK_IOU_MIN")]
    pub lock_iou_min: f32,

    /// Consecutive misses tolerated before the lock drops (default: 10)
    #[serde(default = "default_lock_max_miss", alias = "LOCK_MAX_MISS_FR")]
    pub lock_max_miss_fr: u32,

    /// Prefer candidates centered inside the ROI on acquisition (default: true)
    #[serde(default = "default_prefer_roi", alias = "PREFER_ROI")]
    pub prefer_roi: bool,
}

/// Behavior timing
#[derive(Clone, Debug, Deserialize)]
pub struct BehaviorConfig {
    /// Pause at the target in seconds (default: 3.0)
    #[serde(default = "default_hold_seconds", alias = "HOLD_SECONDS")]
    pub hold_seconds: f32,

    /// Re-acquisition block after a hold in seconds (default: 15.0)
    #[serde(default = "default_cooldown_seconds", alias = "COOLDOWN_SECONDS")]
    pub cooldown_seconds: f32,

    /// Minimum interval between mode announcements in seconds (default: 0.5)
    #[serde(default = "default_announce_interval")]
    pub announce_interval_secs: f32,
}

/// Simulated scene used when no robot is attached
#[derive(Clone, Debug, Deserialize)]
pub struct SimulationConfig {
    /// RNG seed, 0 = entropy (default: 42)
    #[serde(default = "default_sim_seed")]
    pub seed: u64,

    /// Camera frame rate in Hz (default: 15)
    #[serde(default = "default_sim_frame_rate")]
    pub frame_rate_hz: f32,

    /// Image width in pixels (default: 640)
    #[serde(default = "default_sim_width")]
    pub frame_width: u32,

    /// Image height in pixels (default: 480)
    #[serde(default = "default_sim_height")]
    pub frame_height: u32,

    /// Horizontal field of view in degrees (default: 70)
    #[serde(default = "default_sim_hfov")]
    pub horizontal_fov_deg: f32,

    /// Probability a frame request yields nothing (default: 0.02)
    #[serde(default = "default_sim_frame_dropout")]
    pub frame_dropout: f32,

    /// Probability the target is missed in a frame (default: 0.05)
    #[serde(default = "default_sim_detection_dropout")]
    pub detection_dropout: f32,

    /// Box corner jitter in pixels (default: 2.0)
    #[serde(default = "default_sim_box_jitter")]
    pub box_jitter_px: f32,

    /// Target position in world frame (default: [4.0, 0.6])
    #[serde(default = "default_sim_target_position")]
    pub target_position: [f32; 2],

    /// Target physical size (width, height) in meters (default: [0.5, 0.9])
    #[serde(default = "default_sim_target_size")]
    pub target_size: [f32; 2],

    /// Center of the beacon's circular walk (default: [2.0, -1.0])
    #[serde(default = "default_sim_beacon_center")]
    pub beacon_center: [f32; 2],

    /// Radius of the beacon's walk in meters (default: 1.5)
    #[serde(default = "default_sim_beacon_radius")]
    pub beacon_radius: f32,

    /// Angular speed of the beacon's walk in rad/s (default: 0.15)
    #[serde(default = "default_sim_beacon_speed")]
    pub beacon_speed: f32,

    /// Beacon report rate in Hz (default: 10)
    #[serde(default = "default_sim_beacon_rate")]
    pub beacon_rate_hz: f32,

    /// Ranging noise stddev in meters (default: 0.05)
    #[serde(default = "default_sim_range_noise")]
    pub range_noise_stddev: f32,

    /// Range the tag reports as zero distance error, meters (default: 0.5)
    #[serde(default = "default_sim_beacon_standoff")]
    pub beacon_standoff: f32,

    /// Press the tag's X button after this many seconds, 0 = never (default: 0)
    #[serde(default)]
    pub button_press_after_secs: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_camera_timeout(),
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            target_class: default_target_class(),
            min_conf: default_min_conf(),
            min_box_frac: default_min_box_frac(),
        }
    }
}

impl Default for ApproachConfig {
    fn default() -> Self {
        Self {
            roi_norm: default_roi_norm(),
            size_tol: default_size_tol(),
            center_tol: default_center_tol(),
            max_vx: default_max_vx(),
            max_wz: default_max_wz(),
            k_vx_fwd: default_k_vx_fwd(),
            k_vx_back: default_k_vx_back(),
        }
    }
}

impl Default for FollowSettings {
    fn default() -> Self {
        Self {
            follow_dt: default_follow_dt(),
            dead_band_d: default_dead_band_d(),
            dist_slowdown: default_dist_slowdown(),
            dead_band_o: default_dead_band_o(),
            slowdown_angle: default_slowdown_angle(),
            max_vx_follow: default_max_vx_follow(),
            max_wz_follow: default_max_wz_follow(),
        }
    }
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            lock_iou_min: default_lock_iou_min(),
            lock_max_miss_fr: default_lock_max_miss(),
            prefer_roi: default_prefer_roi(),
        }
    }
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            hold_seconds: default_hold_seconds(),
            cooldown_seconds: default_cooldown_seconds(),
            announce_interval_secs: default_announce_interval(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: default_sim_seed(),
            frame_rate_hz: default_sim_frame_rate(),
            frame_width: default_sim_width(),
            frame_height: default_sim_height(),
            horizontal_fov_deg: default_sim_hfov(),
            frame_dropout: default_sim_frame_dropout(),
            detection_dropout: default_sim_detection_dropout(),
            box_jitter_px: default_sim_box_jitter(),
            target_position: default_sim_target_position(),
            target_size: default_sim_target_size(),
            beacon_center: default_sim_beacon_center(),
            beacon_radius: default_sim_beacon_radius(),
            beacon_speed: default_sim_beacon_speed(),
            beacon_rate_hz: default_sim_beacon_rate(),
            range_noise_stddev: default_sim_range_noise(),
            beacon_standoff: default_sim_beacon_standoff(),
            button_press_after_secs: 0.0,
        }
    }
}

// Default value functions
fn default_camera_timeout() -> f32 {
    2.0
}
fn default_target_class() -> String {
    "chair".to_string()
}
fn default_min_conf() -> f32 {
    0.35
}
fn default_min_box_frac() -> f32 {
    0.05
}
fn default_roi_norm() -> [f32; 4] {
    [0.33, 0.1, 0.67, 0.8]
}
fn default_size_tol() -> f32 {
    0.08
}
fn default_center_tol() -> f32 {
    0.10
}
fn default_max_vx() -> f32 {
    0.40
}
fn default_max_wz() -> f32 {
    0.96
}
fn default_k_vx_fwd() -> f32 {
    0.8
}
fn default_k_vx_back() -> f32 {
    0.4
}

// Follow defaults
fn default_follow_dt() -> f32 {
    0.04
}
fn default_dead_band_d() -> f32 {
    1.2
}
fn default_dist_slowdown() -> f32 {
    1.0
}
fn default_dead_band_o() -> f32 {
    0.20
}
fn default_slowdown_angle() -> f32 {
    60f32.to_radians()
}
fn default_max_vx_follow() -> f32 {
    0.9
}
fn default_max_wz_follow() -> f32 {
    0.96
}

// Lock and timing defaults
fn default_lock_iou_min() -> f32 {
    0.25
}
fn default_lock_max_miss() -> u32 {
    10
}
fn default_prefer_roi() -> bool {
    true
}
fn default_hold_seconds() -> f32 {
    3.0
}
fn default_cooldown_seconds() -> f32 {
    15.0
}
fn default_announce_interval() -> f32 {
    0.5
}

// Simulation defaults
fn default_sim_seed() -> u64 {
    42
}
fn default_sim_frame_rate() -> f32 {
    15.0
}
fn default_sim_width() -> u32 {
    640
}
fn default_sim_height() -> u32 {
    480
}
fn default_sim_hfov() -> f32 {
    70.0
}
fn default_sim_frame_dropout() -> f32 {
    0.02
}
fn default_sim_detection_dropout() -> f32 {
    0.05
}
fn default_sim_box_jitter() -> f32 {
    2.0
}
fn default_sim_target_position() -> [f32; 2] {
    [4.0, 0.6]
}
fn default_sim_target_size() -> [f32; 2] {
    [0.5, 0.9]
}
fn default_sim_beacon_center() -> [f32; 2] {
    [2.0, -1.0]
}
fn default_sim_beacon_radius() -> f32 {
    1.5
}
fn default_sim_beacon_speed() -> f32 {
    0.15
}
fn default_sim_beacon_rate() -> f32 {
    10.0
}
fn default_sim_range_noise() -> f32 {
    0.05
}
fn default_sim_beacon_standoff() -> f32 {
    0.5
}

impl LakshyaConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LakshyaError::Config(format!("Failed to read config file: {}", e)))?;
        let config: LakshyaConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the control loops cannot run with.
    pub fn validate(&self) -> Result<()> {
        let [x1, y1, x2, y2] = self.approach.roi_norm;
        if [x1, y1, x2, y2].iter().any(|v| !(0.0..=1.0).contains(v)) || x1 >= x2 || y1 >= y2 {
            return Err(LakshyaError::Config(format!(
                "roi_norm must be an ordered rectangle inside [0, 1], got {:?}",
                self.approach.roi_norm
            )));
        }

        if !(0.0..=1.0).contains(&self.lock.lock_iou_min) {
            return Err(LakshyaError::Config(format!(
                "lock_iou_min must lie in [0, 1], got {}",
                self.lock.lock_iou_min
            )));
        }

        let positive = [
            ("follow_dt", self.follow.follow_dt),
            ("dist_slowdown", self.follow.dist_slowdown),
            ("slowdown_angle", self.follow.slowdown_angle),
            ("timeout_secs", self.camera.timeout_secs),
            ("frame_rate_hz", self.simulation.frame_rate_hz),
            ("beacon_rate_hz", self.simulation.beacon_rate_hz),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(LakshyaError::Config(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }

        let non_negative = [
            ("min_conf", self.detection.min_conf),
            ("min_box_frac", self.detection.min_box_frac),
            ("size_tol", self.approach.size_tol),
            ("center_tol", self.approach.center_tol),
            ("max_vx", self.approach.max_vx),
            ("max_wz", self.approach.max_wz),
            ("k_vx_fwd", self.approach.k_vx_fwd),
            ("k_vx_back", self.approach.k_vx_back),
            ("dead_band_d", self.follow.dead_band_d),
            ("dead_band_o", self.follow.dead_band_o),
            ("max_vx_follow", self.follow.max_vx_follow),
            ("max_wz_follow", self.follow.max_wz_follow),
            ("hold_seconds", self.behavior.hold_seconds),
            ("cooldown_seconds", self.behavior.cooldown_seconds),
            ("announce_interval_secs", self.behavior.announce_interval_secs),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(LakshyaError::Config(format!(
                    "{} must be non-negative, got {}",
                    name, value
                )));
            }
        }

        // Every seconds value must become a `Duration` that an `Instant` can absorb
        let now = Instant::now();
        let seconds = [
            ("follow_dt", self.follow.follow_dt),
            ("timeout_secs", self.camera.timeout_secs),
            ("hold_seconds", self.behavior.hold_seconds),
            ("cooldown_seconds", self.behavior.cooldown_seconds),
            ("announce_interval_secs", self.behavior.announce_interval_secs),
            ("1 / frame_rate_hz", 1.0 / self.simulation.frame_rate_hz),
            ("1 / beacon_rate_hz", 1.0 / self.simulation.beacon_rate_hz),
        ];
        for (name, value) in seconds {
            let duration = Duration::try_from_secs_f32(value).map_err(|e| {
                LakshyaError::Config(format!("{} out of range ({}): {}", name, value, e))
            })?;
            if now.checked_add(duration).is_none() {
                return Err(LakshyaError::Config(format!(
                    "{} out of range: {} s overflows the clock",
                    name, value
                )));
            }
        }

        Ok(())
    }

    /// Region of interest in normalized image coordinates
    pub fn roi(&self) -> NormalizedRoi {
        let [x1, y1, x2, y2] = self.approach.roi_norm;
        NormalizedRoi { x1, y1, x2, y2 }
    }

    /// Follow loop period
    pub fn follow_period(&self) -> Duration {
        Duration::from_secs_f32(self.follow.follow_dt)
    }
}
