//! Data types crossing module boundaries.

use std::time::Instant;

use super::geometry::BoundingBox;

/// A detection of the target class that passed filtering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Detector confidence (0-1)
    pub confidence: f32,
    /// Box in pixel coordinates
    pub bbox: BoundingBox,
}

impl Candidate {
    pub const fn new(confidence: f32, bbox: BoundingBox) -> Self {
        Self { confidence, bbox }
    }
}

/// Latest beacon range and bearing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RangingEstimate {
    /// Signed distance error in meters, positive = too far
    pub distance_est: f32,
    /// Relative bearing in radians
    pub orientation_est: f32,
}

/// Body-frame velocity command.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VelocityCommand {
    /// Forward velocity (m/s)
    pub vx: f32,
    /// Lateral velocity (m/s)
    pub vy: f32,
    /// Yaw rate (rad/s)
    pub wz: f32,
}

impl VelocityCommand {
    pub const STOP: VelocityCommand = VelocityCommand {
        vx: 0.0,
        vy: 0.0,
        wz: 0.0,
    };

    /// Planar command with no lateral component.
    pub const fn planar(vx: f32, wz: f32) -> Self {
        Self { vx, vy: 0.0, wz }
    }

    pub fn is_stop(&self) -> bool {
        self.vx == 0.0 && self.vy == 0.0 && self.wz == 0.0
    }
}

/// A camera frame handed to the detector.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// Encoded image bytes as delivered by the camera
    pub data: Vec<u8>,
    pub captured_at: Instant,
}
