//! Simulated camera and detector.
//!
//! The camera only paces frames; the detector reads the robot pose from the
//! world and projects the scene objects through a pinhole model with the
//! horizon at mid-image.

use std::time::{Duration, Instant};

use crate::core::{BoundingBox, Frame};
use crate::error::Result;
use crate::perception::{Detection, Detector, FrameSource};

use super::{RobotPose, SharedWorld};

/// Physical size (width, height) of the person carrying the tag.
const PERSON_SIZE: [f32; 2] = [0.5, 1.7];

/// Objects closer than this are not detected.
const MIN_RANGE: f32 = 0.3;

/// Paced frame stream.
pub struct SimCamera {
    world: SharedWorld,
    timeout: Duration,
    next_frame_at: Option<Instant>,
    closed: bool,
}

impl SimCamera {
    /// A request that would wait longer than `timeout` gives up empty-handed.
    pub fn new(world: SharedWorld, timeout: Duration) -> Self {
        Self {
            world,
            timeout,
            next_frame_at: None,
            closed: false,
        }
    }
}

impl FrameSource for SimCamera {
    fn next_frame(&mut self) -> Option<Frame> {
        if self.closed {
            return None;
        }

        let (period, width, height) = {
            let world = self.world.lock();
            let config = world.config();
            (
                Duration::from_secs_f32(1.0 / config.frame_rate_hz),
                config.frame_width,
                config.frame_height,
            )
        };

        let now = Instant::now();
        let due = self.next_frame_at.unwrap_or(now);
        if due > now {
            let wait = due - now;
            if wait > self.timeout {
                std::thread::sleep(self.timeout);
                tracing::debug!("Frame request timed out");
                return None;
            }
            std::thread::sleep(wait);
        }
        let now = Instant::now();
        // Fall behind by at most one frame
        let next = due + period;
        self.next_frame_at = Some(if next < now { now } else { next });

        let mut world = self.world.lock();
        let dropout = world.config().frame_dropout;
        if world.noise().chance(dropout) {
            return None;
        }

        Some(Frame {
            width,
            height,
            data: Vec::new(),
            captured_at: now,
        })
    }

    fn close(&mut self) {
        if !self.closed {
            tracing::debug!("Simulated camera closed");
            self.closed = true;
        }
    }
}

/// Projects the target and the beacon carrier into the frame.
pub struct SimDetector {
    world: SharedWorld,
    target_class: String,
}

impl SimDetector {
    pub fn new(world: SharedWorld, target_class: &str) -> Self {
        Self {
            world,
            target_class: target_class.to_string(),
        }
    }
}

impl Detector for SimDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        let now = Instant::now();
        let mut world = self.world.lock();
        world.advance(now);

        let pose = world.pose();
        let config = world.config().clone();
        let hfov = config.horizontal_fov_deg.to_radians();
        let (bx, by) = world.beacon_position(now);

        let objects = [
            (
                self.target_class.as_str(),
                config.target_position,
                config.target_size,
            ),
            ("person", [bx, by], PERSON_SIZE),
        ];

        let mut detections = Vec::new();
        for (class_name, position, size) in objects {
            let Some(bbox) = project_box(&pose, position, size, hfov, frame.width, frame.height)
            else {
                continue;
            };
            let noise = world.noise();
            if noise.chance(config.detection_dropout) {
                continue;
            }

            let jitter = config.box_jitter_px;
            let bbox = BoundingBox::new(
                bbox.x1 + noise.gaussian(jitter),
                bbox.y1 + noise.gaussian(jitter),
                bbox.x2 + noise.gaussian(jitter),
                bbox.y2 + noise.gaussian(jitter),
            );
            detections.push(Detection {
                class_name: class_name.to_string(),
                confidence: noise.confidence(0.6, 0.95),
                bbox,
            });
        }

        Ok(detections)
    }
}

/// Pixel box of an upright object of `size` (width, height) standing at
/// `position`, clipped to the image. `None` when out of view.
pub fn project_box(
    pose: &RobotPose,
    position: [f32; 2],
    size: [f32; 2],
    hfov: f32,
    width: u32,
    height: u32,
) -> Option<BoundingBox> {
    let (range, bearing) = pose.range_bearing(position[0], position[1]);
    if range < MIN_RANGE || bearing.abs() >= hfov / 2.0 {
        return None;
    }

    let (w, h) = (width as f32, height as f32);
    let focal = (w / 2.0) / (hfov / 2.0).tan();
    let cx = w / 2.0 - focal * bearing.tan();
    let cy = h / 2.0;
    let half_w = focal * size[0] / range / 2.0;
    let half_h = focal * size[1] / range / 2.0;

    let x1 = (cx - half_w).max(0.0);
    let x2 = (cx + half_w).min(w);
    let y1 = (cy - half_h).max(0.0);
    let y2 = (cy + half_h).min(h);
    if x2 <= x1 || y2 <= y1 {
        return None;
    }
    Some(BoundingBox::new(x1, y1, x2, y2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::devices::mock::SimWorld;
    use approx::assert_relative_eq;
    use parking_lot::Mutex;
    use std::sync::Arc;

    const HFOV: f32 = 70.0 * std::f32::consts::PI / 180.0;

    #[test]
    fn test_projection_straight_ahead() {
        let pose = RobotPose::default();
        let bbox = project_box(&pose, [2.0, 0.0], [0.5, 1.0], HFOV, 640, 480).unwrap();

        let focal = 320.0 / (HFOV / 2.0).tan();
        let (cx, cy) = bbox.center();
        assert_relative_eq!(cx, 320.0, epsilon = 1e-3);
        assert_relative_eq!(cy, 240.0, epsilon = 1e-3);
        assert_relative_eq!(bbox.height(), focal / 2.0, epsilon = 1e-3);
    }

    #[test]
    fn test_projection_left_is_left_of_center() {
        let pose = RobotPose::default();
        let bbox = project_box(&pose, [3.0, 0.5], [0.5, 1.0], HFOV, 640, 480).unwrap();
        assert!(bbox.center().0 < 320.0);
    }

    #[test]
    fn test_projection_out_of_view() {
        let pose = RobotPose::default();
        assert!(project_box(&pose, [-2.0, 0.0], [0.5, 1.0], HFOV, 640, 480).is_none());
        assert!(project_box(&pose, [0.1, 0.0], [0.5, 1.0], HFOV, 640, 480).is_none());
    }

    #[test]
    fn test_detector_sees_target() {
        let config = SimulationConfig {
            detection_dropout: 0.0,
            box_jitter_px: 0.0,
            ..Default::default()
        };
        let world = Arc::new(Mutex::new(SimWorld::new(config, Instant::now())));
        let mut detector = SimDetector::new(world, "chair");
        let frame = Frame {
            width: 640,
            height: 480,
            data: Vec::new(),
            captured_at: Instant::now(),
        };

        let detections = detector.detect(&frame).unwrap();
        assert!(detections.iter().any(|d| d.class_name == "chair"));
        assert!(detections.iter().all(|d| (0.6..0.95).contains(&d.confidence)));
    }

    #[test]
    fn test_closed_camera_yields_nothing() {
        let world = Arc::new(Mutex::new(SimWorld::new(
            SimulationConfig::default(),
            Instant::now(),
        )));
        let mut camera = SimCamera::new(world, Duration::from_secs(2));
        camera.close();
        camera.close();
        assert!(camera.next_frame().is_none());
    }

    #[test]
    fn test_slow_stream_times_out() {
        let config = SimulationConfig {
            frame_rate_hz: 2.0,
            frame_dropout: 0.0,
            ..Default::default()
        };
        let world = Arc::new(Mutex::new(SimWorld::new(config, Instant::now())));
        let mut camera = SimCamera::new(world, Duration::from_millis(50));

        assert!(camera.next_frame().is_some());
        // Next frame is 500 ms away
        assert!(camera.next_frame().is_none());
    }
}
