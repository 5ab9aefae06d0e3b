//! Differential-drive kinematics for the simulated robot.

use crate::utils::normalize_angle;

/// Robot pose in the world frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RobotPose {
    /// X position (meters)
    pub x: f32,
    /// Y position (meters)
    pub y: f32,
    /// Heading (radians, CCW from +X)
    pub theta: f32,
}

impl RobotPose {
    pub fn new(x: f32, y: f32, theta: f32) -> Self {
        Self {
            x,
            y,
            theta: normalize_angle(theta),
        }
    }

    /// Advance by `dt` seconds at forward speed `vx` and yaw rate `wz`.
    pub fn integrate(&mut self, vx: f32, wz: f32, dt: f32) {
        if wz.abs() < 1e-6 {
            self.x += vx * self.theta.cos() * dt;
            self.y += vx * self.theta.sin() * dt;
        } else {
            // Exact arc
            let r = vx / wz;
            let theta = self.theta + wz * dt;
            self.x += r * (theta.sin() - self.theta.sin());
            self.y += r * (self.theta.cos() - theta.cos());
            self.theta = normalize_angle(theta);
        }
    }

    /// Range and relative bearing to a world point.
    pub fn range_bearing(&self, x: f32, y: f32) -> (f32, f32) {
        let dx = x - self.x;
        let dy = y - self.y;
        let range = (dx * dx + dy * dy).sqrt();
        let bearing = normalize_angle(dy.atan2(dx) - self.theta);
        (range, bearing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_straight_line() {
        let mut pose = RobotPose::default();
        pose.integrate(0.5, 0.0, 2.0);
        assert_relative_eq!(pose.x, 1.0);
        assert_relative_eq!(pose.y, 0.0);
    }

    #[test]
    fn test_quarter_arc() {
        let mut pose = RobotPose::default();
        // Radius 1 m, quarter turn
        pose.integrate(FRAC_PI_2, FRAC_PI_2, 1.0);
        assert_relative_eq!(pose.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(pose.y, 1.0, epsilon = 1e-5);
        assert_relative_eq!(pose.theta, FRAC_PI_2, epsilon = 1e-5);
    }

    #[test]
    fn test_range_bearing() {
        let pose = RobotPose::new(1.0, 1.0, FRAC_PI_2);
        let (range, bearing) = pose.range_bearing(1.0, 3.0);
        assert_relative_eq!(range, 2.0);
        assert_relative_eq!(bearing, 0.0, epsilon = 1e-6);

        let (_, bearing) = pose.range_bearing(0.0, 1.0);
        assert_relative_eq!(bearing, FRAC_PI_2, epsilon = 1e-6);
    }
}
