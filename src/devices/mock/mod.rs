//! Hardware-free pursuit scene.
//!
//! Stands in for the camera, detector, motion client and UWB tag so the
//! pursuit loops can run on a workstation.
//!
//! | Component | Simulation Method |
//! |-----------|-------------------|
//! | Camera | Paced frame stream with random dropouts |
//! | Detector | Pinhole projection of the target and the beacon carrier |
//! | Motion client | Differential-drive integration of commanded velocity |
//! | UWB tag | Circular walk, noisy range/bearing, optional X press |
//!
//! All devices share one `SimWorld` behind a mutex. The world advances lazily:
//! whoever touches it first integrates the robot up to the current instant.
//!
//! Example configuration:
//!
//! ```toml
//! [simulation]
//! seed = 42                  # 0 = random each run
//! target_position = [4.0, 0.6]
//! beacon_radius = 1.5
//! button_press_after_secs = 60.0
//! ```

mod actuator;
mod beacon;
mod camera;
mod noise;
mod physics;

pub use actuator::SimActuator;
pub use beacon::SimBeacon;
pub use camera::{SimCamera, SimDetector, project_box};
pub use noise::NoiseGenerator;
pub use physics::RobotPose;

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::config::{LakshyaConfig, SimulationConfig};
use crate::core::VelocityCommand;

/// Longest interval integrated in one step.
const MAX_STEP: Duration = Duration::from_millis(200);

/// Scene shared by all simulated devices.
pub struct SimWorld {
    config: SimulationConfig,
    pose: RobotPose,
    command: VelocityCommand,
    remote_mode: bool,
    started: Instant,
    last_update: Instant,
    noise: NoiseGenerator,
}

pub type SharedWorld = Arc<Mutex<SimWorld>>;

impl SimWorld {
    /// Robot at the origin facing +X.
    pub fn new(config: SimulationConfig, now: Instant) -> Self {
        let noise = NoiseGenerator::new(config.seed);
        Self {
            config,
            pose: RobotPose::default(),
            command: VelocityCommand::STOP,
            remote_mode: false,
            started: now,
            last_update: now,
            noise,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn pose(&self) -> RobotPose {
        self.pose
    }

    pub fn command(&self) -> VelocityCommand {
        self.command
    }

    pub fn noise(&mut self) -> &mut NoiseGenerator {
        &mut self.noise
    }

    /// Integrate the robot up to `now`.
    pub fn advance(&mut self, now: Instant) {
        let dt = now.saturating_duration_since(self.last_update).min(MAX_STEP);
        if !dt.is_zero() {
            self.pose
                .integrate(self.command.vx, self.command.wz, dt.as_secs_f32());
        }
        self.last_update = self.last_update.max(now);
    }

    /// Apply a new velocity command from `now` on.
    pub fn set_command(&mut self, command: VelocityCommand, now: Instant) {
        self.advance(now);
        self.command = command;
    }

    pub fn remote_mode(&self) -> bool {
        self.remote_mode
    }

    pub fn set_remote_mode(&mut self, enabled: bool, now: Instant) {
        self.remote_mode = enabled;
        if !enabled {
            self.set_command(VelocityCommand::STOP, now);
        }
    }

    /// Time since the scene started.
    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started)
    }

    /// Where the beacon carrier stands at `now`.
    pub fn beacon_position(&self, now: Instant) -> (f32, f32) {
        let angle = self.config.beacon_speed * self.elapsed(now).as_secs_f32();
        let [cx, cy] = self.config.beacon_center;
        (
            cx + self.config.beacon_radius * angle.cos(),
            cy + self.config.beacon_radius * angle.sin(),
        )
    }
}

/// Complete set of simulated devices over one world.
pub struct Simulation {
    pub world: SharedWorld,
    pub camera: SimCamera,
    pub detector: SimDetector,
    pub actuator: SimActuator,
    pub beacon: SimBeacon,
}

impl Simulation {
    pub fn new(config: &LakshyaConfig) -> Self {
        let sim = &config.simulation;
        let world: SharedWorld = Arc::new(Mutex::new(SimWorld::new(sim.clone(), Instant::now())));

        tracing::info!(
            "Simulated scene: target '{}' at ({:.1}, {:.1}), beacon circling ({:.1}, {:.1}) r={:.1}m, seed {}",
            config.detection.target_class,
            sim.target_position[0],
            sim.target_position[1],
            sim.beacon_center[0],
            sim.beacon_center[1],
            sim.beacon_radius,
            sim.seed
        );

        Self {
            camera: SimCamera::new(
                Arc::clone(&world),
                Duration::from_secs_f32(config.camera.timeout_secs),
            ),
            detector: SimDetector::new(Arc::clone(&world), &config.detection.target_class),
            actuator: SimActuator::new(Arc::clone(&world)),
            beacon: SimBeacon::new(Arc::clone(&world)),
            world,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_advance_integrates_command() {
        let t0 = Instant::now();
        let mut world = SimWorld::new(SimulationConfig::default(), t0);
        world.set_command(VelocityCommand::planar(0.5, 0.0), t0);
        world.advance(t0 + Duration::from_millis(100));
        assert_relative_eq!(world.pose().x, 0.05, epsilon = 1e-5);
    }

    #[test]
    fn test_advance_caps_step() {
        let t0 = Instant::now();
        let mut world = SimWorld::new(SimulationConfig::default(), t0);
        world.set_command(VelocityCommand::planar(1.0, 0.0), t0);
        world.advance(t0 + Duration::from_secs(5));
        assert_relative_eq!(world.pose().x, 0.2, epsilon = 1e-5);
    }

    #[test]
    fn test_disabling_remote_mode_stops() {
        let t0 = Instant::now();
        let mut world = SimWorld::new(SimulationConfig::default(), t0);
        world.set_remote_mode(true, t0);
        world.set_command(VelocityCommand::planar(0.3, 0.1), t0);
        world.set_remote_mode(false, t0);
        assert!(world.command().is_stop());
    }

    #[test]
    fn test_beacon_starts_on_circle() {
        let t0 = Instant::now();
        let world = SimWorld::new(SimulationConfig::default(), t0);
        let (x, y) = world.beacon_position(t0);
        assert_relative_eq!(x, 3.5);
        assert_relative_eq!(y, -1.0);
    }
}
