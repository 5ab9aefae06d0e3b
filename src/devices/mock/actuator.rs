//! Simulated motion client.

use std::time::Instant;

use crate::core::VelocityCommand;
use crate::error::{LakshyaError, Result};
use crate::io::MotionActuator;

use super::SharedWorld;

/// Applies velocity commands to the simulated robot.
///
/// Like the real client, commands are rejected unless remote-command mode
/// has been enabled.
pub struct SimActuator {
    world: SharedWorld,
    greetings: u32,
}

impl SimActuator {
    pub fn new(world: SharedWorld) -> Self {
        Self {
            world,
            greetings: 0,
        }
    }
}

impl MotionActuator for SimActuator {
    fn move_velocity(&mut self, vx: f32, vy: f32, wz: f32) -> Result<()> {
        let mut world = self.world.lock();
        if !world.remote_mode() {
            return Err(LakshyaError::Actuator(
                "remote command mode is not enabled".to_string(),
            ));
        }
        world.set_command(VelocityCommand { vx, vy, wz }, Instant::now());
        Ok(())
    }

    fn set_remote_command_mode(&mut self, enabled: bool) -> Result<()> {
        tracing::info!(
            "Remote command mode {}",
            if enabled { "enabled" } else { "disabled" }
        );
        self.world.lock().set_remote_mode(enabled, Instant::now());
        Ok(())
    }

    fn greet(&mut self) -> Result<()> {
        self.greetings += 1;
        tracing::info!("Greeting target (#{})", self.greetings);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::devices::mock::SimWorld;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_rejects_without_remote_mode() {
        let world = Arc::new(Mutex::new(SimWorld::new(
            SimulationConfig::default(),
            Instant::now(),
        )));
        let mut actuator = SimActuator::new(Arc::clone(&world));

        assert!(actuator.move_velocity(0.2, 0.0, 0.0).is_err());

        actuator.set_remote_command_mode(true).unwrap();
        actuator.move_velocity(0.2, 0.0, 0.1).unwrap();
        assert_eq!(world.lock().command(), VelocityCommand::planar(0.2, 0.1));

        actuator.set_remote_command_mode(false).unwrap();
        assert!(world.lock().command().is_stop());
    }
}
