//! Motion actuator seam.
//!
//! The robot's motion transport (obstacle-avoiding velocity client) is
//! external. Both loops reach it through `SharedActuator`: the follow loop
//! dispatches velocities, the perception loop sends the hold gesture and
//! releases remote-command mode on teardown.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::VelocityCommand;
use crate::error::{LakshyaError, Result};

/// Robot motion interface.
pub trait MotionActuator: Send {
    /// Body-frame velocity command.
    fn move_velocity(&mut self, vx: f32, vy: f32, wz: f32) -> Result<()>;

    /// Hand velocity control to (or take it back from) this client.
    fn set_remote_command_mode(&mut self, enabled: bool) -> Result<()>;

    /// Acknowledgement gesture played while holding at a target.
    fn greet(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Actuator shared by the perception and follow threads.
pub type SharedActuator = Arc<Mutex<Box<dyn MotionActuator>>>;

/// Wrap an actuator for use from several threads.
pub fn create_shared_actuator<A: MotionActuator + 'static>(actuator: A) -> SharedActuator {
    Arc::new(Mutex::new(Box::new(actuator)))
}

/// One recorded actuator call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActuatorCall {
    Move(VelocityCommand),
    RemoteCommandMode(bool),
    Greet,
}

/// Recording actuator for tests and dry runs.
///
/// Clones share the same call log.
#[derive(Clone, Default)]
pub struct MockActuator {
    inner: Arc<Mutex<MockActuatorInner>>,
}

#[derive(Default)]
struct MockActuatorInner {
    calls: Vec<ActuatorCall>,
    fail_moves: bool,
}

impl MockActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `move_velocity` calls fail (they are still recorded).
    pub fn set_fail_moves(&self, fail: bool) {
        self.inner.lock().fail_moves = fail;
    }

    /// All calls so far.
    pub fn calls(&self) -> Vec<ActuatorCall> {
        self.inner.lock().calls.clone()
    }

    /// Velocity commands so far.
    pub fn moves(&self) -> Vec<VelocityCommand> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                ActuatorCall::Move(cmd) => Some(*cmd),
                _ => None,
            })
            .collect()
    }

    /// Forget the recorded calls.
    pub fn clear(&self) {
        self.inner.lock().calls.clear();
    }
}

impl MotionActuator for MockActuator {
    fn move_velocity(&mut self, vx: f32, vy: f32, wz: f32) -> Result<()> {
        let mut inner = self.inner.lock();
        inner
            .calls
            .push(ActuatorCall::Move(VelocityCommand { vx, vy, wz }));
        if inner.fail_moves {
            return Err(LakshyaError::Actuator("injected move failure".to_string()));
        }
        Ok(())
    }

    fn set_remote_command_mode(&mut self, enabled: bool) -> Result<()> {
        self.inner
            .lock()
            .calls
            .push(ActuatorCall::RemoteCommandMode(enabled));
        Ok(())
    }

    fn greet(&mut self) -> Result<()> {
        self.inner.lock().calls.push(ActuatorCall::Greet);
        Ok(())
    }
}
