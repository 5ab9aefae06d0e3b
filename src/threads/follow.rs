//! Follow thread: fixed-rate velocity dispatch.
//!
//! Every period this thread:
//! - Copies the latest behavior snapshot and beacon estimate
//! - Computes the blended command
//! - Sends it to the actuator (failures are logged, never fatal)
//!
//! On cancellation it sends a single zero-velocity command and exits.

use std::time::{Duration, Instant};

use crate::control::{FollowConfig, FollowController};
use crate::core::VelocityCommand;
use crate::io::SharedActuator;
use crate::shared::PursuitContext;
use crate::utils::Throttle;

/// Follow thread state and logic.
pub struct FollowThread {
    controller: FollowController,
    context: PursuitContext,
    actuator: SharedActuator,
    failure_log: Throttle,
    failures: u32,
}

impl FollowThread {
    pub fn new(config: FollowConfig, context: PursuitContext, actuator: SharedActuator) -> Self {
        Self {
            controller: FollowController::new(config),
            context,
            actuator,
            failure_log: Throttle::new(Duration::from_secs(1)),
            failures: 0,
        }
    }

    /// Run the follow loop until cancelled.
    pub fn run(&mut self) {
        let period = self.controller.config().period;
        tracing::info!(
            "Follow thread started ({:.0} ms period)",
            period.as_secs_f32() * 1000.0
        );

        let mut next_tick = Instant::now();
        while !self.context.cancel.is_cancelled() {
            self.tick();

            next_tick += period;
            let now = Instant::now();
            if next_tick > now {
                if self.context.cancel.sleep(next_tick - now) {
                    break;
                }
            } else {
                // Overran the period; restart the schedule from now
                next_tick = now;
            }
        }

        tracing::info!("Follow thread shutting down");
        self.send_stop();
        self.context.mark_follow_stopped();
    }

    /// One control step; returns the command that was dispatched.
    pub fn tick(&mut self) -> VelocityCommand {
        let behavior = self.context.behavior.snapshot();
        let ranging = self.context.ranging.latest();
        let command = self.controller.command(&behavior, ranging);

        tracing::trace!(
            "Follow tick: mode={}, vx={:.3}, wz={:.3}",
            behavior.mode,
            command.vx,
            command.wz
        );

        self.dispatch(command);
        command
    }

    fn dispatch(&mut self, command: VelocityCommand) {
        let result = self
            .actuator
            .lock()
            .move_velocity(command.vx, command.vy, command.wz);

        if let Err(e) = result {
            self.failures += 1;
            if self.failure_log.ready(Instant::now()) {
                tracing::warn!(
                    "Failed to send velocity command ({} failures so far): {}",
                    self.failures,
                    e
                );
            }
        }
    }

    /// Send the final zero-velocity command.
    fn send_stop(&mut self) {
        let stop = VelocityCommand::STOP;
        if let Err(e) = self.actuator.lock().move_velocity(stop.vx, stop.vy, stop.wz) {
            tracing::error!("Failed to send stop command: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RangingEstimate;
    use crate::io::{ActuatorCall, MockActuator, create_shared_actuator};
    use crate::shared::{BehaviorMode, BehaviorState};

    fn setup() -> (FollowThread, PursuitContext, MockActuator) {
        let mock = MockActuator::new();
        let context = PursuitContext::new();
        let config = FollowConfig {
            period: Duration::from_millis(5),
            ..Default::default()
        };
        let thread = FollowThread::new(config, context.clone(), create_shared_actuator(mock.clone()));
        (thread, context, mock)
    }

    #[test]
    fn test_tick_dispatches_baseline() {
        let (mut thread, context, mock) = setup();
        context.ranging.store(RangingEstimate {
            distance_est: 2.0,
            orientation_est: 0.0,
        });

        let command = thread.tick();
        assert_eq!(command, VelocityCommand::planar(0.9, 0.0));
        assert_eq!(mock.moves(), vec![VelocityCommand::planar(0.9, 0.0)]);
    }

    #[test]
    fn test_tick_uses_override() {
        let (mut thread, context, mock) = setup();
        context.ranging.store(RangingEstimate {
            distance_est: 2.0,
            orientation_est: 0.5,
        });
        context.behavior.publish(BehaviorState {
            mode: BehaviorMode::Hold,
            ..Default::default()
        });

        thread.tick();
        assert_eq!(mock.moves(), vec![VelocityCommand::STOP]);
    }

    #[test]
    fn test_dispatch_failure_is_contained() {
        let (mut thread, _context, mock) = setup();
        mock.set_fail_moves(true);

        thread.tick();
        thread.tick();
        assert_eq!(thread.failures, 2);
        assert_eq!(mock.moves().len(), 2);
    }

    #[test]
    fn test_cancel_sends_single_stop() {
        let (mut thread, context, mock) = setup();
        context.cancel.cancel();

        thread.run();

        assert_eq!(mock.calls(), vec![ActuatorCall::Move(VelocityCommand::STOP)]);
        assert!(context.is_follow_stopped());
    }
}
