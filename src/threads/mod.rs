//! Two-thread pursuit architecture.
//!
//! - Perception thread (frame rate): detection, target lock, pursuit behavior
//! - Follow thread (fixed period): beacon following blended with the behavior
//!   override, velocity dispatch
//!
//! The threads share only the `PursuitContext`.

mod follow;
mod perception;

pub use follow::FollowThread;
pub use perception::PerceptionThread;

use std::thread::{self, JoinHandle};

use crate::config::LakshyaConfig;
use crate::control::FollowConfig;
use crate::error::{LakshyaError, Result};
use crate::io::SharedActuator;
use crate::perception::{Detector, FrameSource};
use crate::shared::PursuitContext;

/// Thread handles for the pursuit loops.
pub struct ThreadHandles {
    pub perception: JoinHandle<()>,
    pub follow: JoinHandle<()>,
}

impl ThreadHandles {
    /// Whether either loop has exited.
    pub fn any_finished(&self) -> bool {
        self.perception.is_finished() || self.follow.is_finished()
    }

    /// Join both threads, logging panics.
    pub fn join(self) {
        if let Err(e) = self.follow.join() {
            tracing::error!("Follow thread panicked: {:?}", e);
        }
        if let Err(e) = self.perception.join() {
            tracing::error!("Perception thread panicked: {:?}", e);
        }
    }
}

/// Spawn the perception and follow threads.
pub fn spawn_threads(
    config: &LakshyaConfig,
    context: PursuitContext,
    actuator: SharedActuator,
    frames: Box<dyn FrameSource>,
    detector: Box<dyn Detector>,
) -> Result<ThreadHandles> {
    let follow_config = FollowConfig::from_config(config);
    let follow_context = context.clone();
    let follow_actuator = SharedActuator::clone(&actuator);

    let follow = thread::Builder::new()
        .name("follow".into())
        .spawn(move || {
            let mut follow_thread = FollowThread::new(follow_config, follow_context, follow_actuator);
            follow_thread.run();
        })
        .map_err(|e| LakshyaError::Thread(format!("Failed to spawn follow thread: {}", e)))?;

    let mut perception_thread = PerceptionThread::new(config, context.clone(), actuator, frames, detector);
    let perception = match thread::Builder::new()
        .name("perception".into())
        .spawn(move || perception_thread.run())
    {
        Ok(handle) => handle,
        Err(e) => {
            // Stop the follow thread we already started
            context.cancel.cancel();
            if follow.join().is_err() {
                tracing::error!("Follow thread panicked during startup abort");
            }
            return Err(LakshyaError::Thread(format!(
                "Failed to spawn perception thread: {}",
                e
            )));
        }
    };

    Ok(ThreadHandles { perception, follow })
}
