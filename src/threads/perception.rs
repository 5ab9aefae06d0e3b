//! Perception thread: camera → detector → pursuit state machine.
//!
//! Runs as fast as frames arrive. Each processed frame produces one
//! `BehaviorState` that is published for the follow thread. Transient
//! failures (no frame, detector error) skip the cycle without touching the
//! published state.

use std::time::{Duration, Instant};

use crate::config::LakshyaConfig;
use crate::core::{Frame, NormalizedRoi};
use crate::io::SharedActuator;
use crate::perception::{DetectionFilter, Detector, FrameSource, PursuitStateMachine};
use crate::shared::{BehaviorMode, BehaviorState, PursuitContext};
use crate::utils::{RateMeter, Throttle};

/// Retry delay when the camera returns nothing.
const NO_FRAME_BACKOFF: Duration = Duration::from_millis(10);

/// Bound on waiting for the follow thread's final stop during teardown.
const FOLLOW_STOP_TIMEOUT: Duration = Duration::from_secs(1);

/// Perception thread state and logic.
pub struct PerceptionThread {
    context: PursuitContext,
    actuator: SharedActuator,
    frames: Box<dyn FrameSource>,
    detector: Box<dyn Detector>,
    filter: DetectionFilter,
    machine: PursuitStateMachine,
    roi: NormalizedRoi,
    announce: Throttle,
    greet: Throttle,
    fps: RateMeter,
}

impl PerceptionThread {
    pub fn new(
        config: &LakshyaConfig,
        context: PursuitContext,
        actuator: SharedActuator,
        frames: Box<dyn FrameSource>,
        detector: Box<dyn Detector>,
    ) -> Self {
        let announce_interval = Duration::from_secs_f32(config.behavior.announce_interval_secs);
        Self {
            context,
            actuator,
            frames,
            detector,
            filter: DetectionFilter::from_config(&config.detection),
            machine: PursuitStateMachine::from_config(config),
            roi: config.roi(),
            announce: Throttle::new(announce_interval),
            greet: Throttle::new(announce_interval),
            fps: RateMeter::new(Duration::from_secs(1), Instant::now()),
        }
    }

    /// Run the perception loop until cancelled, then tear down.
    pub fn run(&mut self) {
        tracing::info!(
            "Perception thread started (target class '{}')",
            self.filter.target_class()
        );

        while !self.context.cancel.is_cancelled() {
            let Some(frame) = self.frames.next_frame() else {
                tracing::trace!("No frame available");
                self.context.cancel.sleep(NO_FRAME_BACKOFF);
                continue;
            };
            self.process_frame(&frame, Instant::now());
        }

        self.teardown();
    }

    /// Process one frame. Returns the published state, or `None` if the
    /// cycle was skipped.
    pub fn process_frame(&mut self, frame: &Frame, now: Instant) -> Option<BehaviorState> {
        let roi_px = self.roi.to_pixels(frame.width, frame.height);

        let detections = match self.detector.detect(frame) {
            Ok(detections) => detections,
            Err(e) => {
                tracing::warn!("Detection failed, skipping frame: {}", e);
                return None;
            }
        };
        let candidates = self.filter.candidates(&detections, frame.height);
        tracing::debug!(
            "{} detections, {} candidates",
            detections.len(),
            candidates.len()
        );

        let state = self.machine.step(&candidates, roi_px, now);
        self.context.behavior.publish(state);

        self.announce_mode(&state, now);
        if state.mode == BehaviorMode::Hold
            && self.greet.ready(now)
            && let Err(e) = self.actuator.lock().greet()
        {
            tracing::warn!("Greet gesture failed: {}", e);
        }
        if let Some(fps) = self.fps.tick(now) {
            tracing::debug!("Perception rate: {:.1} fps", fps);
        }

        Some(state)
    }

    /// Log the current mode at most once per announce interval. Returns
    /// whether a line was written.
    fn announce_mode(&mut self, state: &BehaviorState, now: Instant) -> bool {
        if !self.announce.ready(now) {
            return false;
        }
        tracing::info!(
            "Mode: {} (vx={:.2}, wz={:.2})",
            state.mode,
            state.vx,
            state.wz
        );
        true
    }

    pub fn machine(&self) -> &PursuitStateMachine {
        &self.machine
    }

    fn teardown(&mut self) {
        tracing::info!("Perception thread shutting down");
        self.frames.close();

        if !self.context.wait_follow_stopped(FOLLOW_STOP_TIMEOUT) {
            tracing::warn!("Follow thread did not confirm its final stop");
        }

        if let Err(e) = self.actuator.lock().set_remote_command_mode(false) {
            tracing::error!("Failed to disable remote command mode: {}", e);
        }
    }
}
