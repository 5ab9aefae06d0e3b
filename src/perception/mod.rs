//! Perception side of the pursuit loop.
//!
//! - `detection`: camera/detector seams and candidate filtering
//! - `target_lock`: single-target IoU tracker
//! - `pursuit`: FOLLOW / APPROACH / HOLD state machine

pub mod detection;
pub mod pursuit;
pub mod target_lock;

pub use detection::{Detection, DetectionFilter, Detector, FrameSource};
pub use pursuit::{PursuitConfig, PursuitStateMachine, approach_errors};
pub use target_lock::{TargetLock, TargetLockConfig};
