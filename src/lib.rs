//! Lakshya - Vision-guided target pursuit for a beacon-following robot
//!
//! The robot normally trails a person carrying a UWB tag. When the camera
//! spots an object of the configured class, the robot breaks off, drives up
//! to it, pauses, and then resumes following.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │               threads/  +  bin/                     │  ← Orchestration
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌──────────────────────────┬──────────────────────────┐
//! │      perception/         │        control/          │  ← Behavior
//! │ (filter, lock, pursuit)  │   (beacon following)     │
//! └──────────────────────────┴──────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │        io/  +  devices/mock  +  shared              │  ← Seams & state
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                     core/                           │  ← Foundation
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Threads
//!
//! - **Perception** (frame rate): camera → detector → `PursuitStateMachine`,
//!   publishes a `BehaviorState` snapshot per frame
//! - **Follow** (25Hz): beacon-following command, replaced by the behavior
//!   override in APPROACH and HOLD, sent to the motion client
//!
//! Both observe one `CancelToken`. On shutdown the follow thread sends a
//! final stop, then the perception thread releases remote-command mode.

// ============================================================================
// Foundation
// ============================================================================
pub mod core;
pub mod error;
pub mod utils;

// ============================================================================
// Configuration and shared state
// ============================================================================
pub mod config;
pub mod shared;

// ============================================================================
// Behavior
// ============================================================================
pub mod control;
pub mod perception;

// ============================================================================
// External seams and backends
// ============================================================================
pub mod devices;
pub mod io;

// ============================================================================
// Orchestration
// ============================================================================
pub mod threads;

// ============================================================================
// Convenience re-exports
// ============================================================================
pub use config::LakshyaConfig;
pub use control::{FollowConfig, FollowController};
pub use crate::core::{BoundingBox, Candidate, Frame, PixelRect, RangingEstimate, VelocityCommand, iou};
pub use error::{LakshyaError, Result};
pub use perception::{PursuitConfig, PursuitStateMachine, TargetLock, TargetLockConfig};
pub use shared::{BehaviorMode, BehaviorState, CancelToken, PursuitContext};
