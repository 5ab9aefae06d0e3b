//! Velocity command generation.

pub mod follow;

pub use follow::{FollowConfig, FollowController};
