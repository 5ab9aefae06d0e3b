//! Device backends

pub mod mock;
