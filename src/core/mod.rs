//! Foundation types shared by perception and control.

pub mod geometry;
pub mod types;

pub use geometry::{BoundingBox, NormalizedRoi, PixelRect, iou};
pub use types::{Candidate, Frame, RangingEstimate, VelocityCommand};
