//! Frame acquisition and detector seams, plus candidate filtering.
//!
//! The camera and the detection model live outside this crate. They are
//! reached through `FrameSource` and `Detector`; `DetectionFilter` reduces
//! raw detections to the `Candidate`s of the one class being pursued.

use crate::config::DetectionConfig;
use crate::core::{BoundingBox, Candidate, Frame};
use crate::error::Result;

/// Raw detector output.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub class_name: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// Supplies camera frames.
pub trait FrameSource: Send {
    /// Next frame, or `None` when nothing usable arrived (timeout, decode failure).
    fn next_frame(&mut self) -> Option<Frame>;

    /// Release the camera. Safe to call more than once.
    fn close(&mut self);
}

/// Object detection model.
pub trait Detector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>>;
}

/// Keeps confident, large-enough detections of the target class.
#[derive(Clone, Debug)]
pub struct DetectionFilter {
    target_class: String,
    min_confidence: f32,
    min_box_frac: f32,
}

impl DetectionFilter {
    pub fn new(target_class: impl Into<String>, min_confidence: f32, min_box_frac: f32) -> Self {
        Self {
            target_class: target_class.into(),
            min_confidence,
            min_box_frac,
        }
    }

    pub fn from_config(config: &DetectionConfig) -> Self {
        Self::new(&config.target_class, config.min_conf, config.min_box_frac)
    }

    pub fn target_class(&self) -> &str {
        &self.target_class
    }

    /// Candidates in detector order.
    pub fn candidates(&self, detections: &[Detection], frame_height: u32) -> Vec<Candidate> {
        let min_height = self.min_box_frac * frame_height as f32;
        detections
            .iter()
            .filter(|d| d.class_name == self.target_class)
            .filter(|d| d.confidence >= self.min_confidence)
            .filter(|d| d.bbox.height() >= min_height)
            .map(|d| Candidate::new(d.confidence, d.bbox))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(class_name: &str, confidence: f32, height: f32) -> Detection {
        Detection {
            class_name: class_name.to_string(),
            confidence,
            bbox: BoundingBox::new(10.0, 10.0, 60.0, 10.0 + height),
        }
    }

    #[test]
    fn test_filters_class_confidence_and_size() {
        let filter = DetectionFilter::new("chair", 0.35, 0.05);
        let detections = vec![
            detection("chair", 0.9, 100.0),
            detection("person", 0.95, 200.0),
            detection("chair", 0.2, 100.0),
            detection("chair", 0.6, 10.0),
            detection("chair", 0.35, 30.0),
        ];

        // 480 * 0.05 = 24px minimum height
        let candidates = filter.candidates(&detections, 480);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].confidence, 0.9);
        assert_eq!(candidates[1].confidence, 0.35);
    }

    #[test]
    fn test_empty_detections() {
        let filter = DetectionFilter::from_config(&DetectionConfig::default());
        assert_eq!(filter.target_class(), "chair");
        assert!(filter.candidates(&[], 480).is_empty());
    }
}
