//! Single-target lock with IoU association.
//!
//! The lock is acquired on the most confident candidate (optionally
//! preferring candidates centered in the region of interest) and then
//! follows that box frame to frame by maximum overlap. Consecutive frames
//! without an acceptable match are counted against a miss budget; once
//! the budget is exceeded the lock drops.

use crate::core::{BoundingBox, Candidate, PixelRect};

/// Configuration for the target lock.
#[derive(Clone, Debug)]
pub struct TargetLockConfig {
    /// Minimum IoU with the previous box to keep the lock (inclusive)
    pub iou_min: f32,
    /// Consecutive misses tolerated; the lock drops on the next one
    pub max_miss_frames: u32,
    /// Prefer candidates centered inside the ROI when acquiring
    pub prefer_roi: bool,
}

impl Default for TargetLockConfig {
    fn default() -> Self {
        Self {
            iou_min: 0.25,
            max_miss_frames: 10,
            prefer_roi: true,
        }
    }
}

/// Tracks one target box across frames.
#[derive(Clone, Debug)]
pub struct TargetLock {
    config: TargetLockConfig,
    bbox: Option<BoundingBox>,
    miss_count: u32,
    active: bool,
}

impl TargetLock {
    pub fn new(config: TargetLockConfig) -> Self {
        Self {
            config,
            bbox: None,
            miss_count: 0,
            active: false,
        }
    }

    /// Current locked box.
    pub fn bbox(&self) -> Option<BoundingBox> {
        self.bbox
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Consecutive frames without an accepted match.
    pub fn miss_count(&self) -> u32 {
        self.miss_count
    }

    pub fn reset(&mut self) {
        self.bbox = None;
        self.miss_count = 0;
        self.active = false;
    }

    /// Lock onto the most confident candidate.
    ///
    /// With ROI preference enabled and `roi` given, only candidates whose
    /// center lies inside `roi` are considered, unless there are none.
    /// Returns false without touching state when `candidates` is empty.
    pub fn acquire(&mut self, candidates: &[Candidate], roi: Option<PixelRect>) -> bool {
        if candidates.is_empty() {
            return false;
        }

        let in_roi: Vec<&Candidate> = match roi {
            Some(rect) if self.config.prefer_roi => candidates
                .iter()
                .filter(|c| {
                    let (cx, cy) = c.bbox.center();
                    rect.contains(cx, cy)
                })
                .collect(),
            _ => Vec::new(),
        };

        let best = if in_roi.is_empty() {
            most_confident(candidates.iter())
        } else {
            most_confident(in_roi.into_iter())
        };

        let Some(best) = best else {
            return false;
        };

        tracing::debug!(
            "Lock acquired: conf={:.2}, box=({:.0},{:.0})-({:.0},{:.0})",
            best.confidence,
            best.bbox.x1,
            best.bbox.y1,
            best.bbox.x2,
            best.bbox.y2
        );

        self.bbox = Some(best.bbox);
        self.miss_count = 0;
        self.active = true;
        true
    }

    /// Associate the lock with this frame's candidates.
    ///
    /// Returns whether the lock is still active afterwards.
    pub fn update(&mut self, candidates: &[Candidate]) -> bool {
        let current = match (self.active, self.bbox) {
            (true, Some(bbox)) => bbox,
            _ => return false,
        };

        let mut best: Option<(f32, BoundingBox)> = None;
        for candidate in candidates {
            let overlap = current.iou(&candidate.bbox);
            if best.is_none_or(|(best_iou, _)| overlap > best_iou) {
                best = Some((overlap, candidate.bbox));
            }
        }

        match best {
            Some((overlap, bbox)) if overlap >= self.config.iou_min => {
                self.bbox = Some(bbox);
                self.miss_count = 0;
            }
            _ => self.record_miss(),
        }

        self.active
    }

    fn record_miss(&mut self) {
        self.miss_count += 1;
        if self.miss_count > self.config.max_miss_frames {
            tracing::debug!("Lock dropped after {} missed frames", self.miss_count);
            self.reset();
        }
    }
}

/// Highest confidence, first occurrence wins ties.
fn most_confident<'a>(candidates: impl Iterator<Item = &'a Candidate>) -> Option<&'a Candidate> {
    candidates.fold(None, |best: Option<&Candidate>, c| match best {
        Some(b) if b.confidence >= c.confidence => Some(b),
        _ => Some(c),
    })
}
