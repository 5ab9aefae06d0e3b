//! Image-plane geometry: boxes, regions of interest, overlap.

/// Axis-aligned box in pixel coordinates, corners `(x1, y1)`-`(x2, y2)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    #[inline]
    pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// Area, zero for degenerate boxes.
    #[inline]
    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (0.5 * (self.x1 + self.x2), 0.5 * (self.y1 + self.y2))
    }

    /// Intersection-over-union with another box.
    #[inline]
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        iou(self, other)
    }
}

/// Intersection-over-union of two axis-aligned boxes.
///
/// Returns 0 when the boxes are disjoint or both degenerate.
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let ix1 = a.x1.max(b.x1);
    let iy1 = a.y1.max(b.y1);
    let ix2 = a.x2.min(b.x2);
    let iy2 = a.y2.min(b.y2);

    let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
    let union = a.area() + b.area() - inter;

    if union > 0.0 { inter / union } else { 0.0 }
}

/// Rectangle in integer pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelRect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl PixelRect {
    #[inline]
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        (self.x2 - self.x1) as f32
    }

    #[inline]
    pub fn height(&self) -> f32 {
        (self.y2 - self.y1) as f32
    }

    #[inline]
    pub fn center_x(&self) -> f32 {
        0.5 * (self.x1 + self.x2) as f32
    }

    /// Point containment, edges inclusive.
    #[inline]
    pub fn contains(&self, x: f32, y: f32) -> bool {
        self.x1 as f32 <= x && x <= self.x2 as f32 && self.y1 as f32 <= y && y <= self.y2 as f32
    }
}

/// Region of interest in normalized `[0, 1]` image coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedRoi {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl NormalizedRoi {
    /// Scale to a `width` x `height` image, truncating toward zero.
    pub fn to_pixels(&self, width: u32, height: u32) -> PixelRect {
        let w = width as f32;
        let h = height as f32;
        PixelRect {
            x1: (self.x1 * w) as i32,
            y1: (self.y1 * h) as i32,
            x2: (self.x2 * w) as i32,
            y2: (self.y2 * h) as i32,
        }
    }
}
