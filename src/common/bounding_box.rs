use serde::{Deserialize, Serialize};

/// A single detection in normalized image space.
///
/// Corners are clipped into `[0, 1]`; the centre form keeps the raw values
/// the model produced. Boxes are built with the `from_*`/`with_*` chain and
/// are read-only after that.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    cx: f32,
    cy: f32,
    w: f32,
    h: f32,
    confidence: f32,
    class_id: usize,
    class_name: String,
}

/// Clamps `v` into `[lo, hi]`, mapping NaN to `lo`.
pub fn clip(v: f32, lo: f32, hi: f32) -> f32 {
    if v.is_nan() {
        lo
    } else {
        v.clamp(lo, hi)
    }
}

impl BoundingBox {
    /// Builds a box from centre coordinates and size, clipping the corners
    /// into the unit square.
    ///
    /// # Arguments
    ///
    /// * `cx` - The x-coordinate of the horizontal center.
    /// * `cy` - The y-coordinate of the vertical center.
    /// * `w` - The width of the bounding box.
    /// * `h` - The height of the bounding box.
    pub fn from_cxcy_wh(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self {
            x1: clip(cx - w / 2.0, 0., 1.),
            y1: clip(cy - h / 2.0, 0., 1.),
            x2: clip(cx + w / 2.0, 0., 1.),
            y2: clip(cy + h / 2.0, 0., 1.),
            cx,
            cy,
            w,
            h,
            ..Default::default()
        }
    }

    /// Builds a box from its corners. Corners are clipped and ordered, the
    /// centre form is derived from them.
    pub fn from_x1y1_x2y2(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        let (x1, x2) = (clip(x1.min(x2), 0., 1.), clip(x1.max(x2), 0., 1.));
        let (y1, y2) = (clip(y1.min(y2), 0., 1.), clip(y1.max(y2), 0., 1.));
        Self {
            x1,
            y1,
            x2,
            y2,
            cx: (x1 + x2) / 2.,
            cy: (y1 + y2) / 2.,
            w: x2 - x1,
            h: y2 - y1,
            ..Default::default()
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = clip(confidence, 0., 1.);
        self
    }

    pub fn with_class(mut self, class_id: usize, class_name: &str) -> Self {
        self.class_id = class_id;
        self.class_name = class_name.to_string();
        self
    }

    pub fn x1(&self) -> f32 {
        self.x1
    }

    pub fn y1(&self) -> f32 {
        self.y1
    }

    pub fn x2(&self) -> f32 {
        self.x2
    }

    pub fn y2(&self) -> f32 {
        self.y2
    }

    /// Returns the corners as `(x1, y1, x2, y2)`.
    pub fn xy1_xy2(&self) -> (f32, f32, f32, f32) {
        (self.x1, self.y1, self.x2, self.y2)
    }

    /// Returns the unclipped centre form as `(cx, cy, w, h)`.
    pub fn cxy_wh(&self) -> (f32, f32, f32, f32) {
        (self.cx, self.cy, self.w, self.h)
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn class_id(&self) -> usize {
        self.class_id
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Area of the clipped box.
    pub fn area(&self) -> f32 {
        (self.x2 - self.x1) * (self.y2 - self.y1)
    }

    /// Computes the intersection area between this bounding box and another.
    pub fn intersect(&self, other: &BoundingBox) -> f32 {
        let left = self.x1.max(other.x1);
        let right = self.x2.min(other.x2);
        let top = self.y1.max(other.y1);
        let bottom = self.y2.min(other.y2);
        (right - left).max(0.) * (bottom - top).max(0.)
    }

    /// Computes the union area between this bounding box and another.
    pub fn union(&self, other: &BoundingBox) -> f32 {
        self.area() + other.area() - self.intersect(other)
    }

    /// Intersection over union. Zero-area pairs give `0.0`.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let union = self.union(other);
        if union <= 0. {
            return 0.;
        }
        self.intersect(other) / union
    }

    /// Scales the box to a view of `view_width` x `view_height` pixels and
    /// returns `(left, top, right, bottom)`.
    pub fn to_view_rect(&self, view_width: f32, view_height: f32) -> (f32, f32, f32, f32) {
        (
            self.x1 * view_width,
            self.y1 * view_height,
            self.x2 * view_width,
            self.y2 * view_height,
        )
    }

    /// Caption drawn next to the box, e.g. `"phone 0.87"`.
    pub fn label_text(&self) -> String {
        format!("{} {:.2}", self.class_name, self.confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corners(x1: f32, y1: f32, x2: f32, y2: f32) -> BoundingBox {
        BoundingBox::from_x1y1_x2y2(x1, y1, x2, y2)
    }

    #[test]
    fn iou_is_symmetric() {
        let a = corners(0.1, 0.1, 0.5, 0.5);
        let b = corners(0.3, 0.2, 0.7, 0.6);
        assert_eq!(a.iou(&b), b.iou(&a));
        assert!(a.iou(&b) > 0. && a.iou(&b) < 1.);
    }

    #[test]
    fn iou_with_self_is_one() {
        let a = corners(0.2, 0.3, 0.6, 0.9);
        assert!((a.iou(&a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn iou_of_disjoint_boxes_is_zero() {
        let a = corners(0.0, 0.0, 0.2, 0.2);
        let b = corners(0.5, 0.5, 0.9, 0.9);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn iou_of_zero_area_boxes_does_not_divide_by_zero() {
        let a = corners(0.4, 0.4, 0.4, 0.4);
        assert_eq!(a.iou(&a), 0.0);
    }

    #[test]
    fn centre_form_is_clipped_into_unit_square() {
        let b = BoundingBox::from_cxcy_wh(0.05, 0.95, 0.3, 0.4);
        assert_eq!(b.x1(), 0.0);
        assert!((b.x2() - 0.2).abs() < 1e-6);
        assert!((b.y1() - 0.75).abs() < 1e-6);
        assert_eq!(b.y2(), 1.0);
        assert_eq!(b.cxy_wh(), (0.05, 0.95, 0.3, 0.4));
    }

    #[test]
    fn nan_coordinates_clip_to_lower_bound() {
        let b = BoundingBox::from_cxcy_wh(f32::NAN, 0.5, 0.2, 0.2);
        assert_eq!(b.x1(), 0.0);
        assert_eq!(b.x2(), 0.0);
    }

    #[test]
    fn view_rect_and_label() {
        let b = corners(0.25, 0.5, 0.75, 1.0)
            .with_confidence(0.873)
            .with_class(2, "phone");
        assert_eq!(b.to_view_rect(400., 200.), (100., 100., 300., 200.));
        assert_eq!(b.label_text(), "phone 0.87");
        assert_eq!(b.class_id(), 2);
    }
}
