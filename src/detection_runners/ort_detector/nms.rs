use crate::common::BoundingBox;

pub trait Nms {
    fn iou(&self, other: &Self) -> f32;
    fn confidence(&self) -> f32;
}

impl Nms for BoundingBox {
    /// Computes the intersection over union (IoU) between this bounding box and another.
    fn iou(&self, other: &Self) -> f32 {
        BoundingBox::iou(self, other)
    }

    /// Returns the confidence score of the bounding box.
    fn confidence(&self) -> f32 {
        BoundingBox::confidence(self)
    }
}

/// Greedy, class-agnostic suppression.
///
/// Boxes are ordered by descending confidence (stable, so equal scores keep
/// their input order). A box survives if its IoU with every box already kept
/// is at most `iou_threshold`.
pub fn non_max_suppression<T: Nms>(mut boxes: Vec<T>, iou_threshold: f32) -> Vec<T> {
    boxes.sort_by(|b1, b2| b2.confidence().total_cmp(&b1.confidence()));

    let mut current_index = 0;
    for index in 0..boxes.len() {
        let mut drop = false;
        for prev_index in 0..current_index {
            if boxes[prev_index].iou(&boxes[index]) > iou_threshold {
                drop = true;
                break;
            }
        }
        if !drop {
            boxes.swap(current_index, index);
            current_index += 1;
        }
    }
    boxes.truncate(current_index);
    boxes
}
