//! Decoding of the channel-major detection tensor into candidate boxes.

use anyhow::{bail, Result};
use ndarray::ArrayView2;
use crate::common::{BoundingBox, ModelConfig, DEFAULT_CONF_THRESHOLD, DEFAULT_MAX_BOX_SIZE, DEFAULT_MIN_BOX_SIZE};
use crate::data::LabelTable;
use crate::detection_runners::forward_pass::CLASS_OFFSET;

const CH_CX: usize = 0;
const CH_CY: usize = 1;
const CH_W: usize = 2;
const CH_H: usize = 3;
const CH_OBJECTNESS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodeParams {
    /// Candidates pass only when objectness is strictly greater.
    pub conf_threshold: f32,
    /// Width and height must lie strictly inside `(min_box_size, max_box_size)`.
    pub min_box_size: f32,
    pub max_box_size: f32,
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            conf_threshold: DEFAULT_CONF_THRESHOLD,
            min_box_size: DEFAULT_MIN_BOX_SIZE,
            max_box_size: DEFAULT_MAX_BOX_SIZE,
        }
    }
}

impl From<&ModelConfig> for DecodeParams {
    fn from(config: &ModelConfig) -> Self {
        Self {
            conf_threshold: config.conf_threshold,
            min_box_size: config.min_box_size,
            max_box_size: config.max_box_size,
        }
    }
}

/// Walks every element of a `(num_channels, num_elements)` output and keeps
/// the ones that clear the objectness threshold and have a plausible size.
///
/// Boxes come out in element order, before suppression.
pub fn decode(output: ArrayView2<f32>, labels: &LabelTable, params: &DecodeParams) -> Result<Vec<BoundingBox>> {
    let (num_channels, num_elements) = output.dim();
    if num_channels <= CLASS_OFFSET {
        bail!("Output has {} channels, at least {} are required", num_channels, CLASS_OFFSET + 1);
    }

    let mut boxes = Vec::new();
    for i in 0..num_elements {
        let confidence = output[[CH_OBJECTNESS, i]];
        if !(confidence > params.conf_threshold) {
            continue;
        }

        let (w, h) = (output[[CH_W, i]], output[[CH_H, i]]);
        if !is_plausible_size(w, params) || !is_plausible_size(h, params) {
            continue;
        }

        let class_id = argmax_class(output, i);
        let Some(class_name) = labels.get(class_id) else {
            log::debug!("Skipping element {}: class {} has no label", i, class_id);
            continue;
        };

        let bbox = BoundingBox::from_cxcy_wh(output[[CH_CX, i]], output[[CH_CY, i]], w, h)
            .with_confidence(confidence)
            .with_class(class_id, class_name);
        boxes.push(bbox);
    }

    Ok(boxes)
}

fn is_plausible_size(v: f32, params: &DecodeParams) -> bool {
    v > params.min_box_size && v < params.max_box_size
}

/// Index of the highest class score for element `i`; the lowest index wins ties.
fn argmax_class(output: ArrayView2<f32>, i: usize) -> usize {
    let (num_channels, _) = output.dim();
    let mut best = 0;
    let mut best_score = output[[CLASS_OFFSET, i]];
    for c in (CLASS_OFFSET + 1)..num_channels {
        let score = output[[c, i]];
        if score > best_score || best_score.is_nan() {
            best = c - CLASS_OFFSET;
            best_score = score;
        }
    }
    best
}
