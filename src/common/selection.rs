use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use image::{imageops, DynamicImage, RgbaImage};
use crate::common::{BoundingBox, DetectionResult, Frame};
use crate::data::FsAccess;

/// Pixel rectangle inside the upright frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    /// Scales a normalized box to an image of `img_width` x `img_height`
    /// pixels. The rectangle always lies inside the image and is at least one
    /// pixel in each direction.
    pub fn from_normalized(bbox: &BoundingBox, img_width: u32, img_height: u32) -> Self {
        let (x, width) = Self::axis(bbox.x1(), bbox.x2(), img_width);
        let (y, height) = Self::axis(bbox.y1(), bbox.y2(), img_height);
        Self { x, y, width, height }
    }

    fn axis(lo: f32, hi: f32, extent: u32) -> (u32, u32) {
        let start = ((lo * extent as f32) as u32).min(extent.saturating_sub(1));
        let len = (((hi - lo) * extent as f32) as u32)
            .min(extent - start)
            .max(1);
        (start, len)
    }
}

/// The detection promoted by the user, with the matching image region.
#[derive(Debug, Clone)]
pub struct Selection {
    pub bbox: BoundingBox,
    pub rect: CropRect,
    pub crop: RgbaImage,
}

/// Picks the most confident box of `result` and crops it out of `frame`.
/// Ties go to the first box. Returns `None` when there is nothing to select.
pub fn select_best(result: &DetectionResult, frame: &Frame) -> Option<Selection> {
    let mut best: Option<&BoundingBox> = None;
    for bbox in result.boxes.iter() {
        match best {
            Some(b) if bbox.confidence() <= b.confidence() => {}
            _ => best = Some(bbox),
        }
    }
    let bbox = best?.clone();

    let upright = frame.upright();
    let rect = CropRect::from_normalized(&bbox, upright.width(), upright.height());
    let crop = imageops::crop_imm(&upright, rect.x, rect.y, rect.width, rect.height).to_image();

    log::debug!(
        "Selected {} at {}x{}+{}+{}",
        bbox.label_text(), rect.width, rect.height, rect.x, rect.y
    );

    Some(Selection { bbox, rect, crop })
}

impl Selection {
    /// Writes the crop as a JPEG. Alpha is dropped.
    pub fn save_jpeg<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let rgb = DynamicImage::ImageRgba8(self.crop.clone()).to_rgb8();
        rgb.save_with_format(path.as_ref(), image::ImageFormat::Jpeg)?;
        Ok(())
    }

    /// Writes the crop into the cache directory and returns its path. Falls
    /// back to the working directory on platforms without a cache directory.
    pub fn save_to_cache(&self) -> anyhow::Result<PathBuf> {
        let dir = FsAccess::Cache
            .path_with_subs(&["captures"])
            .or_else(|err| {
                log::warn!("Cache directory unavailable ({err}), using the working directory");
                FsAccess::Current.path_with_subs(&["captures"])
            })?;
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let path = dir.join(format!("detected_{millis}.jpg"));
        self.save_jpeg(&path)?;
        log::info!("Saved selection to {}", path.display());
        Ok(path)
    }
}
