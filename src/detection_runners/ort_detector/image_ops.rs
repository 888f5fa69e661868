//! Frame preprocessing: rotate upright, letterbox into the model input and
//! normalize to an NHWC float tensor.

use anyhow::{bail, Result};
use fast_image_resize::{
    images::Image as FirImage,
    pixels::PixelType,
    FilterType, ResizeAlg, ResizeOptions, Resizer,
};
use image::{DynamicImage, RgbImage};
use ndarray::{Array, Array3};
use rayon::prelude::*;
use crate::common::Frame;

const INPUT_MEAN: f32 = 0.0;
const INPUT_STD: f32 = 255.0;
const PAD_VALUE: u8 = 0;

/// Placement of the scaled frame inside the model input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub scaled_width: u32,
    pub scaled_height: u32,
    pub left: u32,
    pub top: u32,
}

impl Letterbox {
    /// Uniform scale that fits `src` inside `dst`, centred on the padding.
    pub fn fit(src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> Self {
        let scale = (dst_w as f32 / src_w as f32).min(dst_h as f32 / src_h as f32);
        let scaled_width = ((src_w as f32 * scale).round() as u32).clamp(1, dst_w);
        let scaled_height = ((src_h as f32 * scale).round() as u32).clamp(1, dst_h);
        Self {
            scale,
            scaled_width,
            scaled_height,
            left: (dst_w - scaled_width) / 2,
            top: (dst_h - scaled_height) / 2,
        }
    }
}

/// Produces the `(input_height, input_width, 3)` tensor for one frame.
///
/// The frame is rotated upright, scaled with bilinear filtering, centred on a
/// zero-filled canvas and mapped to `(v - 0) / 255` per RGB channel.
pub fn preprocess(frame: &Frame, input_width: usize, input_height: usize) -> Result<Array3<f32>> {
    if input_width == 0 || input_height == 0 {
        bail!("Model input must be non-empty, got {}x{}", input_width, input_height);
    }
    let (dst_w, dst_h) = (input_width as u32, input_height as u32);

    let upright = DynamicImage::ImageRgba8(frame.upright()).into_rgb8();
    let (w0, h0) = upright.dimensions();
    let letterbox = Letterbox::fit(w0, h0, dst_w, dst_h);

    let scaled = resize_image(upright, letterbox.scaled_width, letterbox.scaled_height)?;
    let padded = pad_image(&scaled, &letterbox, dst_w, dst_h);

    nhwc_normalize(&padded, input_width, input_height)
}

fn resize_image(img: RgbImage, target_w: u32, target_h: u32) -> Result<FirImage<'static>> {
    let (w0, h0) = img.dimensions();
    let src = FirImage::from_vec_u8(w0, h0, img.into_raw(), PixelType::U8x3)?;
    if w0 == target_w && h0 == target_h {
        return Ok(src);
    }

    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));
    let mut dst = FirImage::new(target_w, target_h, PixelType::U8x3);
    Resizer::new().resize(&src, &mut dst, &options)?;
    Ok(dst)
}

fn pad_image(scaled: &FirImage, letterbox: &Letterbox, dst_w: u32, dst_h: u32) -> Vec<u8> {
    let row_in = letterbox.scaled_width as usize * 3;
    let row_out = dst_w as usize * 3;
    let mut padded = vec![PAD_VALUE; row_out * dst_h as usize];

    for (y, row) in scaled.buffer().chunks_exact(row_in).enumerate() {
        let start = (letterbox.top as usize + y) * row_out + letterbox.left as usize * 3;
        padded[start..start + row_in].copy_from_slice(row);
    }
    padded
}

fn nhwc_normalize(buf: &[u8], width: usize, height: usize) -> Result<Array3<f32>> {
    if buf.len() != width * height * 3 {
        bail!("Unexpected buffer size: got {}, expected {}", buf.len(), width * height * 3);
    }

    let data: Vec<f32> = buf
        .par_iter()
        .map(|&v| (v as f32 - INPUT_MEAN) / INPUT_STD)
        .collect();

    Ok(Array::from_shape_vec((height, width, 3), data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Rotation;

    fn solid_frame(width: u32, height: u32, rgba: [u8; 4], rotation: Rotation) -> Frame {
        let pixels = rgba.repeat((width * height) as usize);
        Frame::new(width, height, pixels, rotation)
    }

    #[test]
    fn letterbox_centres_wide_frames() {
        let lb = Letterbox::fit(200, 100, 64, 64);
        assert_eq!((lb.scaled_width, lb.scaled_height), (64, 32));
        assert_eq!((lb.left, lb.top), (0, 16));
    }

    #[test]
    fn output_has_nhwc_shape_and_zero_padding() {
        let frame = solid_frame(200, 100, [255, 255, 255, 255], Rotation::Deg0);
        let tensor = preprocess(&frame, 64, 64).unwrap();
        assert_eq!(tensor.dim(), (64, 64, 3));

        // padding above and below the scaled frame
        assert_eq!(tensor[[0, 10, 0]], 0.0);
        assert_eq!(tensor[[63, 10, 2]], 0.0);
        // scaled content in the middle
        assert!((tensor[[32, 32, 0]] - 1.0).abs() < 0.01);
    }

    #[test]
    fn values_are_scaled_to_unit_range_and_alpha_dropped() {
        let frame = solid_frame(8, 8, [51, 102, 204, 0], Rotation::Deg0);
        let tensor = preprocess(&frame, 8, 8).unwrap();
        assert!((tensor[[4, 4, 0]] - 0.2).abs() < 1e-6);
        assert!((tensor[[4, 4, 1]] - 0.4).abs() < 1e-6);
        assert!((tensor[[4, 4, 2]] - 0.8).abs() < 1e-6);
        assert!(tensor.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn rotation_applies_before_letterbox() {
        // 100x200 portrait sensor rotated by 90 is a 200x100 landscape image
        let frame = solid_frame(100, 200, [255, 0, 0, 255], Rotation::Deg90);
        let tensor = preprocess(&frame, 64, 64).unwrap();
        assert_eq!(tensor[[5, 32, 0]], 0.0);
        assert!((tensor[[32, 32, 0]] - 1.0).abs() < 0.01);
    }
}
