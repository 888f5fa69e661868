use image::{imageops, RgbaImage};

const RGBA_CHANNELS: usize = 4;

/// Clockwise rotation that turns the sensor image upright.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn from_degrees(degrees: u32) -> Option<Self> {
        match degrees % 360 {
            0 => Some(Rotation::Deg0),
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            270 => Some(Rotation::Deg270),
            _ => None,
        }
    }

    pub fn degrees(&self) -> u32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// True when the rotation swaps width and height.
    pub fn is_transposed(&self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

/// One camera frame: interleaved RGBA bytes plus the sensor rotation.
#[derive(Debug, Clone)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    rotation: Rotation,
}

impl Frame {
    /// Wraps a raw RGBA buffer.
    ///
    /// # Panics
    ///
    /// If either dimension is zero or `pixels` is not `width * height * 4`
    /// bytes long.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>, rotation: Rotation) -> Self {
        assert!(width > 0 && height > 0, "frame dimensions must be positive, got {width}x{height}");
        let expected = width as usize * height as usize * RGBA_CHANNELS;
        assert_eq!(
            pixels.len(),
            expected,
            "frame buffer length mismatch for {width}x{height} RGBA"
        );

        Self {
            width,
            height,
            pixels,
            rotation,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Dimensions after the rotation has been applied.
    pub fn upright_dimensions(&self) -> (u32, u32) {
        if self.rotation.is_transposed() {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }

    /// Returns the frame rotated upright as an owned image.
    pub fn upright(&self) -> RgbaImage {
        // Length was checked in `new`.
        let raw = RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
            .unwrap_or_else(|| RgbaImage::new(self.width, self.height));

        match self.rotation {
            Rotation::Deg0 => raw,
            Rotation::Deg90 => imageops::rotate90(&raw),
            Rotation::Deg180 => imageops::rotate180(&raw),
            Rotation::Deg270 => imageops::rotate270(&raw),
        }
    }

    /// Gives the pixel buffer back so the capture side can reuse it.
    pub fn into_buffer(self) -> Vec<u8> {
        self.pixels
    }
}

impl From<RgbaImage> for Frame {
    fn from(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self::new(width, height, image.into_raw(), Rotation::Deg0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_from_degrees() {
        assert_eq!(Rotation::from_degrees(90), Some(Rotation::Deg90));
        assert_eq!(Rotation::from_degrees(450), Some(Rotation::Deg90));
        assert_eq!(Rotation::from_degrees(45), None);
        assert_eq!(Rotation::Deg270.degrees(), 270);
    }

    #[test]
    fn upright_swaps_dimensions_for_quarter_turns() {
        let frame = Frame::new(4, 2, vec![0u8; 4 * 2 * 4], Rotation::Deg90);
        assert_eq!(frame.upright_dimensions(), (2, 4));
        assert_eq!(frame.upright().dimensions(), (2, 4));
    }

    #[test]
    fn upright_rotates_clockwise() {
        // 2x1 image: red then blue. A clockwise quarter turn puts red on top.
        let pixels = vec![255, 0, 0, 255, 0, 0, 255, 255];
        let frame = Frame::new(2, 1, pixels, Rotation::Deg90);
        let up = frame.upright();
        assert_eq!(up.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(up.get_pixel(0, 1).0, [0, 0, 255, 255]);
    }

    #[test]
    #[should_panic]
    fn zero_sized_frame_is_rejected() {
        let _ = Frame::new(0, 10, vec![], Rotation::Deg0);
    }

    #[test]
    #[should_panic]
    fn short_buffer_is_rejected() {
        let _ = Frame::new(2, 2, vec![0u8; 3], Rotation::Deg0);
    }
}
