// THEORY:
// `BgrImage` is the validated input frame. Camera stacks hand frames around as
// flat byte buffers whose shape and channel order are only implied by position;
// this type makes both explicit. A `BgrImage` can only be built through
// constructors that check the channel count, the dimensions and the buffer
// length, so a value of this type is always a non-empty, tightly packed,
// three-channel, blue-green-red grid.
//
// The frame is immutable once built. The classifier only ever borrows it, and
// every derived plane or mask is a fresh allocation owned by the caller.

pub mod bgr_image {
    use crate::core_modules::pixel::pixel::{CHANNELS, Channel, Pixel};
    use crate::error::{ClassifierError, Result};
    use image::{ColorType, DynamicImage, RgbImage};
    use std::path::Path;

    /// An immutable, validated blue-green-red frame with 8 bits per channel.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct BgrImage {
        width: u32,
        height: u32,
        /// Row-major, interleaved B, G, R bytes.
        data: Vec<Channel>,
    }

    impl BgrImage {
        /// Wraps a raw interleaved buffer, rejecting anything that is not a
        /// non-empty `width * height * 3` blue-green-red buffer.
        pub fn from_raw(width: u32, height: u32, channels: usize, data: Vec<Channel>) -> Result<Self> {
            if channels != CHANNELS {
                return Err(ClassifierError::InvalidImageFormat { channels });
            }
            if width == 0 || height == 0 {
                return Err(ClassifierError::EmptyImage { width, height });
            }

            let expected = (width as usize)
                .saturating_mul(height as usize)
                .saturating_mul(CHANNELS);
            if data.len() != expected {
                return Err(ClassifierError::BufferSizeMismatch {
                    expected,
                    actual: data.len(),
                });
            }

            Ok(Self { width, height, data })
        }

        /// Copies a borrowed buffer into a new frame. See [`BgrImage::from_raw`].
        pub fn from_bytes(width: u32, height: u32, channels: usize, data: &[Channel]) -> Result<Self> {
            Self::from_raw(width, height, channels, data.to_vec())
        }

        /// Builds a frame by evaluating `f(x, y)` for every pixel; `f` returns `[b, g, r]`.
        pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Result<Self>
        where
            F: FnMut(u32, u32) -> [Channel; CHANNELS],
        {
            let mut data = Vec::with_capacity((width as usize) * (height as usize) * CHANNELS);
            for y in 0..height {
                for x in 0..width {
                    data.extend_from_slice(&f(x, y));
                }
            }
            Self::from_raw(width, height, CHANNELS, data)
        }

        /// A frame where every pixel has the same blue, green and red values.
        pub fn filled(width: u32, height: u32, bgr: [Channel; CHANNELS]) -> Result<Self> {
            Self::from_fn(width, height, |_, _| bgr)
        }

        /// Reorders an `image` crate RGB buffer into blue-green-red.
        pub fn from_rgb(image: &RgbImage) -> Result<Self> {
            let (width, height) = image.dimensions();
            let data = image
                .pixels()
                .flat_map(|p| [p[2], p[1], p[0]])
                .collect::<Vec<_>>();
            Self::from_raw(width, height, CHANNELS, data)
        }

        /// Accepts only three-channel decoded images. Deeper RGB formats are
        /// reduced to 8 bits per channel; gray or alpha-carrying images are rejected.
        pub fn from_dynamic(image: &DynamicImage) -> Result<Self> {
            match image.color() {
                ColorType::Rgb8 => match image.as_rgb8() {
                    Some(rgb) => Self::from_rgb(rgb),
                    None => Self::from_rgb(&image.to_rgb8()),
                },
                color if color.channel_count() as usize == CHANNELS => Self::from_rgb(&image.to_rgb8()),
                color => Err(ClassifierError::InvalidImageFormat {
                    channels: color.channel_count() as usize,
                }),
            }
        }

        /// Decodes a still frame from disk. Same channel rules as [`BgrImage::from_dynamic`].
        pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
            let decoded = image::open(path)?;
            Self::from_dynamic(&decoded)
        }

        pub fn width(&self) -> u32 {
            self.width
        }

        pub fn height(&self) -> u32 {
            self.height
        }

        pub fn dimensions(&self) -> (u32, u32) {
            (self.width, self.height)
        }

        pub fn pixel_count(&self) -> usize {
            (self.width as usize) * (self.height as usize)
        }

        /// The raw interleaved B, G, R bytes.
        pub fn as_bytes(&self) -> &[Channel] {
            &self.data
        }

        pub fn get_pixel(&self, x: u32, y: u32) -> Option<Pixel> {
            if x >= self.width || y >= self.height {
                return None;
            }
            let start = ((y as usize) * (self.width as usize) + x as usize) * CHANNELS;
            let bgr = &self.data[start..start + CHANNELS];
            Some(Pixel::new(bgr[0], bgr[1], bgr[2]))
        }

        /// Iterates pixels in row-major order.
        pub fn pixels(&self) -> impl Iterator<Item = Pixel> + '_ {
            self.data
                .chunks_exact(CHANNELS)
                .map(|bgr| Pixel::new(bgr[0], bgr[1], bgr[2]))
        }

        /// Converts back to an `image` crate RGB buffer, e.g. for saving.
        pub fn to_rgb(&self) -> RgbImage {
            RgbImage::from_fn(self.width, self.height, |x, y| {
                let start = ((y as usize) * (self.width as usize) + x as usize) * CHANNELS;
                image::Rgb([self.data[start + 2], self.data[start + 1], self.data[start]])
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::bgr_image::*;
    use crate::error::ClassifierError;
    use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage, RgbaImage};

    #[test]
    fn rejects_wrong_channel_counts() {
        for channels in [1usize, 4] {
            let data = vec![0u8; 2 * 2 * channels];
            let err = BgrImage::from_raw(2, 2, channels, data).unwrap_err();
            assert!(matches!(err, ClassifierError::InvalidImageFormat { channels: c } if c == channels));
        }
    }

    #[test]
    fn rejects_zero_dimensions() {
        let err = BgrImage::from_raw(0, 5, 3, Vec::new()).unwrap_err();
        assert!(matches!(err, ClassifierError::EmptyImage { width: 0, height: 5 }));
        let err = BgrImage::from_raw(5, 0, 3, Vec::new()).unwrap_err();
        assert!(matches!(err, ClassifierError::EmptyImage { width: 5, height: 0 }));
    }

    #[test]
    fn rejects_short_buffers() {
        let err = BgrImage::from_bytes(2, 2, 3, &[0u8; 11]).unwrap_err();
        assert!(matches!(
            err,
            ClassifierError::BufferSizeMismatch { expected: 12, actual: 11 }
        ));
    }

    #[test]
    fn accepts_a_single_pixel() {
        let image = BgrImage::from_bytes(1, 1, 3, &[1, 2, 3]).unwrap();
        assert_eq!(image.dimensions(), (1, 1));
        assert_eq!(image.pixel_count(), 1);
        let pixel = image.get_pixel(0, 0).unwrap();
        assert_eq!((pixel.blue, pixel.green, pixel.red), (1, 2, 3));
        assert!(image.get_pixel(1, 0).is_none());
    }

    #[test]
    fn from_fn_is_row_major() {
        let image = BgrImage::from_fn(3, 2, |x, y| [x as u8, y as u8, 7]).unwrap();
        assert_eq!(&image.as_bytes()[..6], &[0, 0, 7, 1, 0, 7]);
        let pixel = image.get_pixel(2, 1).unwrap();
        assert_eq!((pixel.blue, pixel.green, pixel.red), (2, 1, 7));
        assert_eq!(image.pixels().count(), 6);
    }

    #[test]
    fn rgb_input_is_reordered_to_bgr() {
        let rgb = RgbImage::from_pixel(2, 1, Rgb([200, 100, 50]));
        let image = BgrImage::from_rgb(&rgb).unwrap();
        assert_eq!(image.as_bytes(), &[50, 100, 200, 50, 100, 200]);
        assert_eq!(image.to_rgb(), rgb);
    }

    #[test]
    fn dynamic_images_must_have_three_channels() {
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(2, 2, Luma([9])));
        let err = BgrImage::from_dynamic(&gray).unwrap_err();
        assert!(matches!(err, ClassifierError::InvalidImageFormat { channels: 1 }));

        let rgba = DynamicImage::ImageRgba8(RgbaImage::new(2, 2));
        let err = BgrImage::from_dynamic(&rgba).unwrap_err();
        assert!(matches!(err, ClassifierError::InvalidImageFormat { channels: 4 }));

        let rgb = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([255, 0, 0])));
        let image = BgrImage::from_dynamic(&rgb).unwrap();
        assert_eq!(&image.as_bytes()[..3], &[0, 0, 255]);
    }

    #[test]
    fn open_reads_png_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        RgbImage::from_pixel(4, 3, Rgb([0, 255, 0])).save(&path).unwrap();

        let image = BgrImage::open(&path).unwrap();
        assert_eq!(image.dimensions(), (4, 3));
        assert!(image.pixels().all(|p| p.green == 255 && p.red == 0 && p.blue == 0));
    }

    #[test]
    fn open_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let err = BgrImage::open(dir.path().join("missing.png")).unwrap_err();
        assert!(matches!(err, ClassifierError::Image(_)));
    }
}
