// THEORY:
// The `BinaryMask` is the collapsed form of a purity plane: every cell is either
// off (0) or on (255). The 0/255 encoding is kept, rather than a bool grid, so a
// mask is directly viewable as a grayscale image when debugging which pixels
// counted as vivid. Counting the "on" cells is the last step before the decision.

pub mod binary_mask {
    use crate::core_modules::pixel::pixel::PurityScore;
    use image::{GrayImage, Luma};

    pub const MASK_OFF: u8 = 0;
    pub const MASK_ON: u8 = 255;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct BinaryMask {
        width: u32,
        height: u32,
        cells: Vec<u8>,
    }

    impl BinaryMask {
        /// Marks each score strictly greater than `cutoff` as on.
        pub fn from_scores(width: u32, height: u32, scores: &[PurityScore], cutoff: PurityScore) -> Self {
            let cells = scores
                .iter()
                .map(|&score| if score > cutoff { MASK_ON } else { MASK_OFF })
                .collect();
            Self { width, height, cells }
        }

        pub fn width(&self) -> u32 {
            self.width
        }

        pub fn height(&self) -> u32 {
            self.height
        }

        pub fn cells(&self) -> &[u8] {
            &self.cells
        }

        pub fn is_on(&self, x: u32, y: u32) -> bool {
            if x >= self.width || y >= self.height {
                return false;
            }
            self.cells[(y as usize) * (self.width as usize) + x as usize] != MASK_OFF
        }

        /// Number of non-zero cells.
        pub fn count_on(&self) -> usize {
            self.cells.iter().filter(|&&cell| cell != MASK_OFF).count()
        }

        pub fn to_gray_image(&self) -> GrayImage {
            GrayImage::from_fn(self.width, self.height, |x, y| {
                Luma([self.cells[(y as usize) * (self.width as usize) + x as usize]])
            })
        }
    }
}
