// THEORY:
// A `PurityPlane` lifts the single-pixel purity heuristic to a whole frame: one
// byte per pixel, scoring how purely that pixel expresses one target color. The
// plane is the first of two passes (score, then threshold). Keeping the score
// around as its own value lets callers inspect or save the intermediate result
// before it is collapsed into a binary mask.

pub mod purity_plane {
    use crate::core_modules::bgr_image::bgr_image::BgrImage;
    use crate::core_modules::binary_mask::binary_mask::BinaryMask;
    use crate::core_modules::pixel::pixel::{Pixel, PurityScore};

    /// The color a purity plane measures.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum TargetColor {
        Red,
        Green,
    }

    impl TargetColor {
        pub fn name(&self) -> &'static str {
            match self {
                TargetColor::Red => "red",
                TargetColor::Green => "green",
            }
        }

        fn score(&self, pixel: &Pixel, weights: &PurityWeights) -> PurityScore {
            match self {
                TargetColor::Red => pixel.red_purity(weights.gain, weights.scale),
                TargetColor::Green => pixel.green_purity(weights.gain, weights.scale),
            }
        }
    }

    /// Calibrated multiplier on the raw purity product.
    pub const DEFAULT_PURITY_GAIN: f64 = 2.0;
    /// Calibrated scale from the normalized product back to the byte range.
    pub const DEFAULT_PURITY_SCALE: f64 = 256.0;

    /// Multipliers applied to the raw purity product before clamping.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct PurityWeights {
        pub gain: f64,
        pub scale: f64,
    }

    impl Default for PurityWeights {
        fn default() -> Self {
            Self {
                gain: DEFAULT_PURITY_GAIN,
                scale: DEFAULT_PURITY_SCALE,
            }
        }
    }

    /// Per-pixel purity scores for one target color, row-major.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct PurityPlane {
        width: u32,
        height: u32,
        target: TargetColor,
        scores: Vec<PurityScore>,
    }

    impl PurityPlane {
        pub fn compute(image: &BgrImage, target: TargetColor, weights: PurityWeights) -> Self {
            let scores = image
                .pixels()
                .map(|pixel| target.score(&pixel, &weights))
                .collect::<Vec<_>>();

            tracing::trace!(
                target_color = target.name(),
                width = image.width(),
                height = image.height(),
                "computed purity plane"
            );

            Self {
                width: image.width(),
                height: image.height(),
                target,
                scores,
            }
        }

        pub fn width(&self) -> u32 {
            self.width
        }

        pub fn height(&self) -> u32 {
            self.height
        }

        pub fn target(&self) -> TargetColor {
            self.target
        }

        pub fn scores(&self) -> &[PurityScore] {
            &self.scores
        }

        pub fn get(&self, x: u32, y: u32) -> Option<PurityScore> {
            if x >= self.width || y >= self.height {
                return None;
            }
            self.scores
                .get((y as usize) * (self.width as usize) + x as usize)
                .copied()
        }

        /// Second pass: marks every score strictly above `cutoff`.
        pub fn threshold(&self, cutoff: PurityScore) -> BinaryMask {
            BinaryMask::from_scores(self.width, self.height, &self.scores, cutoff)
        }
    }
}
