// THEORY:
// The `classifier` module is the top-level API of the crate. It runs the whole
// two-pass heuristic behind one call:
//
//   frame → red/green purity planes → binary masks → pixel counts → decision
//
// The decision is a two-term rule: enough vivid red pixels must be present at all,
// and red must not be clearly outnumbered by vivid green. A frame that shows a lit
// green lamp next to a few red reflections therefore does not read as a red light.
//
// The classifier holds only its configuration, so one instance can be shared
// across threads and called concurrently on independent frames.

use crate::core_modules::purity_plane::purity_plane::{
    DEFAULT_PURITY_GAIN, DEFAULT_PURITY_SCALE, PurityPlane, PurityWeights, TargetColor,
};
use crate::error::Result;
use std::fmt;
use std::sync::Arc;

// Re-export key data structures for the public API.
pub use crate::core_modules::bgr_image::bgr_image::BgrImage;
pub use crate::core_modules::binary_mask::binary_mask::BinaryMask;

/// Tunable constants of the heuristic. `Default` holds the calibrated values;
/// changing them moves the decision boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    /// Multiplier on the raw purity product.
    pub purity_gain: f64,
    /// Scale from the normalized purity product back to the byte range.
    pub purity_scale: f64,
    /// A purity score must be strictly greater than this to count as vivid.
    pub mask_threshold: u8,
    /// The red count must be strictly greater than this.
    pub min_red_count: usize,
    /// The red count must be at least this fraction of the green count.
    pub red_to_green_ratio: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            purity_gain: DEFAULT_PURITY_GAIN,
            purity_scale: DEFAULT_PURITY_SCALE,
            mask_threshold: 200,
            min_red_count: 10,
            red_to_green_ratio: 0.8,
        }
    }
}

impl ClassifierConfig {
    pub fn weights(&self) -> PurityWeights {
        PurityWeights {
            gain: self.purity_gain,
            scale: self.purity_scale,
        }
    }
}

/// The outcome of one classification, with the counts that drove it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorCounts {
    pub red_count: usize,
    pub green_count: usize,
    pub is_red_light: bool,
}

/// Both thresholded masks for a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorMasks {
    pub red: BinaryMask,
    pub green: BinaryMask,
}

/// Callback handed the counts of every classification.
pub type CountsObserver = Arc<dyn Fn(&ColorCounts) + Send + Sync>;

/// Decides whether a frame shows a vivid red signal that outweighs vivid green.
#[derive(Clone, Default)]
pub struct VividColorRatioClassifier {
    config: ClassifierConfig,
    observer: Option<CountsObserver>,
}

impl fmt::Debug for VividColorRatioClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VividColorRatioClassifier")
            .field("config", &self.config)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl VividColorRatioClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            observer: None,
        }
    }

    /// Registers a callback that receives the counts after every classification.
    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(&ColorCounts) + Send + Sync + 'static,
    {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn classify(&self, image: &BgrImage) -> bool {
        self.analyze(image).is_red_light
    }

    /// Validates a raw interleaved blue-green-red buffer, then classifies it.
    pub fn classify_raw(&self, width: u32, height: u32, channels: usize, bytes: &[u8]) -> Result<bool> {
        let image = BgrImage::from_bytes(width, height, channels, bytes)?;
        Ok(self.classify(&image))
    }

    /// Runs the full heuristic and reports the counts alongside the decision.
    pub fn analyze(&self, image: &BgrImage) -> ColorCounts {
        let masks = self.masks(image);
        let red_count = masks.red.count_on();
        let green_count = masks.green.count_on();
        let counts = ColorCounts {
            red_count,
            green_count,
            is_red_light: self.decide(red_count, green_count),
        };

        tracing::debug!(
            red = counts.red_count,
            green = counts.green_count,
            is_red_light = counts.is_red_light,
            "vivid color counts"
        );
        if let Some(observer) = &self.observer {
            observer(&counts);
        }

        counts
    }

    pub fn planes(&self, image: &BgrImage) -> (PurityPlane, PurityPlane) {
        let weights = self.config.weights();
        (
            PurityPlane::compute(image, TargetColor::Red, weights),
            PurityPlane::compute(image, TargetColor::Green, weights),
        )
    }

    pub fn masks(&self, image: &BgrImage) -> ColorMasks {
        let (red, green) = self.planes(image);
        ColorMasks {
            red: red.threshold(self.config.mask_threshold),
            green: green.threshold(self.config.mask_threshold),
        }
    }

    /// The two-term decision rule on already-counted pixels.
    pub fn decide(&self, red_count: usize, green_count: usize) -> bool {
        red_count > self.config.min_red_count
            && red_count as f64 >= self.config.red_to_green_ratio * green_count as f64
    }
}

/// Classifies a frame with the default configuration.
pub fn classify(image: &BgrImage) -> bool {
    VividColorRatioClassifier::default().classify(image)
}

/// Classifies a raw interleaved blue-green-red buffer with the default configuration.
pub fn classify_raw(width: u32, height: u32, channels: usize, bytes: &[u8]) -> Result<bool> {
    VividColorRatioClassifier::default().classify_raw(width, height, channels, bytes)
}
