// THEORY:
// This file is the main entry point for the `vivid_light` library crate.
// The public surface is the `classifier` module: a validated `BgrImage` goes in,
// a boolean "red light" verdict (or the counts behind it) comes out. The
// `parallel_classifier` module fans independent frames out to a worker pool for
// callers with many frames to score.
//
// The `core_modules` hold the building blocks of the heuristic (pixel purity,
// purity planes, binary masks) and are public so each pass can be inspected on
// its own, but a typical caller never needs to touch them directly.

pub mod classifier;
pub mod core_modules;
pub mod error;
pub mod parallel_classifier;

pub use classifier::{
    BgrImage, ClassifierConfig, ColorCounts, ColorMasks, VividColorRatioClassifier, classify, classify_raw,
};
pub use error::{ClassifierError, Result};
pub use parallel_classifier::{FrameVerdict, ParallelClassifier, ParallelConfig};
