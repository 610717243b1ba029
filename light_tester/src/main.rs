use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use vivid_light::core_modules::image_helper::image_helper;
use vivid_light::{BgrImage, ClassifierConfig, ParallelClassifier, ParallelConfig, VividColorRatioClassifier};

/// Classify still camera frames as showing a red traffic light or not.
#[derive(Parser, Debug)]
#[command(name = "light_tester", version)]
struct Cli {
    /// Still frames to classify (any format the `image` crate decodes).
    #[arg(required = true)]
    frames: Vec<PathBuf>,

    /// Directory to write `<frame>_red.png` / `<frame>_green.png` vivid-pixel masks into.
    #[arg(long)]
    dump_masks: Option<PathBuf>,

    /// Print one JSON object per frame instead of plain text.
    #[arg(long)]
    json: bool,

    /// Drop alpha and expand gray frames to RGB instead of rejecting them.
    #[arg(long)]
    flatten: bool,

    /// Number of classification workers (defaults to the CPU count).
    #[arg(long, env = "VIVID_WORKERS")]
    workers: Option<usize>,

    #[arg(long, env = "VIVID_PURITY_GAIN", default_value_t = 2.0)]
    purity_gain: f64,

    #[arg(long, env = "VIVID_PURITY_SCALE", default_value_t = 256.0)]
    purity_scale: f64,

    /// Purity score a pixel must exceed to count as vivid.
    #[arg(long, env = "VIVID_MASK_THRESHOLD", default_value_t = 200)]
    mask_threshold: u8,

    /// Vivid red pixel count a frame must exceed.
    #[arg(long, env = "VIVID_MIN_RED_COUNT", default_value_t = 10)]
    min_red_count: usize,

    /// Red count must be at least this fraction of the green count.
    #[arg(long, env = "VIVID_RED_TO_GREEN_RATIO", default_value_t = 0.8)]
    red_to_green_ratio: f64,
}

impl Cli {
    fn classifier_config(&self) -> ClassifierConfig {
        ClassifierConfig {
            purity_gain: self.purity_gain,
            purity_scale: self.purity_scale,
            mask_threshold: self.mask_threshold,
            min_red_count: self.min_red_count,
            red_to_green_ratio: self.red_to_green_ratio,
        }
    }

    fn parallel_config(&self) -> ParallelConfig {
        let defaults = ParallelConfig::default();
        ParallelConfig {
            classifier: self.classifier_config(),
            worker_count: self.workers.unwrap_or(defaults.worker_count),
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
struct FrameRow {
    path: String,
    red: usize,
    green: usize,
    red_light: bool,
}

impl FrameRow {
    fn to_line(&self) -> String {
        format!(
            "{} red={} green={} red_light={}",
            self.path, self.red, self.green, self.red_light
        )
    }
}

/// Decodes a frame from disk. Gray and alpha frames are rejected unless
/// `flatten` is set, in which case alpha is dropped and gray is expanded.
fn load_frame(path: &Path, flatten: bool) -> Result<BgrImage> {
    let frame = if flatten {
        let decoded = image::open(path).with_context(|| format!("failed to decode {}", path.display()))?;
        BgrImage::from_rgb(&decoded.to_rgb8())
    } else {
        BgrImage::open(path)
    };
    frame.with_context(|| format!("unusable frame {}", path.display()))
}

/// Mask files are prefixed with the frame's position on the command line, so
/// frames sharing a file name in different directories do not overwrite each other.
fn dump_masks(
    dir: &Path,
    index: usize,
    frame_path: &Path,
    classifier: &VividColorRatioClassifier,
    frame: &BgrImage,
) -> Result<()> {
    let stem = frame_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".to_string());
    let masks = classifier.masks(frame);

    for (color, mask) in [("red", &masks.red), ("green", &masks.green)] {
        let out = dir.join(format!("{index:04}_{stem}_{color}.png"));
        image_helper::save_mask(&out, mask).with_context(|| format!("failed to write {}", out.display()))?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.parallel_config();

    // --- 1. Load frames, skipping the ones that fail ---
    let mut loaded = Vec::with_capacity(cli.frames.len());
    let mut failures = 0usize;
    for (index, path) in cli.frames.iter().enumerate() {
        match load_frame(path, cli.flatten) {
            Ok(frame) => loaded.push((index, path.clone(), frame)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %format!("{e:#}"), "skipping frame");
                failures += 1;
            }
        }
    }

    // --- 2. Optional mask dumps ---
    if let Some(dir) = &cli.dump_masks {
        std::fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
        let classifier = VividColorRatioClassifier::new(config.classifier.clone());
        for (index, path, frame) in &loaded {
            dump_masks(dir, *index, path, &classifier, frame)?;
        }
    }

    // --- 3. Classify ---
    let classifier = ParallelClassifier::new(config);
    let (paths, frames): (Vec<_>, Vec<_>) = loaded.into_iter().map(|(_, path, frame)| (path, frame)).unzip();
    let verdicts = classifier.classify_batch(frames).await?;
    classifier.shutdown().await;

    // --- 4. Report ---
    for (path, verdict) in paths.iter().zip(&verdicts) {
        let row = FrameRow {
            path: path.display().to_string(),
            red: verdict.counts.red_count,
            green: verdict.counts.green_count,
            red_light: verdict.is_red_light(),
        };
        if cli.json {
            println!("{}", serde_json::to_string(&row)?);
        } else {
            println!("{}", row.to_line());
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} frames could not be loaded", cli.frames.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};
    use vivid_light::ClassifierError;

    #[test]
    fn defaults_match_the_library() {
        let cli = Cli::try_parse_from(["light_tester", "a.png"]).unwrap();
        assert_eq!(cli.classifier_config(), ClassifierConfig::default());
        assert_eq!(cli.frames, vec![PathBuf::from("a.png")]);
        assert!(!cli.json);
    }

    #[test]
    fn flags_override_the_config() {
        let cli = Cli::try_parse_from([
            "light_tester",
            "--mask-threshold",
            "150",
            "--min-red-count",
            "3",
            "--workers",
            "2",
            "a.png",
        ])
        .unwrap();
        let config = cli.parallel_config();
        assert_eq!(config.classifier.mask_threshold, 150);
        assert_eq!(config.classifier.min_red_count, 3);
        assert_eq!(config.worker_count, 2);
    }

    #[test]
    fn frames_are_required() {
        assert!(Cli::try_parse_from(["light_tester"]).is_err());
    }

    #[test]
    fn load_frame_rejects_alpha_and_gray_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let rgba_path = dir.path().join("lamp.png");
        RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 128])).save(&rgba_path).unwrap();
        let gray_path = dir.path().join("night.png");
        GrayImage::from_pixel(4, 4, Luma([40])).save(&gray_path).unwrap();

        for path in [&rgba_path, &gray_path] {
            let err = load_frame(path, false).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<ClassifierError>(),
                Some(ClassifierError::InvalidImageFormat { .. })
            ));
        }
    }

    #[test]
    fn flatten_drops_alpha_and_expands_gray() {
        let dir = tempfile::tempdir().unwrap();
        let rgba_path = dir.path().join("lamp.png");
        RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 128])).save(&rgba_path).unwrap();
        let gray_path = dir.path().join("night.png");
        GrayImage::from_pixel(4, 4, Luma([40])).save(&gray_path).unwrap();

        let lamp = load_frame(&rgba_path, true).unwrap();
        assert_eq!(lamp.dimensions(), (4, 4));
        assert!(vivid_light::classify(&lamp));

        let night = load_frame(&gray_path, true).unwrap();
        assert!(night.pixels().all(|p| p.blue == 40 && p.green == 40 && p.red == 40));
    }

    #[test]
    fn flatten_flag_parses() {
        let cli = Cli::try_parse_from(["light_tester", "--flatten", "a.png"]).unwrap();
        assert!(cli.flatten);
    }

    #[test]
    fn load_frame_reads_rgb_frames_strictly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signal.png");
        RgbImage::from_pixel(4, 4, Rgb([255, 0, 0])).save(&path).unwrap();

        let frame = load_frame(&path, false).unwrap();
        assert!(vivid_light::classify(&frame));
    }

    #[test]
    fn load_frame_reports_the_path() {
        let err = load_frame(Path::new("/definitely/not/here.png"), false).unwrap_err();
        assert!(format!("{err:#}").contains("/definitely/not/here.png"));
    }

    #[test]
    fn dump_masks_writes_both_colors() {
        let dir = tempfile::tempdir().unwrap();
        let frame_path = dir.path().join("signal.png");
        RgbImage::from_pixel(3, 3, Rgb([0, 255, 0])).save(&frame_path).unwrap();
        let frame = load_frame(&frame_path, false).unwrap();

        dump_masks(dir.path(), 0, &frame_path, &VividColorRatioClassifier::default(), &frame).unwrap();

        let red = image::open(dir.path().join("0000_signal_red.png")).unwrap().to_luma8();
        let green = image::open(dir.path().join("0000_signal_green.png")).unwrap().to_luma8();
        assert!(red.pixels().all(|p| p[0] == 0));
        assert!(green.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn dump_masks_keeps_same_named_frames_apart() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("masks");
        std::fs::create_dir_all(&out).unwrap();
        for (sub, rgb) in [("a", Rgb([255, 0, 0])), ("b", Rgb([0, 255, 0]))] {
            std::fs::create_dir_all(dir.path().join(sub)).unwrap();
            RgbImage::from_pixel(2, 2, rgb).save(dir.path().join(sub).join("x.png")).unwrap();
        }
        let classifier = VividColorRatioClassifier::default();

        for (index, sub) in ["a", "b"].into_iter().enumerate() {
            let path = dir.path().join(sub).join("x.png");
            let frame = load_frame(&path, false).unwrap();
            dump_masks(&out, index, &path, &classifier, &frame).unwrap();
        }

        let first_red = image::open(out.join("0000_x_red.png")).unwrap().to_luma8();
        let second_red = image::open(out.join("0001_x_red.png")).unwrap().to_luma8();
        assert!(first_red.pixels().all(|p| p[0] == 255));
        assert!(second_red.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn rows_render_as_text_and_json() {
        let row = FrameRow {
            path: "f.png".into(),
            red: 12,
            green: 3,
            red_light: true,
        };
        assert_eq!(row.to_line(), "f.png red=12 green=3 red_light=true");
        assert_eq!(
            serde_json::to_string(&row).unwrap(),
            r#"{"path":"f.png","red":12,"green":3,"red_light":true}"#
        );
    }
}
