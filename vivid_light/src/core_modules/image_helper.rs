// Writes masks and purity planes to disk as 8-bit grayscale PNGs, so the pixels
// that counted as vivid for a frame can be checked by eye.

pub mod image_helper {
    use crate::core_modules::binary_mask::binary_mask::BinaryMask;
    use crate::core_modules::purity_plane::purity_plane::PurityPlane;
    use crate::error::Result;
    use image::ImageEncoder;
    use std::io::BufWriter;
    use std::path::Path;

    fn save_gray(path: &Path, width: u32, height: u32, buffer: &[u8]) -> Result<()> {
        let output = std::fs::File::create(path).map_err(image::ImageError::IoError)?;
        let encoder = image::codecs::png::PngEncoder::new(BufWriter::new(output));

        encoder.write_image(buffer, width, height, image::ExtendedColorType::L8)?;

        Ok(())
    }

    pub fn save_mask<P: AsRef<Path>>(path: P, mask: &BinaryMask) -> Result<()> {
        save_gray(path.as_ref(), mask.width(), mask.height(), mask.cells())
    }

    pub fn save_plane<P: AsRef<Path>>(path: P, plane: &PurityPlane) -> Result<()> {
        save_gray(path.as_ref(), plane.width(), plane.height(), plane.scores())
    }
}
