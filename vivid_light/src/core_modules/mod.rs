pub mod bgr_image;
pub mod binary_mask;
pub mod image_helper;
pub mod pixel;
pub mod purity_plane;
