//! 体数据的读写、归一化与预览.

mod normalize;
mod preview;
mod volume;

pub use normalize::{normalize_01, normalize_z, Normalization};
pub use preview::{preview_slice, save_preview};
pub use volume::{
    is_nifti_path, is_npy_path, nifti_origin, nifti_spacing, open_nifti, BoxedHeader, Geometry,
    Volume,
};
