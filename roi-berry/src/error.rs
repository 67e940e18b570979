//! 运行时错误.

use std::fmt;
use std::io;

use ndarray_npy::{ReadNpyError, WriteNpyError};

/// 单个病例在裁剪流程中可能产生的错误.
///
/// 所有错误都以病例为单位报告, 不会中断整个批处理.
#[derive(Debug)]
pub enum CropError {
    /// ROI 掩膜不含任何非零体素, 无法计算中心.
    EmptyMask,

    /// 配准体数据与 ROI 形状不一致. `(名称, 期望形状, 实际形状)`.
    ShapeMismatch(String, Vec<usize>, Vec<usize>),

    /// `Shift` 策略下, 第 `axis` 轴的块长度 `patch` 超过体数据长度 `extent`.
    PatchTooLarge {
        /// 轴序号.
        axis: usize,

        /// 请求的块长度.
        patch: usize,

        /// 该轴的实际长度.
        extent: usize,
    },

    /// 维数不匹配. 第一个参数代表期望维数, 第二个参数代表实际维数.
    RankMismatch(usize, usize),

    /// `.npy` 文件的元素类型不受支持.
    UnsupportedElement(String),

    /// 读取 `.npy` 错误.
    ReadNpy(ReadNpyError),

    /// 写入 `.npy` 错误.
    WriteNpy(WriteNpyError),

    /// 读取 nifti 错误.
    Nifti(nifti::NiftiError),

    /// 写入预览图像错误.
    Image(image::ImageError),

    /// 其他底层 I/O 错误.
    Io(io::Error),
}

impl fmt::Display for CropError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyMask => write!(f, "ROI mask has no non-zero voxel"),
            Self::ShapeMismatch(name, expected, found) => write!(
                f,
                "volume `{name}` has shape {found:?}, but the ROI has shape {expected:?}"
            ),
            Self::PatchTooLarge {
                axis,
                patch,
                extent,
            } => write!(
                f,
                "patch extent {patch} exceeds length {extent} of axis {axis} under shift policy"
            ),
            Self::RankMismatch(expected, found) => {
                write!(f, "expected rank {expected}, but got rank {found}")
            }
            Self::UnsupportedElement(path) => {
                write!(f, "unsupported npy element type in `{path}`")
            }
            Self::ReadNpy(e) => write!(f, "npy read error: {e}"),
            Self::WriteNpy(e) => write!(f, "npy write error: {e}"),
            Self::Nifti(e) => write!(f, "nifti error: {e}"),
            Self::Image(e) => write!(f, "image error: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for CropError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadNpy(e) => Some(e),
            Self::WriteNpy(e) => Some(e),
            Self::Nifti(e) => Some(e),
            Self::Image(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for CropError {
    #[inline]
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<ReadNpyError> for CropError {
    #[inline]
    fn from(e: ReadNpyError) -> Self {
        Self::ReadNpy(e)
    }
}

impl From<WriteNpyError> for CropError {
    #[inline]
    fn from(e: WriteNpyError) -> Self {
        Self::WriteNpy(e)
    }
}

impl From<nifti::NiftiError> for CropError {
    #[inline]
    fn from(e: nifti::NiftiError) -> Self {
        Self::Nifti(e)
    }
}

impl From<image::ImageError> for CropError {
    #[inline]
    fn from(e: image::ImageError) -> Self {
        Self::Image(e)
    }
}

/// 裁剪流程运行时结果.
pub type CropResult<T> = Result<T, CropError>;
