//! 裁剪结果的可视化存储.

use std::path::Path;

use image::{GrayImage, ImageResult, Luma};
use ndarray::{ArrayView2, ArrayViewD, Axis, Ix2};

use super::normalize::normalize_01;
use crate::consts::gray::{BLACK, MASK_BACKGROUND, WHITE};
use crate::{CropError, CropResult};

/// 从 2D 或 3D 数据中取出用于预览的切片. 3D 数据取深度方向正中的切片.
pub fn preview_slice<T>(volume: ArrayViewD<'_, T>) -> CropResult<ArrayView2<'_, T>> {
    let volume_rank = volume.ndim();
    let plane = match volume_rank {
        2 => volume,
        3 => {
            let mid = volume.len_of(Axis(0)) / 2;
            volume.index_axis_move(Axis(0), mid)
        }
        n => return Err(CropError::RankMismatch(3, n)),
    };
    plane
        .into_dimensionality::<Ix2>()
        .map_err(|_| CropError::RankMismatch(2, volume_rank))
}

/// `(h, w)` 是否是前景区域的边缘像素: 自身为前景, 且四邻域中存在背景或越界.
fn is_boundary(roi: &ArrayView2<'_, u8>, (h, w): (usize, usize)) -> bool {
    if roi[(h, w)] == MASK_BACKGROUND {
        return false;
    }
    let (height, width) = roi.dim();
    if h == 0 || w == 0 || h + 1 == height || w + 1 == width {
        return true;
    }
    [(h - 1, w), (h + 1, w), (h, w - 1), (h, w + 1)]
        .into_iter()
        .any(|p| roi[p] == MASK_BACKGROUND)
}

/// 将切片按 `[最小值, 最大值]` 线性映射为 8-bit 灰度图保存到 `path`.
///
/// 若提供 `roi` (形状须与 `slice` 一致), 其边缘像素会画成白色.
pub fn save_preview<P: AsRef<Path>>(
    slice: ArrayView2<'_, f32>,
    roi: Option<ArrayView2<'_, u8>>,
    path: P,
) -> ImageResult<()> {
    let (height, width) = slice.dim();
    let scaled = normalize_01(slice.into_dyn());
    let mut buf = GrayImage::new(width as u32, height as u32);
    // 两者形状相同, 逻辑迭代顺序一致.
    for (((h, w), _), &v) in slice.indexed_iter().zip(scaled.iter()) {
        let gray = if v.is_finite() {
            (v * 255.0).round() as u8
        } else {
            BLACK
        };
        buf.put_pixel(w as u32, h as u32, Luma([gray]));
    }
    if let Some(roi) = roi.filter(|r| r.dim() == (height, width)) {
        for (pos, _) in roi.indexed_iter().filter(|(_, &v)| v != MASK_BACKGROUND) {
            if is_boundary(&roi, pos) {
                buf.put_pixel(pos.1 as u32, pos.0 as u32, Luma([WHITE]));
            }
        }
    }
    buf.save(path)
}
