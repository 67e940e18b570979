//! ROI 中心计算.
//!
//! 中心定义为每个轴上, 所有非零体素坐标 **去重并排序后** 的中位数.

use either::Either;
use ndarray::{ArrayView2, ArrayView3, ArrayViewD, Axis};
use num::Zero;

use crate::consts::MIDDLE_SLICE;
use crate::{CropError, CropResult, Idx2d, Idx3d};

/// 每个轴上出现过非零体素的坐标, 已去重并升序排列.
///
/// 掩膜全零时, 每个轴对应的 `Vec` 均为空.
pub fn unique_coords<T: Zero>(roi: ArrayViewD<'_, T>) -> Vec<Vec<usize>> {
    let mut seen: Vec<Vec<bool>> = roi.shape().iter().map(|&len| vec![false; len]).collect();
    for (idx, v) in roi.indexed_iter() {
        if !v.is_zero() {
            for (axis, s) in seen.iter_mut().enumerate() {
                s[idx[axis]] = true;
            }
        }
    }
    seen.into_iter()
        .map(|s| {
            s.into_iter()
                .enumerate()
                .filter_map(|(i, hit)| hit.then_some(i))
                .collect()
        })
        .collect()
}

/// 升序序列的整数中位数. 偶数个元素时取中间两数均值并向下取整.
#[inline]
fn median_of_sorted(v: &[usize]) -> Option<usize> {
    let n = v.len();
    (n != 0).then(|| (v[(n - 1) / 2] + v[n / 2]) / 2)
}

/// 计算任意维 ROI 掩膜的中心, 每个轴一个坐标, 轴序与 `roi` 一致.
///
/// 掩膜不含非零体素时返回 [`CropError::EmptyMask`].
pub fn centroid<T: Zero>(roi: ArrayViewD<'_, T>) -> CropResult<Vec<usize>> {
    if roi.ndim() == 0 {
        return Err(CropError::RankMismatch(1, 0));
    }
    unique_coords(roi)
        .iter()
        .map(|c| median_of_sorted(c).ok_or(CropError::EmptyMask))
        .collect()
}

/// 去掉所有长度为 1 的轴.
pub fn squeeze<T>(mut roi: ArrayViewD<'_, T>) -> ArrayViewD<'_, T> {
    while let Some(axis) = roi.shape().iter().position(|&len| len == 1) {
        roi = roi.index_axis_move(Axis(axis), 0);
    }
    roi
}

/// 将压缩后的掩膜视作单张切片 (左) 或切片栈 (右).
fn plane_or_stack<T>(
    roi: ArrayViewD<'_, T>,
) -> CropResult<Either<ArrayView2<'_, T>, ArrayView3<'_, T>>> {
    let roi = squeeze(roi);
    let rank = roi.ndim();
    let rank_err = |_| CropError::RankMismatch(2, rank);
    match rank {
        2 => Ok(Either::Left(roi.into_dimensionality().map_err(rank_err)?)),
        3 => Ok(Either::Right(roi.into_dimensionality().map_err(rank_err)?)),
        n => Err(CropError::RankMismatch(2, n)),
    }
}

/// 计算 2D ROI 中心, 返回 `(h, w)`.
///
/// 掩膜会先被压缩 (去掉长度为 1 的轴). 若此时仍为三维 (多切片 ROI),
/// 则只取第 [`MIDDLE_SLICE`] 张切片计算.
pub fn centroid_2d<T: Zero>(roi: ArrayViewD<'_, T>) -> CropResult<Idx2d> {
    let plane = match plane_or_stack(roi)? {
        Either::Left(plane) => plane,
        Either::Right(stack) => stack.index_axis_move(Axis(0), MIDDLE_SLICE),
    };
    let c = centroid(plane.into_dyn())?;
    Ok((c[0], c[1]))
}

/// 计算 3D ROI 中心, 返回 `(z, h, w)`.
///
/// 掩膜前部多余的单长度轴会被去掉, 直到剩余三维.
pub fn centroid_3d<T: Zero>(mut roi: ArrayViewD<'_, T>) -> CropResult<Idx3d> {
    while roi.ndim() > 3 && roi.len_of(Axis(0)) == 1 {
        roi = roi.index_axis_move(Axis(0), 0);
    }
    if roi.ndim() != 3 {
        return Err(CropError::RankMismatch(3, roi.ndim()));
    }
    let c = centroid(roi)?;
    Ok((c[0], c[1], c[2]))
}
