use std::ops::Range;

use ndarray::{ArrayD, ArrayViewD, IxDyn, Slice};
use num::Zero;

use super::patch::{AxisExtent, BoundPolicy, PatchSize};
use crate::{CropError, CropResult};

/// 单个轴上的提取窗口 `[start, start + len)`, 以源体数据坐标表示.
///
/// `Pad` 策略下 `start` 可能为负, 窗口也可能越过轴末端.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct AxisWindow {
    /// 窗口起点.
    pub start: isize,

    /// 窗口长度, 即块在该轴上的长度.
    pub len: usize,
}

impl AxisWindow {
    /// 窗口终点 (不含).
    #[inline]
    pub fn end(&self) -> isize {
        self.start + self.len as isize
    }

    /// 窗口是否完全落在 `[0, extent)` 内.
    #[inline]
    pub fn is_inside(&self, extent: usize) -> bool {
        self.start >= 0 && self.end() <= extent as isize
    }

    /// 窗口与 `[0, extent)` 的交集. 依次返回源坐标区间和块内坐标区间.
    ///
    /// 交集为空时返回 `None`.
    fn overlap(&self, extent: usize) -> Option<(Range<usize>, Range<usize>)> {
        let lo = self.start.max(0);
        let hi = self.end().min(extent as isize);
        (lo < hi).then(|| {
            let src = lo as usize..hi as usize;
            let dst = (lo - self.start) as usize..(hi - self.start) as usize;
            (src, dst)
        })
    }
}

/// 计算单个轴的提取窗口.
fn plan_axis(
    axis: usize,
    extent: usize,
    patch: AxisExtent,
    center: usize,
    policy: BoundPolicy,
) -> CropResult<AxisWindow> {
    let p = match patch {
        AxisExtent::Full => return Ok(AxisWindow { start: 0, len: extent }),
        AxisExtent::Fixed(p) => p,
    };
    let start = center as isize - (p / 2) as isize;
    match policy {
        BoundPolicy::Pad => Ok(AxisWindow { start, len: p }),
        BoundPolicy::Shift if p > extent => Err(CropError::PatchTooLarge {
            axis,
            patch: p,
            extent,
        }),
        // 平移量最小: 只贴到离得近的那条边.
        BoundPolicy::Shift => Ok(AxisWindow {
            start: start.clamp(0, (extent - p) as isize),
            len: p,
        }),
    }
}

/// 块提取计划.
///
/// 计划只依赖于 (源形状, 块尺寸, 中心, 越界策略), 与体数据内容无关.
/// 因此同一计划作用于图像和与之配准的掩膜时, 两者的偏移必然一致.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BlockPlan {
    source_shape: Vec<usize>,
    windows: Vec<AxisWindow>,
}

impl BlockPlan {
    /// 为形状为 `shape` 的体数据创建提取计划.
    ///
    /// `patch` 与 `center` 的维数都必须等于 `shape.len()`.
    /// 取整轴 ([`AxisExtent::Full`]) 的轴会忽略 `center` 上的对应坐标.
    pub fn new(
        shape: &[usize],
        patch: &PatchSize,
        center: &[usize],
        policy: BoundPolicy,
    ) -> CropResult<Self> {
        let rank = shape.len();
        if patch.rank() != rank {
            return Err(CropError::RankMismatch(rank, patch.rank()));
        }
        if center.len() != rank {
            return Err(CropError::RankMismatch(rank, center.len()));
        }
        let windows = shape
            .iter()
            .zip(patch.extents())
            .zip(center)
            .enumerate()
            .map(|(axis, ((&extent, &p), &c))| plan_axis(axis, extent, p, c, policy))
            .collect::<CropResult<Vec<_>>>()?;
        Ok(Self {
            source_shape: shape.to_vec(),
            windows,
        })
    }

    /// 各轴实际使用的偏移 (窗口起点).
    #[inline]
    pub fn offsets(&self) -> Vec<isize> {
        self.windows.iter().map(|w| w.start).collect()
    }

    /// 各轴窗口.
    #[inline]
    pub fn windows(&self) -> &[AxisWindow] {
        &self.windows
    }

    /// 源体数据形状.
    #[inline]
    pub fn source_shape(&self) -> &[usize] {
        &self.source_shape
    }

    /// 提取结果的形状.
    #[inline]
    pub fn block_shape(&self) -> Vec<usize> {
        self.windows.iter().map(|w| w.len).collect()
    }

    /// 窗口是否完全落在源体数据内 (即不需要补零).
    pub fn is_inside(&self) -> bool {
        self.windows
            .iter()
            .zip(&self.source_shape)
            .all(|(w, &extent)| w.is_inside(extent))
    }

    /// 按照计划从 `volume` 中提取块. 越界部分补零.
    ///
    /// `volume` 的形状必须等于计划的源形状,
    /// 否则返回 [`CropError::ShapeMismatch`].
    pub fn apply<T: Clone + Zero>(&self, volume: ArrayViewD<'_, T>) -> CropResult<ArrayD<T>> {
        if volume.shape() != self.source_shape.as_slice() {
            return Err(CropError::ShapeMismatch(
                "volume".to_string(),
                self.source_shape.clone(),
                volume.shape().to_vec(),
            ));
        }
        if self.is_inside() {
            let block = volume.slice_each_axis(|d| {
                let w = self.windows[d.axis.index()];
                Slice::from(w.start as usize..w.end() as usize)
            });
            return Ok(block.to_owned());
        }

        let mut block = ArrayD::from_elem(IxDyn(&self.block_shape()), T::zero());
        let overlaps: Option<Vec<_>> = self
            .windows
            .iter()
            .zip(&self.source_shape)
            .map(|(w, &extent)| w.overlap(extent))
            .collect();
        // 某个轴上完全越界, 整块都是零.
        let Some(overlaps) = overlaps else {
            return Ok(block);
        };
        block
            .slice_each_axis_mut(|d| Slice::from(overlaps[d.axis.index()].1.clone()))
            .assign(
                &volume.slice_each_axis(|d| Slice::from(overlaps[d.axis.index()].0.clone())),
            );
        Ok(block)
    }
}

/// 以 `center` 为中心, 从 `volume` 中提取尺寸为 `patch` 的块.
///
/// 返回提取结果和各轴实际使用的偏移. 对图像和与之配准的掩膜以相同参数调用,
/// 得到的偏移完全一致.
pub fn extract_block<T: Clone + Zero>(
    volume: ArrayViewD<'_, T>,
    patch: &PatchSize,
    center: &[usize],
    policy: BoundPolicy,
) -> CropResult<(ArrayD<T>, Vec<isize>)> {
    let plan = BlockPlan::new(volume.shape(), patch, center, policy)?;
    let block = plan.apply(volume)?;
    Ok((block, plan.offsets()))
}
