//! 以 ROI 为中心的定长块提取.
//!
//! 所有坐标、形状都按 `(z, h, w)` (3D) 或 `(h, w)` (2D) 的顺序给出.

mod block;
mod centroid;
mod patch;

use ndarray::{ArrayD, ArrayViewD};
use num::Zero;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use block::{extract_block, AxisWindow, BlockPlan};
pub use centroid::{centroid, centroid_2d, centroid_3d, squeeze, unique_coords};
pub use patch::{AxisExtent, BoundPolicy, ParsePatchError, PatchSize};

use crate::{CropError, CropResult, Idx2d};

/// 中心计算方式.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CentroidMode {
    /// 按切片计算 `(h, w)` 中心, 深度方向坐标取 0.
    /// 一般与深度方向取整轴的块尺寸 (如 `-1x80x80`) 搭配使用.
    #[default]
    #[cfg_attr(feature = "serde", serde(alias = "2d"))]
    Plane,

    /// 按体计算 `(z, h, w)` 中心.
    #[cfg_attr(feature = "serde", serde(alias = "3d"))]
    Volume,
}

impl std::str::FromStr for CentroidMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "2d" | "plane" => Ok(Self::Plane),
            "3d" | "volume" => Ok(Self::Volume),
            _ => Err(format!("`{s}` is not a centroid mode (expected `2d` or `3d`)")),
        }
    }
}

/// 检查配准体数据 `name` 的形状是否与 ROI 一致.
pub fn ensure_same_shape(name: &str, roi_shape: &[usize], shape: &[usize]) -> CropResult<()> {
    if roi_shape == shape {
        Ok(())
    } else {
        Err(CropError::ShapeMismatch(
            name.to_string(),
            roi_shape.to_vec(),
            shape.to_vec(),
        ))
    }
}

/// 将切片中心 `(h, w)` 放回 `shape` 的原始轴上.
///
/// `(h, w)` 对应最后两个长度不为 1 的轴, 其余轴坐标取 0.
fn place_plane_center(shape: &[usize], (h, w): Idx2d) -> CropResult<Vec<usize>> {
    let kept: Vec<usize> = (0..shape.len()).filter(|&i| shape[i] != 1).collect();
    let &[.., axis_h, axis_w] = kept.as_slice() else {
        return Err(CropError::RankMismatch(2, kept.len()));
    };
    let mut ans = vec![0; shape.len()];
    ans[axis_h] = h;
    ans[axis_w] = w;
    Ok(ans)
}

/// 中心坐标左侧补零, 直到维数为 `rank`.
///
/// 补出的轴通常在块尺寸中被标记为取整轴, 坐标本身不会被使用.
fn expand_center(center: &[usize], rank: usize) -> CropResult<Vec<usize>> {
    if center.len() > rank {
        return Err(CropError::RankMismatch(rank, center.len()));
    }
    let mut ans = vec![0; rank - center.len()];
    ans.extend_from_slice(center);
    Ok(ans)
}

/// 一个病例的提取结果.
#[derive(Clone, Debug)]
pub struct CaseBlocks<R, T> {
    /// 提取出的 ROI.
    pub roi: ArrayD<R>,

    /// 按输入顺序排列的配准体数据提取结果.
    pub volumes: Vec<ArrayD<T>>,

    /// ROI 中心, 维数与 ROI 一致.
    pub center: Vec<usize>,

    /// 所有提取共用的各轴偏移.
    pub offsets: Vec<isize>,
}

/// 以 ROI 为中心的定长块提取器.
///
/// 先由 ROI 掩膜计算中心, 再以同一计划裁剪 ROI 及所有与之配准的体数据.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CenteredBlockExtractor {
    patch: PatchSize,
    #[cfg_attr(feature = "serde", serde(default))]
    policy: BoundPolicy,
    #[cfg_attr(feature = "serde", serde(default))]
    mode: CentroidMode,
}

impl CenteredBlockExtractor {
    /// 构建提取器.
    #[inline]
    pub fn new(patch: PatchSize, policy: BoundPolicy, mode: CentroidMode) -> Self {
        Self {
            patch,
            policy,
            mode,
        }
    }

    /// 块尺寸.
    #[inline]
    pub fn patch(&self) -> &PatchSize {
        &self.patch
    }

    /// 越界策略.
    #[inline]
    pub fn policy(&self) -> BoundPolicy {
        self.policy
    }

    /// 中心计算方式.
    #[inline]
    pub fn mode(&self) -> CentroidMode {
        self.mode
    }

    /// 计算 `roi` 的中心, 并补齐到 `roi` 的维数.
    pub fn center_of<R: Zero>(&self, roi: ArrayViewD<'_, R>) -> CropResult<Vec<usize>> {
        let rank = roi.ndim();
        match self.mode {
            CentroidMode::Plane => {
                let shape = roi.shape().to_vec();
                place_plane_center(&shape, centroid_2d(roi)?)
            }
            CentroidMode::Volume => {
                let (z, h, w) = centroid_3d(roi)?;
                expand_center(&[z, h, w], rank)
            }
        }
    }

    /// 由 `roi` 得到提取计划. 计划可以直接作用于任何与 ROI 配准的体数据.
    pub fn plan<R: Zero>(&self, roi: ArrayViewD<'_, R>) -> CropResult<(BlockPlan, Vec<usize>)> {
        let center = self.center_of(roi.view())?;
        let plan = BlockPlan::new(roi.shape(), &self.patch, &center, self.policy)?;
        Ok((plan, center))
    }

    /// 联合提取.
    ///
    /// 先检查 `volumes` 中每个体数据的形状都与 `roi` 一致, 否则返回
    /// [`CropError::ShapeMismatch`]; 然后以同一计划裁剪 ROI 及全部体数据.
    pub fn extract_case<'a, R, T, I>(
        &self,
        roi: ArrayViewD<'_, R>,
        volumes: I,
    ) -> CropResult<CaseBlocks<R, T>>
    where
        R: Clone + Zero,
        T: Clone + Zero + 'a,
        I: IntoIterator<Item = (&'a str, ArrayViewD<'a, T>)>,
    {
        let volumes: Vec<_> = volumes.into_iter().collect();
        for (name, v) in volumes.iter() {
            ensure_same_shape(name, roi.shape(), v.shape())?;
        }
        let (plan, center) = self.plan(roi.view())?;
        let blocks = volumes
            .into_iter()
            .map(|(_, v)| plan.apply(v))
            .collect::<CropResult<Vec<_>>>()?;
        Ok(CaseBlocks {
            roi: plan.apply(roi)?,
            volumes: blocks,
            center,
            offsets: plan.offsets(),
        })
    }
}
