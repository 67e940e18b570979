//! 强度归一化. 总是在裁剪之后进行.

use std::str::FromStr;

use ndarray::{ArrayD, ArrayViewD};
use ordered_float::OrderedFloat;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 归一化方式.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Normalization {
    /// 线性映射到 `[0, 1]`.
    MinMax,

    /// 零均值, 单位方差.
    ZScore,
}

impl FromStr for Normalization {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "minmax" | "01" => Ok(Self::MinMax),
            "zscore" | "z" => Ok(Self::ZScore),
            _ => Err(format!(
                "`{s}` is not a normalization (expected `minmax` or `zscore`)"
            )),
        }
    }
}

impl Normalization {
    /// 对 `volume` 做归一化.
    #[inline]
    pub fn apply(&self, volume: ArrayViewD<'_, f32>) -> ArrayD<f32> {
        match self {
            Self::MinMax => normalize_01(volume),
            Self::ZScore => normalize_z(volume),
        }
    }
}

/// 线性映射到 `[0, 1]`. 非有限值不参与极值计算.
///
/// 所有值都相同 (或没有有限值) 时返回全零.
pub fn normalize_01(volume: ArrayViewD<'_, f32>) -> ArrayD<f32> {
    let finite = || volume.iter().copied().filter(|v| v.is_finite()).map(OrderedFloat);
    let (Some(lo), Some(hi)) = (finite().min(), finite().max()) else {
        return ArrayD::zeros(volume.raw_dim());
    };
    let (lo, range) = (lo.0, hi.0 - lo.0);
    if range == 0.0 {
        return ArrayD::zeros(volume.raw_dim());
    }
    volume.mapv(|v| (v - lo) / range)
}

/// 零均值、单位方差归一化 (总体标准差). 非有限值不参与统计, 原样保留.
///
/// 标准差为零时只做去均值. 没有有限值时返回全零.
pub fn normalize_z(volume: ArrayViewD<'_, f32>) -> ArrayD<f32> {
    let finite = || volume.iter().copied().filter(|v| v.is_finite());
    let n = finite().count();
    if n == 0 {
        return ArrayD::zeros(volume.raw_dim());
    }
    let mean = finite().map(f64::from).sum::<f64>() / n as f64;
    let var = finite()
        .map(|v| (f64::from(v) - mean).powi(2))
        .sum::<f64>()
        / n as f64;
    let (mean, std) = (mean as f32, var.sqrt() as f32);
    if std == 0.0 || !std.is_finite() {
        return volume.mapv(|v| v - mean);
    }
    volume.mapv(|v| (v - mean) / std)
}

#[cfg(test)]
mod tests {
    use super::{normalize_01, normalize_z, Normalization};
    use ndarray::{arr1, ArrayD};

    fn f32_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_min_max() {
        let v = arr1(&[2.0f32, 4.0, 6.0, f32::NAN]).into_dyn();
        let n: Vec<f32> = normalize_01(v.view()).iter().copied().collect();
        assert!(f32_eq(n[0], 0.0));
        assert!(f32_eq(n[1], 0.5));
        assert!(f32_eq(n[2], 1.0));
        assert!(n[3].is_nan());
    }

    #[test]
    fn test_z_score() {
        let v = arr1(&[1.0f32, 2.0, 3.0, 4.0]).into_dyn();
        let n = normalize_z(v.view());
        assert!(f32_eq(n.sum(), 0.0));
        let var = n.mapv(|x| x * x).mean().unwrap();
        assert!(f32_eq(var, 1.0));
    }

    #[test]
    fn test_z_score_skips_non_finite() {
        let v = arr1(&[1.0f32, 2.0, 3.0, 4.0, f32::NAN]).into_dyn();
        let n: Vec<f32> = normalize_z(v.view()).iter().copied().collect();
        let head = &n[..4];
        assert!(f32_eq(head.iter().sum::<f32>(), 0.0));
        let var = head.iter().map(|x| x * x).sum::<f32>() / 4.0;
        assert!(f32_eq(var, 1.0));
        assert!(n[4].is_nan());
    }

    #[test]
    fn test_constant_volume() {
        let v = ArrayD::<f32>::from_elem(ndarray::IxDyn(&[2, 2]), 7.0);
        for mode in [Normalization::MinMax, Normalization::ZScore] {
            assert!(mode.apply(v.view()).iter().all(|x| *x == 0.0));
        }
    }

    #[test]
    fn test_parse() {
        assert_eq!("zscore".parse::<Normalization>(), Ok(Normalization::ZScore));
        assert_eq!("MinMax".parse::<Normalization>(), Ok(Normalization::MinMax));
        assert!("none".parse::<Normalization>().is_err());
    }
}
