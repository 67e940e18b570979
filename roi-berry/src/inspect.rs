//! 数据集检查: ROI 尺度统计与配准形状核对.

use std::path::{Path, PathBuf};

use itertools::Itertools;
use log::{info, warn};

use crate::consts::GEOMETRY_TOLERANCE;
use crate::data::{Geometry, Volume};
use crate::dataset::{case_ids, case_loader, load_case_with_geometry};
use crate::{CropError, CropResult};

/// ROI 在各轴上的跨度 (非零坐标的最大值减最小值).
///
/// 空掩膜返回 [`CropError::EmptyMask`].
pub fn roi_extent(roi: &Volume) -> CropResult<Vec<usize>> {
    roi.unique_coords()
        .into_iter()
        .map(|v| match (v.first(), v.last()) {
            (Some(lo), Some(hi)) => Ok(hi - lo),
            _ => Err(CropError::EmptyMask),
        })
        .collect()
}

/// 一个目录下所有 ROI 的跨度统计.
#[derive(Debug, Default)]
pub struct ExtentSurvey {
    /// 病例及其各轴跨度, 按病例标识升序.
    pub extents: Vec<(String, Vec<usize>)>,

    /// 无法统计的病例.
    pub failed: Vec<(String, CropError)>,
}

impl ExtentSurvey {
    /// 第 `axis` 轴上的全部跨度 (升序). 维数不足的病例被忽略.
    pub fn sorted_spans(&self, axis: usize) -> Vec<usize> {
        self.extents
            .iter()
            .filter_map(|(_, e)| e.get(axis).copied())
            .sorted_unstable()
            .collect()
    }

    /// 第 `axis` 轴上跨度最大的病例. 并列时取标识最小者.
    pub fn largest(&self, axis: usize) -> Option<(&str, usize)> {
        self.extents
            .iter()
            .filter_map(|(c, e)| Some((c.as_str(), *e.get(axis)?)))
            .rev()
            .max_by_key(|(_, span)| *span)
    }

    /// 所有病例中的最大维数.
    pub fn rank(&self) -> usize {
        self.extents.iter().map(|(_, e)| e.len()).max().unwrap_or(0)
    }
}

/// 统计 `dir` 下所有 ROI 的跨度.
pub fn survey_extents<P: AsRef<Path>>(dir: P) -> std::io::Result<ExtentSurvey> {
    let dir = dir.as_ref();
    let mut ans = ExtentSurvey::default();
    for (case, roi) in case_loader(case_ids(dir)?, dir) {
        match roi.and_then(|roi| roi_extent(&roi)) {
            Ok(e) => ans.extents.push((case, e)),
            Err(e) => {
                warn!("case {case}: {e}");
                ans.failed.push((case, e));
            }
        }
    }
    info!("surveyed {} ROIs in {}", ans.extents.len(), dir.display());
    Ok(ans)
}

/// 某病例中各数据的形状. 第一项总是 ROI.
pub type CaseShapes = Vec<(String, Vec<usize>)>;

/// 某病例中各 nifti 数据的几何信息.
pub type CaseGeometries = Vec<(String, Geometry)>;

/// 配准核对结果.
#[derive(Debug, Default)]
pub struct ShapeAudit {
    /// 核对过的病例数.
    pub checked: usize,

    /// 形状不一致的病例.
    pub mismatched: Vec<(String, CaseShapes)>,

    /// 体素间距或原点不一致的病例. 只比较 nifti 文件.
    pub geometry_mismatched: Vec<(String, CaseGeometries)>,

    /// 读取失败的 `(病例, 数据名称, 错误)`.
    pub failed: Vec<(String, String, CropError)>,
}

impl ShapeAudit {
    /// 是否所有病例均一致且可读.
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.mismatched.is_empty() && self.geometry_mismatched.is_empty() && self.failed.is_empty()
    }
}

/// 对 `roi_dir` 下每个病例, 核对 ROI 与 `modalities` 中各模态的形状,
/// 以及 nifti 文件之间的体素间距和原点.
///
/// `.npy` 文件不携带几何信息, 只参与形状核对.
pub fn audit_shapes<P: AsRef<Path>>(
    roi_dir: P,
    modalities: &[(String, PathBuf)],
) -> std::io::Result<ShapeAudit> {
    let roi_dir = roi_dir.as_ref();
    let mut ans = ShapeAudit::default();
    for case in case_ids(roi_dir)? {
        let sources = std::iter::once(("roi", roi_dir))
            .chain(modalities.iter().map(|(n, d)| (n.as_str(), d.as_path())));
        let mut shapes = CaseShapes::new();
        let mut geometries = CaseGeometries::new();
        for (name, dir) in sources {
            match load_case_with_geometry(dir, &case) {
                Ok((v, geometry)) => {
                    shapes.push((name.to_string(), v.shape().to_vec()));
                    if let Some(g) = geometry {
                        geometries.push((name.to_string(), g));
                    }
                }
                Err(e) => {
                    warn!("case {case}: cannot read {name}: {e}");
                    ans.failed.push((case.clone(), name.to_string(), e));
                }
            }
        }
        if !shapes.iter().map(|(_, s)| s).all_equal() {
            warn!("case {case}: shapes differ");
            ans.mismatched.push((case.clone(), shapes));
        }
        let same_geometry = geometries
            .split_first()
            .map_or(true, |((_, first), rest)| {
                rest.iter().all(|(_, g)| first.approx_eq(g, GEOMETRY_TOLERANCE))
            });
        if !same_geometry {
            warn!("case {case}: spacing or origin differ");
            ans.geometry_mismatched.push((case, geometries));
        }
        ans.checked += 1;
    }
    Ok(ans)
}

#[cfg(test)]
mod tests {
    use super::{audit_shapes, roi_extent, survey_extents};
    use crate::data::Volume;
    use crate::testing::{scratch_dir, write_nifti};
    use crate::CropError;
    use ndarray::{s, Array3, ArrayD, IxDyn};

    fn mask(z: std::ops::Range<usize>, h: std::ops::Range<usize>) -> Volume {
        let mut m = Array3::<u8>::zeros((4, 16, 16));
        m.slice_mut(s![z, h, 2..5]).fill(1);
        m.into_dyn().into()
    }

    #[test]
    fn test_roi_extent() {
        assert_eq!(roi_extent(&mask(1..3, 4..10)).unwrap(), vec![1, 5, 2]);
        let empty = Volume::from(ArrayD::<u8>::zeros(IxDyn(&[2, 2])));
        assert!(matches!(roi_extent(&empty), Err(CropError::EmptyMask)));
    }

    #[test]
    fn test_survey() {
        let tmp = scratch_dir("survey");
        let dir = tmp.path();
        mask(0..4, 4..6).write_npy(dir.join("a.npy")).unwrap();
        mask(1..2, 0..16).write_npy(dir.join("b.npy")).unwrap();
        mask(0..4, 4..12).write_npy(dir.join("c.npy")).unwrap();
        Volume::from(ArrayD::<u8>::zeros(IxDyn(&[2, 2])))
            .write_npy(dir.join("d.npy"))
            .unwrap();

        let survey = survey_extents(&dir).unwrap();
        assert_eq!(survey.rank(), 3);
        assert_eq!(survey.sorted_spans(1), vec![1, 7, 15]);
        assert_eq!(survey.largest(1), Some(("b", 15)));
        // 并列时取标识最小者.
        assert_eq!(survey.largest(0), Some(("a", 3)));
        assert_eq!(survey.failed.len(), 1);
        assert_eq!(survey.failed[0].0, "d");
    }

    #[test]
    fn test_audit_shapes() {
        let tmp = scratch_dir("audit");
        let dir = tmp.path();
        for sub in ["roi", "ADC"] {
            std::fs::create_dir_all(dir.join(sub)).unwrap();
        }
        for case in ["p1", "p2", "p3"] {
            mask(0..1, 0..1)
                .write_npy(dir.join("roi").join(format!("{case}.npy")))
                .unwrap();
        }
        let good = Volume::from(ArrayD::<f32>::zeros(IxDyn(&[4, 16, 16])));
        good.write_npy(dir.join("ADC/p1.npy")).unwrap();
        Volume::from(ArrayD::<f32>::zeros(IxDyn(&[4, 16, 15])))
            .write_npy(dir.join("ADC/p2.npy"))
            .unwrap();

        let audit = audit_shapes(dir.join("roi"), &[("ADC".into(), dir.join("ADC"))]).unwrap();
        assert_eq!(audit.checked, 3);
        assert!(!audit.is_clean());
        assert_eq!(audit.mismatched.len(), 1);
        assert_eq!(audit.mismatched[0].0, "p2");
        assert_eq!(audit.mismatched[0].1[1], ("ADC".to_string(), vec![4, 16, 15]));
        assert_eq!(audit.failed.len(), 1);
        assert_eq!((audit.failed[0].0.as_str(), audit.failed[0].1.as_str()), ("p3", "ADC"));
        assert!(audit.geometry_mismatched.is_empty());
    }

    #[test]
    fn test_audit_nifti_geometry() {
        let tmp = scratch_dir("audit_nifti");
        let dir = tmp.path();
        for sub in ["roi", "T2"] {
            std::fs::create_dir_all(dir.join(sub)).unwrap();
        }
        // [w, h, z]
        let data = Array3::<f32>::ones((6, 5, 3));
        let origin = [1.0, 2.0, 3.0];
        for case in ["p1", "p2"] {
            write_nifti(&dir.join(format!("roi/{case}.nii")), &data, [0.7, 0.7, 3.0], origin);
        }
        write_nifti(&dir.join("T2/p1.nii"), &data, [0.7, 0.7, 3.0], origin);
        write_nifti(&dir.join("T2/p2.nii.gz"), &data, [0.7, 0.7, 5.0], origin);

        let audit = audit_shapes(dir.join("roi"), &[("T2".into(), dir.join("T2"))]).unwrap();
        assert_eq!(audit.checked, 2);
        assert!(audit.mismatched.is_empty());
        assert!(audit.failed.is_empty());
        assert!(!audit.is_clean());
        assert_eq!(audit.geometry_mismatched.len(), 1);
        let (case, geometries) = &audit.geometry_mismatched[0];
        assert_eq!(case, "p2");
        assert_eq!(geometries[0].1.spacing, vec![3.0, 0.7, 0.7]);
        assert_eq!(geometries[1].0, "T2");
        assert_eq!(geometries[1].1.spacing, vec![5.0, 0.7, 0.7]);
    }
}
