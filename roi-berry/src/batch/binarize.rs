//! ROI 掩膜二值化.

use std::path::Path;

use log::{info, warn};

use super::{BatchReport, JobError};
use crate::consts::NPY_EXT;
use crate::dataset::{case_ids, case_loader};

/// 批量二值化结果.
#[derive(Debug, Default)]
pub struct BinarizeReport {
    /// 逐病例结果.
    pub batch: BatchReport,

    /// 原始值不全为 0 或 1 的病例 (升序).
    pub non_binary: Vec<String>,
}

/// 将 `src` 下所有掩膜截断到 `[0, 1]` 后写入 `dst/<case>.npy`. 元素类型不变.
///
/// # 注意
///
/// `src` 与 `dst` 相同时会覆盖原文件.
pub fn binarize_dir<P: AsRef<Path>, Q: AsRef<Path>>(
    src: P,
    dst: Q,
) -> Result<BinarizeReport, JobError> {
    let (src, dst) = (src.as_ref(), dst.as_ref());
    let cases = case_ids(src).map_err(|e| JobError::Io(src.to_owned(), e))?;
    std::fs::create_dir_all(dst).map_err(|e| JobError::Io(dst.to_owned(), e))?;

    let mut non_binary = Vec::new();
    let outcomes: Vec<_> = case_loader(cases, src)
        .map(|(case, mask)| {
            let outcome = mask.and_then(|mask| {
                if !mask.is_binary() {
                    warn!("case {case}: mask values are not limited to {{0, 1}}");
                    non_binary.push(case.clone());
                }
                let path = dst.join(format!("{case}.{NPY_EXT}"));
                mask.clip_unit().write_npy(&path)?;
                info!("case {case}: wrote {}", path.display());
                Ok(())
            });
            (case, outcome)
        })
        .collect();
    Ok(BinarizeReport {
        batch: BatchReport::from_outcomes(outcomes),
        non_binary,
    })
}

#[cfg(test)]
mod tests {
    use super::binarize_dir;
    use crate::data::Volume;
    use crate::testing::scratch_dir;
    use ndarray::{arr2, ArrayD, IxDyn};

    #[test]
    fn test_binarize_dir() {
        let tmp = scratch_dir("binarize");
        let dir = tmp.path();
        let src = dir.join("roi");
        std::fs::create_dir_all(&src).unwrap();
        Volume::from(arr2(&[[0u8, 1], [1, 0]]).into_dyn())
            .write_npy(src.join("a.npy"))
            .unwrap();
        Volume::from(arr2(&[[0.0f32, 2.0], [-1.0, 0.5]]).into_dyn())
            .write_npy(src.join("b.npy"))
            .unwrap();

        let report = binarize_dir(&src, dir.join("bin")).unwrap();
        assert_eq!(report.batch.succeeded, vec!["a", "b"]);
        assert_eq!(report.non_binary, vec!["b"]);

        let b = Volume::read_npy(dir.join("bin/b.npy")).unwrap();
        assert_eq!(b.dtype(), "f32");
        let expected = ArrayD::from_shape_vec(IxDyn(&[2, 2]), vec![0.0f32, 1.0, 0.0, 0.5]);
        assert_eq!(b.to_f32(), expected.unwrap());
    }
}
