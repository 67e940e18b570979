//! 按病例批量裁剪.
//!
//! 病例之间互相独立. 单个病例失败只会被记录, 其余病例照常处理.

mod binarize;
mod job;
mod preview;

use std::path::PathBuf;

use log::{debug, info, warn};

pub use binarize::{binarize_dir, BinarizeReport};
pub use job::{CropJob, JobError, Modality};
pub use preview::preview_dir;

use crate::data::Volume;
use crate::dataset::{case_ids, load_case};
use crate::extract::ensure_same_shape;
use crate::{CropError, CropResult};

/// 批处理结果. 两个列表都按病例标识升序排列.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// 成功处理的病例.
    pub succeeded: Vec<String>,

    /// 失败的病例及原因.
    pub failed: Vec<(String, CropError)>,
}

impl BatchReport {
    /// 由逐病例结果汇总.
    pub fn from_outcomes<I, T>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = (String, CropResult<T>)>,
    {
        let mut ans = Self::default();
        for (case, outcome) in outcomes {
            match outcome {
                Ok(_) => ans.succeeded.push(case),
                Err(e) => {
                    warn!("case {case} failed: {e}");
                    ans.failed.push((case, e));
                }
            }
        }
        ans.succeeded.sort_unstable();
        ans.failed.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        ans
    }

    /// 处理的病例总数.
    #[inline]
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// 是否所有病例都成功.
    #[inline]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

impl CropJob {
    /// 处理单个病例, 返回写出的文件.
    ///
    /// 所有模态都读取并通过形状检查后才会开始写文件.
    pub fn run_case(&self, case: &str) -> CropResult<Vec<PathBuf>> {
        let mut roi = load_case(&self.roi_dir, case)?;
        if self.binarize_roi {
            roi = roi.clip_unit();
        }

        let mut volumes = Vec::with_capacity(self.modalities.len());
        for m in self.modalities.iter() {
            let v = load_case(&m.dir, case)?;
            ensure_same_shape(&m.name, roi.shape(), v.shape())?;
            volumes.push((m, v));
        }

        let (plan, center) = roi.plan_as_roi(&self.extractor())?;
        debug!("case {case}: center {center:?}, offsets {:?}", plan.offsets());

        let mut written = Vec::with_capacity(volumes.len() + 1);
        for (m, v) in volumes {
            let block = v.crop(&plan)?;
            let block = match m.normalization {
                Some(n) => Volume::F32(n.apply(block.to_f32().view())),
                None => block,
            };
            let path = self.output_path(&m.name, case);
            block.write_npy(&path)?;
            info!("case {case}: wrote {}", path.display());
            written.push(path);
        }
        if self.save_roi {
            let path = self.output_path(&self.roi_name, case);
            roi.crop(&plan)?.write_npy(&path)?;
            info!("case {case}: wrote {}", path.display());
            written.push(path);
        }
        Ok(written)
    }

    /// 检查任务、创建输出目录并列出病例. 任何一步失败都不会处理病例.
    fn prepare(&self) -> Result<Vec<String>, JobError> {
        self.validate()?;
        let cases = case_ids(&self.roi_dir).map_err(|e| JobError::Io(self.roi_dir.clone(), e))?;
        self.create_output_dirs()?;
        info!(
            "{} cases, patch {}, {:?} policy, {:?} centroid",
            cases.len(),
            self.patch,
            self.policy,
            self.mode
        );
        Ok(cases)
    }

    /// 依次处理 ROI 目录下的所有病例.
    pub fn run(&self) -> Result<BatchReport, JobError> {
        let cases = self.prepare()?;
        let outcomes = cases.into_iter().map(|case| {
            info!("processing case {case}");
            let outcome = self.run_case(&case);
            (case, outcome)
        });
        Ok(BatchReport::from_outcomes(outcomes))
    }

    /// 并行处理所有病例. 结果与 [`CropJob::run`] 相同.
    #[cfg(feature = "rayon")]
    pub fn par_run(&self) -> Result<BatchReport, JobError> {
        use rayon::prelude::*;

        let cases = self.prepare()?;
        let outcomes: Vec<_> = cases
            .into_par_iter()
            .map(|case| {
                info!("processing case {case}");
                let outcome = self.run_case(&case);
                (case, outcome)
            })
            .collect();
        Ok(BatchReport::from_outcomes(outcomes))
    }
}

/// 按 `parallel` 选择顺序或并行运行. 未启用 `rayon` feature 时总是顺序运行.
pub fn run_job(job: &CropJob, parallel: bool) -> Result<BatchReport, JobError> {
    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            if parallel {
                return job.par_run();
            }
        } else {
            if parallel {
                warn!("built without `rayon`, running sequentially");
            }
        }
    }
    job.run()
}

#[cfg(test)]
mod tests {
    use super::{run_job, CropJob, Modality};
    use crate::data::{Normalization, Volume};
    use crate::extract::{BoundPolicy, CentroidMode};
    use crate::testing::scratch_dir;
    use crate::CropError;
    use ndarray::{s, Array3, ArrayD, IxDyn};
    use std::path::Path;

    /// 建立一个含三个病例的小数据集: `p1` 正常, `p2` ROI 为空, `p3` T2 形状不一致.
    fn dataset(dir: &Path) -> CropJob {
        for sub in ["roi", "ADC", "T2"] {
            std::fs::create_dir_all(dir.join(sub)).unwrap();
        }
        let mut roi = Array3::<u8>::zeros((3, 32, 32));
        roi.slice_mut(s![.., 10..14, 20..24]).fill(1);
        let image = Array3::from_shape_fn((3, 32, 32), |(z, h, w)| (z * 1000 + h * 32 + w) as i16);

        let write = |sub: &str, case: &str, v: Volume| {
            v.write_npy(dir.join(sub).join(format!("{case}.npy"))).unwrap();
        };
        write("roi", "p1", roi.clone().into_dyn().into());
        write("ADC", "p1", image.clone().into_dyn().into());
        write("T2", "p1", image.mapv(f32::from).into_dyn().into());

        write("roi", "p2", Array3::<u8>::zeros((3, 32, 32)).into_dyn().into());
        write("ADC", "p2", image.clone().into_dyn().into());
        write("T2", "p2", image.clone().into_dyn().into());

        write("roi", "p3", roi.into_dyn().into());
        write("ADC", "p3", image.into_dyn().into());
        write("T2", "p3", ArrayD::<i16>::zeros(IxDyn(&[3, 32, 31])).into());

        CropJob {
            roi_dir: dir.join("roi"),
            roi_name: "roi".into(),
            modalities: vec![
                Modality::new("ADC", dir.join("ADC")),
                Modality::new("T2", dir.join("T2"))
                    .with_normalization(Some(Normalization::MinMax)),
            ],
            out_dir: dir.join("out"),
            patch: "-1x8x8".parse().unwrap(),
            policy: BoundPolicy::Shift,
            mode: CentroidMode::Plane,
            save_roi: true,
            binarize_roi: false,
        }
    }

    #[test]
    fn test_run_collects_failures() {
        let _ = simple_logger::init_with_level(log::Level::Debug);
        let tmp = scratch_dir("batch_run");
        let dir = tmp.path();
        let job = dataset(&dir);
        let report = run_job(&job, false).unwrap();

        assert_eq!(report.succeeded, vec!["p1"]);
        assert_eq!(report.total(), 3);
        assert!(!report.is_success());
        assert!(matches!(report.failed[0], (ref c, CropError::EmptyMask) if c == "p2"));
        assert!(matches!(
            report.failed[1],
            (ref c, CropError::ShapeMismatch(ref name, _, _)) if c == "p3" && name == "T2"
        ));

        let adc = Volume::read_npy(dir.join("out/ADC/p1.npy")).unwrap();
        assert_eq!(adc.dtype(), "i16");
        assert_eq!(adc.shape(), &[3, 8, 8]);
        // 中心 (11, 21) -> 起点 (7, 17).
        assert_eq!(adc.to_f32()[IxDyn(&[1, 0, 0])], (1000 + 7 * 32 + 17) as f32);

        let t2 = Volume::read_npy(dir.join("out/T2/p1.npy")).unwrap();
        assert_eq!(t2.dtype(), "f32");
        let t2 = t2.to_f32();
        assert_eq!(t2[IxDyn(&[0, 0, 0])], 0.0);
        assert_eq!(t2[IxDyn(&[2, 7, 7])], 1.0);

        let roi = Volume::read_npy(dir.join("out/roi/p1.npy")).unwrap();
        assert_eq!(roi.to_f32().sum(), (3 * 4 * 4) as f32);

        // 失败病例不写出任何文件.
        assert!(!dir.join("out/ADC/p3.npy").exists());
    }

    #[test]
    fn test_run_setup_error() {
        let tmp = scratch_dir("batch_setup");
        let dir = tmp.path();
        let mut job = dataset(&dir);
        job.modalities[0].dir = dir.join("missing");
        assert!(job.run().is_err());
        assert!(!dir.join("out").exists());
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn test_par_run_same_report() {
        let tmp = scratch_dir("batch_par");
        let dir = tmp.path();
        let job = dataset(&dir);
        let report = job.par_run().unwrap();
        assert_eq!(report.succeeded, vec!["p1"]);
        let failed: Vec<_> = report.failed.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(failed, vec!["p2", "p3"]);
    }
}
