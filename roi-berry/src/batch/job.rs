//! 批处理任务描述.

use std::collections::HashSet;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::data::Normalization;
use crate::extract::{BoundPolicy, CenteredBlockExtractor, CentroidMode, PatchSize};

/// 与 ROI 配准的一个模态.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Modality {
    /// 模态名称, 同时也是输出子目录名.
    pub name: String,

    /// 输入目录.
    pub dir: PathBuf,

    /// 裁剪后的归一化方式. 不归一化时保持原元素类型.
    #[cfg_attr(feature = "serde", serde(default))]
    pub normalization: Option<Normalization>,
}

impl Modality {
    /// 构建不做归一化的模态.
    pub fn new<S: Into<String>, P: Into<PathBuf>>(name: S, dir: P) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
            normalization: None,
        }
    }

    /// 指定归一化方式.
    pub fn with_normalization(mut self, normalization: Option<Normalization>) -> Self {
        self.normalization = normalization;
        self
    }
}

fn default_roi_name() -> String {
    String::from("roi")
}

/// 一次完整的批量裁剪任务.
///
/// 可以由命令行参数构建, 也可以从 TOML 文件读取:
///
/// ```toml
/// roi_dir = "/data/roi"
/// out_dir = "/data/cropped"
/// patch = [-1, 80, 80]
/// policy = "shift"
/// mode = "plane"
/// save_roi = true
///
/// [[modalities]]
/// name = "ADC"
/// dir = "/data/ADC"
/// normalization = "minmax"
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CropJob {
    /// ROI 掩膜目录. 病例列表由该目录决定.
    pub roi_dir: PathBuf,

    /// 保存裁剪后 ROI 时使用的子目录名.
    #[cfg_attr(feature = "serde", serde(default = "default_roi_name"))]
    pub roi_name: String,

    /// 与 ROI 配准的模态.
    pub modalities: Vec<Modality>,

    /// 输出根目录.
    pub out_dir: PathBuf,

    /// 块尺寸.
    pub patch: PatchSize,

    /// 越界策略.
    #[cfg_attr(feature = "serde", serde(default))]
    pub policy: BoundPolicy,

    /// 中心计算方式.
    #[cfg_attr(feature = "serde", serde(default))]
    pub mode: CentroidMode,

    /// 是否保存裁剪后的 ROI.
    #[cfg_attr(feature = "serde", serde(default))]
    pub save_roi: bool,

    /// 使用前是否先把 ROI 截断到 `[0, 1]`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub binarize_roi: bool,
}

/// 任务在处理任何病例之前就失败的错误.
#[derive(Debug)]
pub enum JobError {
    /// 目录不存在或无法读取.
    Io(PathBuf, io::Error),

    /// 配置文件格式错误.
    #[cfg(feature = "serde")]
    Toml(toml::de::Error),

    /// 配置内容不合法.
    Invalid(String),
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(path, e) => write!(f, "{}: {e}", path.display()),
            #[cfg(feature = "serde")]
            Self::Toml(e) => write!(f, "bad job file: {e}"),
            Self::Invalid(msg) => write!(f, "invalid job: {msg}"),
        }
    }
}

impl std::error::Error for JobError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(_, e) => Some(e),
            #[cfg(feature = "serde")]
            Self::Toml(e) => Some(e),
            Self::Invalid(_) => None,
        }
    }
}

fn ensure_dir(path: &Path) -> Result<(), JobError> {
    match std::fs::metadata(path) {
        Ok(m) if m.is_dir() => Ok(()),
        Ok(_) => Err(JobError::Invalid(format!(
            "{} is not a directory",
            path.display()
        ))),
        Err(e) => Err(JobError::Io(path.to_owned(), e)),
    }
}

impl CropJob {
    /// 由任务得到提取器.
    #[inline]
    pub fn extractor(&self) -> CenteredBlockExtractor {
        CenteredBlockExtractor::new(self.patch.clone(), self.policy, self.mode)
    }

    /// 第 `case` 个病例中模态 `name` 的输出路径.
    pub fn output_path(&self, name: &str, case: &str) -> PathBuf {
        let mut ans = self.out_dir.join(name);
        ans.push(format!("{case}.{}", crate::consts::NPY_EXT));
        ans
    }

    /// 检查任务本身是否合法: 输入目录存在, 模态名称非空且互不重复.
    pub fn validate(&self) -> Result<(), JobError> {
        if self.patch.rank() == 0 {
            return Err(JobError::Invalid("empty patch size".into()));
        }
        ensure_dir(&self.roi_dir)?;
        let mut names = HashSet::new();
        if self.save_roi {
            names.insert(self.roi_name.as_str());
        }
        for m in self.modalities.iter() {
            if m.name.is_empty() || m.name.contains(&['/', '\\'][..]) {
                return Err(JobError::Invalid(format!("bad modality name `{}`", m.name)));
            }
            if !names.insert(m.name.as_str()) {
                return Err(JobError::Invalid(format!(
                    "duplicated output name `{}`",
                    m.name
                )));
            }
            ensure_dir(&m.dir)?;
        }
        Ok(())
    }

    /// 创建全部输出子目录.
    pub fn create_output_dirs(&self) -> Result<(), JobError> {
        let names = self.modalities.iter().map(|m| m.name.as_str());
        let roi = self.save_roi.then_some(self.roi_name.as_str());
        for name in names.chain(roi) {
            let dir = self.out_dir.join(name);
            std::fs::create_dir_all(&dir).map_err(|e| JobError::Io(dir, e))?;
        }
        Ok(())
    }
}

#[cfg(feature = "serde")]
impl CropJob {
    /// 从 TOML 文本解析任务.
    pub fn from_toml_str(s: &str) -> Result<Self, JobError> {
        toml::from_str(s).map_err(JobError::Toml)
    }

    /// 从 TOML 文件读取任务.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, JobError> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path).map_err(|e| JobError::Io(path.to_owned(), e))?;
        Self::from_toml_str(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::{CropJob, JobError, Modality};
    use crate::extract::{AxisExtent, BoundPolicy, CentroidMode};
    use crate::testing::scratch_dir;

    fn job_in(dir: &std::path::Path) -> CropJob {
        std::fs::create_dir_all(dir.join("roi")).unwrap();
        std::fs::create_dir_all(dir.join("ADC")).unwrap();
        CropJob {
            roi_dir: dir.join("roi"),
            roi_name: "roi".into(),
            modalities: vec![Modality::new("ADC", dir.join("ADC"))],
            out_dir: dir.join("out"),
            patch: "-1x8x8".parse().unwrap(),
            policy: BoundPolicy::Shift,
            mode: CentroidMode::Plane,
            save_roi: true,
            binarize_roi: false,
        }
    }

    #[test]
    fn test_validate() {
        let tmp = scratch_dir("job_validate");
        let dir = tmp.path();
        let mut job = job_in(&dir);
        assert!(job.validate().is_ok());

        job.modalities.push(Modality::new("roi", dir.join("ADC")));
        assert!(matches!(job.validate(), Err(JobError::Invalid(_))));

        job.modalities.pop();
        job.roi_dir = dir.join("nowhere");
        assert!(matches!(job.validate(), Err(JobError::Io(..))));
    }

    #[test]
    fn test_output_dirs() {
        let tmp = scratch_dir("job_output");
        let dir = tmp.path();
        let job = job_in(&dir);
        job.create_output_dirs().unwrap();
        assert!(dir.join("out/ADC").is_dir());
        assert!(dir.join("out/roi").is_dir());
        assert_eq!(job.output_path("ADC", "p1"), dir.join("out/ADC/p1.npy"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_from_toml() {
        let job = CropJob::from_toml_str(
            r#"
            roi_dir = "/data/roi"
            out_dir = "/data/out"
            patch = [-1, 80, 80]
            mode = "volume"

            [[modalities]]
            name = "ADC"
            dir = "/data/ADC"
            normalization = "zscore"

            [[modalities]]
            name = "T2"
            dir = "/data/T2"
            "#,
        )
        .unwrap();
        assert_eq!(job.roi_name, "roi");
        assert_eq!(job.policy, BoundPolicy::Shift);
        assert_eq!(job.mode, CentroidMode::Volume);
        assert_eq!(job.patch.extents()[0], AxisExtent::Full);
        assert_eq!(job.modalities.len(), 2);
        assert_eq!(job.modalities[1].normalization, None);
        assert!(!job.save_roi);

        assert!(CropJob::from_toml_str("patch = [0, 1]").is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_from_toml_mode_alias() {
        let base = "roi_dir = \"r\"\nout_dir = \"o\"\npatch = [-1, 8, 8]\nmodalities = []\n";
        for (text, mode) in [("2d", CentroidMode::Plane), ("3d", CentroidMode::Volume)] {
            let job = CropJob::from_toml_str(&format!("{base}mode = \"{text}\"\n")).unwrap();
            assert_eq!(job.mode, mode);
        }
    }
}
