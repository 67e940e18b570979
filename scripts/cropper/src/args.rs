//! 命令行参数.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use roi_berry::batch::{CropJob, JobError, Modality};
use roi_berry::consts::PLANE_PATCH;
use roi_berry::{BoundPolicy, CentroidMode, Normalization, PatchSize};
use utils::loader;

/// 以 ROI 为中心裁剪医学影像定长块.
#[derive(Parser, Debug)]
#[command(name = "roi-crop", version)]
pub struct Cli {
    /// 子命令.
    #[command(subcommand)]
    pub command: Command,

    /// 输出更多日志. 可重复.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// 只输出警告与错误.
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// 子命令.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// 按病例批量裁剪 ROI 及其配准模态.
    Crop(CropArgs),
    /// 批量将 ROI 掩膜截断到 [0, 1].
    Binarize(BinarizeArgs),
    /// 统计 ROI 跨度并核对配准形状.
    Inspect(InspectArgs),
    /// 为体数据生成中间切片预览图.
    Preview(PreviewArgs),
}

/// 解析 `名称=目录` 形式的模态.
fn parse_modality(s: &str) -> Result<(String, PathBuf), String> {
    match s.split_once('=') {
        Some((name, dir)) if !name.trim().is_empty() && !dir.trim().is_empty() => {
            Ok((name.trim().to_string(), PathBuf::from(dir.trim())))
        }
        _ => Err(format!("`{s}` is not a modality (expected `NAME=DIR`)")),
    }
}

#[derive(Args, Debug)]
pub struct CropArgs {
    /// TOML 任务文件. 给出时忽略其余任务参数.
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// ROI 掩膜目录. 默认为 `$ROI_DIR` 或 `{数据集根目录}/roi`.
    #[arg(long = "roi-dir")]
    roi_dir: Option<PathBuf>,

    /// 保存裁剪后 ROI 时使用的子目录名.
    #[arg(long = "roi-name", default_value = "roi")]
    roi_name: String,

    /// 配准模态, 形如 `ADC=/data/ADC`. 可重复.
    #[arg(long = "modality", short = 'm', value_parser = parse_modality)]
    modalities: Vec<(String, PathBuf)>,

    /// 输出根目录. 默认为 `{数据集根目录}/cropped`.
    #[arg(long = "out-dir", short = 'o')]
    out_dir: Option<PathBuf>,

    /// 块尺寸, 如 `-1x80x80` 或 `50,100,100`. `-1` 表示取整个轴.
    #[arg(long, default_value = PLANE_PATCH, allow_hyphen_values = true)]
    patch: PatchSize,

    /// 越界策略: `shift` 或 `pad`.
    #[arg(long, default_value = "shift")]
    policy: BoundPolicy,

    /// 中心计算方式: `2d` 或 `3d`.
    #[arg(long, default_value = "2d")]
    mode: CentroidMode,

    /// 对所有模态做归一化: `minmax` 或 `zscore`.
    #[arg(long)]
    normalize: Option<Normalization>,

    /// 同时保存裁剪后的 ROI.
    #[arg(long = "save-roi")]
    save_roi: bool,

    /// 使用前先将 ROI 截断到 [0, 1].
    #[arg(long = "binarize-roi")]
    binarize_roi: bool,

    /// 并行处理病例.
    #[arg(long)]
    pub parallel: bool,

    /// 任一病例失败时以非零状态退出.
    #[arg(long)]
    pub strict: bool,
}

fn missing_dir(what: &str) -> JobError {
    JobError::Invalid(format!(
        "no {what} given and no home directory to derive it from"
    ))
}

impl CropArgs {
    /// 构建任务.
    pub fn job(&self) -> Result<CropJob, JobError> {
        if let Some(config) = self.config.as_ref() {
            return CropJob::from_toml_file(config);
        }
        let roi_dir = match self.roi_dir.clone() {
            Some(d) => d,
            None => loader::roi_dir_from_env_or_home().ok_or_else(|| missing_dir("ROI dir"))?,
        };
        let out_dir = match self.out_dir.clone() {
            Some(d) => d,
            None => loader::out_dir_from_env_or_home().ok_or_else(|| missing_dir("output dir"))?,
        };
        let modalities = self
            .modalities
            .iter()
            .map(|(name, dir)| Modality::new(name, dir).with_normalization(self.normalize))
            .collect();
        Ok(CropJob {
            roi_dir,
            roi_name: self.roi_name.clone(),
            modalities,
            out_dir,
            patch: self.patch.clone(),
            policy: self.policy,
            mode: self.mode,
            save_roi: self.save_roi,
            binarize_roi: self.binarize_roi,
        })
    }
}

#[derive(Args, Debug)]
pub struct BinarizeArgs {
    /// 原始掩膜目录.
    #[arg(long = "src")]
    pub src: PathBuf,

    /// 输出目录. 可以与原始目录相同.
    #[arg(long = "dst")]
    pub dst: PathBuf,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// ROI 掩膜目录. 默认为 `$ROI_DIR` 或 `{数据集根目录}/roi`.
    #[arg(long = "roi-dir")]
    roi_dir: Option<PathBuf>,

    /// 参与配准核对的模态, 形如 `ADC=/data/ADC`. 可重复.
    #[arg(long = "modality", short = 'm', value_parser = parse_modality)]
    pub modalities: Vec<(String, PathBuf)>,
}

impl InspectArgs {
    /// ROI 掩膜目录.
    pub fn roi_dir(&self) -> Result<PathBuf, JobError> {
        match self.roi_dir.clone() {
            Some(d) => Ok(d),
            None => loader::roi_dir_from_env_or_home().ok_or_else(|| missing_dir("ROI dir")),
        }
    }
}

#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// 体数据目录.
    #[arg(long = "src")]
    pub src: PathBuf,

    /// 同名 ROI 所在目录. 给出时画出 ROI 边缘.
    #[arg(long = "roi-dir")]
    pub roi_dir: Option<PathBuf>,

    /// PNG 输出目录.
    #[arg(long = "dst")]
    pub dst: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::{parse_modality, Cli, Command};
    use clap::{CommandFactory, Parser};
    use roi_berry::extract::AxisExtent;
    use roi_berry::{BoundPolicy, CentroidMode, Normalization};
    use std::path::PathBuf;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_modality() {
        assert_eq!(
            parse_modality("ADC=/data/ADC"),
            Ok(("ADC".to_string(), PathBuf::from("/data/ADC")))
        );
        assert!(parse_modality("ADC").is_err());
        assert!(parse_modality("=/data").is_err());
    }

    #[test]
    fn test_crop_job_from_flags() {
        let cli = Cli::try_parse_from([
            "roi-crop", "-v", "crop", "--roi-dir", "/d/roi", "-o", "/d/out", "-m", "ADC=/d/ADC",
            "-m", "T2=/d/T2", "--patch", "-1x100x100", "--policy", "pad", "--mode", "3d",
            "--normalize", "zscore", "--save-roi", "--strict",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        let Command::Crop(args) = cli.command else {
            panic!("expected crop");
        };
        assert!(args.strict);
        let job = args.job().unwrap();
        assert_eq!(job.roi_dir, PathBuf::from("/d/roi"));
        assert_eq!(job.modalities.len(), 2);
        assert_eq!(job.modalities[1].name, "T2");
        assert_eq!(job.modalities[0].normalization, Some(Normalization::ZScore));
        assert_eq!(job.patch.extents()[0], AxisExtent::Full);
        assert_eq!(job.patch.extents()[1], AxisExtent::Fixed(100));
        assert_eq!(job.policy, BoundPolicy::Pad);
        assert_eq!(job.mode, CentroidMode::Volume);
        assert!(job.save_roi && !job.binarize_roi);
    }

    #[test]
    fn test_crop_defaults() {
        let cli = Cli::try_parse_from(["roi-crop", "crop", "--roi-dir", "r", "-o", "o"]).unwrap();
        let Command::Crop(args) = cli.command else {
            panic!("expected crop");
        };
        let job = args.job().unwrap();
        assert_eq!(job.patch.to_string(), "-1x80x80");
        assert_eq!(job.policy, BoundPolicy::Shift);
        assert_eq!(job.mode, CentroidMode::Plane);
        assert!(job.modalities.is_empty());
    }

    #[test]
    fn test_bad_patch_rejected() {
        assert!(Cli::try_parse_from(["roi-crop", "crop", "--patch", "0x80x80"]).is_err());
    }
}
