//! 程序运行函数.

use std::error::Error;

use log::info;
use roi_berry::batch::{self, binarize_dir, preview_dir};
use roi_berry::inspect::{audit_shapes, survey_extents};

use crate::args::{Command, CropArgs};
use crate::result::Summary;

fn crop(args: &CropArgs) -> Result<Summary, Box<dyn Error>> {
    let job = args.job()?;
    if args.parallel {
        info!("running on {} cores", utils::cpus());
    }
    let report = batch::run_job(&job, args.parallel)?;
    Ok(Summary::Batch("crop", report))
}

/// 实际运行. 返回结果汇总以及是否应以失败状态退出.
pub fn run(command: &Command) -> Result<(Summary, bool), Box<dyn Error>> {
    let (summary, strict) = match command {
        Command::Crop(args) => (crop(args)?, args.strict),
        Command::Binarize(args) => (Summary::Binarize(binarize_dir(&args.src, &args.dst)?), false),
        Command::Inspect(args) => {
            let roi_dir = args.roi_dir()?;
            let survey = survey_extents(&roi_dir)?;
            let audit = audit_shapes(&roi_dir, &args.modalities)?;
            (Summary::Inspect(survey, audit), false)
        }
        Command::Preview(args) => {
            let report = preview_dir(&args.src, args.roi_dir.as_deref(), &args.dst)?;
            (Summary::Batch("preview", report), false)
        }
    };
    let failed = strict && summary.has_failure();
    Ok((summary, failed))
}
