//! 批量生成切片预览图.

use std::path::Path;

use log::info;

use super::{BatchReport, JobError};
use crate::consts::gray::{MASK_BACKGROUND, MASK_FOREGROUND};
use crate::data::{preview_slice, save_preview, Volume};
use crate::dataset::{case_ids, case_loader, load_case};
use crate::extract::ensure_same_shape;
use crate::CropResult;

fn preview_case(volume: &Volume, roi: Option<&Volume>, path: &Path) -> CropResult<()> {
    let data = volume.to_f32();
    let mask = match roi {
        Some(roi) => {
            ensure_same_shape("volume", roi.shape(), volume.shape())?;
            Some(roi.to_f32().mapv(|v| {
                if v == 0.0 {
                    MASK_BACKGROUND
                } else {
                    MASK_FOREGROUND
                }
            }))
        }
        None => None,
    };
    let slice = preview_slice(data.view())?;
    let mask = mask.as_ref().map(|m| preview_slice(m.view())).transpose()?;
    save_preview(slice, mask, path)?;
    Ok(())
}

/// 为 `src` 下每个体数据保存一张中间切片的 PNG 预览 `dst/<case>.png`.
///
/// 提供 `roi_dir` 时, 同名 ROI 的边缘会被画出. 缺少 ROI 的病例记为失败.
pub fn preview_dir<P, Q>(src: P, roi_dir: Option<&Path>, dst: Q) -> Result<BatchReport, JobError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let (src, dst) = (src.as_ref(), dst.as_ref());
    let cases = case_ids(src).map_err(|e| JobError::Io(src.to_owned(), e))?;
    std::fs::create_dir_all(dst).map_err(|e| JobError::Io(dst.to_owned(), e))?;

    let outcomes: Vec<_> = case_loader(cases, src)
        .map(|(case, volume)| {
            let outcome = volume.and_then(|volume| {
                let roi = roi_dir.map(|d| load_case(d, &case)).transpose()?;
                let path = dst.join(format!("{case}.png"));
                preview_case(&volume, roi.as_ref(), &path)?;
                info!("case {case}: wrote {}", path.display());
                Ok(())
            });
            (case, outcome)
        })
        .collect();
    Ok(BatchReport::from_outcomes(outcomes))
}
