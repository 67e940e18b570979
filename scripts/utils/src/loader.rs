//! 对 `roi-berry::dataset` 的更一层封装. 提供默认目录.

use std::env;
use std::path::PathBuf;

use roi_berry::dataset;

/// 获取数据集根目录.
///
/// 1. 若环境变量 `$ROI_DATASET_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset`.
pub fn dataset_dir_from_env_or_home() -> Option<PathBuf> {
    dataset::dataset_dir_from_env_or_home()
}

/// 获取 ROI 掩膜目录.
///
/// 1. 若环境变量 `$ROI_DIR` 非空, 则返回其值;
/// 2. 否则, 返回数据集根目录下的 `roi`.
pub fn roi_dir_from_env_or_home() -> Option<PathBuf> {
    match env::var_os("ROI_DIR") {
        Some(d) if !d.is_empty() => Some(PathBuf::from(d)),
        _ => Some(dataset_dir_from_env_or_home()?.join("roi")),
    }
}

/// 获取默认输出根目录: 数据集根目录下的 `cropped`.
pub fn out_dir_from_env_or_home() -> Option<PathBuf> {
    Some(dataset_dir_from_env_or_home()?.join("cropped"))
}

#[cfg(test)]
mod tests {
    use super::{out_dir_from_env_or_home, roi_dir_from_env_or_home};

    #[test]
    fn test_default_dirs() {
        if std::env::var_os("ROI_DIR").is_none() {
            if let Some(roi) = roi_dir_from_env_or_home() {
                assert!(roi.ends_with("roi"));
            }
        }
        if let Some(out) = out_dir_from_env_or_home() {
            assert!(out.ends_with("cropped"));
        }
    }
}
