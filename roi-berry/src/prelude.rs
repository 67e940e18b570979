//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{CropError, CropResult, Idx2d, Idx3d};

pub use crate::data::{Normalization, Volume};
pub use crate::extract::{
    centroid_2d, centroid_3d, extract_block, BlockPlan, BoundPolicy, CenteredBlockExtractor,
    CentroidMode, PatchSize,
};

pub use crate::batch::{run_job, BatchReport, CropJob, Modality};

pub use crate::dataset::{case_ids, dataset_dir_from_env_or_home, home_dataset_dir_with};
pub use crate::dataset;
