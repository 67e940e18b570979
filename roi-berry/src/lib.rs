#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 以 ROI 为中心, 从 2D/3D 医学影像体数据中提取定长块.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 所有坐标、形状均按深度优先的 `(z, h, w)` (3D) 或 `(h, w)` (2D) 顺序给出.
//!   nifti 文件读取时会从 `[w, h, z]` 转换成该顺序.
//! 2. 与 ROI 一同裁剪的体数据必须与 ROI 配准 (形状完全一致), 否则报错而不是裁剪.
//! 3. 除了编程错误, 库函数不会 panic; 所有病例级错误都以 [`CropError`] 返回.
//!
//! # 开发计划
//!
//! ### ROI 中心计算 ✅
//!
//! 按轴取非零体素去重坐标的中位数. 支持 2D (切片) 和 3D (体) 两种方式.
//!
//! 实现位于 `roi-berry/src/extract/centroid.rs`.
//!
//! ### 定长块提取, 平移 / 补零两种越界策略 ✅
//!
//! 提取计划只取决于 `(形状, 块尺寸, 中心, 策略)`,
//! 因此影像与其配准掩膜用同一组参数裁剪时偏移必然相同.
//!
//! 实现位于 `roi-berry/src/extract/block.rs`.
//!
//! ### `.npy` / nifti 读写, 裁剪后归一化 ✅
//!
//! 实现位于 `roi-berry/src/data`.
//!
//! ### 按病例批处理, 单病例失败不中断 ✅
//!
//! 实现位于 `roi-berry/src/batch`.
//!
//! ### 数据集检查 ✅
//!
//! ROI 跨度统计与配准形状核对.
//!
//! 实现位于 `roi-berry/src/inspect.rs`.
//!
//! ### 体素间距重采样 ⌛️
//!
//! `.npy` 文件不携带间距信息, 目前只核对形状.

/// 二维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 三维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

mod error;

pub use error::{CropError, CropResult};

pub mod consts;

/// 体数据读写与处理.
pub mod data;

pub use data::{Normalization, Volume};

pub mod extract;

pub use extract::{BlockPlan, BoundPolicy, CenteredBlockExtractor, CentroidMode, PatchSize};

pub mod batch;
pub mod dataset;
pub mod inspect;
pub mod prelude;

#[cfg(test)]
mod testing;
