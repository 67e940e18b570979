//! 测试辅助工具.

use std::path::Path;

use ndarray::Array3;
use nifti::writer::WriterOptions;
use nifti::NiftiHeader;
use tempfile::TempDir;

/// 在系统临时目录下创建一个新的空目录. 返回值被 drop 时目录随之删除.
pub fn scratch_dir(name: &str) -> TempDir {
    tempfile::Builder::new()
        .prefix(&format!("roi-berry-{name}-"))
        .tempdir()
        .unwrap()
}

/// 写入 nifti 文件. `data` 按 `[w, h, z]` 索引, `spacing` 与 `origin` 按 `x, y, z` 给出.
pub fn write_nifti(path: &Path, data: &Array3<f32>, spacing: [f32; 3], origin: [f32; 3]) {
    let mut header = NiftiHeader::default();
    header.pixdim[1..4].copy_from_slice(&spacing);
    header.sform_code = 1;
    header.srow_x = [spacing[0], 0.0, 0.0, origin[0]];
    header.srow_y = [0.0, spacing[1], 0.0, origin[1]];
    header.srow_z = [0.0, 0.0, spacing[2], origin[2]];
    WriterOptions::new(path)
        .reference_header(&header)
        .write_nifti(data)
        .unwrap();
}
