//! 通用常量.

/// 单通道颜色.
pub mod gray {
    /// 单通道黑色.
    pub const BLACK: u8 = 0b_0000_0000;

    /// 单通道白色.
    pub const WHITE: u8 = 0b_1111_1111;

    /// 掩膜背景值.
    pub const MASK_BACKGROUND: u8 = 0;

    /// 掩膜前景值.
    pub const MASK_FOREGROUND: u8 = 1;
}

/// 多切片 ROI 按 2D 方式求中心时, 使用的切片序号.
///
/// 2.5D 数据通常由病灶层及其上下各一层组成, 因此取第 1 层.
pub const MIDDLE_SLICE: usize = 1;

/// 数组文件扩展名.
pub const NPY_EXT: &str = "npy";

/// nifti 文件扩展名.
pub const NII_EXT: &str = "nii";

/// 压缩 nifti 文件扩展名.
pub const NII_GZ_EXT: &str = "nii.gz";

/// 2.5D 工作流常用块尺寸: 深度取整轴, 平面 80 x 80.
pub const PLANE_PATCH: &str = "-1x80x80";

/// 比较体素间距与原点时允许的误差, 单位毫米.
pub const GEOMETRY_TOLERANCE: f32 = 1e-3;
