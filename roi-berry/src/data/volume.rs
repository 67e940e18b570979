use std::fs;
use std::path::Path;

use ndarray::ArrayD;
use ndarray_npy::{ReadNpyError, ReadNpyExt};
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use num::{One, Zero};

use crate::consts::{NII_EXT, NII_GZ_EXT, NPY_EXT};
use crate::extract::{BlockPlan, CenteredBlockExtractor};
use crate::{CropError, CropResult};

/// `NiftiHeader` 是栈上大对象, 移动该对象的开销很可观.
/// 因此我们将其分配到堆上.
pub type BoxedHeader = Box<NiftiHeader>;

/// 带元素类型标记的任意维体数据.
///
/// `.npy` 文件的元素类型在读取时才能确定, 因此用枚举承载.
/// 所有变体的轴序都是 `(z, h, w)` 或 `(h, w)`.
#[derive(Clone, Debug, PartialEq)]
pub enum Volume {
    /// `u8`.
    U8(ArrayD<u8>),
    /// `i8`.
    I8(ArrayD<i8>),
    /// `u16`.
    U16(ArrayD<u16>),
    /// `i16`.
    I16(ArrayD<i16>),
    /// `u32`.
    U32(ArrayD<u32>),
    /// `i32`.
    I32(ArrayD<i32>),
    /// `u64`.
    U64(ArrayD<u64>),
    /// `i64`.
    I64(ArrayD<i64>),
    /// `f32`.
    F32(ArrayD<f32>),
    /// `f64`.
    F64(ArrayD<f64>),
}

/// 对 `Volume` 的每个变体执行同一段代码.
macro_rules! each_variant {
    ($volume: expr, $arr: ident => $body: expr) => {
        match $volume {
            Volume::U8($arr) => $body,
            Volume::I8($arr) => $body,
            Volume::U16($arr) => $body,
            Volume::I16($arr) => $body,
            Volume::U32($arr) => $body,
            Volume::I32($arr) => $body,
            Volume::U64($arr) => $body,
            Volume::I64($arr) => $body,
            Volume::F32($arr) => $body,
            Volume::F64($arr) => $body,
        }
    };
}

/// 对 `Volume` 的每个变体做变换, 结果保持原元素类型.
macro_rules! map_variant {
    ($volume: expr, $arr: ident => $body: expr) => {
        match $volume {
            Volume::U8($arr) => Volume::U8($body),
            Volume::I8($arr) => Volume::I8($body),
            Volume::U16($arr) => Volume::U16($body),
            Volume::I16($arr) => Volume::I16($body),
            Volume::U32($arr) => Volume::U32($body),
            Volume::I32($arr) => Volume::I32($body),
            Volume::U64($arr) => Volume::U64($body),
            Volume::I64($arr) => Volume::I64($body),
            Volume::F32($arr) => Volume::F32($body),
            Volume::F64($arr) => Volume::F64($body),
        }
    };
}

/// 依次尝试以 `$ty` 解析 `$bytes`. 描述符不符时继续尝试下一个类型.
macro_rules! try_read_npy {
    ($bytes: expr, $($variant: ident => $ty: ty),+) => {
        $(
            match ArrayD::<$ty>::read_npy($bytes) {
                Ok(arr) => return Ok(Volume::$variant(arr)),
                Err(ReadNpyError::WrongDescriptor(_)) => {}
                Err(e) => return Err(e.into()),
            }
        )+
    };
}

macro_rules! impl_from_array {
    ($($variant: ident => $ty: ty),+) => {
        $(
            impl From<ArrayD<$ty>> for Volume {
                #[inline]
                fn from(arr: ArrayD<$ty>) -> Self {
                    Volume::$variant(arr)
                }
            }
        )+
    };
}

impl_from_array!(
    U8 => u8, I8 => i8, U16 => u16, I16 => i16, U32 => u32,
    I32 => i32, U64 => u64, I64 => i64, F32 => f32, F64 => f64
);

/// 路径是否指向 nifti 文件.
pub fn is_nifti_path(path: &Path) -> bool {
    path.to_str().map_or(false, |s| {
        s.ends_with(&format!(".{NII_EXT}")) || s.ends_with(&format!(".{NII_GZ_EXT}"))
    })
}

/// 路径是否指向 `.npy` 文件.
pub fn is_npy_path(path: &Path) -> bool {
    path.extension().map_or(false, |e| e == NPY_EXT)
}

/// 打开 nifti 文件, 返回 header 和以 `f32` 保存的体数据.
///
/// nifti 数据按 `[w, h, z]` 存储, 这里统一转换成 `(z, h, w)`.
pub fn open_nifti<P: AsRef<Path>>(path: P) -> CropResult<(BoxedHeader, ArrayD<f32>)> {
    let obj = ReaderOptions::new().read_file(path.as_ref())?;
    let header = Box::new(obj.header().clone());

    // [w, h, z] -> [z, h, w].
    let data = obj.into_volume().into_ndarray::<f32>()?.reversed_axes();
    let data = if data.is_standard_layout() {
        data
    } else {
        data.as_standard_layout().into_owned()
    };
    Ok((header, data))
}

/// 由 header 读取体素间距, 顺序与 [`open_nifti`] 返回的数据轴序一致.
pub fn nifti_spacing(header: &NiftiHeader) -> Vec<f32> {
    let rank = (header.dim[0] as usize).clamp(1, 7);
    let mut ans = header.pixdim[1..=rank].to_vec();
    ans.reverse();
    ans
}

/// 由 header 读取原点 (世界坐标 `x, y, z`). 优先使用 sform, 否则使用 qform 偏移.
pub fn nifti_origin(header: &NiftiHeader) -> [f32; 3] {
    if header.sform_code > 0 {
        [header.srow_x[3], header.srow_y[3], header.srow_z[3]]
    } else {
        [header.quatern_x, header.quatern_y, header.quatern_z]
    }
}

/// nifti 文件携带的体素几何信息. `.npy` 文件没有这部分信息.
#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    /// 体素间距, 轴序与体数据一致.
    pub spacing: Vec<f32>,

    /// 原点, 世界坐标 `x, y, z`.
    pub origin: [f32; 3],
}

impl Geometry {
    /// 从 header 读取.
    pub fn from_header(header: &NiftiHeader) -> Self {
        Self {
            spacing: nifti_spacing(header),
            origin: nifti_origin(header),
        }
    }

    /// 两者的间距与原点是否在 `tol` 内逐项相等.
    pub fn approx_eq(&self, other: &Self, tol: f32) -> bool {
        let close = |a: &f32, b: &f32| (a - b).abs() <= tol;
        self.spacing.len() == other.spacing.len()
            && self.spacing.iter().zip(&other.spacing).all(|(a, b)| close(a, b))
            && self.origin.iter().zip(&other.origin).all(|(a, b)| close(a, b))
    }
}

impl Volume {
    /// 按扩展名打开 `.npy` 或 `.nii` / `.nii.gz` 文件.
    ///
    /// nifti 文件总是读成 `f32`.
    #[inline]
    pub fn open<P: AsRef<Path>>(path: P) -> CropResult<Self> {
        Self::open_with_geometry(path).map(|(v, _)| v)
    }

    /// 同 [`Volume::open`], 同时返回 nifti 文件的几何信息. `.npy` 文件没有几何信息.
    pub fn open_with_geometry<P: AsRef<Path>>(path: P) -> CropResult<(Self, Option<Geometry>)> {
        let path = path.as_ref();
        if is_nifti_path(path) {
            let (header, data) = open_nifti(path)?;
            Ok((Self::F32(data), Some(Geometry::from_header(&header))))
        } else {
            Ok((Self::read_npy(path)?, None))
        }
    }

    /// 读取 `.npy` 文件, 元素类型由文件描述符决定. `bool` 数组会转成 `u8`.
    pub fn read_npy<P: AsRef<Path>>(path: P) -> CropResult<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let bytes = bytes.as_slice();
        try_read_npy!(
            bytes,
            U8 => u8, I8 => i8, U16 => u16, I16 => i16, U32 => u32,
            I32 => i32, U64 => u64, I64 => i64, F32 => f32, F64 => f64
        );
        match ArrayD::<bool>::read_npy(bytes) {
            Ok(arr) => Ok(Self::U8(arr.mapv(u8::from))),
            Err(ReadNpyError::WrongDescriptor(_)) => {
                Err(CropError::UnsupportedElement(path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 以原元素类型写入 `.npy` 文件.
    pub fn write_npy<P: AsRef<Path>>(&self, path: P) -> CropResult<()> {
        let path = path.as_ref();
        each_variant!(self, arr => ndarray_npy::write_npy(path, arr)?);
        Ok(())
    }

    /// 数据形状.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        each_variant!(self, arr => arr.shape())
    }

    /// 维数.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// 元素类型名称.
    pub fn dtype(&self) -> &'static str {
        match self {
            Volume::U8(_) => "u8",
            Volume::I8(_) => "i8",
            Volume::U16(_) => "u16",
            Volume::I16(_) => "i16",
            Volume::U32(_) => "u32",
            Volume::I32(_) => "i32",
            Volume::U64(_) => "u64",
            Volume::I64(_) => "i64",
            Volume::F32(_) => "f32",
            Volume::F64(_) => "f64",
        }
    }

    /// 转换为 `f32` 数据.
    pub fn to_f32(&self) -> ArrayD<f32> {
        each_variant!(self, arr => arr.mapv(|v| v as f32))
    }

    /// 按计划提取块, 保持元素类型.
    pub fn crop(&self, plan: &BlockPlan) -> CropResult<Self> {
        Ok(map_variant!(self, arr => plan.apply(arr.view())?))
    }

    /// 以该体数据为 ROI 计算提取计划, 同时返回中心.
    pub fn plan_as_roi(
        &self,
        extractor: &CenteredBlockExtractor,
    ) -> CropResult<(BlockPlan, Vec<usize>)> {
        each_variant!(self, arr => extractor.plan(arr.view()))
    }

    /// 每个轴上出现过非零体素的坐标 (去重, 升序).
    pub fn unique_coords(&self) -> Vec<Vec<usize>> {
        each_variant!(self, arr => crate::extract::unique_coords(arr.view()))
    }

    /// 将所有值截断到 `[0, 1]`, 元素类型不变.
    pub fn clip_unit(&self) -> Self {
        map_variant!(self, arr => arr.mapv(|v| num::clamp(v, Zero::zero(), One::one())))
    }

    /// 是否仅包含 0 和 1.
    pub fn is_binary(&self) -> bool {
        each_variant!(self, arr => arr.iter().all(|v| v.is_zero() || v.is_one()))
    }
}
