use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 块在单个轴上的长度.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "i64", into = "i64"))]
pub enum AxisExtent {
    /// 固定长度. 长度必须为正.
    Fixed(usize),

    /// 取整个轴, 并忽略该轴上的中心坐标. 文本形式为 `-1`.
    Full,
}

impl AxisExtent {
    /// 对长度为 `len` 的轴求实际块长度.
    #[inline]
    pub fn resolve(&self, len: usize) -> usize {
        match self {
            Self::Fixed(p) => *p,
            Self::Full => len,
        }
    }
}

impl TryFrom<i64> for AxisExtent {
    type Error = ParsePatchError;

    fn try_from(v: i64) -> Result<Self, Self::Error> {
        match v {
            -1 => Ok(Self::Full),
            p if p > 0 => Ok(Self::Fixed(p as usize)),
            _ => Err(ParsePatchError::IllegalExtent(v.to_string())),
        }
    }
}

impl From<AxisExtent> for i64 {
    fn from(e: AxisExtent) -> Self {
        match e {
            AxisExtent::Fixed(p) => p as i64,
            AxisExtent::Full => -1,
        }
    }
}

impl fmt::Display for AxisExtent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", i64::from(*self))
    }
}

/// 解析块尺寸错误.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParsePatchError {
    /// 空字符串.
    Empty,

    /// 非法的轴长度 (非整数、0 或小于 -1).
    IllegalExtent(String),
}

impl fmt::Display for ParsePatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty patch size"),
            Self::IllegalExtent(s) => write!(
                f,
                "`{s}` is not a legal axis extent (positive integer, or -1 for the full axis)"
            ),
        }
    }
}

impl std::error::Error for ParsePatchError {}

/// 块尺寸. 每个轴一个 [`AxisExtent`], 按 `(z, h, w)` 或 `(h, w)` 顺序排列.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PatchSize(Vec<AxisExtent>);

impl PatchSize {
    /// 由各轴长度直接构建. 不接受空列表和长度为 0 的固定轴.
    pub fn new(extents: Vec<AxisExtent>) -> Result<Self, ParsePatchError> {
        if extents.is_empty() {
            return Err(ParsePatchError::Empty);
        }
        if extents.contains(&AxisExtent::Fixed(0)) {
            return Err(ParsePatchError::IllegalExtent("0".to_string()));
        }
        Ok(Self(extents))
    }

    /// 全部为固定长度的块尺寸.
    pub fn fixed(extents: &[usize]) -> Result<Self, ParsePatchError> {
        Self::new(extents.iter().map(|&p| AxisExtent::Fixed(p)).collect())
    }

    /// 维数.
    #[inline]
    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// 各轴长度.
    #[inline]
    pub fn extents(&self) -> &[AxisExtent] {
        &self.0
    }

    /// 针对形状为 `shape` 的体数据, 求最终块的形状.
    ///
    /// 调用方需保证 `shape.len() == self.rank()`.
    pub fn resolve(&self, shape: &[usize]) -> Vec<usize> {
        debug_assert_eq!(shape.len(), self.rank());
        self.0
            .iter()
            .zip(shape)
            .map(|(e, &len)| e.resolve(len))
            .collect()
    }
}

/// 接受 `"-1x80x80"` 或 `"-1,80,80"` 两种写法.
impl FromStr for PatchSize {
    type Err = ParsePatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParsePatchError::Empty);
        }
        s.split(|c| c == 'x' || c == 'X' || c == ',')
            .map(|part| {
                let part = part.trim();
                part.parse::<i64>()
                    .map_err(|_| ParsePatchError::IllegalExtent(part.to_string()))
                    .and_then(AxisExtent::try_from)
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl fmt::Display for PatchSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join("x"))
    }
}

/// 越界处理策略.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum BoundPolicy {
    /// 平移窗口, 使其完全落在体数据内.
    #[default]
    Shift,

    /// 保持窗口不动, 越界部分补零.
    Pad,
}

impl FromStr for BoundPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "shift" => Ok(Self::Shift),
            "pad" => Ok(Self::Pad),
            _ => Err(format!("`{s}` is not a bound policy (expected `shift` or `pad`)")),
        }
    }
}
