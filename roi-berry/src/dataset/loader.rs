//! 迭代器风格的病例加载器.

use std::path::{Path, PathBuf};

use super::find_case_file;
use crate::data::{Geometry, Volume};
use crate::{CropError, CropResult};

/// 读取 `dir` 下病例 `case` 的体数据.
///
/// 找不到文件时返回 `CropError::Io`, 其类型为 `NotFound`.
#[inline]
pub fn load_case<P: AsRef<Path>>(dir: P, case: &str) -> CropResult<Volume> {
    load_case_with_geometry(dir, case).map(|(v, _)| v)
}

/// 同 [`load_case`], 同时返回 nifti 文件的几何信息.
pub fn load_case_with_geometry<P: AsRef<Path>>(
    dir: P,
    case: &str,
) -> CropResult<(Volume, Option<Geometry>)> {
    let dir = dir.as_ref();
    match find_case_file(dir, case) {
        Some(path) => Volume::open_with_geometry(path),
        None => Err(CropError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no array file for `{case}` in {}", dir.display()),
        ))),
    }
}

/// 从病例标识列表和目录创建加载器.
///
/// # 注意
///
/// 病例文件不存在时, 迭代器返回对应的 `Err(CropError::Io(..))`, 而不会中止迭代.
pub fn case_loader<S, I, P>(cases: I, dir: P) -> CaseLoader
where
    S: Into<String>,
    I: IntoIterator<Item = S>,
    P: AsRef<Path>,
{
    let mut cases: Vec<String> = cases.into_iter().map(Into::into).collect();
    cases.reverse();
    CaseLoader {
        dir: dir.as_ref().to_owned(),
        cases_rev: cases,
    }
}

/// 按病例顺序读取同一目录下的体数据.
#[derive(Debug, Clone)]
pub struct CaseLoader {
    dir: PathBuf,
    cases_rev: Vec<String>,
}

impl CaseLoader {
    /// 所在目录.
    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 读取单个病例.
    #[inline]
    pub fn load(&self, case: &str) -> CropResult<Volume> {
        load_case(&self.dir, case)
    }
}

impl Iterator for CaseLoader {
    type Item = (String, CropResult<Volume>);

    fn next(&mut self) -> Option<Self::Item> {
        let case = self.cases_rev.pop()?;
        let data = self.load(&case);
        Some((case, data))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.cases_rev.len(), Some(self.cases_rev.len()))
    }
}

impl ExactSizeIterator for CaseLoader {
    #[inline]
    fn len(&self) -> usize {
        self.cases_rev.len()
    }
}
