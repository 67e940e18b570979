//! 数据集操作.
//!
//! 数据集按模态分目录存放, 每个病例在各目录下对应一个同名文件
//! `<case>.npy` (或 `<case>.nii` / `<case>.nii.gz`). 病例标识即文件名去掉扩展名.

use std::io;
use std::path::{Path, PathBuf};

mod loader;

pub use loader::{case_loader, load_case, load_case_with_geometry, CaseLoader};

use crate::consts::{NII_EXT, NII_GZ_EXT, NPY_EXT};
use crate::data::{is_nifti_path, is_npy_path};

/// 覆盖默认数据集根目录的环境变量.
pub const DATASET_DIR_ENV: &str = "ROI_DATASET_DIR";

/// 获取 `{用户主目录}/dataset` 目录.
pub fn home_dataset_dir() -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    Some(ans)
}

/// 获取 `{用户主目录}/dataset` 目录下给定继续项组成的全路径.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = home_dataset_dir()?;
    ans.extend(it);
    Some(ans)
}

/// 数据集根目录. 优先读取环境变量 [`DATASET_DIR_ENV`], 否则为 `{用户主目录}/dataset`.
pub fn dataset_dir_from_env_or_home() -> Option<PathBuf> {
    match std::env::var_os(DATASET_DIR_ENV) {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => home_dataset_dir(),
    }
}

/// 由文件路径得到病例标识. 不是支持的数组文件时返回 `None`.
pub fn case_id_of(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let stem = if is_npy_path(path) {
        name.strip_suffix(NPY_EXT)?
    } else if is_nifti_path(path) {
        name.strip_suffix(NII_GZ_EXT)
            .or_else(|| name.strip_suffix(NII_EXT))?
    } else {
        return None;
    };
    let stem = stem.strip_suffix('.')?;
    (!stem.is_empty()).then(|| stem.to_string())
}

/// 列出 `dir` 下所有病例标识 (升序, 去重).
pub fn case_ids<P: AsRef<Path>>(dir: P) -> io::Result<Vec<String>> {
    let mut ans = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            ans.extend(case_id_of(&path));
        }
    }
    ans.sort_unstable();
    ans.dedup();
    Ok(ans)
}

/// 在 `dir` 下查找病例 `case` 的文件. 依次尝试 `.npy`, `.nii.gz`, `.nii`.
pub fn find_case_file<P: AsRef<Path>>(dir: P, case: &str) -> Option<PathBuf> {
    let dir = dir.as_ref();
    [NPY_EXT, NII_GZ_EXT, NII_EXT]
        .into_iter()
        .map(|ext| dir.join(format!("{case}.{ext}")))
        .find(|p| p.is_file())
}

#[cfg(test)]
mod tests {
    use super::{case_id_of, case_ids, find_case_file, home_dataset_dir_with};
    use crate::testing::scratch_dir;
    use std::fs::File;
    use std::path::Path;

    #[test]
    fn test_case_id_of() {
        assert_eq!(case_id_of(Path::new("a/E054_65.npy")), Some("E054_65".into()));
        assert_eq!(case_id_of(Path::new("a/ESER_1.nii.gz")), Some("ESER_1".into()));
        assert_eq!(case_id_of(Path::new("a/roi3D.nii")), Some("roi3D".into()));
        assert_eq!(case_id_of(Path::new("a/notes.txt")), None);
        assert_eq!(case_id_of(Path::new("a/.npy")), None);
    }

    #[test]
    fn test_case_ids() {
        let tmp = scratch_dir("case_ids");
        let dir = tmp.path();
        for name in ["b.npy", "a.npy", "c.nii.gz", "a.nii", "readme.md"] {
            File::create(dir.join(name)).unwrap();
        }
        std::fs::create_dir(dir.join("d.npy")).unwrap();
        assert_eq!(case_ids(&dir).unwrap(), vec!["a", "b", "c"]);
        assert_eq!(find_case_file(&dir, "a"), Some(dir.join("a.npy")));
        assert_eq!(find_case_file(&dir, "c"), Some(dir.join("c.nii.gz")));
        assert_eq!(find_case_file(&dir, "d"), None);
    }

    #[test]
    fn test_home_dataset_dir() {
        if let Some(p) = home_dataset_dir_with(["roi", "ADC"]) {
            assert!(p.ends_with("dataset/roi/ADC"));
        }
    }
}
