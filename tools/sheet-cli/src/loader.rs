//! 受试者文件定位. 由解剖扫描的路径推出掩膜, 测量表和输出目录的路径.

use anyhow::{bail, Context};
use std::path::{Path, PathBuf};

/// 一个受试者的全部输入文件.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectPaths {
    /// 所在目录.
    pub dir: PathBuf,

    /// 去掉 `.nii` / `.nii.gz` 扩展名后的文件名.
    pub stem: String,

    /// 解剖扫描.
    pub base: PathBuf,

    /// 左侧 ROI 掩膜, `<stem>_mask_L.nii.gz`.
    pub roi_left: PathBuf,

    /// 右侧 ROI 掩膜, `<stem>_mask_R.nii.gz`.
    pub roi_right: PathBuf,

    /// 参考掩膜, `<stem>_brain_mask.nii.gz`.
    pub extent_ref: PathBuf,

    /// 体积测量表, `<stem>_hippoLR_volumes.csv`.
    pub volumes_csv: PathBuf,
}

/// 去掉 `.nii.gz` 或 `.nii` 扩展名. 其他扩展名返回 `None`.
fn nifti_stem(name: &str) -> Option<&str> {
    name.strip_suffix(".nii.gz")
        .or_else(|| name.strip_suffix(".nii"))
        .filter(|s| !s.is_empty())
}

impl SubjectPaths {
    /// 由解剖扫描路径推出其余文件路径. 不检查文件是否存在.
    ///
    /// 扩展名不是 `.nii` 或 `.nii.gz` 时返回错误.
    pub fn from_input(input: &Path) -> anyhow::Result<Self> {
        let name = input
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("无法解析文件名: `{}`", input.display()))?;
        let Some(stem) = nifti_stem(name) else {
            bail!("`{}` 不是 nifti 文件 (.nii / .nii.gz)", input.display());
        };
        let dir = input.parent().map(Path::to_path_buf).unwrap_or_default();
        let with = |suffix: &str| dir.join(format!("{stem}{suffix}"));
        Ok(Self {
            base: input.to_path_buf(),
            roi_left: with("_mask_L.nii.gz"),
            roi_right: with("_mask_R.nii.gz"),
            extent_ref: with("_brain_mask.nii.gz"),
            volumes_csv: with("_hippoLR_volumes.csv"),
            stem: stem.to_string(),
            dir,
        })
    }

    /// 默认输出目录 `<dir>/<stem>_report`.
    #[inline]
    pub fn default_out_dir(&self) -> PathBuf {
        self.dir.join(format!("{}_report", self.stem))
    }
}
