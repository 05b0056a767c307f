use std::fmt;
use std::path::Path;

use ndarray::{Array3, ArrayD, ArrayView3, Axis, Ix3};
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};

use crate::error::{ReportError, Result};
use crate::{Idx3d, Spacing};

pub mod crop;
pub mod orient;
pub mod reslice;
pub mod select;
pub mod slice;
pub mod window;

use orient::{Direction, Orientation};

pub use slice::SliceView;
pub use window::MaxWindow;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// ROI 所在侧.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Side {
    /// 左侧 ROI.
    Left,

    /// 右侧 ROI.
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => f.write_str("left"),
            Self::Right => f.write_str("right"),
        }
    }
}

/// 一组同步处理的体数据: 解剖扫描, 左右 ROI, 以及仅用于确定裁剪范围的参考掩膜.
///
/// 四个体数据形状一致, 且都与同一个体素分辨率向量对应. 这两个性质在构造时检查,
/// 之后所有变换都会同步作用于每个体数据和分辨率向量.
#[derive(Debug, Clone)]
pub struct VolumeSet {
    base: Array3<f32>,
    roi_left: Array3<f32>,
    roi_right: Array3<f32>,
    extent_ref: Array3<f32>,
    spacing: Spacing,
}

impl VolumeSet {
    /// 构建体数据组.
    ///
    /// 如果四个体数据形状不一致, 存在长度为 0 的轴, 或者 `spacing` 中存在非正/非有限值,
    /// 则返回 `Err(ReportError::InvalidInput)`.
    pub fn new(
        spacing: Spacing,
        base: Array3<f32>,
        roi_left: Array3<f32>,
        roi_right: Array3<f32>,
        extent_ref: Array3<f32>,
    ) -> Result<Self> {
        let shape = base.dim();
        for (name, v) in [
            ("roi_left", &roi_left),
            ("roi_right", &roi_right),
            ("extent_ref", &extent_ref),
        ] {
            if v.dim() != shape {
                return Err(ReportError::InvalidInput(format!(
                    "`{name}` 形状 {:?} 与 `base` 形状 {shape:?} 不一致",
                    v.dim()
                )));
            }
        }
        if shape.0 == 0 || shape.1 == 0 || shape.2 == 0 {
            return Err(ReportError::InvalidInput(format!("体数据为空: {shape:?}")));
        }
        check_spacing(&spacing)?;
        Ok(Self {
            base,
            roi_left,
            roi_right,
            extent_ref,
            spacing,
        })
    }

    /// 不做检查地直接拼装. 仅供内部在已知一致的变换之后使用.
    #[inline]
    pub(crate) fn from_parts(
        spacing: Spacing,
        [base, roi_left, roi_right, extent_ref]: [Array3<f32>; 4],
    ) -> Self {
        debug_assert!([&roi_left, &roi_right, &extent_ref]
            .iter()
            .all(|v| v.dim() == base.dim()));
        Self {
            base,
            roi_left,
            roi_right,
            extent_ref,
            spacing,
        }
    }

    /// 拆解为 `(spacing, [base, roi_left, roi_right, extent_ref])`.
    #[inline]
    pub(crate) fn into_parts(self) -> (Spacing, [Array3<f32>; 4]) {
        (
            self.spacing,
            [self.base, self.roi_left, self.roi_right, self.extent_ref],
        )
    }

    /// 对四个体数据同步施加同一个变换.
    pub(crate) fn map_volumes<F>(self, spacing: Spacing, mut f: F) -> Self
    where
        F: FnMut(Array3<f32>) -> Array3<f32>,
    {
        let (_, volumes) = self.into_parts();
        Self::from_parts(spacing, volumes.map(&mut f))
    }

    /// 体数据形状 (X, Y, Z).
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.base.dim()
    }

    /// 体素分辨率 (mm).
    #[inline]
    pub fn spacing(&self) -> Spacing {
        self.spacing
    }

    /// 解剖扫描.
    #[inline]
    pub fn base(&self) -> ArrayView3<'_, f32> {
        self.base.view()
    }

    /// 给定侧的 ROI.
    #[inline]
    pub fn roi(&self, side: Side) -> ArrayView3<'_, f32> {
        match side {
            Side::Left => self.roi_left.view(),
            Side::Right => self.roi_right.view(),
        }
    }

    /// 参考掩膜.
    #[inline]
    pub fn extent_ref(&self) -> ArrayView3<'_, f32> {
        self.extent_ref.view()
    }
}

/// 体素分辨率必须是正的有限值.
pub(crate) fn check_spacing(spacing: &Spacing) -> Result<()> {
    if spacing.iter().all(|s| s.is_finite() && *s > 0.0) {
        Ok(())
    } else {
        Err(ReportError::InvalidInput(format!(
            "体素分辨率必须为正有限值, 但得到 {spacing:?}"
        )))
    }
}

/// 求体数据最大值. 空数据或全为 NaN 时返回 `f32::NEG_INFINITY`.
#[inline]
pub(crate) fn max_value(data: ArrayView3<'_, f32>) -> f32 {
    data.iter().copied().fold(f32::NEG_INFINITY, f32::max)
}

/// 将体数据就地除以其最大值, 使最大值为 1.0.
///
/// 如果最大值不是正的有限值 (例如全零), 则不做任何修改并返回 `false`.
pub(crate) fn normalize_unit_max(data: &mut Array3<f32>) -> bool {
    let max = max_value(data.view());
    if max.is_finite() && max > 0.0 {
        data.mapv_inplace(|v| v / max);
        true
    } else {
        false
    }
}

/// 一个受试者的四个 nifti 文件, 以及它们在文件中的方向信息.
///
/// 加载时 ROI 会被规范化到 `[0, 1]`. 方向信息取自解剖扫描的 header.
#[derive(Debug, Clone)]
pub struct SubjectVolumes {
    volumes: VolumeSet,
    orientation: Orientation,
}

impl SubjectVolumes {
    /// 分别打开 nifti 文件格式的解剖扫描, 左右 ROI 和参考掩膜.
    ///
    /// 任一文件打开失败时返回 `Err(ReportError::Nifti)`; 形状不一致,
    /// 不是 3D 数据, 或 header 中的方向矩阵退化时返回 `Err(ReportError::InvalidInput)`.
    pub fn open(
        base: impl AsRef<Path>,
        roi_left: impl AsRef<Path>,
        roi_right: impl AsRef<Path>,
        extent_ref: impl AsRef<Path>,
    ) -> Result<Self> {
        let (base, header) = read_volume(base.as_ref())?;
        let (mut roi_left, _) = read_volume(roi_left.as_ref())?;
        let (mut roi_right, _) = read_volume(roi_right.as_ref())?;
        let (extent_ref, _) = read_volume(extent_ref.as_ref())?;

        for (side, roi) in [(Side::Left, &mut roi_left), (Side::Right, &mut roi_right)] {
            if !normalize_unit_max(roi) {
                log::warn!("ROI `{side}` is empty");
            }
        }

        let spacing = spacing_from_header(&header);
        let orientation = Orientation::from_direction(&Direction::from_header(&header))?;
        let volumes = VolumeSet::new(spacing, base, roi_left, roi_right, extent_ref)?;
        Ok(Self {
            volumes,
            orientation,
        })
    }

    /// 由已解码的数据直接构建.
    #[inline]
    pub fn from_parts(volumes: VolumeSet, orientation: Orientation) -> Self {
        Self {
            volumes,
            orientation,
        }
    }

    /// 文件中的体素轴方向.
    #[inline]
    pub fn orientation(&self) -> &Orientation {
        &self.orientation
    }

    /// 尚未规范化方向的体数据.
    #[inline]
    pub fn volumes(&self) -> &VolumeSet {
        &self.volumes
    }

    /// 转换到 LAS 约定, 供 [`crate::build_report_from`] 使用.
    #[inline]
    pub fn into_las(self) -> VolumeSet {
        orient::to_las(self.volumes, &self.orientation)
    }
}

/// header 中 `pixdim[1..=3]` 对应 (X, Y, Z) 三个体素轴的分辨率.
#[inline]
fn spacing_from_header(h: &NiftiHeader) -> Spacing {
    let [_, x, y, z, ..] = h.pixdim;
    [x.abs() as f64, y.abs() as f64, z.abs() as f64]
}

/// 读取 nifti 文件, 以 `f32` 返回 (X, Y, Z) 顺序的 3D 数据和 header.
fn read_volume(path: &Path) -> Result<(Array3<f32>, NiftiHeader)> {
    let obj = ReaderOptions::new().read_file(path)?;
    let header = obj.header().clone();
    let data = obj.into_volume().into_ndarray::<f32>()?;
    let data = squeeze_to_3d(data).ok_or_else(|| {
        ReportError::InvalidInput(format!("`{}` 不是 3D 体数据", path.display()))
    })?;
    Ok((data, header))
}

/// 去掉末尾长度为 1 的轴 (例如只有一个时间点的 4D 文件), 然后转为 3D.
fn squeeze_to_3d(mut data: ArrayD<f32>) -> Option<Array3<f32>> {
    while data.ndim() > 3 && data.shape()[data.ndim() - 1] == 1 {
        let last = Axis(data.ndim() - 1);
        data = data.index_axis_move(last, 0);
    }
    data.into_dimensionality::<Ix3>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array3, IxDyn};

    fn ones(shape: Idx3d) -> Array3<f32> {
        Array3::ones(shape)
    }

    #[test]
    fn test_volume_set_shape_mismatch() {
        let r = VolumeSet::new(
            [1.0; 3],
            ones((4, 4, 4)),
            ones((4, 4, 4)),
            ones((4, 4, 3)),
            ones((4, 4, 4)),
        );
        assert!(matches!(r, Err(ReportError::InvalidInput(_))));
    }

    #[test]
    fn test_volume_set_bad_spacing() {
        for spacing in [[1.0, -1.0, 1.0], [0.0, 1.0, 1.0], [1.0, 1.0, f64::NAN]] {
            let r = VolumeSet::new(
                spacing,
                ones((2, 2, 2)),
                ones((2, 2, 2)),
                ones((2, 2, 2)),
                ones((2, 2, 2)),
            );
            assert!(matches!(r, Err(ReportError::InvalidInput(_))));
        }
    }

    #[test]
    fn test_volume_set_empty() {
        let e = Array3::<f32>::zeros((0, 2, 2));
        let r = VolumeSet::new([1.0; 3], e.clone(), e.clone(), e.clone(), e);
        assert!(r.is_err());
    }

    #[test]
    fn test_normalize_unit_max() {
        let mut v = Array3::from_shape_fn((2, 2, 2), |(x, y, z)| (x + y + z) as f32 * 2.0);
        assert!(normalize_unit_max(&mut v));
        assert_eq!(max_value(v.view()), 1.0);
        assert_eq!(v[(0, 0, 0)], 0.0);

        let mut z = Array3::<f32>::zeros((2, 2, 2));
        assert!(!normalize_unit_max(&mut z));
        assert!(z.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_squeeze_to_3d() {
        let d = ArrayD::<f32>::zeros(IxDyn(&[3, 4, 5, 1]));
        assert_eq!(squeeze_to_3d(d).unwrap().dim(), (3, 4, 5));

        let d = ArrayD::<f32>::zeros(IxDyn(&[3, 4, 5, 2]));
        assert!(squeeze_to_3d(d).is_none());

        let d = ArrayD::<f32>::zeros(IxDyn(&[3, 4]));
        assert!(squeeze_to_3d(d).is_none());
    }
}
