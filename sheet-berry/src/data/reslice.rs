//! 平面重切.
//!
//! 重切后的体数据总是 (行, 列, 切片) 的排列: 最后一维是切片索引,
//! 前两维是显示时图像的竖直和水平方向. 体素分辨率随轴同步置换,
//! 因此 `spacing()[0] / spacing()[1]` 始终是显示图像上 "行高 / 列宽" 的实际比例.
//!
//! 平面按 轴位 → 冠状位 → 矢状位 流水线处理, 后一个平面建立在前一个平面的结果之上:
//!
//! | 阶段   | (行, 列, 切片)           |
//! |--------|--------------------------|
//! | 规范   | (X, Y, Z)                |
//! | 轴位   | (Y 反向, X, Z)           |
//! | 冠状位 | (Z 反向, X, Y 反向)      |
//! | 矢状位 | (Z 反向, Y, X)           |
//!
//! 进入冠状位之前, 会在足头方向两端补黑, 避免 ROI 紧贴图像边缘.

use std::fmt;

use ndarray::{concatenate, Array3, ArrayView3, Axis};

use super::orient::permute_spacing;
use super::slice::SliceView;
use super::{Side, VolumeSet};
use crate::error::{ReportError, Result};
use crate::{Idx2d, Spacing};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 解剖平面.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Plane {
    /// 轴位 (水平面).
    Axial,

    /// 冠状位.
    Coronal,

    /// 矢状位, 仅右侧 ROI.
    SagittalRight,

    /// 矢状位, 仅左侧 ROI. 切片顺序与其他平面相反.
    SagittalLeft,
}

impl Plane {
    /// 报告中的处理顺序.
    pub const ALL: [Plane; 4] = [
        Self::Axial,
        Self::Coronal,
        Self::SagittalRight,
        Self::SagittalLeft,
    ];

    /// 决定切片是否合格的 ROI. 同时也是合成时需要叠加的 ROI, 左侧在前.
    #[inline]
    pub fn gating(self) -> &'static [Side] {
        match self {
            Self::Axial | Self::Coronal => &[Side::Left, Side::Right],
            Self::SagittalRight => &[Side::Right],
            Self::SagittalLeft => &[Side::Left],
        }
    }

    /// 最多显示的行数.
    #[inline]
    pub fn max_rows(self) -> usize {
        match self {
            Self::Axial | Self::Coronal => 2,
            Self::SagittalRight | Self::SagittalLeft => 1,
        }
    }

    /// 挑选结果是否需要倒序.
    #[inline]
    pub fn is_reversed(self) -> bool {
        matches!(self, Self::SagittalLeft)
    }

    /// 本平面块之后的纵向间隔. 两个矢状位半视图紧挨在一起.
    #[inline]
    pub fn gap_after(self, gap: f64) -> f64 {
        match self {
            Self::SagittalRight => 0.0,
            _ => gap,
        }
    }

    /// 名称.
    pub fn name(self) -> &'static str {
        match self {
            Self::Axial => "axial",
            Self::Coronal => "coronal",
            Self::SagittalRight => "sagittal-right",
            Self::SagittalLeft => "sagittal-left",
        }
    }

    #[inline]
    fn stage(self) -> Stage {
        match self {
            Self::Axial => Stage::Axial,
            Self::Coronal => Stage::Coronal,
            Self::SagittalRight | Self::SagittalLeft => Stage::Sagittal,
        }
    }
}

impl fmt::Display for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 流水线阶段. 顺序即处理顺序.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
enum Stage {
    Canonical,
    Axial,
    Coronal,
    Sagittal,
}

/// 相邻阶段之间的轴变换: 第 `i` 个新轴取第 `perm[i]` 个旧轴, 然后翻转新轴 `invert`.
struct AxisMap {
    perm: [usize; 3],
    invert: usize,
}

impl Stage {
    /// 从上一阶段进入本阶段的变换.
    fn entry_map(self) -> AxisMap {
        match self {
            Stage::Canonical => unreachable!("规范阶段没有前驱"),
            Stage::Axial => AxisMap { perm: [1, 0, 2], invert: 0 },
            Stage::Coronal => AxisMap { perm: [2, 1, 0], invert: 0 },
            Stage::Sagittal => AxisMap { perm: [0, 2, 1], invert: 1 },
        }
    }

    fn next(self) -> Option<Stage> {
        match self {
            Stage::Canonical => Some(Stage::Axial),
            Stage::Axial => Some(Stage::Coronal),
            Stage::Coronal => Some(Stage::Sagittal),
            Stage::Sagittal => None,
        }
    }
}

/// 参与绘制的三个体数据 (解剖扫描与左右 ROI) 以及它们的体素分辨率.
///
/// 参考掩膜在裁剪之后不再需要, 因此不属于此结构.
#[derive(Debug, Clone)]
pub struct PlaneStack {
    base: Array3<f32>,
    roi_left: Array3<f32>,
    roi_right: Array3<f32>,
    spacing: Spacing,
    stage: Stage,
}

impl From<VolumeSet> for PlaneStack {
    /// 丢弃参考掩膜, 得到规范阶段 (LAS) 的体数据.
    fn from(volumes: VolumeSet) -> Self {
        let (spacing, [base, roi_left, roi_right, _]) = volumes.into_parts();
        Self {
            base,
            roi_left,
            roi_right,
            spacing,
            stage: Stage::Canonical,
        }
    }
}

impl PlaneStack {
    /// 体数据形状 (行, 列, 切片).
    #[inline]
    pub fn shape(&self) -> crate::Idx3d {
        self.base.dim()
    }

    /// 切片形状 (行, 列).
    #[inline]
    pub fn slice_shape(&self) -> Idx2d {
        let (r, c, _) = self.shape();
        (r, c)
    }

    /// 切片个数.
    #[inline]
    pub fn len_slices(&self) -> usize {
        self.shape().2
    }

    /// 体素分辨率, 顺序与 (行, 列, 切片) 一致.
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

    /// 解剖扫描的第 `index` 张切片.
    ///
    /// 当 `index` 越界时 panic.
    #[inline]
    pub fn base_slice(&self, index: usize) -> SliceView<'_> {
        SliceView::new(self.base.index_axis(Axis(2), index))
    }

    /// 给定侧 ROI 的第 `index` 张切片.
    ///
    /// 当 `index` 越界时 panic.
    #[inline]
    pub fn roi_slice(&self, side: Side, index: usize) -> SliceView<'_> {
        let v = match side {
            Side::Left => &self.roi_left,
            Side::Right => &self.roi_right,
        };
        SliceView::new(v.index_axis(Axis(2), index))
    }

    /// 将体数据变换到 `plane` 的方向.
    ///
    /// 变换从当前阶段出发, 依次经过中间阶段; 从轴位进入冠状位时会在足头方向两端各补
    /// `trunc(foot_head_margin * len)` 张全零切片. 已处于目标阶段时什么也不做.
    ///
    /// 如果目标平面位于当前阶段之前 (例如已经处于矢状位却请求轴位), 返回
    /// `Err(ReportError::InvalidInput)`.
    pub fn to_plane_orientation(mut self, plane: Plane, foot_head_margin: f64) -> Result<Self> {
        let target = plane.stage();
        if target < self.stage {
            return Err(ReportError::InvalidInput(format!(
                "平面 `{plane}` 必须在 {:?} 阶段之前处理",
                self.stage
            )));
        }
        while self.stage < target {
            // `self.stage < target` 保证存在后继.
            let Some(next) = self.stage.next() else { break };
            if next == Stage::Coronal {
                self = self.pad_foot_head(foot_head_margin);
            }
            self = self.apply(next);
        }
        Ok(self)
    }

    /// 在当前切片轴 (轴位阶段即足头方向) 两端补黑.
    fn pad_foot_head(self, margin: f64) -> Self {
        let len = self.len_slices();
        let n = (margin * len as f64) as usize;
        if n == 0 {
            return self;
        }
        let pad = |v: Array3<f32>| {
            let (r, c, _) = v.dim();
            let zeros = Array3::<f32>::zeros((r, c, n));
            // 形状除拼接轴外一致, 不会失败.
            concatenate(Axis(2), &[zeros.view(), v.view(), zeros.view()])
                .unwrap_or_else(|_| unreachable!())
        };
        Self {
            base: pad(self.base),
            roi_left: pad(self.roi_left),
            roi_right: pad(self.roi_right),
            ..self
        }
    }

    /// 进入阶段 `next`.
    fn apply(self, next: Stage) -> Self {
        let AxisMap { perm, invert } = next.entry_map();
        let f = |v: Array3<f32>| {
            let mut v = v.permuted_axes(perm);
            v.invert_axis(Axis(invert));
            v.as_standard_layout().into_owned()
        };
        Self {
            base: f(self.base),
            roi_left: f(self.roi_left),
            roi_right: f(self.roi_right),
            spacing: permute_spacing(self.spacing, perm),
            stage: next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 在 `(x, y, z)` 处打一个点, 其余为 0.
    fn marked(shape: crate::Idx3d, at: crate::Idx3d) -> Array3<f32> {
        let mut a = Array3::zeros(shape);
        a[at] = 1.0;
        a
    }

    fn stack(shape: crate::Idx3d, at: crate::Idx3d, spacing: Spacing) -> PlaneStack {
        let set = VolumeSet::new(
            spacing,
            marked(shape, at),
            marked(shape, at),
            marked(shape, at),
            marked(shape, at),
        )
        .unwrap();
        PlaneStack::from(set)
    }

    fn argmax(a: ArrayView3<'_, f32>) -> crate::Idx3d {
        a.indexed_iter()
            .find(|(_, v)| **v == 1.0)
            .map(|(p, _)| p)
            .unwrap()
    }

    #[test]
    fn test_axial() {
        let (nx, ny, nz) = (4, 5, 6);
        let s = stack((nx, ny, nz), (1, 2, 3), [1.0, 2.0, 3.0])
            .to_plane_orientation(Plane::Axial, 0.05)
            .unwrap();
        assert_eq!(s.shape(), (ny, nx, nz));
        assert_eq!(s.spacing(), [2.0, 1.0, 3.0]);
        assert_eq!(argmax(s.base()), (ny - 1 - 2, 1, 3));
    }

    #[test]
    fn test_coronal_pads_and_rotates() {
        let (nx, ny, nz) = (4, 5, 40);
        let s = stack((nx, ny, nz), (1, 2, 3), [1.0, 2.0, 3.0])
            .to_plane_orientation(Plane::Axial, 0.05)
            .unwrap()
            .to_plane_orientation(Plane::Coronal, 0.05)
            .unwrap();
        // 40 * 0.05 = 2 张补黑切片在两端.
        let nz_pad = nz + 4;
        assert_eq!(s.shape(), (nz_pad, nx, ny));
        assert_eq!(s.spacing(), [3.0, 1.0, 2.0]);
        // z = 3 补黑后为 5, 再反向.
        assert_eq!(argmax(s.roi(Side::Left)), (nz_pad - 1 - 5, 1, ny - 1 - 2));
    }

    #[test]
    fn test_sagittal_pipeline() {
        let (nx, ny, nz) = (4, 5, 6);
        let s = stack((nx, ny, nz), (1, 2, 3), [1.0, 2.0, 3.0])
            .to_plane_orientation(Plane::SagittalRight, 0.0)
            .unwrap();
        assert_eq!(s.shape(), (nz, ny, nx));
        assert_eq!(s.spacing(), [3.0, 2.0, 1.0]);
        assert_eq!(argmax(s.roi(Side::Right)), (nz - 1 - 3, 2, 1));

        // 左右矢状位共用同一阶段.
        let s = s.to_plane_orientation(Plane::SagittalLeft, 0.0).unwrap();
        assert_eq!(s.shape(), (nz, ny, nx));
        assert_eq!(s.base_slice(1)[(nz - 1 - 3, 2)], 1.0);
    }

    #[test]
    fn test_backwards_is_rejected() {
        let s = stack((2, 2, 2), (0, 0, 0), [1.0; 3])
            .to_plane_orientation(Plane::Coronal, 0.0)
            .unwrap();
        assert!(matches!(
            s.to_plane_orientation(Plane::Axial, 0.0),
            Err(ReportError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_plane_properties() {
        assert_eq!(Plane::Axial.gating(), &[Side::Left, Side::Right]);
        assert_eq!(Plane::SagittalLeft.gating(), &[Side::Left]);
        assert_eq!(Plane::SagittalRight.gating(), &[Side::Right]);
        assert!(Plane::SagittalLeft.is_reversed());
        assert!(!Plane::Axial.is_reversed());
        assert_eq!(Plane::Coronal.max_rows(), 2);
        assert_eq!(Plane::SagittalRight.max_rows(), 1);
        assert_eq!(Plane::SagittalRight.gap_after(2.0), 0.0);
        assert_eq!(Plane::Axial.gap_after(2.0), 2.0);
    }
}
