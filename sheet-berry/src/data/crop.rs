//! 视野裁剪.
//!
//! 以参考掩膜在某一轴上的非零范围为准, 对称扩展后同步裁剪所有体数据.
//! 流程上会先后在前后 (Y) 和足头 (Z) 两个轴上各裁剪一次.

use itertools::{Itertools, MinMaxResult};
use ndarray::{ArrayView3, Axis, Slice};

use super::{normalize_unit_max, VolumeSet};
use crate::error::{ReportError, Result};

/// 计算参考掩膜 `extent_ref` 在 `axis` 轴上的裁剪边界 `(lo, hi)`, 两端均为闭区间.
///
/// 先对另外两个轴求和, 找到和非零的最小和最大索引, 再向两侧各扩展
/// `trunc(padding * (hi - lo))` 个体素, 最后截断到 `[0, len)`.
///
/// # 错误
///
/// 1. 如果参考掩膜在该轴上全为零, 返回 `Err(ReportError::EmptyExtent)`.
/// 2. 如果 `axis` 越界或 `padding` 不是非负有限数, 返回 `Err(ReportError::InvalidInput)`.
pub fn compute_bounds(
    extent_ref: ArrayView3<'_, f32>,
    axis: Axis,
    padding: f64,
) -> Result<(usize, usize)> {
    if axis.index() >= 3 {
        return Err(ReportError::InvalidInput(format!("轴 {} 越界", axis.index())));
    }
    if !(padding.is_finite() && padding >= 0.0) {
        return Err(ReportError::InvalidInput(format!(
            "扩展比例必须为非负有限数, 但得到 {padding}"
        )));
    }

    let (lo, hi) = match extent_ref
        .axis_iter(axis)
        .map(|plane| plane.sum())
        .positions(|sum| sum != 0.0)
        .minmax()
    {
        MinMaxResult::NoElements => {
            return Err(ReportError::EmptyExtent { axis: axis.index() })
        }
        MinMaxResult::OneElement(i) => (i, i),
        MinMaxResult::MinMax(lo, hi) => (lo, hi),
    };

    let len = extent_ref.len_of(axis);
    let delta = (padding * (hi - lo) as f64) as usize;
    Ok((lo.saturating_sub(delta), hi.saturating_add(delta).min(len - 1)))
}

/// 将所有体数据在 `axis` 轴上同步裁剪到闭区间 `[lo, hi]`, 然后把解剖扫描重新规范化为最大值 1.0.
///
/// 全零的解剖扫描不做规范化.
///
/// # 注意
///
/// 要求 `lo <= hi < len`, 否则程序 panic. [`compute_bounds`] 的结果总是满足该条件.
pub fn crop_all(volumes: VolumeSet, axis: Axis, lo: usize, hi: usize) -> VolumeSet {
    assert!(
        lo <= hi && hi < volumes.base.len_of(axis),
        "裁剪区间 [{lo}, {hi}] 越界"
    );
    let spacing = volumes.spacing();
    let mut cropped = volumes.map_volumes(spacing, |v| {
        v.slice_axis(axis, Slice::from(lo..=hi)).to_owned()
    });
    if !normalize_unit_max(&mut cropped.base) {
        log::debug!("base volume is blank after cropping axis {}", axis.index());
    }
    cropped
}
