//! 切片挑选.
//!
//! 先找出所有满足 ROI 覆盖度阈值的候选切片, 再从中以居中、等间隔的方式挑选出至多
//! `max_rows` 行的切片.

use ndarray::{ArrayView3, Axis};

use super::reslice::{Plane, PlaneStack};
use super::slice::SliceView;
use crate::error::{ReportError, Result};
use crate::Idx2d;

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelIterator, ParallelIterator};
    }
}

/// 覆盖度阈值: `trunc(fraction * 行数 * 列数)`.
#[inline]
pub fn coverage_threshold((rows, cols): Idx2d, fraction: f64) -> usize {
    (fraction * (rows * cols) as f64) as usize
}

/// 统计 `roi` 每张切片 (最后一维) 的非零像素个数.
#[cfg(not(feature = "rayon"))]
fn nonzero_per_slice(roi: &ArrayView3<'_, f32>) -> Vec<usize> {
    roi.axis_iter(Axis(2))
        .map(|s| SliceView::new(s).count_nonzero())
        .collect()
}

/// 借助 `rayon`, 并行地统计 `roi` 每张切片 (最后一维) 的非零像素个数.
///
/// 结果顺序与切片顺序一致.
#[cfg(feature = "rayon")]
fn nonzero_per_slice(roi: &ArrayView3<'_, f32>) -> Vec<usize> {
    roi.axis_iter(Axis(2))
        .into_par_iter()
        .map(|s| SliceView::new(s).count_nonzero())
        .collect()
}

/// 找出所有候选切片的索引 (升序).
///
/// 某张切片是候选切片, 当且仅当 `rois` 中每个体数据在该切片上的非零像素个数都严格大于
/// `threshold`. `rois` 为空时返回空列表.
///
/// # 注意
///
/// `rois` 中体数据的切片数必须一致, 否则程序 panic.
pub fn candidate_slices(rois: &[ArrayView3<'_, f32>], threshold: usize) -> Vec<usize> {
    let Some(first) = rois.first() else {
        return Vec::new();
    };
    let len = first.len_of(Axis(2));
    assert!(
        rois.iter().all(|r| r.len_of(Axis(2)) == len),
        "ROI 切片数不一致"
    );

    let counts: Vec<Vec<usize>> = rois.iter().map(nonzero_per_slice).collect();
    (0..len)
        .filter(|&k| counts.iter().all(|c| c[k] > threshold))
        .collect()
}

/// 在已转到 `plane` 方向的 `stack` 上, 以该平面的门控 ROI 寻找候选切片.
///
/// 阈值由切片形状和 `fraction` 经 [`coverage_threshold`] 求出.
/// 没有任何候选切片时返回 `Err(ReportError::NoOverlap)`.
pub fn find_candidate_slices(
    stack: &PlaneStack,
    plane: Plane,
    fraction: f64,
) -> Result<Vec<usize>> {
    let threshold = coverage_threshold(stack.slice_shape(), fraction);
    let rois: Vec<_> = plane.gating().iter().map(|&s| stack.roi(s)).collect();
    let found = candidate_slices(&rois, threshold);
    log::debug!(
        "plane `{plane}`: {} candidate slices over threshold {threshold}",
        found.len()
    );
    if found.is_empty() {
        Err(ReportError::NoOverlap { plane })
    } else {
        Ok(found)
    }
}

/// 需要显示的切片个数.
///
/// 候选数 `n` 超过两行时显示两行, 超过一行时显示一行, 否则全部显示.
/// `max_rows == 1` 时最多显示一行.
#[inline]
fn target_count(n: usize, row_width: usize, max_rows: usize) -> usize {
    if max_rows >= 2 && n > 2 * row_width {
        2 * row_width
    } else if n > row_width {
        row_width
    } else {
        n
    }
}

/// 从升序的候选切片中等间隔地挑选, 并使挑选结果在候选序列中居中.
///
/// `step = n / target`, `start = (n - target * step) / 2`, 从 `start` 开始每隔 `step`
/// 取一个, 共取 `target` 个. 结果保持升序.
pub fn select_subset(candidates: &[usize], row_width: usize, max_rows: usize) -> Vec<usize> {
    let n = candidates.len();
    let target = target_count(n, row_width, max_rows);
    if target == 0 {
        return Vec::new();
    }
    let step = n / target;
    let start = (n - target * step) / 2;
    candidates[start..]
        .iter()
        .step_by(step)
        .take(target)
        .copied()
        .collect()
}

/// 为 `plane` 挑选切片: 按该平面的最大行数挑选, 左侧矢状位再倒序.
pub fn select_for_plane(candidates: &[usize], plane: Plane, row_width: usize) -> Vec<usize> {
    let mut selected = select_subset(candidates, row_width, plane.max_rows());
    if plane.is_reversed() {
        selected.reverse();
    }
    selected
}
