//! 报告参数.

use crate::colormap::ColormapId;
use crate::consts::{crop, overlay, page};
use crate::data::Side;
use crate::error::{ReportError, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 生成报告所需的全部可调参数. 默认值即为常用的 A4 单页排版.
///
/// 开启 `serde` feature 后可从任意格式反序列化, 缺失的字段取默认值.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReportConfig {
    /// 每行切片数.
    pub row_width: usize,

    /// 单元格宽度 (mm).
    pub cell_width: f64,

    /// 网格左上角横坐标 (mm).
    pub origin_x: f64,

    /// 第一个平面块的纵坐标 (mm).
    pub origin_y: f64,

    /// 平面块之间的间隔 (mm).
    pub plane_gap: f64,

    /// ROI 图层不透明度, 位于 `[0, 1]`.
    pub transparency: f32,

    /// 合格切片所需的最小 ROI 覆盖比例.
    pub coverage_fraction: f64,

    /// 前后方向裁剪扩展比例.
    pub pad_anterior_posterior: f64,

    /// 足头方向裁剪扩展比例.
    pub pad_foot_head: f64,

    /// 冠状位之前足头方向两端补黑的比例.
    pub foot_head_margin: f64,

    /// 左侧 ROI 查找表.
    pub left_colormap: ColormapId,

    /// 右侧 ROI 查找表.
    pub right_colormap: ColormapId,

    /// 页宽 (mm).
    pub page_width: f64,

    /// 页高 (mm).
    pub page_height: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            row_width: page::ROW_WIDTH,
            cell_width: page::CELL_WIDTH_MM,
            origin_x: page::ORIGIN_X_MM,
            origin_y: page::ORIGIN_Y_MM,
            plane_gap: page::PLANE_GAP_MM,
            transparency: overlay::TRANSPARENCY,
            coverage_fraction: overlay::COVERAGE_FRACTION,
            pad_anterior_posterior: crop::PAD_ANTERIOR_POSTERIOR,
            pad_foot_head: crop::PAD_FOOT_HEAD,
            foot_head_margin: crop::FOOT_HEAD_MARGIN,
            left_colormap: ColormapId::Green,
            right_colormap: ColormapId::Red,
            page_width: page::A4_WIDTH_MM,
            page_height: page::A4_HEIGHT_MM,
        }
    }
}

impl ReportConfig {
    /// 检查参数是否合理. 不合理时返回 `Err(ReportError::InvalidInput)`.
    pub fn validate(&self) -> Result<()> {
        fn non_negative(name: &str, v: f64) -> Result<()> {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(ReportError::InvalidInput(format!("`{name}` 必须为非负有限数, 但得到 {v}")))
            }
        }

        fn positive(name: &str, v: f64) -> Result<()> {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(ReportError::InvalidInput(format!("`{name}` 必须为正有限数, 但得到 {v}")))
            }
        }

        if self.row_width == 0 {
            return Err(ReportError::InvalidInput("`row_width` 不能为 0".into()));
        }
        positive("cell_width", self.cell_width)?;
        non_negative("origin_x", self.origin_x)?;
        non_negative("origin_y", self.origin_y)?;
        non_negative("plane_gap", self.plane_gap)?;
        non_negative("coverage_fraction", self.coverage_fraction)?;
        non_negative("pad_anterior_posterior", self.pad_anterior_posterior)?;
        non_negative("pad_foot_head", self.pad_foot_head)?;
        non_negative("foot_head_margin", self.foot_head_margin)?;
        positive("page_width", self.page_width)?;
        positive("page_height", self.page_height)?;
        if !(0.0..=1.0).contains(&self.transparency) {
            return Err(ReportError::InvalidInput(format!(
                "`transparency` 必须位于 [0, 1], 但得到 {}",
                self.transparency
            )));
        }
        Ok(())
    }

    /// 给定侧 ROI 的查找表.
    #[inline]
    pub fn colormap(&self, side: Side) -> ColormapId {
        match side {
            Side::Left => self.left_colormap,
            Side::Right => self.right_colormap,
        }
    }

    /// 一整行网格的宽度 (mm).
    #[inline]
    pub fn grid_width(&self) -> f64 {
        self.row_width as f64 * self.cell_width
    }
}
