//! 报告生成.
//!
//! [`build_report`] 依次执行: 视野裁剪 (前后, 足头), 然后对 轴位 → 冠状位 →
//! 右矢状位 → 左矢状位 逐个平面地重切、挑选切片、合成图像并排版.
//!
//! 参考掩膜为空 (无法裁剪) 和平面上没有合格切片这两种情况不会中断流程,
//! 而是分别记录在 [`Report::crops`] 和 [`Report::planes`] 中.

use std::path::Path;

use image::ImageResult;
use ndarray::{Array3, Axis};

use crate::config::ReportConfig;
use crate::consts::header;
use crate::data::crop::{compute_bounds, crop_all};
use crate::data::reslice::{Plane, PlaneStack};
use crate::data::select::{find_candidate_slices, select_for_plane};
use crate::data::VolumeSet;
use crate::error::{ReportError, Result};
use crate::layout::{cell_height, Cell, LayoutCursor};
use crate::render::{composite, CompositeImage, ImgWriteVis, Layer};
use crate::Spacing;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 一行页眉文本及其样式.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HeaderLine {
    /// 文本.
    pub text: String,

    /// 字号 (pt).
    pub size_pt: f32,

    /// RGB 颜色.
    pub color: [u8; 3],

    /// 是否水平居中. 否则左对齐于网格原点.
    pub centered: bool,
}

impl HeaderLine {
    /// 为四行页眉分配样式: 标题居中大字, 第二行黑色正文,
    /// 第三、四行分别使用与左右 ROI 对应的绿色和红色.
    pub fn styled(lines: [String; 4]) -> [HeaderLine; 4] {
        let [title, total, left, right] = lines;
        let body = |text: String, color: [u8; 3]| HeaderLine {
            text,
            size_pt: header::BODY_PT,
            color,
            centered: false,
        };
        [
            HeaderLine {
                text: title,
                size_pt: header::TITLE_PT,
                color: header::BLACK,
                centered: true,
            },
            body(total, header::BLACK),
            body(left, header::LEFT_GREEN),
            body(right, header::RIGHT_RED),
        ]
    }
}

/// 已摆放到页面上的一张合成图像.
#[derive(Clone, Debug)]
pub struct Placement {
    /// 所属平面.
    pub plane: Plane,

    /// 切片在该平面重切后体数据中的索引.
    pub slice: usize,

    /// 合成图像.
    pub image: CompositeImage,

    /// 页面上的位置和尺寸 (mm).
    pub cell: Cell,
}

/// 保存合成好的彩色图像.
impl ImgWriteVis for Placement {
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        self.image.save(path)
    }
}

/// 单个平面的处理结果.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum PlaneStatus {
    /// 至少摆放了一张图像.
    Placed,

    /// 没有切片满足覆盖度阈值, 该平面没有图像.
    NoOverlap,
}

/// 单个平面的处理摘要.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlaneOutcome {
    /// 平面.
    pub plane: Plane,

    /// 候选切片个数.
    pub candidates: usize,

    /// 最终挑选的切片, 按摆放顺序.
    pub selected: Vec<usize>,

    /// 单元格宽 (mm).
    pub cell_width: f64,

    /// 单元格高 (mm).
    pub cell_height: f64,

    /// 状态.
    pub status: PlaneStatus,
}

/// 单次裁剪的结果.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case", tag = "kind"))]
pub enum CropOutcome {
    /// 已裁剪到闭区间 `[lo, hi]`.
    Cropped {
        /// 轴序号.
        axis: usize,
        /// 下界.
        lo: usize,
        /// 上界 (包含).
        hi: usize,
    },

    /// 参考掩膜在该轴上为空, 未裁剪.
    Skipped {
        /// 轴序号.
        axis: usize,
    },
}

/// 一份排版好的报告. 不包含任何文件 I/O.
#[derive(Clone, Debug)]
pub struct Report {
    /// 四行页眉.
    pub header: [HeaderLine; 4],

    /// 所有图像, 按平面顺序, 平面内按挑选顺序.
    pub placements: Vec<Placement>,

    /// 每个平面的摘要, 按处理顺序.
    pub planes: Vec<PlaneOutcome>,

    /// 两次裁剪的结果, 依次为前后和足头方向.
    pub crops: Vec<CropOutcome>,
}

impl Report {
    /// 所有图像中最靠下的边界. 没有图像时返回 `None`.
    pub fn content_bottom(&self) -> Option<f64> {
        self.placements
            .iter()
            .map(|p| p.cell.bottom())
            .reduce(f64::max)
    }

    /// 属于 `plane` 的图像.
    pub fn placements_of(&self, plane: Plane) -> impl Iterator<Item = &Placement> {
        self.placements.iter().filter(move |p| p.plane == plane)
    }

    /// 给定平面的摘要.
    pub fn outcome(&self, plane: Plane) -> Option<&PlaneOutcome> {
        self.planes.iter().find(|o| o.plane == plane)
    }
}

/// 由 LAS 约定的体数据生成报告.
///
/// `roi_left`, `roi_right` 应当已规范化到 `[0, 1]`; `extent_ref` 只用于确定裁剪范围.
///
/// # 错误
///
/// 形状不一致, 体数据为空, 体素分辨率非法, 或 `config` 非法时返回
/// `Err(ReportError::InvalidInput)`. 其他情况都会得到一份 (可能不含图像的) 报告.
pub fn build_report(
    spacing: Spacing,
    base: Array3<f32>,
    roi_left: Array3<f32>,
    roi_right: Array3<f32>,
    extent_ref: Array3<f32>,
    header_lines: [String; 4],
    config: &ReportConfig,
) -> Result<Report> {
    let volumes = VolumeSet::new(spacing, base, roi_left, roi_right, extent_ref)?;
    build_report_from(volumes, header_lines, config)
}

/// 同 [`build_report`], 但接受已经组装好的体数据组.
pub fn build_report_from(
    volumes: VolumeSet,
    header_lines: [String; 4],
    config: &ReportConfig,
) -> Result<Report> {
    config.validate()?;
    log::info!(
        "building report for volumes of shape {:?}, spacing {:?}",
        volumes.shape(),
        volumes.spacing()
    );

    let (volumes, crops) = crop_volumes(volumes, config)?;
    let mut stack = PlaneStack::from(volumes);
    let mut cursor = LayoutCursor::new(config.origin_y);
    let mut placements = Vec::new();
    let mut planes = Vec::with_capacity(Plane::ALL.len());

    for plane in Plane::ALL {
        stack = stack.to_plane_orientation(plane, config.foot_head_margin)?;
        let (rows, cols) = stack.slice_shape();
        let [row_mm, col_mm, _] = stack.spacing();
        let cell_h = cell_height(config.cell_width, rows, cols, row_mm, col_mm);
        log::debug!("plane `{plane}`: slice shape ({rows}, {cols}), cell height {cell_h:.3} mm");

        let gap = plane.gap_after(config.plane_gap);
        let (candidates, selected, status) =
            match find_candidate_slices(&stack, plane, config.coverage_fraction) {
                Ok(c) => {
                    let selected = select_for_plane(&c, plane, config.row_width);
                    (c.len(), selected, PlaneStatus::Placed)
                }
                Err(e @ ReportError::NoOverlap { .. }) => {
                    log::warn!("{e}");
                    (0, Vec::new(), PlaneStatus::NoOverlap)
                }
                Err(e) => return Err(e),
            };
        log::info!("plane `{plane}`: {candidates} candidates, selected {selected:?}");

        cursor = match status {
            PlaneStatus::Placed => {
                let (cells, next) = cursor.place(
                    selected.len(),
                    config.row_width,
                    config.cell_width,
                    cell_h,
                    config.origin_x,
                    gap,
                );
                for (&slice, cell) in selected.iter().zip(cells) {
                    let layers: Vec<Layer<'_>> = plane
                        .gating()
                        .iter()
                        .map(|&side| Layer {
                            data: stack.roi_slice(side, slice),
                            colormap: config.colormap(side),
                            transparency: config.transparency,
                        })
                        .collect();
                    let image = composite(stack.base_slice(slice), &layers);
                    placements.push(Placement {
                        plane,
                        slice,
                        image,
                        cell,
                    });
                }
                next
            }
            PlaneStatus::NoOverlap => cursor.skip(gap),
        };

        planes.push(PlaneOutcome {
            plane,
            candidates,
            selected,
            cell_width: config.cell_width,
            cell_height: cell_h,
            status,
        });
    }

    Ok(Report {
        header: HeaderLine::styled(header_lines),
        placements,
        planes,
        crops,
    })
}

/// 依次在前后 (Y) 和足头 (Z) 方向上裁剪. 参考掩膜为空的方向跳过.
fn crop_volumes(
    mut volumes: VolumeSet,
    config: &ReportConfig,
) -> Result<(VolumeSet, Vec<CropOutcome>)> {
    let mut crops = Vec::with_capacity(2);
    for (axis, padding) in [
        (Axis(1), config.pad_anterior_posterior),
        (Axis(2), config.pad_foot_head),
    ] {
        let bounds = compute_bounds(volumes.extent_ref(), axis, padding);
        match bounds {
            Ok((lo, hi)) => {
                log::debug!("cropping axis {} to [{lo}, {hi}]", axis.index());
                volumes = crop_all(volumes, axis, lo, hi);
                crops.push(CropOutcome::Cropped {
                    axis: axis.index(),
                    lo,
                    hi,
                });
            }
            Err(e) if e.is_recoverable() => {
                log::warn!("{e}, crop skipped");
                crops.push(CropOutcome::Skipped { axis: axis.index() });
            }
            Err(e) => return Err(e),
        }
    }
    Ok((volumes, crops))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Side;

    const N: usize = 64;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn sphere(center: (usize, usize, usize), radius: usize) -> Array3<f32> {
        let (cx, cy, cz) = center;
        let d = |a: usize, b: usize| (a as i64 - b as i64).pow(2);
        Array3::from_shape_fn((N, N, N), |(x, y, z)| {
            (d(x, cx) + d(y, cy) + d(z, cz) <= (radius * radius) as i64) as u8 as f32
        })
    }

    fn header() -> [String; 4] {
        [
            "HippoDeep Report".to_string(),
            "total".to_string(),
            "left".to_string(),
            "right".to_string(),
        ]
    }

    #[test]
    fn test_sphere_left_only() {
        let _ = simple_logger::init_with_level(log::Level::Debug);
        let base = Array3::<f32>::ones((N, N, N));
        let report = build_report(
            [1.0; 3],
            base.clone(),
            sphere((20, 32, 32), 10),
            Array3::zeros((N, N, N)),
            base,
            header(),
            &ReportConfig::default(),
        )
        .unwrap();

        // 参考掩膜覆盖全部体积, 裁剪后不变.
        assert_eq!(
            report.crops,
            vec![
                CropOutcome::Cropped { axis: 1, lo: 0, hi: 63 },
                CropOutcome::Cropped { axis: 2, lo: 0, hi: 63 },
            ]
        );

        // 右侧 ROI 为空, 所有以它为门控的平面都没有图像.
        for plane in [Plane::Axial, Plane::Coronal, Plane::SagittalRight] {
            let o = report.outcome(plane).unwrap();
            assert_eq!(o.status, PlaneStatus::NoOverlap);
            assert!(o.selected.is_empty());
            assert_eq!(report.placements_of(plane).count(), 0);
        }

        // 矢状位切片即 X 索引. 覆盖度阈值 trunc(0.001 * 70 * 64) = 4, 候选为 11..=29.
        let o = report.outcome(Plane::SagittalLeft).unwrap();
        assert_eq!(o.status, PlaneStatus::Placed);
        assert_eq!(o.candidates, 19);
        assert_eq!(o.selected, vec![25, 22, 19, 16, 13]);
        let sel: Vec<usize> = report
            .placements_of(Plane::SagittalLeft)
            .map(|p| p.slice)
            .collect();
        assert_eq!(sel, o.selected);

        // 空平面只前进平面间隔.
        let first = &report.placements[0];
        assert!(f64_eq(first.cell.y, 55.0 + 2.0 + 2.0));
        assert!(f64_eq(first.cell.x, 10.0));

        // 图像: 行 = 足头 (补黑后 70), 列 = 前后 (64).
        assert_eq!(first.image.dimensions(), (64, 70));
        assert_eq!(report.header[0].text, "HippoDeep Report");
        assert!(report.header[0].centered);
        assert_eq!(report.header[2].color, header::LEFT_GREEN);
    }

    #[test]
    fn test_overlay_colours_sagittal_left() {
        let base = Array3::<f32>::ones((N, N, N));
        let report = build_report(
            [1.0; 3],
            base.clone(),
            sphere((20, 32, 32), 10),
            Array3::zeros((N, N, N)),
            base,
            header(),
            &ReportConfig::default(),
        )
        .unwrap();
        let p = report.placements_of(Plane::SagittalLeft).nth(2).unwrap();
        assert_eq!(p.slice, 19);
        // 球心位于 (Z = 32 + 3 补黑 -> 反向后行 70 - 1 - 35 = 34, Y = 32).
        // 白底 + 绿色 alpha 102: r = b = (255 * 153 + 127) / 255 = 153.
        assert_eq!(p.image.get_pixel(32, 34), &image::Rgb([153, 255, 153]));
        assert_eq!(p.image.get_pixel(0, 0), &image::Rgb([0, 0, 0]));
        assert_eq!(p.image.get_pixel(0, 10), &image::Rgb([255, 255, 255]));
    }

    #[test]
    fn test_anisotropic_cell_heights() {
        let base = Array3::<f32>::ones((N, N, N));
        let build = |spacing: Spacing| {
            build_report(
                spacing,
                base.clone(),
                sphere((20, 32, 32), 10),
                sphere((44, 32, 32), 10),
                base.clone(),
                header(),
                &ReportConfig::default(),
            )
            .unwrap()
        };
        let iso = build([1.0, 1.0, 1.0]);
        let aniso = build([1.0, 1.0, 2.0]);

        for r in [&iso, &aniso] {
            assert!(r.planes.iter().all(|o| o.status == PlaneStatus::Placed));
            assert_eq!(r.outcome(Plane::Axial).unwrap().selected.len(), 10);
        }

        // 轴位: 行 = Y, 列 = X, 分辨率比 1:1.
        let h = |r: &Report, plane| r.outcome(plane).unwrap().cell_height;
        assert!(f64_eq(h(&iso, Plane::Axial), 38.0));
        assert!(f64_eq(h(&aniso, Plane::Axial), 38.0));

        // 冠状位和矢状位: 行 = Z (补黑后 70), 分辨率比 resZ / resX 或 resZ / resY.
        for plane in [Plane::Coronal, Plane::SagittalRight, Plane::SagittalLeft] {
            assert!(f64_eq(h(&iso, plane), 38.0 * 70.0 / 64.0));
            assert!(f64_eq(h(&aniso, plane), 38.0 * 70.0 / 64.0 * 2.0));
            let p = aniso.placements_of(plane).next().unwrap();
            let (w, ht) = p.image.dimensions();
            let expected = ht as f64 / w as f64 * 2.0;
            assert!(f64_eq(p.cell.height / p.cell.width, expected));
        }
    }

    #[test]
    fn test_planes_do_not_overlap() {
        let base = Array3::<f32>::ones((N, N, N));
        let report = build_report(
            [1.0; 3],
            base.clone(),
            sphere((20, 32, 32), 10),
            sphere((44, 32, 32), 10),
            base,
            header(),
            &ReportConfig::default(),
        )
        .unwrap();
        let cells: Vec<Cell> = report.placements.iter().map(|p| p.cell).collect();
        for (i, a) in cells.iter().enumerate() {
            for b in &cells[i + 1..] {
                assert!(!a.overlaps(b), "{a:?} {b:?}");
            }
        }
        // 两个矢状位半视图之间没有间隔.
        let r = report.placements_of(Plane::SagittalRight).next().unwrap();
        let l = report.placements_of(Plane::SagittalLeft).next().unwrap();
        assert!(f64_eq(r.cell.bottom(), l.cell.y));
        assert!(report.content_bottom().unwrap() > l.cell.y);
    }

    #[test]
    fn test_empty_extent_skips_crop() {
        let base = Array3::<f32>::ones((N, N, N));
        let report = build_report(
            [1.0; 3],
            base,
            sphere((20, 32, 32), 10),
            sphere((44, 32, 32), 10),
            Array3::zeros((N, N, N)),
            header(),
            &ReportConfig::default(),
        )
        .unwrap();
        assert_eq!(
            report.crops,
            vec![CropOutcome::Skipped { axis: 1 }, CropOutcome::Skipped { axis: 2 }]
        );
        assert!(!report.placements.is_empty());
    }

    #[test]
    fn test_crop_follows_extent() {
        let base = Array3::<f32>::ones((N, N, N));
        // 参考掩膜 Y 方向 [12, 51], Z 方向 [22, 41].
        let extent = Array3::from_shape_fn((N, N, N), |(_, y, z)| {
            ((12..=51).contains(&y) && (22..=41).contains(&z)) as u8 as f32
        });
        let report = build_report(
            [1.0; 3],
            base,
            sphere((20, 32, 32), 8),
            sphere((44, 32, 32), 8),
            extent,
            header(),
            &ReportConfig::default(),
        )
        .unwrap();
        // Y: delta = trunc(0.2 * 39) = 7; Z: delta = trunc(0.1 * 19) = 1.
        assert_eq!(
            report.crops,
            vec![
                CropOutcome::Cropped { axis: 1, lo: 5, hi: 58 },
                CropOutcome::Cropped { axis: 2, lo: 21, hi: 42 },
            ]
        );
        // 轴位切片: 行 = Y (54), 列 = X (64).
        let p = report.placements_of(Plane::Axial).next().unwrap();
        assert_eq!(p.image.dimensions(), (64, 54));
    }

    #[test]
    fn test_invalid_input() {
        let ones = || Array3::<f32>::ones((4, 4, 4));
        let r = build_report(
            [1.0, 0.0, 1.0],
            ones(),
            ones(),
            ones(),
            ones(),
            header(),
            &ReportConfig::default(),
        );
        assert!(matches!(r, Err(ReportError::InvalidInput(_))));

        let r = build_report(
            [1.0; 3],
            ones(),
            ones(),
            Array3::ones((4, 4, 5)),
            ones(),
            header(),
            &ReportConfig::default(),
        );
        assert!(matches!(r, Err(ReportError::InvalidInput(_))));

        let config = ReportConfig {
            transparency: -1.0,
            ..Default::default()
        };
        let r = build_report([1.0; 3], ones(), ones(), ones(), ones(), header(), &config);
        assert!(matches!(r, Err(ReportError::InvalidInput(_))));
    }

    #[test]
    fn test_sides_follow_config() {
        let config = ReportConfig::default();
        assert_eq!(config.colormap(Side::Left), crate::ColormapId::Green);
        assert_eq!(config.colormap(Side::Right), crate::ColormapId::Red);
    }
}
