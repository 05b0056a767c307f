//! 报告落盘: PDF 文档, 整页栅格图, 每个切片的独立图像, 以及 JSON 清单.

use anyhow::Context;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use serde::Serialize;
use sheet_berry::prelude::*;

use crate::pdf::write_pdf;
use std::fs;
use std::path::{Path, PathBuf};

/// 默认栅格分辨率.
pub const DEFAULT_DPI: u32 = 150;

/// 整页图像文件名.
pub const PAGE_FILE: &str = "page.png";

/// 清单文件名.
pub const MANIFEST_FILE: &str = "report.json";

const MM_PER_INCH: f64 = 25.4;

/// 清单中的整页信息.
#[derive(Debug, Serialize)]
pub struct PageEntry {
    /// 文件名.
    pub file: String,
    /// 页宽 (mm).
    pub width_mm: f64,
    /// 页高 (mm). 内容超出默认页高时会相应增大.
    pub height_mm: f64,
    /// 栅格分辨率.
    pub dpi: u32,
}

/// 清单中的一张切片图像.
#[derive(Debug, Serialize)]
pub struct PlacementEntry {
    /// 文件名.
    pub file: String,
    /// 平面.
    pub plane: Plane,
    /// 切片索引.
    pub slice: usize,
    /// 页面位置 (mm).
    pub cell: Cell,
}

/// `report.json` 的内容.
#[derive(Debug, Serialize)]
pub struct Manifest<'a> {
    /// PDF 文档文件名.
    pub document: String,
    /// 页眉.
    pub header: &'a [HeaderLine; 4],
    /// 整页图像.
    pub page: PageEntry,
    /// 切片图像.
    pub placements: Vec<PlacementEntry>,
    /// 平面摘要.
    pub planes: &'a [PlaneOutcome],
    /// 裁剪结果.
    pub crops: &'a [CropOutcome],
}

/// 毫米换算为像素.
#[inline]
fn px(mm: f64, dpi: u32) -> f64 {
    mm / MM_PER_INCH * dpi as f64
}

/// 单张切片图像的文件名, 如 `sagittal-left_019.png`.
#[inline]
pub fn placement_file(p: &Placement) -> String {
    format!("{}_{:03}.png", p.plane, p.slice)
}

/// 页高: 默认页高与内容下边界 (加上与左边距相同的下边距) 中的较大者.
pub fn page_height_mm(report: &Report, config: &ReportConfig) -> f64 {
    report
        .content_bottom()
        .map_or(config.page_height, |b| config.page_height.max(b + config.origin_x))
}

/// 将报告栅格化为白底整页图像. 每张切片缩放到其单元格大小后贴到对应位置.
pub fn render_page(report: &Report, config: &ReportConfig, dpi: u32) -> RgbImage {
    let width = px(config.page_width, dpi).round() as u32;
    let height = px(page_height_mm(report, config), dpi).round() as u32;
    let mut page = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    for p in &report.placements {
        let Cell {
            x,
            y,
            width,
            height,
        } = p.cell;
        let w = (px(width, dpi).round() as u32).max(1);
        let h = (px(height, dpi).round() as u32).max(1);
        let resized = imageops::resize(&p.image, w, h, FilterType::Triangle);
        imageops::overlay(
            &mut page,
            &resized,
            px(x, dpi).round() as i64,
            px(y, dpi).round() as i64,
        );
    }
    page
}

/// PDF 文档的文件名 `<stem>.pdf`.
#[inline]
pub fn document_file(stem: &str) -> String {
    format!("{stem}.pdf")
}

/// 将报告写入 `out_dir` (不存在时创建), 返回清单路径.
///
/// 主要产物是 `<stem>.pdf`, 其余文件供后续处理使用.
pub fn write_report(
    report: &Report,
    config: &ReportConfig,
    out_dir: &Path,
    stem: &str,
    dpi: u32,
) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("无法创建输出目录 `{}`", out_dir.display()))?;

    let document = document_file(stem);
    write_pdf(report, config, &out_dir.join(&document))?;

    let mut placements = Vec::with_capacity(report.placements.len());
    for p in &report.placements {
        let file = placement_file(p);
        p.save(out_dir.join(&file))
            .with_context(|| format!("无法写出 `{file}`"))?;
        placements.push(PlacementEntry {
            file,
            plane: p.plane,
            slice: p.slice,
            cell: p.cell,
        });
    }

    let page = render_page(report, config, dpi);
    page.save(out_dir.join(PAGE_FILE))
        .with_context(|| format!("无法写出 `{PAGE_FILE}`"))?;
    log::debug!("page rasterized at {dpi} dpi: {:?}", page.dimensions());

    let manifest = Manifest {
        document,
        header: &report.header,
        page: PageEntry {
            file: PAGE_FILE.to_string(),
            width_mm: config.page_width,
            height_mm: page_height_mm(report, config),
            dpi,
        },
        placements,
        planes: &report.planes,
        crops: &report.crops,
    };
    let path = out_dir.join(MANIFEST_FILE);
    let json = serde_json::to_string_pretty(&manifest)?;
    fs::write(&path, json).with_context(|| format!("无法写出 `{}`", path.display()))?;
    Ok(path)
}
