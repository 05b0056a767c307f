//! 以 PDF 矢量文档的形式输出报告.
//!
//! 页面坐标沿用报告的约定 (毫米, 原点在左上角, 纵坐标向下), 写入 PDF 时再换算为
//! 以左下角为原点的坐标.

use anyhow::{anyhow, Context};
use image::DynamicImage;
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument,
    PdfLayerReference, Rgb,
};
use sheet_berry::prelude::*;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::writer::page_height_mm;

const MM_PER_INCH: f32 = 25.4;
const MM_PER_PT: f32 = MM_PER_INCH / 72.0;

/// 嵌入图像时使用的名义分辨率. 实际尺寸由缩放比例决定.
const IMAGE_DPI: f32 = 300.0;

/// 页眉上边距.
const HEADER_TOP_MM: f32 = 10.0;

/// 标题行高.
const TITLE_LINE_MM: f32 = 28.0;

/// 正文行高.
const BODY_LINE_MM: f32 = 5.0;

/// Helvetica 的平均字宽 (以字号为单位), 用于估算居中位置.
const AVG_GLYPH_EM: f32 = 0.5;

/// 页眉各行的基线纵坐标 (自上而下, mm). 文本在各自行高内垂直居中.
pub fn header_baselines(header: &[HeaderLine; 4]) -> [f32; 4] {
    let mut top = HEADER_TOP_MM;
    let mut out = [0.0; 4];
    for (i, line) in header.iter().enumerate() {
        let h = if line.centered { TITLE_LINE_MM } else { BODY_LINE_MM };
        out[i] = top + h / 2.0 + 0.3 * line.size_pt * MM_PER_PT;
        top += h;
    }
    out
}

/// 一行文本的左端横坐标 (mm). 居中行按估算的文本宽度居中于整页.
fn header_x(line: &HeaderLine, page_width: f32, origin_x: f32) -> f32 {
    if line.centered {
        let text_w = line.text.chars().count() as f32 * line.size_pt * AVG_GLYPH_EM * MM_PER_PT;
        ((page_width - text_w) / 2.0).max(0.0)
    } else {
        origin_x
    }
}

fn write_header(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    header: &[HeaderLine; 4],
    page: (f32, f32),
    origin_x: f32,
) {
    let (page_w, page_h) = page;
    for (line, y) in header.iter().zip(header_baselines(header)) {
        let [r, g, b] = line.color.map(|c| c as f32 / 255.0);
        layer.set_fill_color(Color::Rgb(Rgb::new(r, g, b, None)));
        layer.use_text(
            line.text.as_str(),
            line.size_pt,
            Mm(header_x(line, page_w, origin_x)),
            Mm(page_h - y),
            font,
        );
    }
}

/// 把一张合成图像嵌入到其单元格中, 宽高都拉伸到单元格尺寸.
fn place_image(layer: &PdfLayerReference, p: &Placement, page_h: f32) {
    let (w_px, h_px) = p.image.dimensions();
    if w_px == 0 || h_px == 0 {
        return;
    }
    let natural = |n: u32| n as f32 / IMAGE_DPI * MM_PER_INCH;
    let Cell {
        x,
        y,
        width,
        height,
    } = p.cell;
    let transform = ImageTransform {
        translate_x: Some(Mm(x as f32)),
        translate_y: Some(Mm(page_h - (y + height) as f32)),
        scale_x: Some(width as f32 / natural(w_px)),
        scale_y: Some(height as f32 / natural(h_px)),
        dpi: Some(IMAGE_DPI),
        ..Default::default()
    };
    Image::from_dynamic_image(&DynamicImage::ImageRgb8(p.image.clone()))
        .add_to_layer(layer.clone(), transform);
}

/// 将报告写成单页 PDF. 页高与整页栅格图一致, 内容超出默认页高时相应增大.
pub fn write_pdf(report: &Report, config: &ReportConfig, path: &Path) -> anyhow::Result<()> {
    let page_w = config.page_width as f32;
    let page_h = page_height_mm(report, config) as f32;
    let title = report.header[0].text.as_str();

    let (doc, page, layer) = PdfDocument::new(title, Mm(page_w), Mm(page_h), "Layer 1");
    let layer = doc.get_page(page).get_layer(layer);
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| anyhow!("无法加载内置字体: {e:?}"))?;

    write_header(
        &layer,
        &font,
        &report.header,
        (page_w, page_h),
        config.origin_x as f32,
    );
    for p in &report.placements {
        place_image(&layer, p, page_h);
    }

    let file = File::create(path).with_context(|| format!("无法创建 `{}`", path.display()))?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|e| anyhow!("无法写出 `{}`: {e:?}", path.display()))?;
    log::debug!(
        "pdf written: {} images on a {page_w} x {page_h} mm page",
        report.placements.len()
    );
    Ok(())
}
