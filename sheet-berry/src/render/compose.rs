//! 切片合成: 灰度底图 + 若干半透明彩色 ROI 图层.

use image::{Rgb, RgbImage, Rgba};

use crate::colormap::ColormapId;
use crate::data::{MaxWindow, SliceView};

/// 合成后的 8-bit RGB 图像. 图像高对应切片的行, 宽对应切片的列.
pub type CompositeImage = RgbImage;

/// 一个 ROI 图层.
#[derive(Copy, Clone, Debug)]
pub struct Layer<'a> {
    /// 与底图同形状的 ROI 切片.
    pub data: SliceView<'a>,

    /// 查找表.
    pub colormap: ColormapId,

    /// 不透明度, 位于 `[0, 1]`.
    pub transparency: f32,
}

/// 标准 source-over 混合, 逐通道进行整数运算并四舍五入. 结果丢弃 alpha.
///
/// `out = (src * a + dst * (255 - a) + 127) / 255`.
#[inline]
pub fn source_over(dst: Rgb<u8>, src: Rgba<u8>) -> Rgb<u8> {
    let a = src[3] as u32;
    let mix = |s: u8, d: u8| ((s as u32 * a + d as u32 * (255 - a) + 127) / 255) as u8;
    Rgb([mix(src[0], dst[0]), mix(src[1], dst[1]), mix(src[2], dst[2])])
}

/// 将切片以自身最大值规范化到 `[0, 255]` 后映射为灰度 RGB.
///
/// 全零切片得到全黑图像. NaN 等无意义像素视作 0.
pub fn grayscale(base: SliceView<'_>) -> CompositeImage {
    let (height, width) = base.shape();
    let mut buf = RgbImage::new(width as u32, height as u32);
    if let Some(window) = base.window() {
        for ((h, w), &v) in base.indexed_iter() {
            let g = window.eval(v).unwrap_or(0);
            buf.put_pixel(w as u32, h as u32, Rgb(ColormapId::Gray.lookup(g)));
        }
    }
    buf
}

/// 在 `buf` 上叠加一个图层. 图层全零时不做任何事.
fn overlay(buf: &mut CompositeImage, layer: &Layer<'_>) {
    let Some(window) = MaxWindow::from_data(&layer.data.array_view()) else {
        return;
    };
    let opacity = layer.transparency.clamp(0.0, 1.0);
    for ((h, w), &v) in layer.data.indexed_iter() {
        let Some(unit) = window.eval_unit(v) else {
            continue;
        };
        let alpha = (unit * 255.0 * opacity) as u8;
        if alpha == 0 {
            continue;
        }
        let [r, g, b] = layer.colormap.lookup((unit * 255.0) as u8);
        let dst = buf.get_pixel_mut(w as u32, h as u32);
        *dst = source_over(*dst, Rgba([r, g, b, alpha]));
    }
}

/// 合成一张切片: 底图先转灰度, 再按顺序叠加 `layers`.
///
/// # 注意
///
/// 每个图层的形状必须与底图一致, 否则程序 panic.
pub fn composite(base: SliceView<'_>, layers: &[Layer<'_>]) -> CompositeImage {
    let mut buf = grayscale(base);
    for layer in layers {
        assert_eq!(
            layer.data.shape(),
            base.shape(),
            "ROI 图层形状与底图不一致"
        );
        overlay(&mut buf, layer);
    }
    buf
}
