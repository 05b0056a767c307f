//! 图像的持久化存储.

use image::ImageResult;
use std::path::Path;

use super::compose::grayscale;
use crate::data::SliceView;

/// 表明一个可以通过 **可视化友好** 模式持久化存储的图像对象.
///
/// `ImgWriteVis` trait 的意图是, 图像将以 "可视化友好" 的方式保存, 而不是 "as is"
/// 的方式. 对于 `SliceView` 这类浮点切片, 保存时会以自身最大值规范化为灰度;
/// 对于 [`crate::report::Placement`], 保存的是已经合成好的彩色图像.
pub trait ImgWriteVis {
    /// 按照一定的可视化规则将图片保存到 `path` 路径. 格式由扩展名决定.
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

/// 以自身最大值为上界的灰度图.
impl ImgWriteVis for SliceView<'_> {
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        grayscale(*self).save(path)
    }
}
