use crate::data::window::MaxWindow;
use crate::Idx2d;
use ndarray::ArrayView2;
use std::ops::Index;

/// 不可变、借用的 2D 切片, 行对应图像的竖直方向, 列对应水平方向.
#[derive(Clone, Copy, Debug)]
pub struct SliceView<'a> {
    /// 底层数据的轻量级视图, 借用于某个 3D 体数据.
    data: ArrayView2<'a, f32>,
}

impl Index<Idx2d> for SliceView<'_> {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl<'a> From<ArrayView2<'a, f32>> for SliceView<'a> {
    #[inline]
    fn from(data: ArrayView2<'a, f32>) -> Self {
        Self::new(data)
    }
}

impl<'a> SliceView<'a> {
    /// 直接初始化.
    #[inline]
    pub fn new(data: ArrayView2<'a, f32>) -> Self {
        Self { data }
    }

    /// 获得底层数据的一份不可变 shallow copy.
    #[inline]
    pub fn array_view(&self) -> ArrayView2<'a, f32> {
        self.data
    }

    /// 以行优先规则, 获取能迭代图像所有 `(索引, 像素值)` 的迭代器.
    #[inline]
    pub fn indexed_iter(&self) -> impl Iterator<Item = (Idx2d, &f32)> {
        self.data.indexed_iter()
    }

    /// 图像的分辨率 (行, 列).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.data.dim()
    }

    /// 统计非零像素个数.
    #[inline]
    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|&&p| p != 0.0).count()
    }

    /// 以本切片的最大值为上界的窗口. 全零切片返回 `None`.
    #[inline]
    pub fn window(&self) -> Option<MaxWindow> {
        MaxWindow::from_data(&self.data)
    }
}
