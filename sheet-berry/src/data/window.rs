use ndarray::{ArrayBase, Data, Dimension};

/// 以最大值为上界的线性窗口, 将 `[0, max]` 映射为 8-bit 灰度.
///
/// 该窗口是只读的. 若要修改上界, 你应该创建新的实例.
#[derive(Copy, Clone, Debug)]
pub struct MaxWindow {
    max: f32,
}

impl MaxWindow {
    /// 构建窗口.
    ///
    /// `max` 必须是正的有限值, 否则返回 `None`.
    pub fn new(max: f32) -> Option<MaxWindow> {
        (max.is_finite() && max > 0.0).then_some(Self { max })
    }

    /// 以 `data` 的最大值为上界构建窗口.
    ///
    /// 全零 (或全为非正值) 的数据没有合法窗口, 此时返回 `None`.
    /// 这种情况应被视作空图层, 而不是错误.
    pub fn from_data<S, D>(data: &ArrayBase<S, D>) -> Option<MaxWindow>
    where
        S: Data<Elem = f32>,
        D: Dimension,
    {
        Self::new(data.iter().copied().fold(f32::NEG_INFINITY, f32::max))
    }

    /// 窗上限.
    #[inline]
    pub fn max(&self) -> f32 {
        self.max
    }

    /// 求 `v` 在窗口中的相对位置 (0.0 <= value <= 1.0).
    ///
    /// 如果 `v` 无意义 (如 inf, NaN), 则返回 `None`.
    pub fn eval_unit(&self, v: f32) -> Option<f32> {
        if !v.is_finite() {
            return None;
        }
        Some((v / self.max).clamp(0.0, 1.0))
    }

    /// 求 `v` 对应的灰度图像素整数值 (0 <= value <= 255). 小数部分直接截断.
    ///
    /// 如果 `v` 无意义 (如 inf, NaN), 则返回 `None`.
    pub fn eval(&self, v: f32) -> Option<u8> {
        // 255, not 256.
        self.eval_unit(v).map(|u| (u * 255.0) as u8)
    }
}
