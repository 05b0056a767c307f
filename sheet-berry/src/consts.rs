//! 通用常量. 所有长度均以毫米为单位.

/// 页面与网格.
pub mod page {
    /// A4 纸宽.
    pub const A4_WIDTH_MM: f64 = 210.0;

    /// A4 纸高.
    pub const A4_HEIGHT_MM: f64 = 297.0;

    /// 每行切片数.
    pub const ROW_WIDTH: usize = 5;

    /// 单元格宽度. 配合 `ROW_WIDTH = 5` 时效果最好.
    pub const CELL_WIDTH_MM: f64 = 38.0;

    /// 网格左上角横坐标.
    pub const ORIGIN_X_MM: f64 = 10.0;

    /// 网格左上角纵坐标. 其上方留给页眉.
    pub const ORIGIN_Y_MM: f64 = 55.0;

    /// 相邻平面块之间的纵向间隔.
    pub const PLANE_GAP_MM: f64 = 2.0;
}

/// 叠加与挑选.
pub mod overlay {
    /// ROI 图层不透明度. 0.5 为半透明, 1.0 为完全不透明.
    pub const TRANSPARENCY: f32 = 0.4;

    /// 合格切片所需的最小 ROI 像素数占切片面积的比例.
    pub const COVERAGE_FRACTION: f64 = 0.001;
}

/// 裁剪与填充.
pub mod crop {
    /// 前后 (Y) 方向裁剪的对称扩展比例.
    pub const PAD_ANTERIOR_POSTERIOR: f64 = 0.2;

    /// 足头 (Z) 方向裁剪的对称扩展比例.
    pub const PAD_FOOT_HEAD: f64 = 0.1;

    /// 冠状位之前, 足头方向两端补黑的比例.
    pub const FOOT_HEAD_MARGIN: f64 = 0.05;
}

/// 页眉样式.
pub mod header {
    /// 标题字号 (pt).
    pub const TITLE_PT: f32 = 20.0;

    /// 正文字号 (pt).
    pub const BODY_PT: f32 = 12.0;

    /// 黑色.
    pub const BLACK: [u8; 3] = [0, 0, 0];

    /// 左侧测量行的颜色, 与左侧 ROI 的绿色对应.
    pub const LEFT_GREEN: [u8; 3] = [0, 140, 0];

    /// 右侧测量行的颜色, 与右侧 ROI 的红色对应.
    pub const RIGHT_RED: [u8; 3] = [170, 0, 0];
}
