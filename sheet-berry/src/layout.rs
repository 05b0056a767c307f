//! 页面排版.
//!
//! 所有坐标以毫米为单位, 原点位于页面左上角, 纵坐标向下增大.
//! 每个平面块占据若干行网格, 块的高度由切片形状和体素分辨率共同决定.
//! 平面之间通过 [`LayoutCursor`] 显式传递下一个平面块的起始纵坐标.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 页面上的一个矩形单元格.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cell {
    /// 左上角横坐标.
    pub x: f64,

    /// 左上角纵坐标.
    pub y: f64,

    /// 宽.
    pub width: f64,

    /// 高.
    pub height: f64,
}

impl Cell {
    /// 下边界纵坐标.
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// 右边界横坐标.
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// 两个单元格的内部是否相交. 仅共享边界不算相交.
    pub fn overlaps(&self, other: &Cell) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// 单元格高度: `cell_w * rows / cols * row_mm / col_mm`.
///
/// `rows`, `cols` 为切片形状, `row_mm`, `col_mm` 为对应方向的体素分辨率.
/// 这样排版出的图像保持真实的物理长宽比.
#[inline]
pub fn cell_height(cell_w: f64, rows: usize, cols: usize, row_mm: f64, col_mm: f64) -> f64 {
    cell_w * rows as f64 / cols as f64 * row_mm / col_mm
}

/// `n` 个图像按行优先填入宽度为 `row_width` 的网格后所占的行数.
#[inline]
pub fn rows_used(n: usize, row_width: usize) -> usize {
    if row_width == 0 {
        0
    } else {
        (n + row_width - 1) / row_width
    }
}

/// 第 `i` 个图像位于 (`i / row_width` 行, `i % row_width` 列),
/// 坐标为 `x = origin_x + col * cell_w`, `y = origin_y + row * cell_h`.
pub fn layout_row(
    n: usize,
    row_width: usize,
    cell_w: f64,
    cell_h: f64,
    origin_x: f64,
    origin_y: f64,
) -> Vec<Cell> {
    if row_width == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let (row, col) = (i / row_width, i % row_width);
            Cell {
                x: origin_x + col as f64 * cell_w,
                y: origin_y + row as f64 * cell_h,
                width: cell_w,
                height: cell_h,
            }
        })
        .collect()
}

/// 下一个平面块的起始纵坐标: `origin_y + rows_used * cell_h + gap`.
#[inline]
pub fn advance_offset(origin_y: f64, rows_used: usize, cell_h: f64, gap: f64) -> f64 {
    origin_y + rows_used as f64 * cell_h + gap
}

/// 纵向排版游标.
///
/// 游标以值传递: [`LayoutCursor::place`] 消耗旧游标并返回新游标,
/// 平面块之间不存在共享的可变状态.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LayoutCursor {
    y: f64,
}

impl LayoutCursor {
    /// 从纵坐标 `y` 开始.
    #[inline]
    pub fn new(y: f64) -> Self {
        Self { y }
    }

    /// 当前纵坐标.
    #[inline]
    pub fn y(&self) -> f64 {
        self.y
    }

    /// 在当前位置摆放一个含 `n` 个图像的平面块, 返回单元格和摆放后 (已加上 `gap`) 的游标.
    pub fn place(
        self,
        n: usize,
        row_width: usize,
        cell_w: f64,
        cell_h: f64,
        origin_x: f64,
        gap: f64,
    ) -> (Vec<Cell>, LayoutCursor) {
        let cells = layout_row(n, row_width, cell_w, cell_h, origin_x, self.y);
        let y = advance_offset(self.y, rows_used(n, row_width), cell_h, gap);
        (cells, LayoutCursor { y })
    }

    /// 跳过一个空平面块, 只前进 `gap`.
    #[inline]
    pub fn skip(self, gap: f64) -> LayoutCursor {
        LayoutCursor { y: self.y + gap }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_cell_height() {
        assert!(f64_eq(cell_height(38.0, 64, 64, 1.0, 1.0), 38.0));
        assert!(f64_eq(cell_height(38.0, 32, 64, 1.0, 1.0), 19.0));
        assert!(f64_eq(cell_height(38.0, 64, 64, 2.0, 1.0), 76.0));
    }

    #[test]
    fn test_layout_row_positions() {
        let cells = layout_row(7, 5, 38.0, 20.0, 10.0, 55.0);
        assert_eq!(cells.len(), 7);
        assert!(f64_eq(cells[0].x, 10.0) && f64_eq(cells[0].y, 55.0));
        assert!(f64_eq(cells[4].x, 10.0 + 4.0 * 38.0));
        assert!(f64_eq(cells[5].x, 10.0) && f64_eq(cells[5].y, 75.0));
        assert!(layout_row(3, 0, 1.0, 1.0, 0.0, 0.0).is_empty());
    }

    #[test]
    fn test_rows_used() {
        assert_eq!(rows_used(0, 5), 0);
        assert_eq!(rows_used(1, 5), 1);
        assert_eq!(rows_used(5, 5), 1);
        assert_eq!(rows_used(6, 5), 2);
        assert_eq!(rows_used(10, 5), 2);
    }

    #[test]
    fn test_no_overlap_within_plane() {
        let cells = layout_row(10, 5, 38.0, 27.3, 10.0, 55.0);
        for (i, a) in cells.iter().enumerate() {
            for b in &cells[i + 1..] {
                assert!(!a.overlaps(b));
            }
        }
    }

    #[test]
    fn test_cursor_blocks_do_not_overlap() {
        let c = LayoutCursor::new(55.0);
        let (axial, c) = c.place(10, 5, 38.0, 30.0, 10.0, 2.0);
        assert!(f64_eq(c.y(), 55.0 + 60.0 + 2.0));
        let (coronal, c) = c.place(7, 5, 38.0, 25.0, 10.0, 2.0);
        assert!(f64_eq(c.y(), 117.0 + 50.0 + 2.0));
        let (sag_r, c) = c.place(5, 5, 38.0, 20.0, 10.0, 0.0);
        let (sag_l, c) = c.place(5, 5, 38.0, 20.0, 10.0, 2.0);
        assert!(f64_eq(c.y(), 169.0 + 40.0 + 2.0));

        let blocks = [axial, coronal, sag_r, sag_l];
        for (i, a) in blocks.iter().enumerate() {
            for b in &blocks[i + 1..] {
                for p in a {
                    assert!(b.iter().all(|q| !p.overlaps(q)));
                }
            }
        }
        // 两个矢状位半视图紧挨.
        assert!(f64_eq(blocks[2][0].bottom(), blocks[3][0].y));
    }

    #[test]
    fn test_cursor_skip() {
        let c = LayoutCursor::new(10.0).skip(2.0);
        assert!(f64_eq(c.y(), 12.0));
        let (cells, c) = c.place(0, 5, 38.0, 30.0, 10.0, 2.0);
        assert!(cells.is_empty());
        assert!(f64_eq(c.y(), 14.0));
    }
}
