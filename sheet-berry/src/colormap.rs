//! 颜色查找表.
//!
//! 所有查找表都是 256 项, 将 8-bit 强度映射为 RGB 三元组. 表在第一次访问时构造,
//! 此后只读, 可在多个线程之间共享.

use once_cell::sync::Lazy;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 256 项 RGB 查找表.
pub type Lut = [[u8; 3]; 256];

/// 查找表标识.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ColormapId {
    /// 灰度.
    Gray,

    /// 纯红.
    Red,

    /// 纯绿.
    Green,

    /// 纯蓝.
    Blue,

    /// 红 + 绿.
    Yellow,

    /// 红 + 蓝.
    Magenta,

    /// 绿 + 蓝.
    Cyan,

    /// DICOM PS3.6 B.1.1 中的 "Hot Iron": 黑 → 红 → 黄 → 白.
    HotIron,

    /// `HotIron` 的别名.
    RedIron,

    /// 以绿色为主的 iron, 通道顺序为 (B, R, G).
    GreenIron,

    /// 以蓝色为主的 iron, 通道顺序为 (B, G, R).
    BlueIron,
}

impl ColormapId {
    /// 所有查找表.
    pub const ALL: [ColormapId; 11] = [
        Self::Gray,
        Self::Red,
        Self::Green,
        Self::Blue,
        Self::Yellow,
        Self::Magenta,
        Self::Cyan,
        Self::HotIron,
        Self::RedIron,
        Self::GreenIron,
        Self::BlueIron,
    ];

    /// 获取该标识对应的查找表.
    #[inline]
    pub fn table(self) -> &'static Lut {
        &REGISTRY[self.slot()]
    }

    /// 查表.
    #[inline]
    pub fn lookup(self, index: u8) -> [u8; 3] {
        self.table()[index as usize]
    }

    /// 在注册表中的位置. `RedIron` 与 `HotIron` 共用一张表.
    const fn slot(self) -> usize {
        match self {
            Self::Gray => 0,
            Self::Red => 1,
            Self::Green => 2,
            Self::Blue => 3,
            Self::Yellow => 4,
            Self::Magenta => 5,
            Self::Cyan => 6,
            Self::HotIron | Self::RedIron => 7,
            Self::GreenIron => 8,
            Self::BlueIron => 9,
        }
    }

    /// 名称.
    pub fn name(self) -> &'static str {
        match self {
            Self::Gray => "gray",
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Yellow => "yellow",
            Self::Magenta => "magenta",
            Self::Cyan => "cyan",
            Self::HotIron => "hot-iron",
            Self::RedIron => "red-iron",
            Self::GreenIron => "green-iron",
            Self::BlueIron => "blue-iron",
        }
    }
}

impl fmt::Display for ColormapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 查表, 等价于 `id.lookup(index)`.
#[inline]
pub fn lookup(id: ColormapId, index: u8) -> [u8; 3] {
    id.lookup(index)
}

static REGISTRY: Lazy<[Lut; 10]> = Lazy::new(|| {
    let hot = hot_iron();
    [
        channels([true, true, true]),
        channels([true, false, false]),
        channels([false, true, false]),
        channels([false, false, true]),
        channels([true, true, false]),
        channels([true, false, true]),
        channels([false, true, true]),
        hot,
        rotate(&hot, [2, 0, 1]),
        rotate(&hot, [2, 1, 0]),
    ]
});

/// 线性灰阶, 只点亮 `mask` 中为 `true` 的通道.
fn channels(mask: [bool; 3]) -> Lut {
    let mut lut = [[0u8; 3]; 256];
    for (i, rgb) in lut.iter_mut().enumerate() {
        for (c, on) in rgb.iter_mut().zip(mask) {
            if on {
                *c = i as u8;
            }
        }
    }
    lut
}

/// 标准 hot iron 曲线. 前 128 项红色以 2 递增; 之后红色饱和, 绿色以 2 递增;
/// 从第 192 项起蓝色以 4 递增; 最后一项为纯白.
fn hot_iron() -> Lut {
    let mut lut = [[0u8; 3]; 256];
    for (i, rgb) in lut.iter_mut().enumerate() {
        *rgb = match i {
            0..=127 => [(2 * i) as u8, 0, 0],
            128..=191 => [255, (2 * (i - 128)) as u8, 0],
            192..=254 => [255, (2 * (i - 128)) as u8, (4 * (i - 191)) as u8],
            _ => [255, 255, 255],
        };
    }
    lut
}

/// 按 `order` 重排通道: 新表第 `c` 个通道取 `src` 的第 `order[c]` 个通道.
fn rotate(src: &Lut, order: [usize; 3]) -> Lut {
    let mut lut = [[0u8; 3]; 256];
    for (dst, s) in lut.iter_mut().zip(src.iter()) {
        *dst = order.map(|c| s[c]);
    }
    lut
}

#[cfg(test)]
mod tests {
    use super::ColormapId::{self, *};

    #[test]
    fn test_solid_ramps() {
        for i in [0u8, 1, 127, 200, 255] {
            assert_eq!(Gray.lookup(i), [i, i, i]);
            assert_eq!(Red.lookup(i), [i, 0, 0]);
            assert_eq!(Green.lookup(i), [0, i, 0]);
            assert_eq!(Blue.lookup(i), [0, 0, i]);
            assert_eq!(Yellow.lookup(i), [i, i, 0]);
            assert_eq!(Magenta.lookup(i), [i, 0, i]);
            assert_eq!(Cyan.lookup(i), [0, i, i]);
        }
    }

    /// 与 DICOM 标准表中的若干已知项对照.
    #[test]
    fn test_hot_iron_known_entries() {
        assert_eq!(HotIron.lookup(0), [0, 0, 0]);
        assert_eq!(HotIron.lookup(1), [2, 0, 0]);
        assert_eq!(HotIron.lookup(127), [254, 0, 0]);
        assert_eq!(HotIron.lookup(128), [255, 0, 0]);
        assert_eq!(HotIron.lookup(191), [255, 126, 0]);
        assert_eq!(HotIron.lookup(192), [255, 128, 4]);
        assert_eq!(HotIron.lookup(223), [255, 190, 128]);
        assert_eq!(HotIron.lookup(254), [255, 252, 252]);
        assert_eq!(HotIron.lookup(255), [255, 255, 255]);
    }

    #[test]
    fn test_hot_iron_monotonic() {
        let t = HotIron.table();
        for w in t.windows(2) {
            for c in 0..3 {
                assert!(w[0][c] <= w[1][c]);
            }
        }
    }

    #[test]
    fn test_iron_family_rotation() {
        assert!(std::ptr::eq(RedIron.table(), HotIron.table()));
        for i in 0..=255u8 {
            let [r, g, b] = HotIron.lookup(i);
            assert_eq!(GreenIron.lookup(i), [b, r, g]);
            assert_eq!(BlueIron.lookup(i), [b, g, r]);
        }
        assert_eq!(GreenIron.lookup(100), [0, 200, 0]);
        assert_eq!(BlueIron.lookup(100), [0, 0, 200]);
    }

    #[test]
    fn test_names_unique() {
        let mut names: Vec<_> = ColormapId::ALL.iter().map(|c| c.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ColormapId::ALL.len());
    }
}
