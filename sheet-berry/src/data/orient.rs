//! 方向规范化.
//!
//! 核心算法要求体数据为 LAS 约定: 第一轴由右向左, 第二轴由后向前, 第三轴由足向头.
//! nifti 的世界坐标系为 RAS+, 因此 LAS 即第一轴取反.
//!
//! 本模块从体素到世界坐标的方向矩阵中推断每个体素轴的朝向, 并给出把体数据置换/翻转到
//! LAS 的纯变换. 该变换同时作用于体素分辨率.

use nifti::NiftiHeader;

use super::VolumeSet;
use crate::error::{ReportError, Result};
use crate::Spacing;

/// 3x3 方向矩阵. `m[w][v]` 表示第 `v` 个体素轴在第 `w` 个世界轴 (R, A, S) 上的分量.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Direction(pub [[f64; 3]; 3]);

impl Direction {
    /// 单位矩阵, 即体素轴与 RAS 世界轴一一对齐.
    pub const IDENTITY: Direction = Direction([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);

    /// 从 nifti header 中读取方向矩阵.
    ///
    /// 1. `sform_code > 0` 时使用 `srow_{x,y,z}` 的前三列;
    /// 2. 否则 `qform_code > 0` 时使用四元数 `quatern_{b,c,d}` 和 `pixdim[0]` (qfac);
    /// 3. 否则视为单位矩阵.
    pub fn from_header(h: &NiftiHeader) -> Direction {
        if h.sform_code > 0 {
            let rows = [h.srow_x, h.srow_y, h.srow_z];
            Direction(rows.map(|r| [r[0] as f64, r[1] as f64, r[2] as f64]))
        } else if h.qform_code > 0 {
            let qfac = if h.pixdim[0] < 0.0 { -1.0 } else { 1.0 };
            Self::from_quaternion(
                [h.quatern_b as f64, h.quatern_c as f64, h.quatern_d as f64],
                qfac,
            )
        } else {
            Self::IDENTITY
        }
    }

    /// 由四元数的 `(b, c, d)` 分量和 qfac 构建旋转矩阵.
    pub fn from_quaternion([b, c, d]: [f64; 3], qfac: f64) -> Direction {
        let a = (1.0 - (b * b + c * c + d * d)).max(0.0).sqrt();
        let mut m = [
            [
                a * a + b * b - c * c - d * d,
                2.0 * (b * c - a * d),
                2.0 * (b * d + a * c),
            ],
            [
                2.0 * (b * c + a * d),
                a * a + c * c - b * b - d * d,
                2.0 * (c * d - a * b),
            ],
            [
                2.0 * (b * d - a * c),
                2.0 * (c * d + a * b),
                a * a + d * d - b * b - c * c,
            ],
        ];
        for row in m.iter_mut() {
            row[2] *= qfac;
        }
        Direction(m)
    }
}

/// 一个体素轴的朝向.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct AxisCode {
    /// 对应的世界轴: 0 = 左右, 1 = 前后, 2 = 足头.
    pub world: usize,

    /// 体素索引增大时世界坐标是否减小 (相对 RAS+).
    pub flipped: bool,
}

/// 三个体素轴各自的朝向.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Orientation(pub [AxisCode; 3]);

/// LAS 约定下每个世界轴的期望翻转状态.
const LAS_FLIPPED: [bool; 3] = [true, false, false];

impl Orientation {
    /// LAS 本身.
    pub const LAS: Orientation = Orientation([
        AxisCode { world: 0, flipped: true },
        AxisCode { world: 1, flipped: false },
        AxisCode { world: 2, flipped: false },
    ]);

    /// 从方向矩阵推断每个体素轴的朝向.
    ///
    /// 每次选取剩余元素中绝对值最大的一个, 将对应体素轴分配给对应世界轴, 共三次.
    /// 若矩阵含非有限值, 或者某次选出的最大值为 0 (矩阵退化), 则返回
    /// `Err(ReportError::InvalidInput)`.
    pub fn from_direction(d: &Direction) -> Result<Orientation> {
        let m = &d.0;
        if m.iter().flatten().any(|v| !v.is_finite()) {
            return Err(ReportError::InvalidInput(format!("方向矩阵含非有限值: {m:?}")));
        }

        let mut codes = [None::<AxisCode>; 3];
        let mut world_used = [false; 3];
        for _ in 0..3 {
            let mut best: Option<(usize, usize, f64)> = None;
            for (w, row) in m.iter().enumerate().filter(|(w, _)| !world_used[*w]) {
                for (v, &x) in row.iter().enumerate().filter(|(v, _)| codes[*v].is_none()) {
                    if best.map_or(true, |(_, _, b)| x.abs() > b.abs()) {
                        best = Some((w, v, x));
                    }
                }
            }
            match best {
                Some((w, v, x)) if x != 0.0 => {
                    world_used[w] = true;
                    codes[v] = Some(AxisCode {
                        world: w,
                        flipped: x < 0.0,
                    });
                }
                _ => return Err(ReportError::InvalidInput(format!("方向矩阵退化: {m:?}"))),
            }
        }

        let [Some(a), Some(b), Some(c)] = codes else {
            unreachable!()
        };
        Ok(Orientation([a, b, c]))
    }

    /// 是否已经是 LAS?
    #[inline]
    pub fn is_las(&self) -> bool {
        *self == Self::LAS
    }

    /// 到 LAS 的轴变换: 第 `w` 个输出轴取第 `perm[w]` 个输入轴, `flip[w]` 表示是否需要翻转.
    pub fn las_transform(&self) -> ([usize; 3], [bool; 3]) {
        let mut perm = [0usize; 3];
        let mut flip = [false; 3];
        for (v, code) in self.0.iter().enumerate() {
            perm[code.world] = v;
            flip[code.world] = code.flipped != LAS_FLIPPED[code.world];
        }
        (perm, flip)
    }
}

/// 按 `perm` 置换体素分辨率.
#[inline]
pub(crate) fn permute_spacing(spacing: Spacing, perm: [usize; 3]) -> Spacing {
    perm.map(|i| spacing[i])
}

/// 将体数据组置换/翻转到 LAS, 并同步置换体素分辨率.
pub fn to_las(volumes: VolumeSet, orientation: &Orientation) -> VolumeSet {
    if orientation.is_las() {
        return volumes;
    }
    let (perm, flip) = orientation.las_transform();
    log::debug!("reorienting volumes to LAS with axes {perm:?}, flips {flip:?}");
    let spacing = permute_spacing(volumes.spacing(), perm);
    volumes.map_volumes(spacing, |v| {
        let mut v = v.permuted_axes(perm);
        for (axis, _) in flip.iter().enumerate().filter(|(_, f)| **f) {
            v.invert_axis(ndarray::Axis(axis));
        }
        v.as_standard_layout().into_owned()
    })
}
