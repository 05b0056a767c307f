//! 运行时错误.

use crate::reslice::Plane;
use thiserror::Error;

/// 本 crate 的 `Result` 别名.
pub type Result<T> = std::result::Result<T, ReportError>;

/// 生成报告过程中的错误.
///
/// 其中 `EmptyExtent` 和 `NoOverlap` 在 [`crate::build_report`] 内部会被降级为
/// 结果标记, 不会中断整个流程.
#[derive(Error, Debug)]
pub enum ReportError {
    /// 调用者违反了输入约定 (形状不一致, 分辨率非法, 配置非法等).
    #[error("非法输入: {0}")]
    InvalidInput(String),

    /// 参考掩膜在第 `axis` 轴上没有任何非零体素.
    #[error("参考掩膜在第 {axis} 轴上全为零")]
    EmptyExtent {
        /// 轴序号.
        axis: usize,
    },

    /// 该平面上没有任何切片满足 ROI 覆盖度阈值.
    #[error("平面 `{plane}` 上没有满足覆盖度阈值的切片")]
    NoOverlap {
        /// 出问题的平面.
        plane: Plane,
    },

    /// 读取 nifti 文件错误.
    #[error("nifti 错误: {0}")]
    Nifti(#[from] nifti::NiftiError),

    /// 编码或写出图像错误.
    #[error("图像错误: {0}")]
    Image(#[from] image::ImageError),

    /// 其他底层 I/O 错误.
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),
}

impl ReportError {
    /// 该错误是否可以被降级处理 (跳过当前步骤而继续).
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::EmptyExtent { .. } | Self::NoOverlap { .. })
    }
}
