#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 将配准好的 3D 解剖扫描与左右两个 ROI 掩膜 (以及一个仅用于裁剪的参考掩膜)
//! 排版成固定布局的多平面切片总览图.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 核心算法假设输入已经是 LAS 约定 (X = 左右, Y = 前后, Z = 足头) 的体数据.
//!   从 nifti 文件加载并转换方向的功能位于 `data` 模块, 与核心算法相互独立.
//! 2. 核心不写出最终文档. [`Report`] 只包含已摆放好的图像和页眉文本,
//!   由调用者决定如何落盘.
//!
//! # 开发计划
//!
//! ### 颜色查找表 ✅
//!
//! 灰度, 纯色, 以及 iron 系列伪彩色查找表, 进程内只初始化一次.
//!
//! 实现位于 `sheet-berry/src/colormap.rs`.
//!
//! ### 视野裁剪 ✅
//!
//! 根据参考掩膜在某一轴上的非零范围计算边界并对称扩展, 然后同步裁剪所有体数据.
//!
//! 实现位于 `sheet-berry/src/data/crop.rs`.
//!
//! ### 平面重切 ✅
//!
//! 轴位 → 冠状位 → 矢状位 流水线式地旋转体数据, 使切片轴总是最后一维,
//! 同时同步置换体素分辨率.
//!
//! 实现位于 `sheet-berry/src/data/reslice.rs`.
//!
//! ### 切片挑选 ✅
//!
//! 统计 ROI 覆盖度, 然后以居中、等间隔的方式挑选至多两行切片.
//!
//! 实现位于 `sheet-berry/src/data/select.rs`.
//!
//! ### 切片合成 ✅
//!
//! 灰度底图 + 半透明彩色 ROI, 标准 source-over 混合.
//!
//! 实现位于 `sheet-berry/src/render/compose.rs`.
//!
//! ### 页面排版 ✅
//!
//! 网格摆放, 按体素分辨率校正单元格高度, 在平面之间显式传递纵向游标.
//!
//! 实现位于 `sheet-berry/src/layout.rs`.
//!
//! ### 方向规范化 ✅
//!
//! 根据 nifti header 的 sform/qform 将任意方向的体数据转换为 LAS.
//!
//! 实现位于 `sheet-berry/src/data/orient.rs`.
//!
//! # 示例
//!
//! ```no_run
//! use sheet_berry::prelude::*;
//!
//! let subject = SubjectVolumes::open(
//!     "t1.nii.gz",
//!     "t1_mask_L.nii.gz",
//!     "t1_mask_R.nii.gz",
//!     "t1_brain_mask.nii.gz",
//! )
//! .unwrap();
//! let volumes = subject.into_las();
//! let header = ["Report".to_string(), String::new(), String::new(), String::new()];
//! let report = build_report_from(volumes, header, &ReportConfig::default()).unwrap();
//! println!("{} images placed", report.placements.len());
//! ```

/// 二维索引 (行, 列), 同时也用作切片形状.
pub type Idx2d = (usize, usize);

/// 三维索引, 同时也用作体数据形状.
pub type Idx3d = (usize, usize, usize);

/// 单个体素在三个轴上的实际尺寸, 以毫米为单位. 与体数据的三个轴一一对应.
pub type Spacing = [f64; 3];

pub mod colormap;
pub mod config;
pub mod consts;
pub mod error;
pub mod layout;
pub mod prelude;
pub mod report;

/// 体数据: 加载, 方向规范化, 裁剪, 重切, 切片挑选.
mod data;

/// 切片合成与图像持久化.
mod render;

pub use data::{crop, orient, reslice, select};
pub use data::{MaxWindow, Side, SliceView, SubjectVolumes, VolumeSet};

pub use render::{compose, composite, CompositeImage, ImgWriteVis, Layer};

pub use colormap::ColormapId;
pub use config::ReportConfig;
pub use error::{ReportError, Result};
pub use layout::{Cell, LayoutCursor};
pub use report::{build_report, build_report_from, Placement, Report};
