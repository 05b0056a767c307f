//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d, Spacing};

pub use crate::data::orient::{Direction, Orientation};
pub use crate::data::reslice::{Plane, PlaneStack};
pub use crate::data::{MaxWindow, Side, SliceView, SubjectVolumes, VolumeSet};

pub use crate::render::{composite, CompositeImage, ImgWriteVis, Layer};

pub use crate::colormap::{ColormapId, Lut};
pub use crate::config::ReportConfig;
pub use crate::error::{ReportError, Result};
pub use crate::layout::{Cell, LayoutCursor};
pub use crate::report::{
    build_report, build_report_from, CropOutcome, HeaderLine, Placement, PlaneOutcome,
    PlaneStatus, Report,
};
