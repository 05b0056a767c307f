//! 2D 切片视图.

mod view;

pub use view::SliceView;
