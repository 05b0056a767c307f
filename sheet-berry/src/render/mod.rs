pub mod compose;
mod save;

pub use compose::{composite, CompositeImage, Layer};
pub use save::ImgWriteVis;
