mod binner;
mod canvas;

pub use binner::{bin, Binned, Binner};
pub use canvas::{make_canvas, Canvas};
