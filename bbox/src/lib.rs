//! Safe bounding box types and functions.

mod common;

pub use ltrb::*;
pub mod ltrb;

pub use rect::*;
pub mod rect;

pub use hw::*;
pub mod hw;

pub use transform::*;
mod transform;

pub mod prelude {
    pub use crate::rect::{Rect, RectNum};
}
