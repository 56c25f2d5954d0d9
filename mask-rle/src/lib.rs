//! Run-length encoding of binary segmentation masks.
//!
//! Masks are scanned in column-major order and run lengths alternate between
//! background and foreground, starting with background. The compressed byte
//! form is the ASCII counts string used by COCO tools, so masks written here
//! are readable by pycocotools and vice versa.

mod counts;
mod error;
mod rle;

pub use error::RleError;
pub use rle::Rle;

use ndarray::{Array2, ArrayView2};

/// Encode a binary raster into compressed counts bytes.
pub fn encode(mask: ArrayView2<u8>) -> Vec<u8> {
    Rle::encode(mask).to_bytes()
}

/// Decode compressed counts bytes into a `h` by `w` binary raster.
pub fn decode(bytes: &[u8], h: usize, w: usize) -> Result<Array2<u8>, RleError> {
    Ok(Rle::from_bytes(bytes, h, w)?.decode())
}
