use crate::{counts, RleError};
use ndarray::{Array2, ArrayView2, ShapeBuilder};

/// Uncompressed run lengths of a `h` by `w` binary raster.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rle {
    h: usize,
    w: usize,
    counts: Vec<u32>,
}

impl Rle {
    /// Build from run lengths. The runs must cover exactly `h * w` pixels.
    pub fn new(h: usize, w: usize, counts: Vec<u32>) -> Result<Self, RleError> {
        let expected = (h * w) as u64;
        let found: u64 = counts.iter().map(|&count| count as u64).sum();
        if found != expected {
            return Err(RleError::LengthMismatch { expected, found });
        }
        Ok(Self { h, w, counts })
    }

    /// Run-length encode a raster. Any non-zero pixel is foreground.
    pub fn encode(mask: ArrayView2<u8>) -> Self {
        let (h, w) = mask.dim();
        let mut counts = vec![];
        let mut prev = false;
        let mut run = 0u32;

        // the transposed view iterates the mask in column-major order
        for &value in mask.t().iter() {
            let value = value != 0;
            if value != prev {
                counts.push(run);
                run = 0;
                prev = value;
            }
            run += 1;
        }
        counts.push(run);

        Self { h, w, counts }
    }

    pub fn decode(&self) -> Array2<u8> {
        let Self { h, w, ref counts } = *self;
        let mut mask = Array2::zeros((h, w).f());
        if h == 0 {
            return mask;
        }

        let mut index = 0usize;
        counts.iter().enumerate().for_each(|(nth, &count)| {
            let count = count as usize;
            if nth % 2 == 1 {
                (index..index + count).for_each(|pixel| {
                    mask[[pixel % h, pixel / h]] = 1;
                });
            }
            index += count;
        });

        mask
    }

    /// Parse the compressed counts string.
    pub fn from_bytes(bytes: &[u8], h: usize, w: usize) -> Result<Self, RleError> {
        let counts = counts::decompress(bytes)?;
        Self::new(h, w, counts)
    }

    /// Produce the compressed counts string.
    pub fn to_bytes(&self) -> Vec<u8> {
        counts::compress(&self.counts)
    }

    /// Number of foreground pixels.
    pub fn area(&self) -> u64 {
        self.counts
            .iter()
            .skip(1)
            .step_by(2)
            .map(|&count| count as u64)
            .sum()
    }
}
