use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RleError {
    #[error("invalid byte 0x{byte:02x} at position {position} in compressed counts")]
    InvalidByte { position: usize, byte: u8 },
    #[error("compressed counts end in the middle of a run length")]
    Truncated,
    #[error("run length starting at position {position} does not fit in 64 bits")]
    Overflow { position: usize },
    #[error("run {index} has invalid length {value}")]
    InvalidRun { index: usize, value: i64 },
    #[error("run lengths cover {found} pixels, but the raster has {expected}")]
    LengthMismatch { expected: u64, found: u64 },
}
