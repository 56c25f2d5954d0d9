//! Error types.
//!
//! Archive parsing failures are [SchemaError]s, invariant violations found by
//! the checker are [ValidationError]s, and file system failures are passed
//! through as [io::Error]s. All of them fold into the crate [Error].

use crate::common::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("malformed archive: {0}")]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("cannot derive a video id from the path '{}'", .0.display())]
    InvalidPath(PathBuf),
    #[error("mask must be {expected:?} pixels, but is {found:?}")]
    MaskShape {
        expected: (usize, usize),
        found: (usize, usize),
    },
}

/// The archive bytes do not follow the wire layout.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("file magic does not match")]
    BadMagic,
    #[error("unsupported schema version {found}, expected {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
    #[error("mask resolution {found:?} does not match the schema resolution {expected:?}")]
    MaskSizeMismatch { found: [u32; 2], expected: [u32; 2] },
    #[error("unexpected end of file")]
    Truncated,
    #[error("unexpected trailing bytes at offset {offset}")]
    TrailingBytes { offset: u64 },
    #[error("invalid header: {0}")]
    Header(String),
    #[error("missing field '{field}' in message '{message}'")]
    MissingField {
        message: &'static str,
        field: &'static str,
    },
    #[error(transparent)]
    Decode(#[from] prost::DecodeError),
    #[error("frame record {index}: {source}")]
    Frame {
        index: u64,
        #[source]
        source: Box<SchemaError>,
    },
}

/// A bounding box side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BBoxField {
    Left,
    Top,
    Right,
    Bottom,
}

impl BBoxField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Top => "top",
            Self::Right => "right",
            Self::Bottom => "bottom",
        }
    }
}

impl fmt::Display for BBoxField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The violated invariant, with the offending value and the accepted range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Violation {
    #[error("expected {expected} frames, but found {found}")]
    FrameCount { expected: usize, found: usize },
    #[error("frame_number {value} is outside [1, {expected_frames}]")]
    FrameNumber { value: i32, expected_frames: usize },
    #[error("score {value} is outside [0, 1]")]
    Score { value: f32 },
    #[error("bbox {field} {value} is outside [0, 1]")]
    BBoxRange { field: BBoxField, value: f32 },
    #[error("bbox {low_field} ({low}) must be less than or equal to {high_field} ({high})")]
    BBoxOrder {
        low_field: BBoxField,
        low: f32,
        high_field: BBoxField,
        high: f32,
    },
    #[error("mask is not a valid {h}x{w} binary raster: {reason}")]
    Mask { h: usize, w: usize, reason: String },
    #[error("pred_class {value} is outside [0, {num_classes})")]
    Class { value: i32, num_classes: usize },
}

/// The first invariant violation found in a video, with its location.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub video_id: String,
    pub frame_number: Option<i32>,
    pub object_index: Option<usize>,
    pub violation: Violation,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "video '{}'", self.video_id)?;
        if let Some(frame_number) = self.frame_number {
            write!(f, ", frame {}", frame_number)?;
        }
        if let Some(object_index) = self.object_index {
            write!(f, ", object {}", object_index)?;
        }
        write!(f, ": {}", self.violation)
    }
}

impl std::error::Error for ValidationError {}
