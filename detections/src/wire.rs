//! Wire records of the archive.
//!
//! A frame record is a protocol buffer message:
//!
//! ```text
//! message BBox {
//!     float left = 1;
//!     float top = 2;
//!     float right = 3;
//!     float bottom = 4;
//! }
//!
//! message ObjectDetection {
//!     BBox bbox = 1;
//!     float score = 2;
//!     int32 pred_class = 3;
//!     bytes coco_mask = 4;
//! }
//!
//! message FrameObjectDetections {
//!     int32 frame_number = 1;
//!     repeated ObjectDetection objects = 2;
//! }
//! ```
//!
//! Coordinates and scores are single precision in memory and on the wire.
//! The video id is not part of the record.

use crate::{
    error::SchemaError,
    types::{BBox, FrameObjectDetections, ObjectDetection},
};
use prost::Message as _;

pub mod pb {
    #[derive(Clone, Copy, PartialEq, ::prost::Message)]
    pub struct BBox {
        #[prost(float, tag = "1")]
        pub left: f32,
        #[prost(float, tag = "2")]
        pub top: f32,
        #[prost(float, tag = "3")]
        pub right: f32,
        #[prost(float, tag = "4")]
        pub bottom: f32,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ObjectDetection {
        #[prost(message, optional, tag = "1")]
        pub bbox: Option<BBox>,
        #[prost(float, tag = "2")]
        pub score: f32,
        #[prost(int32, tag = "3")]
        pub pred_class: i32,
        #[prost(bytes = "vec", tag = "4")]
        pub coco_mask: Vec<u8>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct FrameObjectDetections {
        #[prost(int32, tag = "1")]
        pub frame_number: i32,
        #[prost(message, repeated, tag = "2")]
        pub objects: Vec<ObjectDetection>,
    }
}

/// Conversion between an in-memory type and its wire record.
pub trait WireFormat: Sized {
    type Wire;

    fn to_wire(&self) -> Self::Wire;

    fn from_wire(wire: Self::Wire) -> Result<Self, SchemaError>;
}

impl WireFormat for BBox {
    type Wire = pb::BBox;

    fn to_wire(&self) -> Self::Wire {
        let [left, top, right, bottom] = self.ltrb();
        pb::BBox {
            left,
            top,
            right,
            bottom,
        }
    }

    fn from_wire(wire: Self::Wire) -> Result<Self, SchemaError> {
        let pb::BBox {
            left,
            top,
            right,
            bottom,
        } = wire;
        Ok(BBox::new(left, top, right, bottom))
    }
}

impl WireFormat for ObjectDetection {
    type Wire = pb::ObjectDetection;

    fn to_wire(&self) -> Self::Wire {
        pb::ObjectDetection {
            bbox: Some(self.bbox.to_wire()),
            score: self.score,
            pred_class: self.pred_class,
            coco_mask: self.mask_counts().to_vec(),
        }
    }

    fn from_wire(wire: Self::Wire) -> Result<Self, SchemaError> {
        let pb::ObjectDetection {
            bbox,
            score,
            pred_class,
            coco_mask,
        } = wire;
        let bbox = bbox.ok_or(SchemaError::MissingField {
            message: "ObjectDetection",
            field: "bbox",
        })?;
        Ok(ObjectDetection::new(
            BBox::from_wire(bbox)?,
            score,
            pred_class,
            coco_mask,
        ))
    }
}

impl FrameObjectDetections {
    pub fn to_wire(&self) -> pb::FrameObjectDetections {
        pb::FrameObjectDetections {
            frame_number: self.frame_number,
            objects: self.objects.iter().map(|object| object.to_wire()).collect(),
        }
    }

    /// Serialize the frame record. The video id is left out.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_wire().encode_to_vec()
    }

    pub fn from_wire(
        video_id: impl Into<String>,
        wire: pb::FrameObjectDetections,
    ) -> Result<Self, SchemaError> {
        let pb::FrameObjectDetections {
            frame_number,
            objects,
        } = wire;
        let objects: Vec<_> = objects
            .into_iter()
            .map(ObjectDetection::from_wire)
            .collect::<Result<_, _>>()?;
        Ok(Self::new(video_id, frame_number, objects))
    }

    pub fn from_bytes(video_id: impl Into<String>, bytes: &[u8]) -> Result<Self, SchemaError> {
        let wire = pb::FrameObjectDetections::decode(bytes)?;
        Self::from_wire(video_id, wire)
    }
}
