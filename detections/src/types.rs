use crate::{common::*, error::Error};
use bbox::Transform;
use mask_rle::{Rle, RleError};

/// Height of the persisted mask raster.
pub const MASK_HEIGHT: usize = 100;
/// Width of the persisted mask raster.
pub const MASK_WIDTH: usize = 100;

/// Bounding box normalized to `[0, 1]` by the frame height and width.
pub type BBox = LTRB<f32>;

/// Decoded binary mask of [MASK_HEIGHT] by [MASK_WIDTH] pixels.
pub type Mask = Array2<u8>;

/// A detected object instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectDetection {
    pub bbox: BBox,
    pub score: f32,
    /// Index into the class vocabulary.
    pub pred_class: i32,
    mask_counts: Vec<u8>,
}

impl ObjectDetection {
    /// Build from already compressed mask counts.
    pub fn new(bbox: BBox, score: f32, pred_class: i32, mask_counts: Vec<u8>) -> Self {
        Self {
            bbox,
            score,
            pred_class,
            mask_counts,
        }
    }

    /// Build from a decoded mask, compressing it.
    pub fn from_mask(
        bbox: BBox,
        score: f32,
        pred_class: i32,
        mask: ArrayView2<u8>,
    ) -> Result<Self, Error> {
        let expected = (MASK_HEIGHT, MASK_WIDTH);
        let found = mask.dim();
        if found != expected {
            return Err(Error::MaskShape { expected, found });
        }

        let mask_counts = Rle::encode(mask).to_bytes();
        Ok(Self::new(bbox, score, pred_class, mask_counts))
    }

    /// The compressed mask counts.
    pub fn mask_counts(&self) -> &[u8] {
        &self.mask_counts
    }

    /// Decode the mask.
    ///
    /// The mask is decoded again on every call. Callers that need it more than
    /// once should keep the returned raster.
    pub fn mask(&self) -> Result<Mask, RleError> {
        mask_rle::decode(&self.mask_counts, MASK_HEIGHT, MASK_WIDTH)
    }

    /// Number of foreground mask pixels, counted without decoding the raster.
    pub fn mask_area(&self) -> Result<u64, RleError> {
        Ok(Rle::from_bytes(&self.mask_counts, MASK_HEIGHT, MASK_WIDTH)?.area())
    }

    /// The bounding box in pixels of a `frame_size` frame.
    pub fn pixel_bbox(&self, frame_size: HW<f64>) -> LTRB<f64> {
        let transform = Transform::normalize(frame_size).inverse();
        &transform * &self.bbox.cast::<f64>()
    }
}

/// All detections of one video frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameObjectDetections {
    /// Identifier of the video. It is not stored in the frame record but
    /// taken from the archive file name.
    pub video_id: String,
    /// 1-based frame index.
    pub frame_number: i32,
    pub objects: Vec<ObjectDetection>,
}

impl FrameObjectDetections {
    pub fn new(
        video_id: impl Into<String>,
        frame_number: i32,
        objects: Vec<ObjectDetection>,
    ) -> Self {
        Self {
            video_id: video_id.into(),
            frame_number,
            objects,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::s;

    #[test]
    fn object_mask_is_decoded_on_demand() {
        let mut mask = Mask::zeros((MASK_HEIGHT, MASK_WIDTH));
        mask.slice_mut(s![10..30, 20..40]).fill(1);

        let object =
            ObjectDetection::from_mask(BBox::new(0.1, 0.2, 0.3, 0.4), 0.8, 42, mask.view())
                .unwrap();
        assert_eq!(object.mask().unwrap(), mask);
        assert_eq!(object.mask().unwrap(), object.mask().unwrap());
    }

    #[test]
    fn object_mask_area() {
        let mut mask = Mask::zeros((MASK_HEIGHT, MASK_WIDTH));
        mask.slice_mut(s![10..30, 20..40]).fill(1);
        let object = ObjectDetection::from_mask(BBox::default(), 0.8, 42, mask.view()).unwrap();
        assert_eq!(object.mask_area().unwrap(), 400);

        let object = ObjectDetection::new(BBox::default(), 0.8, 42, b"<".to_vec());
        assert!(object.mask_area().is_err());
    }

    #[test]
    fn object_bbox_in_pixels() {
        let object = ObjectDetection::new(BBox::new(0.1, 0.1, 0.5, 1.0), 0.8, 42, vec![]);
        let bbox = object.pixel_bbox(HW::from_hw([256.0, 456.0]));
        assert_abs_diff_eq!(bbox.left(), 45.6, epsilon = 1e-4);
        assert_abs_diff_eq!(bbox.top(), 25.6, epsilon = 1e-4);
        assert_abs_diff_eq!(bbox.right(), 228.0, epsilon = 1e-4);
        assert_abs_diff_eq!(bbox.bottom(), 256.0, epsilon = 1e-4);
    }

    #[test]
    fn object_rejects_mask_of_other_size() {
        let mask = Mask::zeros((50, 100));
        let result = ObjectDetection::from_mask(BBox::default(), 0.5, 0, mask.view());
        assert!(matches!(
            result,
            Err(Error::MaskShape {
                expected: (100, 100),
                found: (50, 100)
            })
        ));
    }

    #[test]
    fn object_with_corrupt_counts_fails_to_decode() {
        let object = ObjectDetection::new(BBox::default(), 0.5, 0, b"<".to_vec());
        assert!(object.mask().is_err());
    }
}
