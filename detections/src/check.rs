//! Release checks for the detections of a video.

use crate::{
    archive::ArchiveReader,
    common::*,
    error::{BBoxField, Error, ValidationError, Violation},
    types::{BBox, FrameObjectDetections, ObjectDetection, MASK_HEIGHT, MASK_WIDTH},
};

/// Checks the frame records of a video and stops at the first violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionChecker {
    expected_frames: Option<usize>,
    num_classes: usize,
}

impl DetectionChecker {
    /// A checker for class indexes in `[0, num_classes)`.
    pub fn new(num_classes: usize) -> Self {
        Self {
            expected_frames: None,
            num_classes,
        }
    }

    /// Also require exactly `expected_frames` records, each with a frame
    /// number in `[1, expected_frames]`.
    pub fn with_expected_frames(self, expected_frames: usize) -> Self {
        Self {
            expected_frames: Some(expected_frames),
            ..self
        }
    }

    pub fn expected_frames(&self) -> Option<usize> {
        self.expected_frames
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Check the frame records of the video `video_id`.
    ///
    /// The frame count is compared first, then frames are checked in order.
    pub fn check(
        &self,
        video_id: &str,
        frames: &[FrameObjectDetections],
    ) -> Result<(), ValidationError> {
        self.check_frame_count(video_id, frames.len())?;
        frames
            .iter()
            .try_for_each(|frame| self.check_frame(video_id, frame))
    }

    /// Stream an archive file through the checks.
    ///
    /// The frame count announced by the header is compared before any frame
    /// is read. Returns the number of frames on success.
    pub fn check_archive<P>(&self, path: P) -> Result<usize, Error>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let mut reader = ArchiveReader::open(path)?;
        let video_id = reader.video_id().to_owned();

        let num_frames = usize::try_from(reader.num_frames()).unwrap_or(usize::MAX);
        self.check_frame_count(&video_id, num_frames)?;

        reader.try_for_each(|frame| -> Result<_, Error> {
            self.check_frame(&video_id, &frame?)?;
            Ok(())
        })?;

        debug!("'{}' passed with {} frames", path.display(), num_frames);
        Ok(num_frames)
    }

    pub fn check_frame(
        &self,
        video_id: &str,
        frame: &FrameObjectDetections,
    ) -> Result<(), ValidationError> {
        let error = |object_index: Option<usize>, violation: Violation| ValidationError {
            video_id: video_id.to_owned(),
            frame_number: Some(frame.frame_number),
            object_index,
            violation,
        };

        if let Some(expected_frames) = self.expected_frames {
            let in_range = usize::try_from(frame.frame_number)
                .map(|number| (1..=expected_frames).contains(&number))
                .unwrap_or(false);
            if !in_range {
                return Err(error(
                    None,
                    Violation::FrameNumber {
                        value: frame.frame_number,
                        expected_frames,
                    },
                ));
            }
        }

        frame
            .objects
            .iter()
            .enumerate()
            .try_for_each(|(index, object)| {
                self.check_object(object)
                    .map_err(|violation| error(Some(index), violation))
            })
    }

    /// Check one object in the order bbox, score, mask, class.
    pub fn check_object(&self, object: &ObjectDetection) -> Result<(), Violation> {
        check_bbox(&object.bbox)?;
        check_score(object.score)?;
        check_mask(object)?;
        self.check_class(object.pred_class)
    }

    fn check_class(&self, pred_class: i32) -> Result<(), Violation> {
        let in_range = usize::try_from(pred_class)
            .map(|class| class < self.num_classes)
            .unwrap_or(false);
        if !in_range {
            return Err(Violation::Class {
                value: pred_class,
                num_classes: self.num_classes,
            });
        }
        Ok(())
    }

    fn check_frame_count(&self, video_id: &str, num_frames: usize) -> Result<(), ValidationError> {
        match self.expected_frames {
            Some(expected) if expected != num_frames => Err(ValidationError {
                video_id: video_id.to_owned(),
                frame_number: None,
                object_index: None,
                violation: Violation::FrameCount {
                    expected,
                    found: num_frames,
                },
            }),
            _ => Ok(()),
        }
    }
}

fn check_score(score: f32) -> Result<(), Violation> {
    if !is_unit(score) {
        return Err(Violation::Score { value: score });
    }
    Ok(())
}

fn check_bbox(bbox: &BBox) -> Result<(), Violation> {
    let sides = [
        (BBoxField::Left, bbox.left()),
        (BBoxField::Top, bbox.top()),
        (BBoxField::Right, bbox.right()),
        (BBoxField::Bottom, bbox.bottom()),
    ];
    if let Some(&(field, value)) = sides.iter().find(|(_, value)| !is_unit(*value)) {
        return Err(Violation::BBoxRange { field, value });
    }

    let pairs = [
        (BBoxField::Left, bbox.left(), BBoxField::Right, bbox.right()),
        (BBoxField::Top, bbox.top(), BBoxField::Bottom, bbox.bottom()),
    ];
    pairs
        .into_iter()
        .try_for_each(|(low_field, low, high_field, high)| {
            if low <= high {
                Ok(())
            } else {
                Err(Violation::BBoxOrder {
                    low_field,
                    low,
                    high_field,
                    high,
                })
            }
        })
}

fn check_mask(object: &ObjectDetection) -> Result<(), Violation> {
    let violation = |reason: String| Violation::Mask {
        h: MASK_HEIGHT,
        w: MASK_WIDTH,
        reason,
    };

    let mask = object.mask().map_err(|err| violation(err.to_string()))?;
    if mask.dim() != (MASK_HEIGHT, MASK_WIDTH) {
        return Err(violation(format!("decoded shape is {:?}", mask.dim())));
    }
    if let Some(value) = mask.iter().find(|&&value| value > 1) {
        return Err(violation(format!("pixel value {} is not binary", value)));
    }
    Ok(())
}

/// Whether `value` is in `[0, 1]`. NaN is not.
fn is_unit(value: f32) -> bool {
    (0.0..=1.0).contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Mask;
    use ndarray::s;

    const NUM_CLASSES: usize = 300;

    fn object(bbox: BBox, score: f32, pred_class: i32) -> ObjectDetection {
        let mut mask = Mask::zeros((MASK_HEIGHT, MASK_WIDTH));
        mask.slice_mut(s![10..30, 20..40]).fill(1);
        ObjectDetection::from_mask(bbox, score, pred_class, mask.view()).unwrap()
    }

    fn good_object() -> ObjectDetection {
        object(BBox::new(0.1, 0.2, 0.3, 0.4), 0.8, 42)
    }

    fn frames(num_frames: i32) -> Vec<FrameObjectDetections> {
        (1..=num_frames)
            .map(|frame_number| {
                FrameObjectDetections::new("P01_101", frame_number, vec![good_object()])
            })
            .collect()
    }

    fn check_one(object: ObjectDetection) -> Result<(), ValidationError> {
        let frame = FrameObjectDetections::new("P01_101", 1, vec![good_object(), object]);
        DetectionChecker::new(NUM_CLASSES).check("P01_101", &[frame])
    }

    fn violation_of(object: ObjectDetection) -> Violation {
        let error = check_one(object).unwrap_err();
        assert_eq!(error.video_id, "P01_101");
        assert_eq!(error.frame_number, Some(1));
        assert_eq!(error.object_index, Some(1));
        error.violation
    }

    #[test]
    fn accepts_well_formed_video() {
        let frames = frames(5);
        let checker = DetectionChecker::new(NUM_CLASSES).with_expected_frames(5);
        assert_eq!(checker.check("P01_101", &frames), Ok(()));
    }

    #[test]
    fn accepts_boundary_values() {
        let checker = DetectionChecker::new(NUM_CLASSES);
        let edge = object(BBox::new(0.0, 0.0, 1.0, 1.0), 1.0, 0);
        let point = object(BBox::new(0.5, 0.5, 0.5, 0.5), 0.0, NUM_CLASSES as i32 - 1);
        assert_eq!(checker.check_object(&edge), Ok(()));
        assert_eq!(checker.check_object(&point), Ok(()));
    }

    #[test]
    fn rejects_score_out_of_range() {
        assert_eq!(
            violation_of(object(BBox::new(0.1, 0.2, 0.3, 0.4), 1.5, 42)),
            Violation::Score { value: 1.5 }
        );
        assert!(matches!(
            violation_of(object(BBox::new(0.1, 0.2, 0.3, 0.4), f32::NAN, 42)),
            Violation::Score { .. }
        ));
    }

    #[test]
    fn rejects_bbox_ordering() {
        assert_eq!(
            violation_of(object(BBox::new(0.6, 0.2, 0.4, 0.4), 0.8, 42)),
            Violation::BBoxOrder {
                low_field: BBoxField::Left,
                low: 0.6,
                high_field: BBoxField::Right,
                high: 0.4,
            }
        );
        assert_eq!(
            violation_of(object(BBox::new(0.1, 0.5, 0.3, 0.4), 0.8, 42)),
            Violation::BBoxOrder {
                low_field: BBoxField::Top,
                low: 0.5,
                high_field: BBoxField::Bottom,
                high: 0.4,
            }
        );
    }

    #[test]
    fn rejects_bbox_out_of_range() {
        assert_eq!(
            violation_of(object(BBox::new(-0.1, 0.2, 0.3, 0.4), 0.8, 42)),
            Violation::BBoxRange {
                field: BBoxField::Left,
                value: -0.1,
            }
        );
        assert_eq!(
            violation_of(object(BBox::new(0.1, 0.2, 0.3, 1.25), 0.8, 42)),
            Violation::BBoxRange {
                field: BBoxField::Bottom,
                value: 1.25,
            }
        );
    }

    #[test]
    fn rejects_class_out_of_range() {
        let bbox = BBox::new(0.1, 0.2, 0.3, 0.4);
        assert_eq!(
            violation_of(object(bbox, 0.8, NUM_CLASSES as i32)),
            Violation::Class {
                value: NUM_CLASSES as i32,
                num_classes: NUM_CLASSES,
            }
        );
        assert_eq!(
            violation_of(object(bbox, 0.8, -1)),
            Violation::Class {
                value: -1,
                num_classes: NUM_CLASSES,
            }
        );
    }

    #[test]
    fn rejects_undecodable_mask() {
        let bbox = BBox::new(0.1, 0.2, 0.3, 0.4);
        let broken = ObjectDetection::new(bbox, 0.8, 42, b"<".to_vec());
        assert!(matches!(
            violation_of(broken),
            Violation::Mask { h: 100, w: 100, .. }
        ));
    }

    #[test]
    fn checks_bbox_before_score() {
        assert!(matches!(
            violation_of(object(BBox::new(0.6, 0.2, 0.4, 0.4), 1.5, 42)),
            Violation::BBoxOrder { .. }
        ));
    }

    #[test]
    fn rejects_missing_frames() {
        let frames = frames(5);
        let checker = DetectionChecker::new(NUM_CLASSES).with_expected_frames(6);
        let error = checker.check("P01_101", &frames).unwrap_err();
        assert_eq!(error.frame_number, None);
        assert_eq!(
            error.violation,
            Violation::FrameCount {
                expected: 6,
                found: 5
            }
        );
    }

    #[test]
    fn counts_frames_before_frame_numbers() {
        let frames = frames(7);
        let checker = DetectionChecker::new(NUM_CLASSES).with_expected_frames(6);
        let error = checker.check("P01_101", &frames).unwrap_err();
        assert_eq!(error.frame_number, None);
        assert_eq!(
            error.violation,
            Violation::FrameCount {
                expected: 6,
                found: 7
            }
        );
    }

    #[test]
    fn rejects_frame_number_out_of_range() {
        let mut frames = frames(3);
        frames[1].frame_number = 0;
        let checker = DetectionChecker::new(NUM_CLASSES).with_expected_frames(3);
        let error = checker.check("P01_101", &frames).unwrap_err();
        assert_eq!(error.frame_number, Some(0));
        assert_eq!(
            error.violation,
            Violation::FrameNumber {
                value: 0,
                expected_frames: 3
            }
        );
    }

    #[test]
    fn frame_numbers_unchecked_without_expected_count() {
        let mut frames = frames(2);
        frames[0].frame_number = 1000;
        let checker = DetectionChecker::new(NUM_CLASSES);
        assert_eq!(checker.check("P01_101", &frames), Ok(()));
    }

    #[test]
    fn empty_frames_pass_object_checks() {
        let frames: Vec<_> = (1..=3)
            .map(|frame_number| FrameObjectDetections::new("P01_101", frame_number, vec![]))
            .collect();
        let checker = DetectionChecker::new(NUM_CLASSES).with_expected_frames(3);
        assert_eq!(checker.check("P01_101", &frames), Ok(()));

        let checker = DetectionChecker::new(NUM_CLASSES).with_expected_frames(4);
        assert!(checker.check("P01_101", &frames).is_err());
    }
}
