//! Conversion of raw detector output into frame records.
//!
//! The raw output of a video is a JSON object keyed by frame file name. Each
//! entry carries parallel arrays of pixel boxes, class ids, COCO masks and
//! scores.

use crate::{
    common::*,
    types::{BBox, FrameObjectDetections, ObjectDetection, MASK_HEIGHT, MASK_WIDTH},
};
use bbox::Transform;
use mask_rle::Rle;
use regex::Regex;

static FRAME_NUMBER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)(?:\.\w+)?$").unwrap());

/// Raw detections of a video keyed by frame file name, in input order.
pub type RawVideoDetections = IndexMap<String, RawFrameDetections>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFrameDetections {
    /// Pixel boxes in `[x1, y1, x2, y2]` order.
    pub bboxes: Vec<[f64; 4]>,
    pub ids: Vec<i32>,
    pub masks: Vec<RawMask>,
    pub scores: Vec<f32>,
}

/// A COCO style run-length encoded mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMask {
    /// Mask size in `[h, w]` order.
    pub size: [usize; 2],
    pub counts: RawCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawCounts {
    Compressed(String),
    Runs(Vec<u32>),
}

impl RawMask {
    pub fn to_rle(&self) -> anyhow::Result<Rle> {
        let [h, w] = self.size;
        let rle = match &self.counts {
            RawCounts::Compressed(counts) => Rle::from_bytes(counts.as_bytes(), h, w)?,
            RawCounts::Runs(counts) => Rle::new(h, w, counts.clone())?,
        };
        Ok(rle)
    }
}

/// Read a raw detections JSON file.
pub fn load_raw_detections<P>(path: P) -> anyhow::Result<RawVideoDetections>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let reader = BufReader::new(
        File::open(path).with_context(|| format!("unable to open '{}'", path.display()))?,
    );
    let detections: RawVideoDetections = serde_json::from_reader(reader)
        .with_context(|| format!("'{}' is not a valid raw detections file", path.display()))?;
    Ok(detections)
}

/// Parse the frame number from the trailing digits of a frame file name.
pub fn frame_number_of(frame_name: &str) -> anyhow::Result<i32> {
    let captures = FRAME_NUMBER_REGEX
        .captures(frame_name)
        .ok_or_else(|| format_err!("no frame number in frame name '{}'", frame_name))?;
    let frame_number: i32 = captures[1]
        .parse()
        .with_context(|| format!("frame number of '{}' is out of range", frame_name))?;
    Ok(frame_number)
}

#[derive(Debug, Clone)]
pub struct Converter {
    transform: Transform<f64>,
}

impl Converter {
    /// Create a converter for raw detections made on frames of `frame_size` pixels.
    pub fn new(frame_size: HW<f64>) -> anyhow::Result<Self> {
        ensure!(
            frame_size.h() > 0.0 && frame_size.w() > 0.0,
            "frame size must be positive, but get {}x{}",
            frame_size.h(),
            frame_size.w()
        );
        Ok(Self {
            transform: Transform::normalize(frame_size),
        })
    }

    pub fn convert_video_detections(
        &self,
        video_id: &str,
        raw: &RawVideoDetections,
    ) -> anyhow::Result<Vec<FrameObjectDetections>> {
        let frames: Vec<_> = raw
            .iter()
            .map(|(frame_name, raw_frame)| {
                self.convert_frame_detections(video_id, frame_name, raw_frame)
                    .with_context(|| {
                        format!(
                            "failed to convert frame '{}' of video '{}'",
                            frame_name, video_id
                        )
                    })
            })
            .collect::<anyhow::Result<_>>()?;
        info!("converted {} frames of video '{}'", frames.len(), video_id);
        Ok(frames)
    }

    pub fn convert_frame_detections(
        &self,
        video_id: &str,
        frame_name: &str,
        raw: &RawFrameDetections,
    ) -> anyhow::Result<FrameObjectDetections> {
        let RawFrameDetections {
            bboxes,
            ids,
            masks,
            scores,
        } = raw;
        ensure!(
            bboxes.len() == ids.len() && ids.len() == masks.len() && masks.len() == scores.len(),
            "mismatched detection arrays: {} bboxes, {} ids, {} masks, {} scores",
            bboxes.len(),
            ids.len(),
            masks.len(),
            scores.len()
        );

        let frame_number = frame_number_of(frame_name)?;
        let objects: Vec<_> = izip!(bboxes, ids, masks, scores)
            .enumerate()
            .map(|(index, (bbox, &class, mask, &score))| {
                self.convert_object_detection(bbox, mask, class, score)
                    .with_context(|| format!("invalid object {}", index))
            })
            .collect::<anyhow::Result<_>>()?;
        debug!(
            "frame {} of video '{}' has {} objects",
            frame_number,
            video_id,
            objects.len()
        );

        Ok(FrameObjectDetections::new(video_id, frame_number, objects))
    }

    pub fn convert_object_detection(
        &self,
        bbox: &[f64; 4],
        mask: &RawMask,
        pred_class: i32,
        score: f32,
    ) -> anyhow::Result<ObjectDetection> {
        ensure!(
            mask.size == [MASK_HEIGHT, MASK_WIDTH],
            "mask size must be {}x{}, but get {}x{}",
            MASK_HEIGHT,
            MASK_WIDTH,
            mask.size[0],
            mask.size[1]
        );
        let mask = mask.to_rle()?.decode();

        let pixel_bbox = LTRB::from(*bbox);
        let ratio_bbox: BBox = (&self.transform * &pixel_bbox)
            .try_cast()
            .ok_or_else(|| {
                format_err!("bbox {:?} is not representable in single precision", bbox)
            })?;
        let in_range = ratio_bbox
            .ltrb()
            .iter()
            .all(|&value| (0.0..=1.0).contains(&value));
        if !in_range || !ratio_bbox.is_ordered() {
            warn!("bbox {:?} does not fit the frame after normalization", bbox);
        }

        let object = ObjectDetection::from_mask(ratio_bbox, score, pred_class, mask.view())?;
        Ok(object)
    }
}
