use detections::{
    archive,
    convert::{load_raw_detections, Converter},
    Config, DetectionChecker,
};
use std::fs;

const RAW_DETECTIONS: &str = r#"{
    "frame_0000000001.jpg": {
        "bboxes": [[45.6, 25.6, 228.0, 256.0], [0.0, 0.0, 456.0, 256.0]],
        "ids": [2, 0],
        "masks": [
            {"size": [100, 100], "counts": "jn1d0`20000000000000000000000000000000000000Vk5"},
            {"size": [100, 100], "counts": [0, 10000]}
        ],
        "scores": [0.9, 0.25]
    },
    "frame_0000000002.jpg": {
        "bboxes": [], "ids": [], "masks": [], "scores": []
    },
    "frame_0000000003.jpg": {
        "bboxes": [[10.0, 10.0, 20.0, 20.0]],
        "ids": [1],
        "masks": [{"size": [100, 100], "counts": "`h9"}],
        "scores": [1.0]
    }
}"#;

#[test]
fn convert_save_and_check() {
    let dir = tempfile::tempdir().unwrap();
    let raw_path = dir.path().join("P01_101.json");
    let config_path = dir.path().join("config.json5");
    let classes_path = dir.path().join("classes.txt");
    fs::write(&raw_path, RAW_DETECTIONS).unwrap();
    fs::write(&classes_path, "tap\nspoon\nplate\n").unwrap();
    fs::write(
        &config_path,
        r#"{
            version: "0.1.0",
            classes_file: "classes.txt",
            frame_size: { h: 256, w: 456 },
        }"#,
    )
    .unwrap();

    let config = Config::open(&config_path).unwrap();
    let vocabulary = config.load_vocabulary().unwrap();
    assert_eq!(vocabulary.len(), 3);

    let raw = load_raw_detections(&raw_path).unwrap();
    let converter = Converter::new(config.frame_size.to_hw()).unwrap();
    let frames = converter.convert_video_detections("P01_101", &raw).unwrap();
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[0].objects.len(), 2);
    assert_eq!(
        frames[0].objects[0].mask_counts(),
        b"jn1d0`20000000000000000000000000000000000000Vk5"
    );
    assert!(frames[0].objects[1]
        .mask()
        .unwrap()
        .iter()
        .all(|&pixel| pixel == 1));

    let archive_path = dir.path().join("out").join("P01_101.dets");
    archive::save(&archive_path, &frames).unwrap();

    let checker = DetectionChecker::new(vocabulary.len()).with_expected_frames(3);
    assert_eq!(checker.check_archive(&archive_path).unwrap(), 3);
    assert_eq!(archive::load(&archive_path).unwrap(), frames);
}

#[test]
fn converted_class_outside_vocabulary_fails_check() {
    let dir = tempfile::tempdir().unwrap();
    let raw_path = dir.path().join("P01_101.json");
    fs::write(&raw_path, RAW_DETECTIONS).unwrap();

    let raw = load_raw_detections(&raw_path).unwrap();
    let converter = Converter::new(bbox::HW::from_hw([256.0, 456.0])).unwrap();
    let frames = converter.convert_video_detections("P01_101", &raw).unwrap();

    let checker = DetectionChecker::new(2);
    let err = checker.check("P01_101", &frames).unwrap_err();
    assert_eq!(err.frame_number, Some(1));
    assert_eq!(err.object_index, Some(0));
}

#[test]
fn raw_detections_must_be_valid_json() {
    let dir = tempfile::tempdir().unwrap();
    let raw_path = dir.path().join("P01_101.json");
    fs::write(&raw_path, "{ \"frame_1.jpg\": ").unwrap();
    assert!(load_raw_detections(&raw_path).is_err());
}
