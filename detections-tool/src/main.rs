use anyhow::{ensure, Context, Result};
use clap::Parser;
use detections::{
    archive::{self, ArchiveReader},
    convert::{load_raw_detections, Converter},
    Config, DetectionChecker,
};
use log::{error, info};
use prettytable::{cell, row, Table};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Parser)]
/// Convert, inspect and check per-video object detection archives.
enum Opts {
    /// Check archives before release
    Check {
        #[clap(long, default_value = "detections.json5")]
        /// configuration file
        config_file: PathBuf,
        #[clap(long, conflicts_with = "frames-dir")]
        /// number of frames every video must have
        expected_frames: Option<usize>,
        #[clap(long = "frames-dir", name = "frames-dir")]
        /// directory of per-video frame directories to count expected frames from
        frames_dir: Option<PathBuf>,
        #[clap(required = true)]
        /// archive files
        archive_files: Vec<PathBuf>,
    },
    /// Convert raw detections of a video into an archive
    Convert {
        #[clap(long, default_value = "detections.json5")]
        /// configuration file
        config_file: PathBuf,
        /// raw detections JSON file named after the video
        raw_file: PathBuf,
        /// output archive file
        output_file: PathBuf,
    },
    /// Print the contents of an archive
    Info {
        #[clap(long)]
        /// configuration file, to also list objects with class names and pixel boxes
        config_file: Option<PathBuf>,
        /// archive file
        archive_file: PathBuf,
    },
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    match Opts::parse() {
        Opts::Check {
            config_file,
            expected_frames,
            frames_dir,
            archive_files,
        } => check(
            config_file,
            expected_frames,
            frames_dir.as_deref(),
            &archive_files,
        )?,
        Opts::Convert {
            config_file,
            raw_file,
            output_file,
        } => convert(config_file, raw_file, output_file)?,
        Opts::Info {
            config_file,
            archive_file,
        } => info(config_file.as_deref(), archive_file)?,
    }

    Ok(())
}

fn check(
    config_file: impl AsRef<Path>,
    expected_frames: Option<usize>,
    frames_dir: Option<&Path>,
    archive_files: &[PathBuf],
) -> Result<()> {
    let config = Config::open(config_file)?;
    let vocabulary = config.load_vocabulary()?;
    let checker = DetectionChecker::new(vocabulary.len());

    let num_failures = archive_files
        .iter()
        .filter(|archive_file| {
            match check_archive(&checker, expected_frames, frames_dir, archive_file) {
                Ok(num_frames) => {
                    info!("'{}' passed ({} frames)", archive_file.display(), num_frames);
                    false
                }
                Err(err) => {
                    error!("'{}' failed: {:#}", archive_file.display(), err);
                    true
                }
            }
        })
        .count();

    ensure!(
        num_failures == 0,
        "{} of {} archives failed the checks",
        num_failures,
        archive_files.len()
    );
    Ok(())
}

fn check_archive(
    checker: &DetectionChecker,
    expected_frames: Option<usize>,
    frames_dir: Option<&Path>,
    archive_file: &Path,
) -> Result<usize> {
    let expected_frames = match (expected_frames, frames_dir) {
        (Some(expected_frames), _) => Some(expected_frames),
        (None, Some(frames_dir)) => {
            let video_id = archive::video_id_of(archive_file)?;
            Some(count_frames(&frames_dir.join(video_id))?)
        }
        (None, None) => None,
    };
    let checker = match expected_frames {
        Some(expected_frames) => checker.clone().with_expected_frames(expected_frames),
        None => checker.clone(),
    };
    Ok(checker.check_archive(archive_file)?)
}

fn count_frames(video_dir: &Path) -> Result<usize> {
    let num_frames = fs::read_dir(video_dir)
        .with_context(|| format!("unable to list frames in '{}'", video_dir.display()))?
        .count();
    Ok(num_frames)
}

fn convert(
    config_file: impl AsRef<Path>,
    raw_file: impl AsRef<Path>,
    output_file: impl AsRef<Path>,
) -> Result<()> {
    let raw_file = raw_file.as_ref();
    let config = Config::open(config_file)?;
    let video_id = archive::video_id_of(raw_file)?;

    let raw = load_raw_detections(raw_file)?;
    let converter = Converter::new(config.frame_size.to_hw())?;
    let frames = converter.convert_video_detections(&video_id, &raw)?;
    archive::save(output_file, &frames)?;

    Ok(())
}

fn info(config_file: Option<&Path>, archive_file: impl AsRef<Path>) -> Result<()> {
    let reader = ArchiveReader::open(archive_file)?;
    let config = config_file.map(Config::open).transpose()?;
    let vocabulary = config
        .as_ref()
        .map(|config| config.load_vocabulary())
        .transpose()?;

    // print header
    {
        let header = reader.header();
        let mut table = Table::new();
        table.add_row(row!["video", "version", "mask size", "frames"]);
        table.add_row(row![
            reader.video_id(),
            header.version,
            format!("{}x{}", header.mask_height, header.mask_width),
            header.num_frames
        ]);
        table.printstd();
    }

    let frames: Vec<_> = reader.collect::<Result<_, _>>()?;

    // print frames
    {
        let mut table = Table::new();
        table.add_row(row!["frame", "objects", "classes", "max score"]);

        frames.iter().for_each(|frame| {
            let classes: Vec<_> = frame.objects.iter().map(|obj| obj.pred_class).collect();
            let max_score = frame
                .objects
                .iter()
                .map(|obj| obj.score)
                .reduce(f32::max)
                .map(|score| format!("{:.3}", score))
                .unwrap_or_default();

            table.add_row(row![
                frame.frame_number,
                frame.objects.len(),
                format!("{:?}", classes),
                max_score
            ]);
        });

        table.printstd();
    }

    // print objects
    if let (Some(config), Some(vocabulary)) = (&config, &vocabulary) {
        let frame_size = config.frame_size.to_hw();
        let mut table = Table::new();
        table.add_row(row![
            "frame",
            "index",
            "class",
            "score",
            "bbox (pixels)",
            "mask area"
        ]);

        for frame in &frames {
            for (index, obj) in frame.objects.iter().enumerate() {
                let class = vocabulary
                    .name(obj.pred_class)
                    .map(ToOwned::to_owned)
                    .unwrap_or_else(|| format!("<{}>", obj.pred_class));
                let [left, top, right, bottom] = obj.pixel_bbox(frame_size).ltrb();

                table.add_row(row![
                    frame.frame_number,
                    index,
                    class,
                    format!("{:.3}", obj.score),
                    format!("[{:.1}, {:.1}, {:.1}, {:.1}]", left, top, right, bottom),
                    obj.mask_area()?
                ]);
            }
        }

        table.printstd();
    }

    Ok(())
}
