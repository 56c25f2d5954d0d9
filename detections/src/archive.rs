//! The per-video archive file.
//!
//! All integers are little-endian.
//!
//! ```text
//! magic        [u8; 8]   "DETMASKS"
//! version      u32       SCHEMA_VERSION
//! mask_height  u32       MASK_HEIGHT
//! mask_width   u32       MASK_WIDTH
//! num_frames   u64
//! frames       num_frames times:
//!     length   u32
//!     payload  [u8; length]   encoded FrameObjectDetections
//! ```
//!
//! The file name stem is the video id.

use crate::{
    common::*,
    error::{Error, SchemaError},
    types::{FrameObjectDetections, MASK_HEIGHT, MASK_WIDTH},
};
use binread::{BinRead, BinReaderExt as _};
use byteorder::{LittleEndian, WriteBytesExt as _};
use tempfile::NamedTempFile;

pub const MAGIC: [u8; 8] = *b"DETMASKS";

/// Version 1 lays out bounding boxes as left, top, right, bottom.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Hash, BinRead)]
#[br(magic = b"DETMASKS")]
pub struct Header {
    pub version: u32,
    pub mask_height: u32,
    pub mask_width: u32,
    pub num_frames: u64,
}

impl Header {
    pub fn new(num_frames: u64) -> Self {
        Self {
            version: SCHEMA_VERSION,
            mask_height: MASK_HEIGHT as u32,
            mask_width: MASK_WIDTH as u32,
            num_frames,
        }
    }

    pub fn write_to<W>(&self, mut writer: W) -> io::Result<()>
    where
        W: Write,
    {
        writer.write_all(&MAGIC)?;
        writer.write_u32::<LittleEndian>(self.version)?;
        writer.write_u32::<LittleEndian>(self.mask_height)?;
        writer.write_u32::<LittleEndian>(self.mask_width)?;
        writer.write_u64::<LittleEndian>(self.num_frames)?;
        Ok(())
    }

    fn ensure_supported(&self) -> Result<(), SchemaError> {
        if self.version != SCHEMA_VERSION {
            return Err(SchemaError::UnsupportedVersion {
                found: self.version,
                supported: SCHEMA_VERSION,
            });
        }

        let expected = [MASK_HEIGHT as u32, MASK_WIDTH as u32];
        let found = [self.mask_height, self.mask_width];
        if found != expected {
            return Err(SchemaError::MaskSizeMismatch { found, expected });
        }

        Ok(())
    }
}

/// Save frame records to an archive file.
///
/// Parent directories are created as needed. The archive is written to a
/// temporary file next to `path` and moved over it once complete, so a
/// failed save leaves any existing archive untouched.
pub fn save<P>(path: P, frames: &[FrameObjectDetections]) -> Result<(), Error>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(file.as_file_mut());
        write_archive(&mut writer, frames)?;
        writer.flush()?;
    }
    file.as_file().sync_all()?;
    file.persist(path).map_err(|err| err.error)?;

    info!("saved {} frames to '{}'", frames.len(), path.display());
    Ok(())
}

/// Load all frame records of an archive file.
pub fn load<P>(path: P) -> Result<Vec<FrameObjectDetections>, Error>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let frames: Vec<_> = ArchiveReader::open(path)?.collect::<Result<_, _>>()?;
    debug!("loaded {} frames from '{}'", frames.len(), path.display());
    Ok(frames)
}

/// Serialize frame records in archive layout.
pub fn write_archive<W>(mut writer: W, frames: &[FrameObjectDetections]) -> io::Result<()>
where
    W: Write,
{
    Header::new(frames.len() as u64).write_to(&mut writer)?;

    frames.iter().try_for_each(|frame| -> io::Result<_> {
        let payload = frame.to_bytes();
        let length = u32::try_from(payload.len()).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "frame {} encodes to {} bytes, exceeding the record size limit",
                    frame.frame_number,
                    payload.len()
                ),
            )
        })?;
        writer.write_u32::<LittleEndian>(length)?;
        writer.write_all(&payload)?;
        Ok(())
    })
}

/// Streaming archive reader.
///
/// Frame records are decoded one at a time in archive order. Iteration stops
/// after the first error.
#[derive(Debug)]
pub struct ArchiveReader<R> {
    video_id: String,
    header: Header,
    reader: R,
    index: u64,
    finished: bool,
}

impl ArchiveReader<BufReader<File>> {
    /// Open an archive file. The video id is the file name stem.
    pub fn open<P>(path: P) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let video_id = video_id_of(path)?;
        let reader = BufReader::new(File::open(path)?);
        Self::new(video_id, reader)
    }
}

impl<R> ArchiveReader<R>
where
    R: Read + Seek,
{
    pub fn new(video_id: impl Into<String>, mut reader: R) -> Result<Self, Error> {
        let header: Header = reader.read_le().map_err(from_binread_error)?;
        header.ensure_supported()?;

        Ok(Self {
            video_id: video_id.into(),
            header,
            reader,
            index: 0,
            finished: false,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    /// Number of frame records announced by the header.
    pub fn num_frames(&self) -> u64 {
        self.header.num_frames
    }

    fn read_frame(&mut self) -> Result<FrameObjectDetections, Error> {
        let length: u32 = self.reader.read_le().map_err(from_binread_error)?;

        let mut payload = vec![];
        (&mut self.reader)
            .take(length as u64)
            .read_to_end(&mut payload)?;
        if payload.len() != length as usize {
            return Err(SchemaError::Truncated.into());
        }

        let frame =
            FrameObjectDetections::from_bytes(self.video_id.as_str(), &payload).map_err(
                |err| SchemaError::Frame {
                    index: self.index,
                    source: Box::new(err),
                },
            )?;
        Ok(frame)
    }

    fn ensure_consumed(&mut self) -> Result<(), Error> {
        let offset = self.reader.stream_position()?;
        let mut byte = [0u8; 1];
        if self.reader.read(&mut byte)? != 0 {
            return Err(SchemaError::TrailingBytes { offset }.into());
        }
        Ok(())
    }
}

impl<R> Iterator for ArchiveReader<R>
where
    R: Read + Seek,
{
    type Item = Result<FrameObjectDetections, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        if self.index == self.header.num_frames {
            self.finished = true;
            return self.ensure_consumed().err().map(Err);
        }

        let result = self.read_frame();
        match &result {
            Ok(_) => self.index += 1,
            Err(_) => self.finished = true,
        }
        Some(result)
    }
}

/// The video id of an archive path, which is its file name stem.
pub fn video_id_of(path: &Path) -> Result<String, Error> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(ToOwned::to_owned)
        .ok_or_else(|| Error::InvalidPath(path.to_owned()))
}

fn from_binread_error(err: binread::Error) -> Error {
    match err {
        binread::Error::BadMagic { .. } => SchemaError::BadMagic.into(),
        binread::Error::Io(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
            SchemaError::Truncated.into()
        }
        binread::Error::Io(err) => err.into(),
        err => SchemaError::Header(format!("{:?}", err)).into(),
    }
}
