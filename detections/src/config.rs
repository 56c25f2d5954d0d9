//! Tool configuration.

use crate::{common::*, vocabulary::Vocabulary};
use semver::{Version, VersionReq};

pub static CONFIG_VERSION: Lazy<VersionReq> = Lazy::new(|| VersionReq::parse("0.1.0").unwrap());

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(deserialize_with = "deserialize_version")]
    pub version: Version,
    /// File listing the class vocabulary, one name per line. A relative path
    /// is resolved against the directory of the configuration file.
    pub classes_file: PathBuf,
    /// Size of the source frames the raw detections were made on.
    #[serde(default = "default_frame_size")]
    pub frame_size: FrameSize,
}

impl Config {
    pub fn open<P>(path: P) -> anyhow::Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let mut config: Self = json5::from_str(&text)?;

        if config.classes_file.is_relative() {
            if let Some(dir) = path.parent() {
                config.classes_file = dir.join(&config.classes_file);
            }
        }

        Ok(config)
    }

    pub fn load_vocabulary(&self) -> anyhow::Result<Vocabulary> {
        Vocabulary::load(&self.classes_file)
    }
}

/// Frame size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub h: NonZeroUsize,
    pub w: NonZeroUsize,
}

impl FrameSize {
    pub fn to_hw(&self) -> HW<f64> {
        HW::from_hw([self.h.get() as f64, self.w.get() as f64])
    }
}

fn default_frame_size() -> FrameSize {
    FrameSize {
        h: NonZeroUsize::new(256).unwrap(),
        w: NonZeroUsize::new(456).unwrap(),
    }
}

pub fn deserialize_version<'de, D>(deserializer: D) -> Result<Version, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    let version = Version::parse(&text).map_err(|err| {
        D::Error::custom(format!(
            "failed to parse version number '{}': {:?}",
            text, err
        ))
    })?;

    if !CONFIG_VERSION.matches(&version) {
        return Err(D::Error::custom(format!(
            "incompatible version: get '{}', but it is incompatible with requirement '{}'",
            version, &*CONFIG_VERSION,
        )));
    }

    Ok(version)
}
