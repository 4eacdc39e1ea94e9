use std::fmt;
use std::path::PathBuf;

/// Failure while reading a heightmap image from disk.
#[derive(Debug)]
pub enum LoadError {
    Io { path: PathBuf, source: std::io::Error },
    Decode { path: PathBuf, source: image::ImageError },
    UnsupportedChannels { path: PathBuf, color: image::ColorType },
    Empty { path: PathBuf },
}

/// Failure while baking a height field into terrain mesh data.
#[derive(Debug)]
pub enum BakeError {
    Load(LoadError),
    Allocation { what: &'static str, requested: usize },
    InvalidSettings(String),
    GridTooSmall {
        width: u32,
        height: u32,
        required: u32,
    },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io { path, source } => {
                write!(f, "failed to read heightmap {}: {source}", path.display())
            }
            LoadError::Decode { path, source } => {
                write!(f, "failed to decode heightmap {}: {source}", path.display())
            }
            LoadError::UnsupportedChannels { path, color } => write!(
                f,
                "heightmap {} must be single channel grayscale, found {color:?}",
                path.display()
            ),
            LoadError::Empty { path } => write!(f, "heightmap {} has no pixels", path.display()),
        }
    }
}

impl fmt::Display for BakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BakeError::Load(err) => err.fmt(f),
            BakeError::Allocation { what, requested } => {
                write!(f, "out of memory reserving {requested} elements for {what}")
            }
            BakeError::InvalidSettings(msg) => write!(f, "invalid bake settings: {msg}"),
            BakeError::GridTooSmall {
                width,
                height,
                required,
            } => write!(
                f,
                "heightmap grid {width}x{height} is too small, chunks need at least {required} samples per side"
            ),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io { source, .. } => Some(source),
            LoadError::Decode { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl std::error::Error for BakeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BakeError::Load(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LoadError> for BakeError {
    fn from(value: LoadError) -> Self {
        BakeError::Load(value)
    }
}
