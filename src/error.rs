use std::fmt;

use terrain_lod::{BakeError, LoadError};

use crate::render::GpuError;

/// A convenient result type wrapping [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub struct ConfigError {
    pub path: String,
    pub reason: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bad bench config {}: {}", self.path, self.reason)
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug)]
pub enum Error {
    Config(ConfigError),
    Load(LoadError),
    Bake(BakeError),
    Gpu(GpuError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(err) => err.fmt(f),
            Error::Load(err) => write!(f, "heightmap load failed: {err}"),
            Error::Bake(err) => write!(f, "terrain bake failed: {err}"),
            Error::Gpu(err) => write!(f, "gpu resource error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(err) => Some(err),
            Error::Load(err) => Some(err),
            Error::Bake(err) => Some(err),
            Error::Gpu(err) => Some(err),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(value: ConfigError) -> Self {
        Error::Config(value)
    }
}

impl From<LoadError> for Error {
    fn from(value: LoadError) -> Self {
        Error::Load(value)
    }
}

impl From<BakeError> for Error {
    fn from(value: BakeError) -> Self {
        match value {
            BakeError::Load(err) => Error::Load(err),
            other => Error::Bake(other),
        }
    }
}

impl From<GpuError> for Error {
    fn from(value: GpuError) -> Self {
        Error::Gpu(value)
    }
}
