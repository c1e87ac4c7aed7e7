//! Error types for world conversion.
//!
//! Only failures that make the whole run meaningless end up here. Anything
//! scoped to one chunk or one record is recorded in [`crate::stats::Statistics`]
//! and the run carries on.

use std::panic::Location;
use thiserror::Error;

/// Fatal conversion error. Every variant carries the source location where it
/// was raised so a failed run can be traced without a backtrace.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("{message} (at {location})")]
    Fatal {
        message: String,
        location: &'static Location<'static>,
    },

    #[error("I/O error: {source} (at {location})")]
    Io {
        source: std::io::Error,
        location: &'static Location<'static>,
    },

    #[error("storage engine error: {message} (at {location})")]
    Storage {
        message: String,
        location: &'static Location<'static>,
    },

    #[error("unreadable world metadata: {message} (at {location})")]
    Metadata {
        message: String,
        location: &'static Location<'static>,
    },

    #[error("failed to package world archive: {source} (at {location})")]
    Archive {
        source: zip::result::ZipError,
        location: &'static Location<'static>,
    },
}

impl ConvertError {
    #[track_caller]
    pub fn fatal(message: impl Into<String>) -> Self {
        ConvertError::Fatal {
            message: message.into(),
            location: Location::caller(),
        }
    }

    #[track_caller]
    pub fn storage(message: impl Into<String>) -> Self {
        ConvertError::Storage {
            message: message.into(),
            location: Location::caller(),
        }
    }

    #[track_caller]
    pub fn metadata(message: impl Into<String>) -> Self {
        ConvertError::Metadata {
            message: message.into(),
            location: Location::caller(),
        }
    }

    /// Where in the source this error was raised.
    pub fn location(&self) -> &'static Location<'static> {
        match self {
            ConvertError::Fatal { location, .. }
            | ConvertError::Io { location, .. }
            | ConvertError::Storage { location, .. }
            | ConvertError::Metadata { location, .. }
            | ConvertError::Archive { location, .. } => location,
        }
    }
}

impl From<std::io::Error> for ConvertError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        ConvertError::Io {
            source,
            location: Location::caller(),
        }
    }
}

impl From<zip::result::ZipError> for ConvertError {
    #[track_caller]
    fn from(source: zip::result::ZipError) -> Self {
        ConvertError::Archive {
            source,
            location: Location::caller(),
        }
    }
}

impl From<serde_json::Error> for ConvertError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        ConvertError::metadata(err.to_string())
    }
}

impl From<fastnbt::error::Error> for ConvertError {
    #[track_caller]
    fn from(err: fastnbt::error::Error) -> Self {
        ConvertError::metadata(err.to_string())
    }
}

/// Per-chunk failure. Never fatal on its own.
#[derive(Debug, Error)]
pub enum ChunkFailure {
    #[error("NBT error: {0}")]
    Nbt(String),

    #[error("malformed chunk data: {0}")]
    Malformed(String),

    #[error("unsupported chunk version {0}")]
    UnsupportedVersion(i32),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<fastnbt::error::Error> for ChunkFailure {
    fn from(err: fastnbt::error::Error) -> Self {
        ChunkFailure::Nbt(err.to_string())
    }
}

impl From<crate::bedrock_nbt::NbtError> for ChunkFailure {
    fn from(err: crate::bedrock_nbt::NbtError) -> Self {
        ChunkFailure::Nbt(err.to_string())
    }
}

impl From<std::io::Error> for ChunkFailure {
    fn from(err: std::io::Error) -> Self {
        ChunkFailure::Malformed(err.to_string())
    }
}

impl From<ConvertError> for ChunkFailure {
    fn from(err: ConvertError) -> Self {
        ChunkFailure::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_error_points_at_caller() {
        let err = ConvertError::fatal("cannot create output");
        assert_eq!(err.location().file(), file!());
        assert!(err.to_string().contains("cannot create output"));
    }

    #[test]
    fn io_errors_convert_with_location() {
        fn open_missing() -> Result<(), ConvertError> {
            std::fs::File::open("/definitely/not/here/level.dat")?;
            Ok(())
        }
        let err = open_missing().unwrap_err();
        assert!(matches!(err, ConvertError::Io { .. }));
    }
}
