//! Error types shared by every crate in the planner workspace.

use std::io;
use thiserror::Error;

/// The error type produced by the planner's core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A read-feature's reference or read base was outside `{A, C, G, T, N}`.
    #[error("invalid base {byte:#04x} ({byte_char:?}) in substitution feature")]
    InvalidBase {
        /// The offending raw byte.
        byte: u8,
        /// The byte rendered as a character, when printable.
        byte_char: char,
    },

    /// A tag carried a type character outside the closed set the planner
    /// understands.
    #[error("unknown tag type {type_char:?} (tag id {tag_id:#08x})")]
    UnknownTagType {
        /// The offending type character.
        type_char: char,
        /// The packed tag id the character came from.
        tag_id: i32,
    },

    /// One of the probed external compressors failed to compress a buffer.
    #[error("external compressor {compressor} failed to compress {len} bytes: {source}")]
    Probe {
        /// Name of the failing compressor.
        compressor: &'static str,
        /// Size of the buffer that failed to compress.
        len: usize,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// I/O failure while concatenating tag values through the internal
    /// scratch buffer.
    #[error("I/O failure while assembling tag values: {0}")]
    Io(#[from] io::Error),

    /// The fixed data-series table listed the same series more than once,
    /// so the series-to-compressor map built from it is not total.
    #[error("fixed data series {name} appears more than once while assembling the compression header")]
    DuplicateDataSeries {
        /// Name of the duplicated series.
        name: String,
    },
}

/// Result alias for planner operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build an [`Error::InvalidBase`] from a raw byte.
    pub fn invalid_base(byte: u8) -> Self {
        Self::InvalidBase {
            byte,
            byte_char: byte as char,
        }
    }

    /// Build an [`Error::UnknownTagType`].
    pub fn unknown_tag_type(type_char: u8, tag_id: i32) -> Self {
        Self::UnknownTagType {
            type_char: type_char as char,
            tag_id,
        }
    }

    /// Build an [`Error::Probe`] failure.
    pub fn probe(compressor: &'static str, len: usize, source: io::Error) -> Self {
        Self::Probe {
            compressor,
            len,
            source,
        }
    }

    /// Build an [`Error::DuplicateDataSeries`].
    pub fn duplicate_data_series(name: impl Into<String>) -> Self {
        Self::DuplicateDataSeries { name: name.into() }
    }
}
