//! # cramplan-gzip
//!
//! Gzip compressor probe for the CRAM compression header planner.
//!
//! CRAM's `EXTERNAL` block content is conventionally gzip-compressed
//! rather than run through the planner's own rANS coders, so this crate
//! wraps [`flate2`] instead of reimplementing DEFLATE — matching what
//! real CRAM writers (including `noodles-cram`) do.

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::io::Write;

use cramplan_core::{CompressorKind, Error, ExternalCompressor};
use flate2::write::GzEncoder;
use flate2::Compression;

/// Gzip compression level used when probing candidate buffers.
///
/// The planner only cares about the *winning* encoding choice, not about
/// tuning ratio against speed, so a single fixed level keeps probe runs
/// comparable across tags.
const PROBE_LEVEL: Compression = Compression::new(6);

/// A gzip compressor probe.
#[derive(Debug, Default, Clone, Copy)]
pub struct Gzip;

impl Gzip {
    /// Compress `buf` with gzip at the planner's fixed probe level.
    pub fn compress_bytes(buf: &[u8]) -> std::io::Result<Vec<u8>> {
        let mut encoder = GzEncoder::new(Vec::new(), PROBE_LEVEL);
        encoder.write_all(buf)?;
        encoder.finish()
    }
}

impl ExternalCompressor for Gzip {
    fn kind(&self) -> CompressorKind {
        CompressorKind::Gzip
    }

    fn compress(&self, buf: &[u8]) -> Result<Vec<u8>, Error> {
        Self::compress_bytes(buf).map_err(|source| Error::probe("gzip", buf.len(), source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_flate2() {
        let data = b"Hello, World! Hello, World! Hello, World!";
        let compressed = Gzip::compress_bytes(data).expect("compress failed");

        let mut decoder = flate2::read::GzDecoder::new(&compressed[..]);
        let mut decompressed = Vec::new();
        std::io::Read::read_to_end(&mut decoder, &mut decompressed).expect("decompress failed");

        assert_eq!(decompressed, data);
    }

    #[test]
    fn repeated_data_compresses_smaller() {
        let data = vec![b'A'; 4096];
        let compressed = Gzip::compress_bytes(&data).expect("compress failed");
        assert!(compressed.len() < data.len());
    }

    #[test]
    fn empty_buffer_compresses_without_error() {
        let compressed = Gzip::compress_bytes(&[]).expect("compress failed");
        assert!(!compressed.is_empty()); // gzip header/trailer even for empty input
    }
}
