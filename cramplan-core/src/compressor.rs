//! The compressor probe (component A): compress a buffer with every
//! candidate external compressor and keep the smallest result.

use crate::error::Error;

/// Identifies which external compressor a block is compressed with.
///
/// This is the value the planner stores in a [`crate::record`]-adjacent
/// compression header's external-block-id map; the actual compression work
/// is done by an [`ExternalCompressor`] implementor living in a sibling
/// crate (`cramplan-rans`, `cramplan-gzip`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressorKind {
    /// rANS order-0 (symbols modeled independently).
    Rans0,
    /// rANS order-1 (symbols conditioned on the previous symbol).
    Rans1,
    /// gzip (DEFLATE + gzip framing).
    Gzip,
}

impl CompressorKind {
    /// Tie-break priority when two candidates compress to the same size:
    /// lower values win, favoring the lowest-complexity decoder
    /// (rANS-0, then rANS-1, then gzip).
    fn tie_break_rank(self) -> u8 {
        match self {
            CompressorKind::Rans0 => 0,
            CompressorKind::Rans1 => 1,
            CompressorKind::Gzip => 2,
        }
    }

    /// Name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            CompressorKind::Rans0 => "rANS-0",
            CompressorKind::Rans1 => "rANS-1",
            CompressorKind::Gzip => "gzip",
        }
    }
}

/// A general-purpose byte compressor the probe can measure.
pub trait ExternalCompressor {
    /// This compressor's identity, for tie-breaking and header bookkeeping.
    fn kind(&self) -> CompressorKind;

    /// Compress `buf`, returning the compressed bytes.
    fn compress(&self, buf: &[u8]) -> Result<Vec<u8>, Error>;
}

/// Compress `buf` with every candidate and return the smallest result's
/// [`CompressorKind`], breaking ties per [`CompressorKind::tie_break_rank`].
///
/// Failing to compress with any one candidate is fatal.
pub fn best_external(
    buf: &[u8],
    candidates: &[&dyn ExternalCompressor],
) -> Result<CompressorKind, Error> {
    let mut best: Option<(usize, CompressorKind)> = None;

    for candidate in candidates {
        let compressed = candidate.compress(buf)?;
        let kind = candidate.kind();
        let candidate_result = (compressed.len(), kind);

        best = Some(match best {
            None => candidate_result,
            Some(current) => {
                if candidate_result.0 < current.0
                    || (candidate_result.0 == current.0
                        && kind.tie_break_rank() < current.1.tie_break_rank())
                {
                    candidate_result
                } else {
                    current
                }
            }
        });
    }

    best.map(|(_, kind)| kind)
        .ok_or_else(|| Error::probe("none", buf.len(), std::io::Error::other("no candidates")))
}

/// Return the smallest byte value that does not occur in `buf`, or `None`
/// if all 256 byte values are present.
pub fn find_unused_byte(buf: &[u8]) -> Option<u8> {
    let mut seen = [false; 256];
    for &b in buf {
        seen[b as usize] = true;
    }
    seen.iter().position(|&used| !used).map(|b| b as u8)
}
