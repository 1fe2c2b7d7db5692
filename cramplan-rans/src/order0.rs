//! rANS order-0: byte frequencies modeled independently of context.

use cramplan_core::{CompressorKind, Error, ExternalCompressor};

use crate::rans_core::{cumulative, decode_with, encode_with, locate, normalize};

const SCALE_BITS: u32 = 12;
const TOTAL: u32 = 1 << SCALE_BITS;
const TABLE_BYTES: usize = 256 * 2;

/// An order-0 rANS compressor: one frequency table over all 256 byte
/// values, shared across the whole buffer.
#[derive(Debug, Default, Clone, Copy)]
pub struct Rans0;

impl Rans0 {
    fn model(buf: &[u8]) -> (Vec<u32>, Vec<u32>) {
        let mut counts = [0u64; 256];
        for &b in buf {
            counts[b as usize] += 1;
        }
        let freqs = normalize(&counts, TOTAL);
        let cum = cumulative(&freqs);
        (freqs, cum)
    }

    /// Compress `buf` into `[256 normalized u16 frequencies][rANS payload]`.
    pub fn compress_bytes(buf: &[u8]) -> Vec<u8> {
        if buf.is_empty() {
            return Vec::new();
        }

        let (freqs, cum) = Self::model(buf);
        let payload = encode_with(buf.len(), SCALE_BITS, |pos| {
            let s = buf[pos] as usize;
            (cum[s], freqs[s])
        });

        let mut out = Vec::with_capacity(TABLE_BYTES + payload.len());
        for &f in &freqs {
            out.extend_from_slice(&(f as u16).to_le_bytes());
        }
        out.extend_from_slice(&payload);
        out
    }

    /// Decompress `count` bytes from a buffer produced by
    /// [`Self::compress_bytes`].
    pub fn decompress_bytes(data: &[u8], count: usize) -> Vec<u8> {
        if count == 0 {
            return Vec::new();
        }

        let mut freqs = [0u32; 256];
        for (i, freq) in freqs.iter_mut().enumerate() {
            *freq = u32::from(u16::from_le_bytes([data[i * 2], data[i * 2 + 1]]));
        }
        let cum = cumulative(&freqs);
        let payload = &data[TABLE_BYTES..];

        decode_with(payload, count, SCALE_BITS, |slot| {
            let idx = locate(&cum, &freqs, slot);
            (idx as u8, cum[idx], freqs[idx])
        })
    }
}

impl ExternalCompressor for Rans0 {
    fn kind(&self) -> CompressorKind {
        CompressorKind::Rans0
    }

    fn compress(&self, buf: &[u8]) -> Result<Vec<u8>, Error> {
        Ok(Self::compress_bytes(buf))
    }
}
