//! rANS order-1: byte frequencies modeled conditioned on the previous byte.
//!
//! Each distinct context (previous byte) gets its own sparse frequency
//! table covering only the bytes actually observed to follow it, so the
//! serialized model cost scales with how varied the data's context
//! transitions are rather than with a fixed 256x256 table.

use std::collections::BTreeMap;

use cramplan_core::{CompressorKind, Error, ExternalCompressor};

use crate::rans_core::{cumulative, decode_with, encode_with, locate, normalize};

const SCALE_BITS: u32 = 12;
const TOTAL: u32 = 1 << SCALE_BITS;

/// Pseudo-context used for the first byte of a buffer, which has no
/// preceding byte.
const INITIAL_CONTEXT: u8 = 0;

struct ContextModel {
    symbols: Vec<u8>,
    freqs: Vec<u32>,
    cum: Vec<u32>,
}

impl ContextModel {
    fn rank_of(&self, symbol: u8) -> usize {
        self.symbols
            .iter()
            .position(|&s| s == symbol)
            .expect("symbol must have been observed under this context during modeling")
    }
}

fn build_models(buf: &[u8]) -> BTreeMap<u8, ContextModel> {
    let mut counts: BTreeMap<u8, [u64; 256]> = BTreeMap::new();

    for (i, &symbol) in buf.iter().enumerate() {
        let context = if i == 0 { INITIAL_CONTEXT } else { buf[i - 1] };
        let entry = counts.entry(context).or_insert([0u64; 256]);
        entry[symbol as usize] += 1;
    }

    counts
        .into_iter()
        .map(|(context, context_counts)| {
            let symbols: Vec<u8> = (0..=255u16)
                .filter(|&s| context_counts[s as usize] > 0)
                .map(|s| s as u8)
                .collect();
            let observed: Vec<u64> = symbols.iter().map(|&s| context_counts[s as usize]).collect();
            let freqs = normalize(&observed, TOTAL);
            let cum = cumulative(&freqs);
            (
                context,
                ContextModel {
                    symbols,
                    freqs,
                    cum,
                },
            )
        })
        .collect()
}

fn serialize_models(models: &BTreeMap<u8, ContextModel>) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(models.len() as u16).to_le_bytes());

    for (&context, model) in models {
        out.push(context);
        out.extend_from_slice(&(model.symbols.len() as u16).to_le_bytes());
        for (&symbol, &freq) in model.symbols.iter().zip(model.freqs.iter()) {
            out.push(symbol);
            out.extend_from_slice(&(freq as u16).to_le_bytes());
        }
    }

    out
}

fn deserialize_models(data: &[u8]) -> (BTreeMap<u8, ContextModel>, usize) {
    let mut pos = 0usize;
    let num_contexts = u16::from_le_bytes([data[pos], data[pos + 1]]);
    pos += 2;

    let mut models = BTreeMap::new();
    for _ in 0..num_contexts {
        let context = data[pos];
        pos += 1;
        let num_symbols = u16::from_le_bytes([data[pos], data[pos + 1]]) as usize;
        pos += 2;

        let mut symbols = Vec::with_capacity(num_symbols);
        let mut freqs = Vec::with_capacity(num_symbols);
        for _ in 0..num_symbols {
            symbols.push(data[pos]);
            freqs.push(u32::from(u16::from_le_bytes([data[pos + 1], data[pos + 2]])));
            pos += 3;
        }
        let cum = cumulative(&freqs);
        models.insert(
            context,
            ContextModel {
                symbols,
                freqs,
                cum,
            },
        );
    }

    (models, pos)
}

/// An order-1 rANS compressor: a per-previous-byte frequency table.
#[derive(Debug, Default, Clone, Copy)]
pub struct Rans1;

impl Rans1 {
    /// Compress `buf` into `[serialized per-context models][rANS payload]`.
    pub fn compress_bytes(buf: &[u8]) -> Vec<u8> {
        if buf.is_empty() {
            return Vec::new();
        }

        let models = build_models(buf);
        let payload = encode_with(buf.len(), SCALE_BITS, |pos| {
            let context = if pos == 0 {
                INITIAL_CONTEXT
            } else {
                buf[pos - 1]
            };
            let model = &models[&context];
            let rank = model.rank_of(buf[pos]);
            (model.cum[rank], model.freqs[rank])
        });

        let mut out = serialize_models(&models);
        out.extend_from_slice(&payload);
        out
    }

    /// Decompress `count` bytes from a buffer produced by
    /// [`Self::compress_bytes`].
    pub fn decompress_bytes(data: &[u8], count: usize) -> Vec<u8> {
        if count == 0 {
            return Vec::new();
        }

        let (models, header_len) = deserialize_models(data);
        let payload = &data[header_len..];

        let mut prev = INITIAL_CONTEXT;
        decode_with(payload, count, SCALE_BITS, |slot| {
            let model = &models[&prev];
            let idx = locate(&model.cum, &model.freqs, slot);
            let symbol = model.symbols[idx];
            let params = (symbol, model.cum[idx], model.freqs[idx]);
            prev = symbol;
            params
        })
    }
}

impl ExternalCompressor for Rans1 {
    fn kind(&self) -> CompressorKind {
        CompressorKind::Rans1
    }

    fn compress(&self, buf: &[u8]) -> Result<Vec<u8>, Error> {
        Ok(Self::compress_bytes(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_alternating_data() {
        let buf: Vec<u8> = b"ACACACACACACACACACACGTGTGTGTGT".to_vec();
        let compressed = Rans1::compress_bytes(&buf);
        let decompressed = Rans1::decompress_bytes(&compressed, buf.len());
        assert_eq!(decompressed, buf);
    }

    #[test]
    fn round_trips_a_single_repeated_byte() {
        let buf = vec![b'N'; 64];
        let compressed = Rans1::compress_bytes(&buf);
        let decompressed = Rans1::decompress_bytes(&compressed, buf.len());
        assert_eq!(decompressed, buf);
    }

    #[test]
    fn empty_buffer_compresses_to_empty() {
        assert!(Rans1::compress_bytes(&[]).is_empty());
    }
}
