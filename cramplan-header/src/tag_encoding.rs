//! Per-tag encoding chooser (component D): for each distinct tag id
//! observed in a batch, decide an encoding family plus the compressor that
//! wins the probe over that tag's concatenated raw value bytes.

use std::collections::HashMap;

use cramplan_core::{best_external, find_unused_byte, CompressorKind, Error, ExternalCompressor, Record, TagId};
use cramplan_gzip::Gzip;
use cramplan_rans::{Rans0, Rans1};

/// An encoding family for a tag's values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodingFamily {
    /// A fixed-length scalar or fixed-length `Z`/`B` value: one canonical
    /// Huffman symbol (`length`) encoding the shared byte length, with
    /// values stored in an external byte array keyed by `tag_id`.
    FixedLength {
        /// Tag id the value bytes live under.
        tag_id: TagId,
        /// The shared byte length of every occurrence.
        length: usize,
    },
    /// Variable-length values delimited by a stop byte in an external block
    /// keyed by `tag_id`.
    ByteArrayStop {
        /// Tag id the value bytes live under.
        tag_id: TagId,
        /// The delimiter byte separating consecutive values.
        delimiter: u8,
    },
    /// Variable-length values stored as a length stream plus a values
    /// stream, both keyed by `tag_id` (the fallback for `B` tags whose
    /// value bytes use every possible delimiter byte).
    ByteArrayLen {
        /// Tag id the length and value streams live under.
        tag_id: TagId,
    },
}

/// The encoding chosen for one tag id: its family plus the compressor that
/// won the probe over its concatenated raw value bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagEncoding {
    /// The chosen encoding family.
    pub family: EncodingFamily,
    /// The compressor the probe selected for this tag's value bytes.
    pub compressor: CompressorKind,
}

/// Process-local memo of already-chosen tag encodings, threaded explicitly
/// by the caller across `build` invocations rather than kept as hidden
/// module state.
///
/// Also owns the scratch buffer `choose_one` concatenates a tag id's raw
/// value bytes into, so probing a batch of tag ids does not allocate a new
/// `Vec` per tag: the buffer is cleared and refilled for each tag id in
/// turn and never escapes the cache.
#[derive(Debug, Default)]
pub struct EncodingCache {
    entries: HashMap<TagId, TagEncoding>,
    scratch: Vec<u8>,
}

impl EncodingCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }
}

fn default_probe_candidates() -> (Rans0, Rans1, Gzip) {
    (Rans0, Rans1, Gzip)
}

/// Probe `data` with the default three compressors and return the winner.
fn probe(data: &[u8]) -> Result<CompressorKind, Error> {
    let (rans0, rans1, gzip) = default_probe_candidates();
    let candidates: [&dyn ExternalCompressor; 3] = [&rans0, &rans1, &gzip];
    best_external(data, &candidates)
}

/// Choose the encoding for every distinct tag id observed in `records`,
/// consulting and updating `cache` so repeated tag ids across batches skip
/// the probe.
///
/// Dispatch is keyed by the low byte of the tag id (its type character);
/// any type outside the closed set is a fatal error naming the offending
/// character.
pub fn choose_all(
    records: &[Record],
    cache: &mut EncodingCache,
) -> Result<HashMap<TagId, TagEncoding>, Error> {
    let mut values_by_tag: HashMap<TagId, Vec<&cramplan_core::TagValue>> = HashMap::new();
    for record in records {
        for tag in &record.tags {
            values_by_tag.entry(tag.id).or_default().push(&tag.value);
        }
    }

    let mut chosen = HashMap::with_capacity(values_by_tag.len());
    for (tag_id, values) in values_by_tag {
        if let Some(encoding) = cache.entries.get(&tag_id) {
            chosen.insert(tag_id, encoding.clone());
            continue;
        }

        let encoding = choose_one(tag_id, &values, &mut cache.scratch)?;
        cache.entries.insert(tag_id, encoding.clone());
        chosen.insert(tag_id, encoding);
    }

    Ok(chosen)
}

fn choose_one(
    tag_id: TagId,
    values: &[&cramplan_core::TagValue],
    scratch: &mut Vec<u8>,
) -> Result<TagEncoding, Error> {
    let type_char = cramplan_core::tag::type_char(tag_id);

    scratch.clear();
    for value in values {
        value.write_raw_bytes(scratch)?;
    }

    match type_char {
        b'A' | b'c' | b'C' => fixed_length(tag_id, scratch.as_slice(), 1),
        b's' | b'S' => fixed_length(tag_id, scratch.as_slice(), 2),
        b'i' | b'I' | b'f' => fixed_length(tag_id, scratch.as_slice(), 4),
        b'Z' => choose_variable(tag_id, values, scratch.as_slice(), true),
        b'B' => choose_variable(tag_id, values, scratch.as_slice(), false),
        _ => Err(Error::unknown_tag_type(type_char, tag_id)),
    }
}

fn fixed_length(tag_id: TagId, scratch: &[u8], length: usize) -> Result<TagEncoding, Error> {
    Ok(TagEncoding {
        family: EncodingFamily::FixedLength { tag_id, length },
        compressor: probe(scratch)?,
    })
}

fn choose_variable(
    tag_id: TagId,
    values: &[&cramplan_core::TagValue],
    scratch: &[u8],
    is_string: bool,
) -> Result<TagEncoding, Error> {
    let sizes: Vec<usize> = values.iter().map(|v| v.byte_size()).collect();
    let min = *sizes.iter().min().unwrap_or(&0);
    let max = *sizes.iter().max().unwrap_or(&0);

    let compressor = probe(scratch)?;

    if min == max {
        return Ok(TagEncoding {
            family: EncodingFamily::FixedLength {
                tag_id,
                length: min,
            },
            compressor,
        });
    }

    if is_string {
        return Ok(TagEncoding {
            family: EncodingFamily::ByteArrayStop {
                tag_id,
                delimiter: b'\t',
            },
            compressor,
        });
    }

    if min > 100 {
        if let Some(delimiter) = find_unused_byte(scratch) {
            return Ok(TagEncoding {
                family: EncodingFamily::ByteArrayStop { tag_id, delimiter },
                compressor,
            });
        }
    }

    Ok(TagEncoding {
        family: EncodingFamily::ByteArrayLen { tag_id },
        compressor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cramplan_core::{Tag, TagValue};

    fn batch_with(tags: Vec<Tag>) -> Vec<Record> {
        let mut record = Record::new();
        record.tags = tags;
        vec![record]
    }

    #[test]
    fn scalar_int_tag_is_fixed_length_four() {
        let records = batch_with(vec![Tag::new(b'N', b'M', b'i', TagValue::Int32(3))]);
        let mut cache = EncodingCache::new();
        let chosen = choose_all(&records, &mut cache).unwrap();
        let id = cramplan_core::tag::pack(b'N', b'M', b'i');
        match &chosen[&id].family {
            EncodingFamily::FixedLength { length, .. } => assert_eq!(*length, 4),
            other => panic!("expected FixedLength, got {other:?}"),
        }
    }

    #[test]
    fn string_tag_with_uniform_length_is_fixed_length() {
        let id = cramplan_core::tag::pack(b'M', b'D', b'Z');
        let mut record_a = Record::new();
        record_a.tags = vec![Tag::new(b'M', b'D', b'Z', TagValue::Str("ABCDE".into()))];
        let mut record_b = Record::new();
        record_b.tags = vec![Tag::new(b'M', b'D', b'Z', TagValue::Str("FGHIJ".into()))];

        let records = vec![record_a, record_b];
        let mut cache = EncodingCache::new();
        let chosen = choose_all(&records, &mut cache).unwrap();
        match &chosen[&id].family {
            EncodingFamily::FixedLength { length, .. } => assert_eq!(*length, 6), // 5 + terminator
            other => panic!("expected FixedLength, got {other:?}"),
        }
    }

    #[test]
    fn string_tag_with_varying_length_uses_tab_stop() {
        let id = cramplan_core::tag::pack(b'M', b'D', b'Z');
        let mut record_a = Record::new();
        record_a.tags = vec![Tag::new(b'M', b'D', b'Z', TagValue::Str("A".into()))];
        let mut record_b = Record::new();
        record_b.tags = vec![Tag::new(b'M', b'D', b'Z', TagValue::Str("LONGER".into()))];

        let records = vec![record_a, record_b];
        let mut cache = EncodingCache::new();
        let chosen = choose_all(&records, &mut cache).unwrap();
        match &chosen[&id].family {
            EncodingFamily::ByteArrayStop { delimiter, .. } => assert_eq!(*delimiter, b'\t'),
            other => panic!("expected ByteArrayStop, got {other:?}"),
        }
    }

    #[test]
    fn large_variable_b_tag_uses_an_unused_byte_as_delimiter() {
        let id = cramplan_core::tag::pack(b'X', b'A', b'B');
        let small = TagValue::Array {
            subtype: b'C',
            element_width: 1,
            count: 150,
            elements: vec![1u8; 150],
        };
        let large = TagValue::Array {
            subtype: b'C',
            element_width: 1,
            count: 195,
            elements: vec![1u8; 195],
        };

        let mut record_a = Record::new();
        record_a.tags = vec![Tag::new(b'X', b'A', b'B', small)];
        let mut record_b = Record::new();
        record_b.tags = vec![Tag::new(b'X', b'A', b'B', large)];

        let records = vec![record_a, record_b];
        let mut cache = EncodingCache::new();
        let chosen = choose_all(&records, &mut cache).unwrap();
        match &chosen[&id].family {
            // Bytes 0, 1, 67 ('C'), 150, and 195 are all present in the
            // concatenated headers/elements, so the smallest unused byte is 2.
            EncodingFamily::ByteArrayStop { delimiter, .. } => assert_eq!(*delimiter, 2),
            other => panic!("expected ByteArrayStop, got {other:?}"),
        }
    }

    #[test]
    fn unknown_tag_type_is_rejected() {
        let records = batch_with(vec![Tag::new(b'X', b'X', b'?', TagValue::UInt8(0))]);
        let mut cache = EncodingCache::new();
        assert!(choose_all(&records, &mut cache).is_err());
    }

    #[test]
    fn repeated_tag_ids_are_served_from_cache() {
        let records = batch_with(vec![Tag::new(b'N', b'M', b'i', TagValue::Int32(3))]);
        let mut cache = EncodingCache::new();
        let first = choose_all(&records, &mut cache).unwrap();
        let second = choose_all(&records, &mut cache).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn shared_scratch_buffer_does_not_leak_bytes_across_tag_ids() {
        // Two tags probed in the same call share `cache.scratch`; a stale
        // byte left over from the first tag's (longer) value must not
        // survive into the second tag's (shorter) encoding choice.
        let short_id = cramplan_core::tag::pack(b'A', b'A', b'c');
        let long_id = cramplan_core::tag::pack(b'Z', b'Z', b'Z');

        let mut record = Record::new();
        record.tags = vec![
            Tag::new(b'Z', b'Z', b'Z', TagValue::Str("a much longer value".into())),
            Tag::new(b'A', b'A', b'c', TagValue::Int8(5)),
        ];

        let mut cache = EncodingCache::new();
        let chosen = choose_all(&[record], &mut cache).unwrap();

        match &chosen[&short_id].family {
            EncodingFamily::FixedLength { length, .. } => assert_eq!(*length, 1),
            other => panic!("expected FixedLength, got {other:?}"),
        }
        assert!(chosen.contains_key(&long_id));
    }
}
