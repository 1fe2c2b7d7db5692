//! Tag-id dictionary builder (component B): a deterministic, lexicographically
//! ordered dictionary of the distinct tag-key sequences observed across a
//! batch, with a per-record row handle.

use std::collections::BTreeMap;

use cramplan_core::{Record, TagId};

/// A dictionary key: a record's sorted tag ids, serialized as the
/// concatenation of their 3-byte wire forms.
///
/// Ordered by length first, then bytewise. A [`BTreeMap`] keyed by this
/// wrapper lets the tree itself enforce the ordering instead of a separate
/// sort pass over a hash map's entries.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DictionaryKey(Vec<u8>);

impl PartialOrd for DictionaryKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DictionaryKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

fn serialize_tag_ids(ids: &[TagId]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(ids.len() * 3);
    for &id in ids {
        bytes.extend_from_slice(&cramplan_core::tag::to_bytes(id));
    }
    bytes
}

/// One row of the dictionary: the tag ids that make up the row's key, in
/// the sorted order under which every sharing record's tags were stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryRow {
    /// This row's tag ids, sorted ascending.
    pub tag_ids: Vec<TagId>,
}

/// The tag-id dictionary built from one batch: an ordered list of distinct
/// tag-key sequences, row 0 always the empty sequence if any record has no
/// tags or otherwise present at whatever index the ordering assigns it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDictionary {
    rows: Vec<DictionaryRow>,
}

impl TagDictionary {
    /// Number of distinct rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if the dictionary has no rows (only possible for an empty batch
    /// with no prior seeding; [`build`] always seeds the empty row).
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The row at `index`, if any.
    pub fn row(&self, index: usize) -> Option<&DictionaryRow> {
        self.rows.get(index)
    }

    /// All rows, in dictionary order.
    pub fn rows(&self) -> &[DictionaryRow] {
        &self.rows
    }

    /// Materialize the dictionary as a 3-D byte array: one `Vec<u8>` of
    /// length `3*N` per row.
    pub fn to_byte_rows(&self) -> Vec<Vec<u8>> {
        self.rows
            .iter()
            .map(|row| serialize_tag_ids(&row.tag_ids))
            .collect()
    }
}

/// Build the tag-id dictionary for `records`, attaching each record's
/// `tag_ids_index` handle in place.
///
/// Seeds an ordered map with the empty key, sorts each record's tags by
/// ascending id, serializes the sorted ids into a byte-string key, and
/// bumps a per-key counter. The counter cell starts life as a handle count
/// and is resolved into a row index once the map's final iteration order
/// is known.
pub fn build(records: &mut [Record]) -> TagDictionary {
    let mut counters: BTreeMap<DictionaryKey, usize> = BTreeMap::new();
    counters.insert(DictionaryKey(Vec::new()), 0);

    for record in records.iter_mut() {
        record.tags.sort_by_key(|tag| tag.id);
        let ids: Vec<TagId> = record.tags.iter().map(|tag| tag.id).collect();
        let key = DictionaryKey(serialize_tag_ids(&ids));
        *counters.entry(key).or_insert(0) += 1;
    }

    // Phase 2: the map's final iteration order is the dictionary row order,
    // independent of the per-key counts
    // collected above, which exist only to guarantee every distinct key has
    // an entry before rows are assigned.
    let mut row_of_key: BTreeMap<DictionaryKey, usize> = BTreeMap::new();
    let mut rows = Vec::with_capacity(counters.len());
    for (row_index, key) in counters.keys().enumerate() {
        row_of_key.insert(key.clone(), row_index);
        let tag_ids = deserialize_tag_ids(&key.0);
        rows.push(DictionaryRow { tag_ids });
    }

    for record in records.iter_mut() {
        let ids: Vec<TagId> = record.tags.iter().map(|tag| tag.id).collect();
        let key = DictionaryKey(serialize_tag_ids(&ids));
        record.tag_ids_index = row_of_key[&key] as i32;
    }

    TagDictionary { rows }
}

fn deserialize_tag_ids(bytes: &[u8]) -> Vec<TagId> {
    bytes
        .chunks_exact(3)
        .map(|chunk| cramplan_core::tag::from_bytes([chunk[0], chunk[1], chunk[2]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cramplan_core::Tag;

    fn tag(key0: u8, key1: u8, type_char: u8) -> Tag {
        Tag::new(key0, key1, type_char, cramplan_core::TagValue::UInt8(0))
    }

    #[test]
    fn empty_batch_has_exactly_one_row() {
        let mut records: Vec<Record> = Vec::new();
        let dictionary = build(&mut records);
        assert_eq!(dictionary.len(), 1);
        assert!(dictionary.row(0).unwrap().tag_ids.is_empty());
    }

    #[test]
    fn records_with_no_tags_get_the_empty_row() {
        let mut records = vec![Record::new(), Record::new()];
        let dictionary = build(&mut records);
        assert_eq!(dictionary.len(), 1);
        assert_eq!(records[0].tag_ids_index, 0);
        assert_eq!(records[1].tag_ids_index, 0);
    }

    #[test]
    fn records_sharing_a_tag_set_after_sorting_share_a_row() {
        let mut a = Record::new();
        a.tags = vec![tag(b'N', b'M', b'i'), tag(b'M', b'D', b'Z')];

        let mut b = Record::new();
        b.tags = vec![tag(b'M', b'D', b'Z'), tag(b'N', b'M', b'i')];

        let mut records = vec![a, b];
        let dictionary = build(&mut records);

        assert_eq!(records[0].tag_ids_index, records[1].tag_ids_index);
        assert_eq!(dictionary.len(), 2); // empty row + the shared row
    }

    #[test]
    fn row_order_is_length_then_bytewise() {
        let mut short = Record::new();
        short.tags = vec![tag(b'A', b'A', b'c')];

        let mut long = Record::new();
        long.tags = vec![tag(b'A', b'A', b'c'), tag(b'Z', b'Z', b'c')];

        let mut records = vec![long, short];
        let dictionary = build(&mut records);

        // row 0 is the empty sequence, row 1 the 1-tag sequence, row 2 the 2-tag one.
        assert_eq!(dictionary.row(1).unwrap().tag_ids.len(), 1);
        assert_eq!(dictionary.row(2).unwrap().tag_ids.len(), 2);
    }

    #[test]
    fn permuting_record_order_does_not_change_row_order() {
        let mut a = Record::new();
        a.tags = vec![tag(b'N', b'M', b'i')];
        let mut b = Record::new();
        b.tags = vec![tag(b'M', b'D', b'Z')];

        let mut forward = vec![a.clone(), b.clone()];
        let mut backward = vec![b, a];

        let forward_dict = build(&mut forward);
        let backward_dict = build(&mut backward);

        assert_eq!(forward_dict, backward_dict);
    }
}
