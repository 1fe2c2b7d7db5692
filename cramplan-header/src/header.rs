//! Compression-header assembler (component E): composes the fixed
//! data-series map, the per-tag encoding map, the tag-id dictionary, and
//! the substitution matrix into one [`CompressionHeader`].

use std::collections::HashMap;

use cramplan_core::{CompressorKind, Error, Record, TagId};

use crate::data_series::DataSeries;
use crate::dictionary::{self, TagDictionary};
use crate::substitution::{self, SubstitutionMatrix};
use crate::tag_encoding::{self, EncodingCache, TagEncoding};

/// The assembled compression header for one batch, plus bookkeeping the
/// caller needs to actually write slices against it.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionHeader {
    /// Whether alignment positions in this batch are delta-encoded,
    /// mirrored directly from `coordinate_sorted`.
    pub positions_are_deltas: bool,
    /// Fixed data-series to compressor map, total over [`DataSeries::ALL`].
    pub data_series: HashMap<DataSeries, CompressorKind>,
    /// Per-tag-id encoding choices for every distinct tag id in the batch.
    pub tags: HashMap<TagId, TagEncoding>,
    /// External-block-id to compressor map: the union of the fixed
    /// data-series compressors and every chosen tag compressor, keyed by
    /// block id (data series) or tag id (tags).
    pub external_blocks: HashMap<i64, CompressorKind>,
    /// The tag-id dictionary built from this batch.
    pub dictionary: TagDictionary,
    /// The substitution matrix built and back-annotated against this batch.
    pub substitution_matrix: SubstitutionMatrix,
}

/// Output of [`Planner::build`]: the assembled header. Records passed to
/// `build` are mutated in place (sorted tags, dictionary handles,
/// back-annotated substitution codes) rather than returned again.
pub type PlannerOutput = CompressionHeader;

/// Builds compression headers, holding the only cross-call mutable state
/// the planner has: the per-tag-id encoding cache, threaded explicitly
/// rather than kept as hidden module state.
#[derive(Debug, Default)]
pub struct Planner {
    cache: EncodingCache,
}

impl Planner {
    /// A planner with an empty encoding cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a compression header for `records`.
    ///
    /// Installs the fixed data-series map, builds the tag-id dictionary
    /// (mutating each record's `tag_ids_index`), chooses per-tag encodings
    /// (consulting and updating the cache), and builds and back-annotates
    /// the substitution matrix (mutating each substitution read feature's
    /// `code`).
    ///
    /// Returns [`Error::DuplicateDataSeries`] if the fixed series list names
    /// the same series twice, which would otherwise silently collapse two
    /// entries into one and leave the installed map short of total.
    pub fn build(
        &mut self,
        records: &mut [Record],
        coordinate_sorted: bool,
    ) -> Result<CompressionHeader, Error> {
        let mut data_series = HashMap::with_capacity(DataSeries::ALL.len());
        let mut external_blocks = HashMap::new();
        for series in DataSeries::ALL {
            let compressor = series.compressor();
            if data_series.insert(series, compressor).is_some() {
                return Err(Error::duplicate_data_series(format!("{series:?}")));
            }
            external_blocks.insert(i64::from(series.block_id()), compressor);
        }

        let dictionary = dictionary::build(records);

        let tags = tag_encoding::choose_all(records, &mut self.cache)?;
        for (&tag_id, encoding) in &tags {
            external_blocks.insert(i64::from(tag_id), encoding.compressor);
        }

        let matrix = substitution::build(records)?;
        substitution::annotate(records, &matrix)?;

        Ok(CompressionHeader {
            positions_are_deltas: coordinate_sorted,
            data_series,
            tags,
            external_blocks,
            dictionary,
            substitution_matrix: matrix,
        })
    }
}
