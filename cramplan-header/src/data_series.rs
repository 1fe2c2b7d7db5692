//! The fixed data-series to encoding mapping: every logical CRAM column
//! that is not an auxiliary tag gets a predetermined compressor,
//! independent of what a batch actually contains.

use cramplan_core::CompressorKind;

/// One fixed logical column of a CRAM slice.
///
/// Series labeled "BB" and "QQ" in the CRAM specification are intentionally
/// absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataSeries {
    AlignmentPositionOffset,
    Base,
    BitFlags,
    BaseSubstitutionCode,
    CompressionBitFlags,
    DeletionLength,
    FeatureCode,
    ReadFeatureCount,
    FeaturePosition,
    HardClip,
    MateBitFlags,
    MappingQuality,
    RecordsToNextFragment,
    NextFragmentAlignmentStart,
    Padding,
    RefSkip,
    TagCount,
    TagIdList,
    TagNameAndType,
    Insertion,
    ReadName,
    SoftClip,
    NextFragmentReferenceSeqId,
    QualityScore,
    ReadGroup,
    ReadLength,
    InsertSize,
    RefId,
}

impl DataSeries {
    /// All fixed series, in the order the CRAM compression header lists them.
    pub const ALL: [DataSeries; 28] = [
        DataSeries::AlignmentPositionOffset,
        DataSeries::Base,
        DataSeries::BitFlags,
        DataSeries::BaseSubstitutionCode,
        DataSeries::CompressionBitFlags,
        DataSeries::DeletionLength,
        DataSeries::FeatureCode,
        DataSeries::ReadFeatureCount,
        DataSeries::FeaturePosition,
        DataSeries::HardClip,
        DataSeries::MateBitFlags,
        DataSeries::MappingQuality,
        DataSeries::RecordsToNextFragment,
        DataSeries::NextFragmentAlignmentStart,
        DataSeries::Padding,
        DataSeries::RefSkip,
        DataSeries::TagCount,
        DataSeries::TagIdList,
        DataSeries::TagNameAndType,
        DataSeries::Insertion,
        DataSeries::ReadName,
        DataSeries::SoftClip,
        DataSeries::NextFragmentReferenceSeqId,
        DataSeries::QualityScore,
        DataSeries::ReadGroup,
        DataSeries::ReadLength,
        DataSeries::InsertSize,
        DataSeries::RefId,
    ];

    /// This series' external block id: a small dense integer distinct from
    /// every other fixed series' id, used as a key into a compression
    /// header's compressor map.
    pub fn block_id(self) -> u8 {
        self as u8
    }

    /// The compressor fixed for this series.
    ///
    /// `Insertion`, `ReadName`, and `SoftClip` additionally use a
    /// byte-array-stop family with delimiter `\t` (see [`EncodingFamily`] in
    /// `tag_encoding`), but their compressor is gzip regardless.
    pub fn compressor(self) -> CompressorKind {
        use CompressorKind::{Gzip, Rans0, Rans1};
        match self {
            DataSeries::AlignmentPositionOffset => Rans0,
            DataSeries::Base => Rans1,
            DataSeries::BitFlags => Rans1,
            DataSeries::BaseSubstitutionCode => Gzip,
            DataSeries::CompressionBitFlags => Rans1,
            DataSeries::DeletionLength
            | DataSeries::FeatureCode
            | DataSeries::ReadFeatureCount
            | DataSeries::FeaturePosition
            | DataSeries::HardClip
            | DataSeries::MateBitFlags
            | DataSeries::MappingQuality
            | DataSeries::RecordsToNextFragment
            | DataSeries::NextFragmentAlignmentStart
            | DataSeries::Padding
            | DataSeries::RefSkip
            | DataSeries::TagCount
            | DataSeries::TagIdList
            | DataSeries::TagNameAndType => Gzip,
            DataSeries::Insertion | DataSeries::ReadName | DataSeries::SoftClip => Gzip,
            DataSeries::NextFragmentReferenceSeqId => Rans1,
            DataSeries::QualityScore
            | DataSeries::ReadGroup
            | DataSeries::ReadLength
            | DataSeries::InsertSize => Rans1,
            DataSeries::RefId => Rans0,
        }
    }

    /// True for the three series that additionally use a byte-array-stop
    /// encoding with a tab delimiter, rather than a plain scalar encoding.
    pub fn uses_tab_delimited_byte_array_stop(self) -> bool {
        matches!(
            self,
            DataSeries::Insertion | DataSeries::ReadName | DataSeries::SoftClip
        )
    }
}
