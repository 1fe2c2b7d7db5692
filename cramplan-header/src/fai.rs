//! FASTA `.fai` index reader/writer (component F): the only other
//! self-contained algorithmic artifact in this workspace, independent of
//! the header planner proper.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use thiserror::Error;

/// Errors raised while reading or writing a `.fai` index.
#[derive(Debug, Error)]
pub enum FaiError {
    /// A line did not match `<contig>\t<size>\t<offset>\t<bases>\t<bytes>`.
    #[error("malformed .fai line: {line:?}")]
    MalformedLine {
        /// The offending line, verbatim.
        line: String,
    },
    /// The same contig name appeared in more than one line.
    #[error("duplicate contig {name:?} in .fai index")]
    DuplicateContig {
        /// The repeated contig name.
        name: String,
    },
    /// A lookup named a contig absent from the index.
    #[error("no .fai entry for contig {name:?}")]
    MissingEntry {
        /// The queried contig name.
        name: String,
    },
    /// Underlying I/O failure reading or writing the index file.
    #[error("I/O failure on .fai index: {0}")]
    Io(#[from] std::io::Error),
}

/// One reference sequence's index entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaiEntry {
    /// Contig name, truncated at the first whitespace (the SAM
    /// sequence-name rule).
    pub name: String,
    /// Total bases in the sequence.
    pub size: u64,
    /// Byte offset of the first base in the FASTA file.
    pub offset: u64,
    /// Bases per line (excluding the line terminator).
    pub bases_per_line: u32,
    /// Bytes per line (including the line terminator).
    pub bytes_per_line: u32,
    /// 0-based index in insertion order; the SAM numeric reference id.
    pub sequence_index: usize,
}

impl FaiEntry {
    fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}",
            self.name, self.size, self.offset, self.bases_per_line, self.bytes_per_line
        )
    }
}

/// A parsed `.fai` index: insertion-ordered entries, hash-indexed by
/// contig name for exact-match lookup.
#[derive(Debug, Clone, Default)]
pub struct FaiIndex {
    entries: Vec<FaiEntry>,
    by_name: HashMap<String, usize>,
}

impl PartialEq for FaiIndex {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl FaiIndex {
    /// An empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the index has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[FaiEntry] {
        &self.entries
    }

    /// Look up an entry by exact contig name.
    pub fn get(&self, name: &str) -> Option<&FaiEntry> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    /// Look up an entry by insertion-order sequence index.
    pub fn get_by_index(&self, index: usize) -> Option<&FaiEntry> {
        self.entries.get(index)
    }

    /// Look up an entry by contig name, failing with [`FaiError::MissingEntry`]
    /// rather than returning `None`.
    pub fn require(&self, name: &str) -> Result<&FaiEntry, FaiError> {
        self.get(name).ok_or_else(|| FaiError::MissingEntry {
            name: name.to_string(),
        })
    }

    fn insert(&mut self, mut entry: FaiEntry) -> Result<(), FaiError> {
        if self.by_name.contains_key(&entry.name) {
            return Err(FaiError::DuplicateContig { name: entry.name });
        }
        entry.sequence_index = self.entries.len();
        self.by_name.insert(entry.name.clone(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    /// Parse a `.fai` index from `reader`, one entry per line, in file order.
    pub fn read_from<R: BufRead>(reader: R) -> Result<Self, FaiError> {
        let mut index = Self::new();
        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            index.insert(parse_line(&line)?)?;
        }
        Ok(index)
    }

    /// Parse a `.fai` index from a file at `path`.
    pub fn read_path<P: AsRef<Path>>(path: P) -> Result<Self, FaiError> {
        let file = File::open(path)?;
        Self::read_from(BufReader::new(file))
    }

    /// Write the index as tab-delimited lines, in insertion order.
    ///
    /// Uses a scoped file handle whose `BufWriter` is flushed and whose
    /// `File` is closed on every exit path, including error paths, per the
    /// planner's resource discipline for writes that outlive a single call.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), FaiError> {
        let mut writer = BufWriter::new(writer);
        for entry in &self.entries {
            writeln!(writer, "{}", entry.to_line())?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write the index to `path`.
    pub fn write_path<P: AsRef<Path>>(&self, path: P) -> Result<(), FaiError> {
        let file = File::create(path)?;
        self.write_to(file)
    }

    /// Write the index to a sibling temporary file and rename it over
    /// `path`, so a crash mid-write cannot leave a truncated `.fai` beside
    /// a BAM/CRAM file that still claims the index is valid.
    pub fn write_atomically<P: AsRef<Path>>(&self, path: P) -> Result<(), FaiError> {
        let path = path.as_ref();
        let temp_path = path.with_extension("fai.tmp");

        self.write_path(&temp_path)?;
        std::fs::rename(&temp_path, path)?;
        Ok(())
    }
}

fn parse_line(line: &str) -> Result<FaiEntry, FaiError> {
    let malformed = || FaiError::MalformedLine {
        line: line.to_string(),
    };

    let mut fields = line.split('\t');
    let raw_name = fields.next().ok_or_else(malformed)?;
    let size: u64 = fields.next().ok_or_else(malformed)?.parse().map_err(|_| malformed())?;
    let offset: u64 = fields.next().ok_or_else(malformed)?.parse().map_err(|_| malformed())?;
    let bases_per_line: u32 = fields.next().ok_or_else(malformed)?.parse().map_err(|_| malformed())?;
    let bytes_per_line: u32 = fields.next().ok_or_else(malformed)?.parse().map_err(|_| malformed())?;

    if fields.next().is_some() {
        return Err(malformed());
    }

    let name = raw_name
        .split_whitespace()
        .next()
        .ok_or_else(malformed)?
        .to_string();

    Ok(FaiEntry {
        name,
        size,
        offset,
        bases_per_line,
        bytes_per_line,
        sequence_index: 0, // overwritten by FaiIndex::insert
    })
}
