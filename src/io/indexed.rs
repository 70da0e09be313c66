//! Indexed region queries over the interval file.
//!
//! [`IndexedFeatureReader`] pairs the persisted block index with the raw
//! interval file. Each [`query`] call opens an independent file handle,
//! seeks to the candidate blocks' byte spans, and decodes features
//! sequentially, yielding only true overlaps. There is no shared cursor
//! state between queries, so re-querying for successive primary records is
//! side-effect-free.
//!
//! [`query`]: IndexedFeatureReader::query
//!
//! # Examples
//!
//! ```no_run
//! use vartag::io::IndexedFeatureReader;
//!
//! # fn main() -> vartag::Result<()> {
//! let reader = IndexedFeatureReader::open("annotations.bed", b'\t')?;
//! for feature in reader.query("chr1", 150, 150)? {
//!     let feature = feature?;
//!     println!("{}:{}-{}", feature.chrom, feature.start, feature.end);
//! }
//! # Ok(())
//! # }
//! ```

use crate::error::Result;
use crate::formats::feature::{Feature, FeatureDecoder};
use crate::index::IntervalIndex;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Random-access reader over an indexed interval file.
///
/// The index is acquired once at open time and is read-only afterwards; the
/// underlying file is reopened per query.
pub struct IndexedFeatureReader {
    path: PathBuf,
    index: IntervalIndex,
}

impl IndexedFeatureReader {
    /// Opens an interval file, acquiring (building or loading) its index.
    pub fn open(path: impl AsRef<Path>, delimiter: u8) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let index = IntervalIndex::acquire(&path, delimiter)?;
        Ok(IndexedFeatureReader { path, index })
    }

    /// Creates a reader from an already-acquired index.
    pub fn with_index(path: impl AsRef<Path>, index: IntervalIndex) -> Self {
        IndexedFeatureReader {
            path: path.as_ref().to_path_buf(),
            index,
        }
    }

    /// The block index backing this reader.
    pub fn index(&self) -> &IntervalIndex {
        &self.index
    }

    /// Queries all features overlapping the closed interval
    /// `[start, end]` on `chrom`.
    ///
    /// Each call opens its own cursor; the returned iterator is finite and
    /// yields features in file order within each candidate block. A
    /// chromosome with no blocks yields an empty iterator, not an error.
    pub fn query(&self, chrom: &str, start: u64, end: u64) -> Result<OverlapIter> {
        let spans: Vec<(u64, u64)> = self
            .index
            .query_blocks(chrom, start, end)
            .iter()
            .map(|b| (b.start_offset, b.end_offset))
            .collect();

        // No candidate blocks: skip opening the file entirely.
        let decoder = if spans.is_empty() {
            None
        } else {
            let file = File::open(&self.path)?;
            Some(FeatureDecoder::new(
                BufReader::new(file),
                self.index.delimiter(),
            ))
        };

        Ok(OverlapIter {
            decoder,
            spans,
            span_index: 0,
            span_end: 0,
            positioned: false,
            chrom: chrom.to_string(),
            start,
            end,
        })
    }
}

/// Finite iterator over the features of one region query.
pub struct OverlapIter {
    decoder: Option<FeatureDecoder<BufReader<File>>>,
    spans: Vec<(u64, u64)>,
    span_index: usize,
    span_end: u64,
    positioned: bool,
    chrom: String,
    start: u64,
    end: u64,
}

impl OverlapIter {
    fn next_feature(&mut self) -> Result<Option<Feature>> {
        let decoder = match &mut self.decoder {
            Some(decoder) => decoder,
            None => return Ok(None),
        };

        loop {
            if !self.positioned {
                let (span_start, span_end) = match self.spans.get(self.span_index) {
                    Some(&span) => span,
                    None => return Ok(None),
                };
                decoder.seek(span_start)?;
                self.span_end = span_end;
                self.positioned = true;
            }

            if decoder.offset() >= self.span_end {
                self.span_index += 1;
                self.positioned = false;
                continue;
            }

            let feature = match decoder.next_feature()? {
                Some(feature) => feature,
                None => {
                    // End of file inside a span; nothing further to decode.
                    self.span_index = self.spans.len();
                    return Ok(None);
                }
            };

            if feature.chrom == self.chrom && feature.overlaps(self.start, self.end) {
                return Ok(Some(feature));
            }
        }
    }
}

impl Iterator for OverlapIter {
    type Item = Result<Feature>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_feature().transpose()
    }
}
