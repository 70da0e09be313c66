//! Block-structured interval index over a delimiter-separated file.
//!
//! The index maps (chromosome, position range) to byte-offset spans in the
//! source file, so a region query seeks and decodes a handful of blocks
//! instead of re-scanning the whole file.
//!
//! Each [`IndexBlock`] summarizes a bounded run of features: the chromosome,
//! the minimum start and maximum end covered, and the byte span holding the
//! run. Blocks are ordered by chromosome then by minimum start.
//!
//! The index persists to a `<data>.idx` sidecar. The byte layout of the
//! sidecar is private to this module (bincode-serialized). Acquisition
//! policy lives in one place, [`IntervalIndex::acquire`]: a stale or missing
//! sidecar triggers a rebuild-and-persist, a fresh sidecar is loaded as is.
//!
//! # Examples
//!
//! ```no_run
//! use vartag::index::IntervalIndex;
//!
//! # fn main() -> vartag::Result<()> {
//! let index = IntervalIndex::acquire("annotations.bed", b'\t')?;
//! for block in index.query_blocks("chr1", 1_000, 2_000) {
//!     println!("candidate span {}..{}", block.start_offset, block.end_offset);
//! }
//! # Ok(())
//! # }
//! ```

use crate::error::{Result, VartagError};
use crate::formats::feature::FeatureDecoder;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// Features summarized per block before a new block is opened.
///
/// A block also closes early on a chromosome change, so no block ever spans
/// two chromosomes.
pub const BLOCK_FEATURES: usize = 128;

/// Extension of the sidecar index file (`annotations.bed` → `annotations.bed.idx`).
pub const INDEX_EXTENSION: &str = "idx";

/// One entry of the interval index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexBlock {
    /// Chromosome every feature in the block belongs to
    pub chrom: String,
    /// Smallest feature start in the block
    pub min_start: u64,
    /// Largest feature end in the block
    pub max_end: u64,
    /// Byte offset of the block's first line
    pub start_offset: u64,
    /// Byte offset one past the block's last line
    pub end_offset: u64,
}

impl IndexBlock {
    fn intersects(&self, start: u64, end: u64) -> bool {
        self.min_start <= end && self.max_end >= start
    }
}

/// Sorted, block-structured index for one interval file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalIndex {
    blocks: Vec<IndexBlock>,
    // chromosome -> contiguous (first block, block count) run in `blocks`
    by_chrom: HashMap<String, (usize, usize)>,
    delimiter: u8,
}

impl IntervalIndex {
    /// Builds an index with one full linear pass over the interval file.
    ///
    /// The file header is consumed first so no block span covers it.
    pub fn build_from_scan<R: BufRead>(mut decoder: FeatureDecoder<R>) -> Result<Self> {
        let delimiter = decoder.delimiter();
        decoder.read_header()?;

        let mut blocks: Vec<IndexBlock> = Vec::new();
        let mut open: Option<(IndexBlock, usize)> = None;

        loop {
            let line_start = decoder.offset();
            let feature = match decoder.next_feature()? {
                Some(feature) => feature,
                None => break,
            };
            let line_end = decoder.offset();

            match &mut open {
                Some((block, count))
                    if block.chrom == feature.chrom && *count < BLOCK_FEATURES =>
                {
                    block.min_start = block.min_start.min(feature.start);
                    block.max_end = block.max_end.max(feature.end);
                    block.end_offset = line_end;
                    *count += 1;
                }
                _ => {
                    if let Some((block, _)) = open.take() {
                        blocks.push(block);
                    }
                    open = Some((
                        IndexBlock {
                            chrom: feature.chrom.clone(),
                            min_start: feature.start,
                            max_end: feature.end,
                            start_offset: line_start,
                            end_offset: line_end,
                        },
                        1,
                    ));
                }
            }
        }
        if let Some((block, _)) = open {
            blocks.push(block);
        }

        blocks.sort_by(|a, b| {
            a.chrom
                .cmp(&b.chrom)
                .then(a.min_start.cmp(&b.min_start))
                .then(a.start_offset.cmp(&b.start_offset))
        });

        let mut by_chrom: HashMap<String, (usize, usize)> = HashMap::new();
        for (i, block) in blocks.iter().enumerate() {
            by_chrom
                .entry(block.chrom.clone())
                .and_modify(|(_, len)| *len += 1)
                .or_insert((i, 1));
        }

        Ok(IntervalIndex {
            blocks,
            by_chrom,
            delimiter,
        })
    }

    /// Loads a persisted index from its sidecar file.
    ///
    /// # Errors
    ///
    /// Returns [`VartagError::IndexUnavailable`] when the sidecar is missing
    /// or corrupt.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let unavailable = |reason: String| VartagError::IndexUnavailable {
            path: path.to_path_buf(),
            reason,
        };
        let file = File::open(path).map_err(|e| unavailable(e.to_string()))?;
        bincode::deserialize_from(BufReader::new(file))
            .map_err(|e| unavailable(format!("corrupt index: {}", e)))
    }

    /// Persists the index to a sidecar file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let unavailable = |reason: String| VartagError::IndexUnavailable {
            path: path.to_path_buf(),
            reason,
        };
        let file = File::create(path).map_err(|e| unavailable(e.to_string()))?;
        bincode::serialize_into(BufWriter::new(file), self)
            .map_err(|e| unavailable(format!("cannot write index: {}", e)))
    }

    /// Sidecar index path for a data file (`x.bed` → `x.bed.idx`).
    pub fn index_path_for(data_path: impl AsRef<Path>) -> PathBuf {
        let mut name = data_path.as_ref().as_os_str().to_os_string();
        name.push(".");
        name.push(INDEX_EXTENSION);
        PathBuf::from(name)
    }

    /// True iff no persisted index exists or it is older than the data file.
    pub fn is_stale(index_path: impl AsRef<Path>, data_path: impl AsRef<Path>) -> Result<bool> {
        let index_meta = match std::fs::metadata(index_path.as_ref()) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(true),
            Err(e) => return Err(e.into()),
        };
        let data_meta = std::fs::metadata(data_path.as_ref())?;
        Ok(index_meta.modified()? < data_meta.modified()?)
    }

    /// Obtains an index for `data_path`: rebuild and persist when the
    /// sidecar is stale or absent, load it otherwise.
    ///
    /// A sidecar that cannot be written (for example, a read-only directory)
    /// is not fatal: the freshly built in-memory index is used for the run.
    pub fn acquire(data_path: impl AsRef<Path>, delimiter: u8) -> Result<Self> {
        let data_path = data_path.as_ref();
        let index_path = Self::index_path_for(data_path);

        if Self::is_stale(&index_path, data_path)? {
            info!("building index for {}", data_path.display());
            let file = File::open(data_path).map_err(|e| VartagError::IndexUnavailable {
                path: data_path.to_path_buf(),
                reason: e.to_string(),
            })?;
            let index = Self::build_from_scan(FeatureDecoder::new(BufReader::new(file), delimiter))?;
            if let Err(e) = index.save(&index_path) {
                info!("index not persisted: {}", e);
            }
            Ok(index)
        } else {
            info!("loading index from {}", index_path.display());
            Self::load(&index_path)
        }
    }

    /// All blocks, ordered by chromosome then minimum start.
    pub fn blocks(&self) -> &[IndexBlock] {
        &self.blocks
    }

    /// Delimiter the indexed file was tokenized with.
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Candidate blocks for a query interval.
    ///
    /// Returns the blocks of `chrom` whose `[min_start, max_end]` range
    /// intersects the closed interval `[start, end]`; empty for a
    /// chromosome with no blocks.
    pub fn query_blocks(&self, chrom: &str, start: u64, end: u64) -> Vec<&IndexBlock> {
        match self.by_chrom.get(chrom) {
            Some(&(first, len)) => self.blocks[first..first + len]
                .iter()
                .filter(|b| b.intersects(start, end))
                .collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::TempDir;

    const DATA: &str = "\
# track header
chr1\t100\t200\tgeneA
chr1\t150\t250\tgeneB
chr2\t10\t20\tgeneC
chr1\t300\t400\tgeneD
";

    fn build(data: &str) -> IntervalIndex {
        IntervalIndex::build_from_scan(FeatureDecoder::new(data.as_bytes(), b'\t')).unwrap()
    }

    #[test]
    fn test_blocks_ordered_by_chrom_then_start() {
        let index = build(DATA);
        let order: Vec<_> = index
            .blocks()
            .iter()
            .map(|b| (b.chrom.as_str(), b.min_start))
            .collect();
        // chr1 appears in two file runs (split by the chr2 line) but the
        // blocks come back sorted.
        assert_eq!(order, vec![("chr1", 100), ("chr1", 300), ("chr2", 10)]);
    }

    #[test]
    fn test_header_not_covered_by_any_block() {
        let index = build(DATA);
        let header_len = "# track header\n".len() as u64;
        assert!(index.blocks().iter().all(|b| b.start_offset >= header_len));
    }

    #[test]
    fn test_query_blocks_filters_by_range() {
        let index = build(DATA);
        assert_eq!(index.query_blocks("chr1", 120, 130).len(), 1);
        assert_eq!(index.query_blocks("chr1", 350, 360).len(), 1);
        assert_eq!(index.query_blocks("chr1", 500, 600).len(), 0);
        assert_eq!(index.query_blocks("chr2", 15, 15).len(), 1);
    }

    #[test]
    fn test_unknown_chromosome_is_empty_not_error() {
        let index = build(DATA);
        assert!(index.query_blocks("chrMT", 1, 1_000_000).is_empty());
    }

    #[test]
    fn test_block_split_on_feature_cap() {
        let mut data = String::new();
        for i in 0..(BLOCK_FEATURES + 1) {
            data.push_str(&format!("chr1\t{}\t{}\n", i * 10, i * 10 + 5));
        }
        let index = build(&data);
        assert_eq!(index.blocks().len(), 2);
        assert_eq!(index.blocks()[1].min_start, (BLOCK_FEATURES as u64) * 10);
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("intervals.bed.idx");

        let index = build(DATA);
        index.save(&path).unwrap();
        let loaded = IntervalIndex::load(&path).unwrap();
        assert_eq!(loaded, index);
    }

    #[test]
    fn test_load_corrupt_index_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.idx");
        std::fs::write(&path, b"not an index").unwrap();
        assert!(matches!(
            IntervalIndex::load(&path).unwrap_err(),
            VartagError::IndexUnavailable { .. }
        ));
    }

    #[test]
    fn test_index_path_for() {
        assert_eq!(
            IntervalIndex::index_path_for("data/x.bed"),
            PathBuf::from("data/x.bed.idx")
        );
    }

    #[test]
    fn test_missing_sidecar_is_stale() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("x.bed");
        std::fs::write(&data, DATA).unwrap();
        let sidecar = IntervalIndex::index_path_for(&data);
        assert!(IntervalIndex::is_stale(&sidecar, &data).unwrap());
    }

    #[test]
    fn test_acquire_builds_then_loads() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("x.bed");
        let mut file = File::create(&data).unwrap();
        file.write_all(DATA.as_bytes()).unwrap();
        drop(file);

        // First acquisition builds and persists the sidecar.
        let built = IntervalIndex::acquire(&data, b'\t').unwrap();
        let sidecar = IntervalIndex::index_path_for(&data);
        assert!(sidecar.exists());
        assert!(!IntervalIndex::is_stale(&sidecar, &data).unwrap());

        // Second acquisition loads the persisted copy.
        let loaded = IntervalIndex::acquire(&data, b'\t').unwrap();
        assert_eq!(loaded, built);
    }
}
