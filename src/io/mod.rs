//! I/O module: indexed access to the interval file.
//!
//! The annotator reads the interval file through [`IndexedFeatureReader`],
//! which acquires the block index once and then serves any number of
//! independent region queries with sparse seeks instead of full scans.

pub mod indexed;

pub use indexed::{IndexedFeatureReader, OverlapIter};
