//! vartag: annotate VCF variants from an indexed interval file
//!
//! # Overview
//!
//! vartag takes a VCF stream and a delimiter-separated interval file
//! (chromosome, start, end, free-form columns), finds the interval lines
//! overlapping each variant, renders them through a `${column}` template,
//! and attaches the deduplicated results as one multi-valued INFO field.
//!
//! The interval file is queried through a persistent block index
//! (`<file>.idx` sidecar), so arbitrarily large annotation files cost one
//! linear scan the first time and sparse seeks afterwards.
//!
//! ## Quick Start
//!
//! ```no_run
//! use vartag::annotate::{AnnotateConfig, Annotator};
//! use std::io::{stdin, stdout, BufWriter};
//!
//! # fn main() -> vartag::Result<()> {
//! let mut config = AnnotateConfig::new("genes.bed");
//! config.template = "${4}".to_string();
//! config.tag = "GENE".to_string();
//!
//! let annotator = Annotator::new(config)?;
//! annotator.annotate(stdin().lock(), BufWriter::new(stdout().lock()))?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`template`]: `${n}` format compilation and rendering
//! - [`formats`]: interval file decoding and VCF reading/writing
//! - [`index`]: block-structured interval index with sidecar persistence
//! - [`io`]: indexed region queries over the interval file
//! - [`annotate`]: the merge driver tying everything together

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod annotate;
pub mod error;
pub mod formats;
pub mod index;
pub mod io;
pub mod template;

// Re-export commonly used types
pub use annotate::{AnnotateConfig, AnnotateStats, Annotator};
pub use error::{Result, VartagError};
pub use formats::{Feature, FeatureDecoder, VcfParser, VcfRecord, VcfWriter};
pub use index::IntervalIndex;
pub use io::IndexedFeatureReader;
pub use template::Template;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
