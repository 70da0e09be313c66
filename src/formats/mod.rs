//! File format parsers.
//!
//! - [`feature`]: the delimiter-separated interval file (the annotation
//!   source), decoded into [`Feature`]s with byte-offset tracking
//! - [`vcf`]: the primary record stream, read and written with verbatim
//!   passthrough of everything the annotator does not touch

pub mod feature;
pub mod vcf;

pub use feature::{Feature, FeatureDecoder};
pub use vcf::{VcfHeader, VcfParser, VcfRecord, VcfWriter};
