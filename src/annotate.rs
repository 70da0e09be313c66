//! Annotation merge driver.
//!
//! The top-level loop: for every VCF record, query the indexed interval
//! file for overlaps, render each overlapping line through the template,
//! sanitize and deduplicate the results, and emit exactly one output record
//! — unchanged when nothing overlapped, with one added INFO field
//! otherwise.
//!
//! # Examples
//!
//! ```no_run
//! use vartag::annotate::{AnnotateConfig, Annotator};
//! use std::io::{stdin, stdout, BufWriter};
//!
//! # fn main() -> vartag::Result<()> {
//! let config = AnnotateConfig::new("annotations.bed");
//! let annotator = Annotator::new(config)?;
//! let stats = annotator.annotate(stdin().lock(), BufWriter::new(stdout().lock()))?;
//! eprintln!("{} of {} records annotated", stats.annotated, stats.records);
//! # Ok(())
//! # }
//! ```

use crate::error::Result;
use crate::formats::vcf::{VcfParser, VcfWriter};
use crate::io::IndexedFeatureReader;
use crate::template::Template;
use indexmap::IndexSet;
use log::{debug, info};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

/// Default format template: `chrom:start-end` of the overlapping interval.
pub const DEFAULT_TEMPLATE: &str = "${1}:${2}-${3}";

/// Default INFO key for the aggregated annotations.
pub const DEFAULT_TAG: &str = "TAG";

/// Configuration for one annotation run.
#[derive(Debug, Clone)]
pub struct AnnotateConfig {
    /// Path of the delimiter-separated interval file
    pub interval_path: PathBuf,
    /// Format template rendered against each overlapping line
    pub template: String,
    /// INFO key the aggregated annotations are stored under
    pub tag: String,
    /// Column delimiter of the interval file
    pub delimiter: u8,
}

impl AnnotateConfig {
    /// Configuration with the default template, tag, and tab delimiter.
    pub fn new(interval_path: impl AsRef<Path>) -> Self {
        AnnotateConfig {
            interval_path: interval_path.as_ref().to_path_buf(),
            template: DEFAULT_TEMPLATE.to_string(),
            tag: DEFAULT_TAG.to_string(),
            delimiter: b'\t',
        }
    }
}

/// Ordered set of distinct rendered annotations for one record.
///
/// Values are sanitized before insertion so the set is safe to serialize
/// into a single INFO field; insertion order is preserved and duplicates
/// are suppressed.
#[derive(Debug, Default)]
pub struct AnnotationSet {
    values: IndexSet<String>,
}

impl AnnotationSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        AnnotationSet::default()
    }

    /// Sanitizes and inserts a rendered annotation.
    ///
    /// Empty renders are discarded. Space, comma, semicolon and equals are
    /// replaced with `_` since all four are meta-characters of the VCF INFO
    /// column.
    pub fn insert(&mut self, rendered: &str) {
        if rendered.is_empty() {
            return;
        }
        self.values.insert(sanitize(rendered));
    }

    /// True when nothing has been inserted.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Serializes the set as the comma-separated INFO value.
    pub fn to_info_value(&self) -> String {
        self.values.iter().cloned().collect::<Vec<_>>().join(",")
    }
}

fn sanitize(value: &str) -> String {
    value.replace([' ', ',', ';', '='], "_")
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnnotateStats {
    /// Input records processed (always equals output records written)
    pub records: usize,
    /// Records that received at least one annotation
    pub annotated: usize,
}

/// The annotation merge driver.
///
/// Compiles the template and acquires the interval index at construction,
/// so both failure classes surface before any record is read.
pub struct Annotator {
    config: AnnotateConfig,
    template: Template,
    reader: IndexedFeatureReader,
}

impl Annotator {
    /// Builds a driver from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`VartagError::TemplateSyntax`] for a malformed template and
    /// [`VartagError::IndexUnavailable`] when the interval file or its
    /// index cannot be opened.
    ///
    /// [`VartagError::TemplateSyntax`]: crate::VartagError::TemplateSyntax
    /// [`VartagError::IndexUnavailable`]: crate::VartagError::IndexUnavailable
    pub fn new(config: AnnotateConfig) -> Result<Self> {
        let template = Template::compile(&config.template)?;
        info!("opening {}", config.interval_path.display());
        let reader = IndexedFeatureReader::open(&config.interval_path, config.delimiter)?;
        Ok(Annotator {
            config,
            template,
            reader,
        })
    }

    /// Runs the annotation pass: one output record per input record.
    ///
    /// The output header declares the tag before any record is written.
    /// Any decode, seek, or render error aborts the run.
    pub fn annotate<R: BufRead, W: Write>(&self, input: R, output: W) -> Result<AnnotateStats> {
        let mut parser = VcfParser::new(input);
        let mut writer = VcfWriter::new(output);

        let mut header = parser.read_header()?;
        header.add_info_string_field(
            &self.config.tag,
            &format!(
                "metadata added from {}. Format was {}",
                self.config.interval_path.display(),
                self.config.template
            ),
        );
        writer.write_header(&header)?;

        let mut stats = AnnotateStats::default();
        for record in parser {
            let mut record = record?;
            let end = record.end()?;

            // Drain the overlap sequence fully before deciding the outcome.
            let mut annotations = AnnotationSet::new();
            for feature in self.reader.query(&record.chrom, record.pos, end)? {
                let feature = feature?;
                annotations.insert(&self.template.render(&feature.tokens)?);
            }

            if !annotations.is_empty() {
                record.set_info(&self.config.tag, annotations.to_info_value());
                stats.annotated += 1;
            }
            writer.write_record(&record)?;
            stats.records += 1;
        }

        debug!(
            "annotated {} of {} records",
            stats.annotated, stats.records
        );
        writer.finish()?;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_info_meta_characters() {
        assert_eq!(sanitize("a b,c;d=e"), "a_b_c_d_e");
        assert_eq!(sanitize("clean"), "clean");
    }

    #[test]
    fn test_annotation_set_dedups_preserving_order() {
        let mut set = AnnotationSet::new();
        set.insert("geneB");
        set.insert("geneA");
        set.insert("geneB");
        assert_eq!(set.to_info_value(), "geneB,geneA");
    }

    #[test]
    fn test_annotation_set_discards_empty_renders() {
        let mut set = AnnotationSet::new();
        set.insert("");
        assert!(set.is_empty());
    }

    #[test]
    fn test_annotation_set_dedups_after_sanitization() {
        let mut set = AnnotationSet::new();
        set.insert("gene A");
        set.insert("gene=A");
        assert_eq!(set.to_info_value(), "gene_A");
    }
}
