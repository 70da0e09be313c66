//! VCF (Variant Call Format) reading and writing.
//!
//! This is deliberately a shallow VCF layer: the annotator only needs each
//! record's chromosome, position span, and INFO column. Everything else is
//! carried verbatim so that untouched records round-trip byte-identically.
//!
//! - **Header lines** (`##...` and the `#CHROM` column header) are preserved
//!   as raw strings; the only mutation offered is inserting one INFO
//!   declaration for the annotation tag.
//! - **Records** keep ID/REF/ALT/QUAL/FILTER and any FORMAT/sample columns
//!   as opaque strings. INFO is parsed into an order-preserving key/value
//!   list so a field can be appended without reshuffling the rest.
//!
//! # Examples
//!
//! ```
//! use vartag::formats::vcf::VcfRecord;
//!
//! # fn main() -> vartag::Result<()> {
//! let line = "chr1\t12345\trs123\tACG\tA\t30.0\tPASS\tDP=100;DB";
//! let record = VcfRecord::from_line(line, 1)?;
//!
//! assert_eq!(record.chrom, "chr1");
//! assert_eq!(record.pos, 12345);
//! assert_eq!(record.end()?, 12347); // pos + len(REF) - 1
//! assert_eq!(record.to_line(), line);
//! # Ok(())
//! # }
//! ```

use crate::error::{Result, VartagError};
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// VCF file header, preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VcfHeader {
    lines: Vec<String>,
}

impl VcfHeader {
    /// Creates a header from raw lines (each including its leading `#`).
    pub fn from_lines(lines: Vec<String>) -> Self {
        VcfHeader { lines }
    }

    /// The raw header lines, in input order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Declares a new unbounded string-typed INFO field.
    ///
    /// The line is inserted immediately before the `#CHROM` column header
    /// (or appended when no column header is present) so the declaration
    /// appears exactly once, before any records.
    pub fn add_info_string_field(&mut self, id: &str, description: &str) {
        let line = format!(
            "##INFO=<ID={},Number=.,Type=String,Description=\"{}\">",
            id, description
        );
        let at = self
            .lines
            .iter()
            .position(|l| l.starts_with("#CHROM"))
            .unwrap_or(self.lines.len());
        self.lines.insert(at, line);
    }
}

/// One VCF data record.
///
/// Fields other than CHROM/POS/INFO are opaque passthrough strings.
#[derive(Debug, Clone, PartialEq)]
pub struct VcfRecord {
    /// Chromosome/contig name
    pub chrom: String,
    /// Position (1-based)
    pub pos: u64,
    /// Variant ID column, verbatim (`.` for missing)
    pub id: String,
    /// Reference allele, verbatim
    pub reference: String,
    /// Alternate allele column, verbatim
    pub alternate: String,
    /// Quality column, verbatim
    pub quality: String,
    /// Filter column, verbatim
    pub filter: String,
    /// INFO entries in input order; `None` value marks a flag key
    pub info: Vec<(String, Option<String>)>,
    /// FORMAT and sample columns, verbatim
    pub rest: Vec<String>,
    line_number: usize,
}

impl VcfRecord {
    /// Parses one tab-delimited VCF data line.
    ///
    /// # Errors
    ///
    /// Returns [`VartagError::VcfFormat`] when the line has fewer than the
    /// 8 fixed columns or POS is not an integer.
    pub fn from_line(line: &str, line_number: usize) -> Result<Self> {
        let fail = |msg: String| VartagError::VcfFormat {
            line: line_number,
            msg,
        };

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 8 {
            return Err(fail(format!(
                "expected at least 8 columns, found {}",
                fields.len()
            )));
        }

        let pos: u64 = fields[1]
            .parse()
            .map_err(|e| fail(format!("POS \"{}\" is not an integer: {}", fields[1], e)))?;

        let info = if fields[7] == "." {
            Vec::new()
        } else {
            fields[7]
                .split(';')
                .map(|entry| match entry.split_once('=') {
                    Some((k, v)) => (k.to_string(), Some(v.to_string())),
                    None => (entry.to_string(), None),
                })
                .collect()
        };

        Ok(VcfRecord {
            chrom: fields[0].to_string(),
            pos,
            id: fields[2].to_string(),
            reference: fields[3].to_string(),
            alternate: fields[4].to_string(),
            quality: fields[5].to_string(),
            filter: fields[6].to_string(),
            info,
            rest: fields[8..].iter().map(|s| s.to_string()).collect(),
            line_number,
        })
    }

    /// Serializes the record back to a tab-delimited line.
    pub fn to_line(&self) -> String {
        let info = if self.info.is_empty() {
            ".".to_string()
        } else {
            self.info
                .iter()
                .map(|(k, v)| match v {
                    Some(v) => format!("{}={}", k, v),
                    None => k.clone(),
                })
                .collect::<Vec<_>>()
                .join(";")
        };

        let mut fields = vec![
            self.chrom.clone(),
            self.pos.to_string(),
            self.id.clone(),
            self.reference.clone(),
            self.alternate.clone(),
            self.quality.clone(),
            self.filter.clone(),
            info,
        ];
        fields.extend(self.rest.iter().cloned());
        fields.join("\t")
    }

    /// Looks up an INFO value by key.
    pub fn info_value(&self, key: &str) -> Option<&str> {
        self.info
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Sets an INFO field, replacing an existing entry with the same key.
    pub fn set_info(&mut self, key: &str, value: String) {
        if let Some(entry) = self.info.iter_mut().find(|(k, _)| k == key) {
            entry.1 = Some(value);
        } else {
            self.info.push((key.to_string(), Some(value)));
        }
    }

    /// End position of the variant's reference span (1-based, closed).
    ///
    /// Defaults to `pos + len(REF) - 1`; an integer `END` INFO key, as used
    /// by symbolic/structural variants, takes precedence.
    ///
    /// # Errors
    ///
    /// Returns [`VartagError::VcfFormat`] when an `END` key is present but
    /// not an integer.
    pub fn end(&self) -> Result<u64> {
        if let Some(value) = self.info_value("END") {
            return value.parse().map_err(|e| VartagError::VcfFormat {
                line: self.line_number,
                msg: format!("END \"{}\" is not an integer: {}", value, e),
            });
        }
        Ok(self.pos + (self.reference.len() as u64).max(1) - 1)
    }
}

/// Streaming VCF parser with header support.
///
/// Call [`read_header`] first, then iterate over records.
///
/// [`read_header`]: VcfParser::read_header
pub struct VcfParser<R> {
    reader: R,
    line_buf: String,
    line_number: usize,
    // Data line consumed while looking for the end of the header.
    pending: Option<String>,
}

impl VcfParser<BufReader<File>> {
    /// Creates a parser from an uncompressed VCF file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Ok(VcfParser::new(BufReader::new(file)))
    }
}

impl VcfParser<BufReader<MultiGzDecoder<File>>> {
    /// Creates a parser from a gzip/bgzip-compressed VCF file.
    pub fn from_gzip_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Ok(VcfParser::new(BufReader::new(MultiGzDecoder::new(file))))
    }
}

impl<R: BufRead> VcfParser<R> {
    /// Creates a parser from a buffered reader.
    pub fn new(reader: R) -> Self {
        VcfParser {
            reader,
            line_buf: String::with_capacity(1024),
            line_number: 0,
            pending: None,
        }
    }

    fn next_line(&mut self) -> Result<Option<String>> {
        if let Some(line) = self.pending.take() {
            return Ok(Some(line));
        }
        self.line_buf.clear();
        if self.reader.read_line(&mut self.line_buf)? == 0 {
            return Ok(None);
        }
        self.line_number += 1;
        Ok(Some(
            self.line_buf.trim_end_matches(['\n', '\r']).to_string(),
        ))
    }

    /// Reads the header: all leading `#` lines through `#CHROM`.
    ///
    /// A data line encountered before the column header is buffered and
    /// yielded by the record iterator, not lost.
    pub fn read_header(&mut self) -> Result<VcfHeader> {
        let mut lines = Vec::new();
        while let Some(line) = self.next_line()? {
            if line.starts_with('#') {
                let is_column_header = line.starts_with("#CHROM");
                lines.push(line);
                if is_column_header {
                    break;
                }
            } else {
                self.pending = Some(line);
                break;
            }
        }
        Ok(VcfHeader::from_lines(lines))
    }
}

impl<R: BufRead> Iterator for VcfParser<R> {
    type Item = Result<VcfRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.next_line() {
                Ok(None) => return None,
                Ok(Some(line)) => {
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    return Some(VcfRecord::from_line(&line, self.line_number));
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Streaming VCF writer.
pub struct VcfWriter<W: Write> {
    writer: W,
    records_written: usize,
}

impl<W: Write> VcfWriter<W> {
    /// Creates a writer over any `Write` sink.
    pub fn new(writer: W) -> Self {
        VcfWriter {
            writer,
            records_written: 0,
        }
    }

    /// Writes every header line, in order.
    pub fn write_header(&mut self, header: &VcfHeader) -> Result<()> {
        for line in header.lines() {
            writeln!(self.writer, "{}", line)?;
        }
        Ok(())
    }

    /// Writes a single record.
    pub fn write_record(&mut self, record: &VcfRecord) -> Result<()> {
        writeln!(self.writer, "{}", record.to_line())?;
        self.records_written += 1;
        Ok(())
    }

    /// Number of records written so far.
    pub fn records_written(&self) -> usize {
        self.records_written
    }

    /// Flushes buffered output.
    pub fn finish(mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
