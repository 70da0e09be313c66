//! Interval file line tokenizer and feature decoder.
//!
//! The interval file is delimiter-separated text (tab by default):
//! - column 0: chromosome
//! - column 1: start (integer, closed interval)
//! - column 2: end (integer, closed interval)
//! - further columns: free-form, addressable only via the template
//!
//! Lines beginning with `#` before the first data line are header lines,
//! preserved verbatim but never parsed as data. Comment lines between data
//! lines are skipped.
//!
//! The decoder is purely sequential and tracks its byte offset so the index
//! builder can record block spans and the query engine can resume decoding
//! after a seek. The decoder itself never consults the index.
//!
//! # Examples
//!
//! ```
//! use vartag::formats::feature::FeatureDecoder;
//!
//! # fn main() -> vartag::Result<()> {
//! let data = "# header\nchr1\t100\t200\tgeneA\nchr2\t50\t80\tgeneB\n";
//! let mut decoder = FeatureDecoder::new(data.as_bytes(), b'\t');
//!
//! let (header, data_start) = decoder.read_header()?;
//! assert_eq!(header, "# header");
//! assert_eq!(data_start, 9);
//!
//! let feature = decoder.next_feature()?.unwrap();
//! assert_eq!(feature.chrom, "chr1");
//! assert_eq!(feature.start, 100);
//! assert_eq!(feature.end, 200);
//! assert_eq!(feature.tokens[3], "geneA");
//! # Ok(())
//! # }
//! ```

use crate::error::{Result, VartagError};
use std::io::{BufRead, Seek, SeekFrom};

/// One decoded line of the interval file.
///
/// Constructed on demand while scanning or querying; not retained beyond the
/// query that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    /// All columns of the line, in order, delimiters removed
    pub tokens: Vec<String>,
    /// Chromosome name (column 0)
    pub chrom: String,
    /// Interval start (column 1, closed)
    pub start: u64,
    /// Interval end (column 2, closed)
    pub end: u64,
}

impl Feature {
    /// Builds a feature from tokenized columns.
    ///
    /// # Errors
    ///
    /// Returns [`VartagError::FeatureFormat`] when the line has fewer than
    /// three columns, the chromosome is empty, or start/end do not parse as
    /// integers.
    pub fn from_tokens(tokens: Vec<String>, line: usize) -> Result<Self> {
        let fail = |msg: String| VartagError::FeatureFormat { line, msg };

        if tokens.len() < 3 {
            return Err(fail(format!(
                "expected at least 3 columns, found {}",
                tokens.len()
            )));
        }
        let chrom = tokens[0].clone();
        if chrom.is_empty() {
            return Err(fail("empty chromosome".to_string()));
        }
        let start: u64 = tokens[1]
            .parse()
            .map_err(|e| fail(format!("start \"{}\" is not an integer: {}", tokens[1], e)))?;
        let end: u64 = tokens[2]
            .parse()
            .map_err(|e| fail(format!("end \"{}\" is not an integer: {}", tokens[2], e)))?;

        Ok(Feature {
            tokens,
            chrom,
            start,
            end,
        })
    }

    /// True when this feature's closed interval intersects `[start, end]`.
    pub fn overlaps(&self, start: u64, end: u64) -> bool {
        self.start <= end && self.end >= start
    }
}

/// Streaming tokenizer over an interval file.
///
/// Reads one line at a time with constant memory, splitting on a single
/// configurable delimiter byte. A leading delimiter produces an empty first
/// token; consecutive delimiters produce empty intermediate tokens.
pub struct FeatureDecoder<R> {
    reader: R,
    delimiter: u8,
    line_buf: Vec<u8>,
    offset: u64,
    line_number: usize,
}

impl<R: BufRead> FeatureDecoder<R> {
    /// Creates a decoder reading from `reader`, splitting on `delimiter`.
    pub fn new(reader: R, delimiter: u8) -> Self {
        FeatureDecoder {
            reader,
            delimiter,
            line_buf: Vec::with_capacity(1024),
            offset: 0,
            line_number: 0,
        }
    }

    /// Byte offset of the next unread line.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Delimiter byte this decoder splits on.
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Current line number (1-based, counting every physical line read).
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Overrides the decoder's notion of its stream position.
    ///
    /// Used by the query engine after seeking the underlying stream; the
    /// line number is meaningless past this point and resets to zero.
    pub fn set_offset(&mut self, offset: u64) {
        self.offset = offset;
        self.line_number = 0;
    }

    /// Reads the next physical line, returning `None` at end of stream.
    ///
    /// The trailing newline is stripped but counted into [`offset`].
    ///
    /// [`offset`]: FeatureDecoder::offset
    fn next_line(&mut self) -> Result<Option<&str>> {
        self.line_buf.clear();
        let read = self.reader.read_until(b'\n', &mut self.line_buf)?;
        if read == 0 {
            return Ok(None);
        }
        self.offset += read as u64;
        self.line_number += 1;

        let mut end = self.line_buf.len();
        if end > 0 && self.line_buf[end - 1] == b'\n' {
            end -= 1;
        }
        if end > 0 && self.line_buf[end - 1] == b'\r' {
            end -= 1;
        }
        let line = std::str::from_utf8(&self.line_buf[..end]).map_err(|e| {
            VartagError::FeatureFormat {
                line: self.line_number,
                msg: format!("line is not valid UTF-8: {}", e),
            }
        })?;
        Ok(Some(line))
    }

    /// Consumes consecutive `#` lines from the current position.
    ///
    /// Returns the header text (lines joined by `\n`, without trailing
    /// newline) and the byte offset immediately after the last header line.
    /// Must be called before any feature decoding; at any other position the
    /// result is simply empty.
    pub fn read_header(&mut self) -> Result<(String, u64)> {
        let mut header = String::new();
        loop {
            let is_header = {
                let buf = self.reader.fill_buf()?;
                buf.first() == Some(&b'#')
            };
            if !is_header {
                break;
            }
            // Unwrap is safe: fill_buf reported at least one byte.
            let line = self.next_line()?.unwrap_or_default();
            if !header.is_empty() {
                header.push('\n');
            }
            header.push_str(line);
        }
        Ok((header, self.offset))
    }

    /// Decodes the next feature, skipping blank and comment lines.
    ///
    /// Returns `None` only when no further non-comment line exists.
    ///
    /// # Errors
    ///
    /// Returns [`VartagError::FeatureFormat`] for malformed data lines and
    /// [`VartagError::Io`] for read failures.
    pub fn next_feature(&mut self) -> Result<Option<Feature>> {
        let delimiter = self.delimiter as char;
        loop {
            let (tokens, line_number) = {
                let line_number = self.line_number + 1;
                let line = match self.next_line()? {
                    Some(line) => line,
                    None => return Ok(None),
                };
                if line.is_empty() {
                    continue;
                }
                let tokens: Vec<String> =
                    line.split(delimiter).map(|s| s.to_string()).collect();
                (tokens, line_number)
            };
            // Comment line: first token starts with '#'. Skipped, not decoded.
            if tokens[0].starts_with('#') {
                continue;
            }
            return Ok(Some(Feature::from_tokens(tokens, line_number)?));
        }
    }
}

impl<R: BufRead + Seek> FeatureDecoder<R> {
    /// Seeks the underlying stream to `offset` and realigns the decoder's
    /// position tracking.
    pub fn seek(&mut self, offset: u64) -> Result<()> {
        self.reader.seek(SeekFrom::Start(offset))?;
        self.set_offset(offset);
        Ok(())
    }
}
