//! vartag command-line interface.
//!
//! ```bash
//! # Tag variants with the names of overlapping genes
//! vartag -b genes.bed -f '${4}' -t GENE input.vcf > tagged.vcf
//!
//! # Default template renders the overlapping interval itself
//! zcat calls.vcf.gz | vartag -b repeats.bed > tagged.vcf
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use vartag::annotate::{AnnotateConfig, Annotator, DEFAULT_TAG, DEFAULT_TEMPLATE};

#[derive(Parser)]
#[command(name = "vartag")]
#[command(about = "Annotate VCF variants with values from an indexed interval file")]
#[command(version)]
struct Cli {
    /// Input VCF file ('-' or absent reads stdin; .gz is decompressed)
    input: Option<PathBuf>,

    /// Interval file with chrom/start/end columns (tab-delimited by default)
    #[arg(short = 'b', long = "intervals")]
    intervals: PathBuf,

    /// Format template; ${n} is replaced with column n of the interval file
    #[arg(short, long, default_value = DEFAULT_TEMPLATE)]
    format: String,

    /// INFO key for the aggregated annotations
    #[arg(short, long, default_value = DEFAULT_TAG)]
    tag: String,

    /// Column delimiter of the interval file
    #[arg(short, long, default_value = "\t")]
    delimiter: char,

    /// Output VCF file (stdout when absent)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn open_input(path: Option<&PathBuf>) -> Result<Box<dyn BufRead>> {
    match path {
        None => Ok(Box::new(io::stdin().lock())),
        Some(path) if path.as_os_str() == "-" => Ok(Box::new(io::stdin().lock())),
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("cannot open input {}", path.display()))?;
            if path.extension().is_some_and(|ext| ext == "gz") {
                Ok(Box::new(BufReader::new(
                    flate2::read::MultiGzDecoder::new(file),
                )))
            } else {
                Ok(Box::new(BufReader::new(file)))
            }
        }
    }
}

fn open_output(path: Option<&PathBuf>) -> Result<Box<dyn Write>> {
    match path {
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create output {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    anyhow::ensure!(
        cli.delimiter.is_ascii(),
        "delimiter must be a single ASCII character"
    );

    let config = AnnotateConfig {
        interval_path: cli.intervals,
        template: cli.format,
        tag: cli.tag,
        delimiter: cli.delimiter as u8,
    };

    let annotator = Annotator::new(config).context("startup failed")?;
    let input = open_input(cli.input.as_ref())?;
    let output = open_output(cli.output.as_ref())?;

    let stats = annotator.annotate(input, output).context("annotation failed")?;
    log::info!(
        "wrote {} records, {} annotated",
        stats.records,
        stats.annotated
    );
    Ok(())
}
