//! CLI tool for codebook HTML to JSON conversion

use clap::Parser;
use codebook_extract::{process_codebook_file, write_records, ExtractOptions, PageRange};
use std::path::PathBuf;
use std::process;
use std::time::Instant;

/// Extract survey variables from a codebook rendered with
/// `pdf2txt.py codebook.pdf -o codebook.html --output_type html`.
#[derive(Parser, Debug)]
#[command(name = "cdbk2json")]
#[command(version, about, long_about = None)]
struct Args {
    /// HTML output of pdf2txt for the codebook
    input: PathBuf,

    /// Output JSON file
    #[arg(short, long, default_value = "survey_vars.json")]
    output: PathBuf,

    /// Debug logging, plus intermediate dumps written to --debug-dir
    #[arg(short, long)]
    debug: bool,

    /// Directory for the debug dumps
    #[arg(long, default_value = ".")]
    debug_dir: PathBuf,

    /// First data page
    #[arg(long, default_value_t = PageRange::default().start)]
    start_page: u32,

    /// Last data page (inclusive)
    #[arg(long, default_value_t = PageRange::default().end)]
    end_page: u32,
}

fn main() {
    let args = Args::parse();

    let level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Stderr)
        .init();

    let options = ExtractOptions {
        page_range: PageRange {
            start: args.start_page,
            end: args.end_page,
        },
        debug_dir: args.debug.then(|| args.debug_dir.clone()),
        ..ExtractOptions::default()
    };

    let start = Instant::now();
    let records = match process_codebook_file(&args.input, &options) {
        Ok(records) => records,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = write_records(&args.output, &records) {
        eprintln!("Error: failed to write {}: {}", args.output.display(), e);
        process::exit(1);
    }

    log::info!(
        "Wrote {} variables to {} in {}ms",
        records.len(),
        args.output.display(),
        start.elapsed().as_millis()
    );
}
