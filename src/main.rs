//! `label-sheets` command line front end.
//!
//! ```bash
//! label-sheets pedidos.xlsm                      # writes planilhas_geradas.zip
//! label-sheets pedidos.xlsm -o out.zip --preview 20
//! label-sheets pedidos.xlsm --json --quiet       # machine-readable summary on stdout
//! ```

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;
use label_sheets::columns::DATA_SHEET;
use label_sheets::observability::{
    CompositeObserver, FileObserver, PipelineObserver, StdErrObserver,
};
use label_sheets::output::{OutputFormat, OutputOptions, DEFAULT_ARCHIVE_NAME};
use label_sheets::pipeline::{ProcessOptions, ProcessOutput, ProcessRequest};
use label_sheets::processing::normalize::display_value;
use label_sheets::ProcessingError;

#[derive(Parser)]
#[command(
    name = "label-sheets",
    version,
    about = "Split an order workbook into one label spreadsheet per OF_NUMERO"
)]
struct Cli {
    /// Order workbook (.xlsm, .xlsx, .xls, .xlsb, .ods).
    #[arg(value_name = "INPUT")]
    input: PathBuf,
    /// Where to write the zip archive.
    #[arg(short, long, value_name = "ARCHIVE", default_value = DEFAULT_ARCHIVE_NAME)]
    output: PathBuf,
    /// Worksheet holding the order records.
    #[arg(long, value_name = "NAME", default_value = DATA_SHEET)]
    sheet: String,
    /// Format of the generated sheets.
    #[arg(long, value_name = "xls|xlsx", default_value = "xls", value_parser = parse_format)]
    format: OutputFormat,
    /// Write the generated sheets here instead of a fresh temp directory.
    #[arg(long = "scratch-dir", value_name = "DIR")]
    scratch_dir: Option<PathBuf>,
    /// Leave the generated sheets on disk after the archive is written.
    #[arg(long = "keep-scratch")]
    keep_scratch: bool,
    /// Print the first N expanded rows.
    #[arg(long, value_name = "N")]
    preview: Option<usize>,
    /// Print the run summary as JSON.
    #[arg(long)]
    json: bool,
    /// Append progress and outcome lines to this file.
    #[arg(long = "log-file", value_name = "PATH")]
    log_file: Option<PathBuf>,
    /// Do not report progress on stderr.
    #[arg(long)]
    quiet: bool,
}

fn parse_format(value: &str) -> Result<OutputFormat, String> {
    OutputFormat::from_extension(value.trim_start_matches('.'))
        .ok_or_else(|| format!("unknown format '{value}', expected xls or xlsx"))
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), ProcessingError> {
    let mut observers: Vec<Arc<dyn PipelineObserver>> = Vec::new();
    if !cli.quiet {
        observers.push(Arc::new(StdErrObserver));
    }
    if let Some(log) = &cli.log_file {
        observers.push(Arc::new(FileObserver::new(log)));
    }
    let observer: Option<Arc<dyn PipelineObserver>> = match observers.len() {
        0 => None,
        1 => observers.pop(),
        _ => Some(Arc::new(CompositeObserver::new(observers))),
    };

    let request = ProcessRequest {
        path: cli.input.clone(),
        options: ProcessOptions {
            input_sheet: cli.sheet.clone(),
            output: OutputOptions {
                format: cli.format,
                scratch_dir: cli.scratch_dir.clone(),
                ..Default::default()
            },
            observer,
            ..Default::default()
        },
    };

    let out = request.run()?;
    out.save_archive(&cli.output)?;
    if !cli.keep_scratch {
        out.remove_scratch()?;
    }

    if let Some(n) = cli.preview {
        print_preview(&out, n);
    }
    if cli.json {
        let json = serde_json::to_string_pretty(&out.summary)
            .map_err(|e| ProcessingError::Io(e.into()))?;
        println!("{json}");
    } else {
        print_summary(&out, cli);
    }
    Ok(())
}

fn print_summary(out: &ProcessOutput, cli: &Cli) {
    println!("Sheets generated: {}", out.summary.groups);
    println!("Total rows:       {}", out.summary.expanded_rows);
    println!("Distinct OF:      {}", out.artifacts.len());
    if out.summary.dropped_rows > 0 {
        println!("Without OF:       {} rows (not written)", out.summary.dropped_rows);
    }
    for artifact in &out.artifacts {
        println!("  {:<24} {:>8} rows", artifact.file_name, artifact.rows);
    }
    println!(
        "Archive:          {} ({} bytes)",
        cli.output.display(),
        out.summary.archive_bytes
    );
    if cli.keep_scratch {
        println!("Scratch:          {}", out.summary.scratch_dir.display());
    }
}

fn print_preview(out: &ProcessOutput, n: usize) {
    let header: Vec<&str> = out.expanded.schema.field_names().collect();
    println!("{}", header.join("\t"));
    for row in out.expanded.head(n).rows {
        let cells: Vec<String> = row.iter().map(display_value).collect();
        println!("{}", cells.join("\t"));
    }
}
