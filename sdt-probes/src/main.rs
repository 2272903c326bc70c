//! # sdt-probes - Main Entry Point
//!
//! Two subcommands:
//! - **encode** (`sdt-probes encode <BINARY> -o <DIR>`): one note file per compilation unit
//! - **dump** (`sdt-probes dump <FILE>...`): decode note files, as text or JSON lines

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use serde::Serialize;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use sdt_probes::cli::{Args, Command, DumpArgs, EncodeArgs};
use sdt_probes::debug_info::load_binary;
use sdt_probes::encoder::EncoderRegistry;
use sdt_probes::note::{NoteReader, ProbeRecord};
use sdt_probes::preflight::run_preflight_checks;
use sdt_probes::session::{EncodingSession, FailurePolicy};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;
const EXIT_PARTIAL: i32 = 3;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(code) => code,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    let msg = err.to_string().to_lowercase();
    if msg.contains("binary not found") || msg.contains("not a file") {
        EXIT_USAGE
    } else {
        EXIT_ERROR
    }
}

fn run() -> Result<i32> {
    let args = Args::parse();
    match args.command {
        Command::Encode(encode_args) => encode(&encode_args),
        Command::Dump(dump_args) => {
            dump(&dump_args)?;
            Ok(EXIT_SUCCESS)
        }
    }
}

fn encode(args: &EncodeArgs) -> Result<i32> {
    let quiet = args.quiet;

    run_preflight_checks(&args.binary, &args.output_dir)?;

    if !quiet {
        println!("sdt-probes v{}", env!("CARGO_PKG_VERSION"));
        println!("binary: {}", args.binary.display());
        println!("output: {}", args.output_dir.display());
    }

    let loaded = load_binary(&args.binary)
        .with_context(|| format!("Failed to load debug info from {}", args.binary.display()))?;
    let symbols = (!args.no_symbols && !loaded.symbols.is_empty()).then_some(&loaded.symbols);
    info!("{} compilation units, {} text symbols", loaded.units.len(), loaded.symbols.len());

    let options = args.session_options();
    let policy = options.policy;
    let session =
        EncodingSession::new(Arc::new(EncoderRegistry::new()), args.load_config(), options);

    let started = Instant::now();
    let report = session.run(&loaded.units, &args.output_dir, symbols);

    for failure in &report.failures {
        eprintln!("error: unit {} ({}): {}", failure.index, failure.unit, failure.error);
    }

    if !quiet {
        println!(
            "{} probes from {} compilation units in {:.2}s ({} failed, {} skipped)",
            report.probes,
            report.outputs.len(),
            started.elapsed().as_secs_f64(),
            report.failures.len(),
            report.skipped()
        );
    }

    if report.is_success() {
        return Ok(EXIT_SUCCESS);
    }
    if policy == FailurePolicy::Skip {
        return Ok(EXIT_PARTIAL);
    }
    bail!(
        "Encoding aborted after {} failed unit(s)\n\n\
         Pass --keep-going to encode the remaining units anyway.",
        report.failures.len()
    )
}

#[derive(Serialize)]
struct DumpLine<'a> {
    file: &'a Path,
    #[serde(flatten)]
    record: &'a ProbeRecord,
}

fn dump(args: &DumpArgs) -> Result<()> {
    let mut out = BufWriter::new(std::io::stdout().lock());

    for path in &args.files {
        let data =
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

        for record in NoteReader::new(&data) {
            let record =
                record.with_context(|| format!("Malformed note file: {}", path.display()))?;
            if args.json {
                serde_json::to_writer(&mut out, &DumpLine { file: path, record: &record })?;
                writeln!(out)?;
            } else {
                writeln!(
                    out,
                    "{}: {:#x} {}:{} [{}]",
                    path.display(),
                    record.address,
                    record.provider,
                    record.name,
                    record.arguments
                )?;
            }
        }
    }

    out.flush()?;
    Ok(())
}
