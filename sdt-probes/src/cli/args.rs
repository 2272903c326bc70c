//! CLI argument definitions

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{FprintfConfig, LoadConfig};
use crate::session::{FailurePolicy, SessionOptions};

#[derive(Parser)]
#[command(
    name = "sdt-probes",
    version,
    about = "Emit SystemTap SDT probe notes for inlined calls found in DWARF",
    after_help = "\
EXAMPLES:
    sdt-probes encode ./myapp -o notes/            One note file per compilation unit
    sdt-probes encode ./myapp -o notes/ -j 8 -k    Eight threads, skip failing units
    sdt-probes dump notes/cu-0000.stapsdt --json   Decode an emitted file"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Encode the inlined calls of a binary into SDT notes
    Encode(EncodeArgs),
    /// Decode SDT note files and print their records
    Dump(DumpArgs),
}

#[derive(ClapArgs)]
pub struct EncodeArgs {
    /// Binary with DWARF debug info
    #[arg(value_name = "BINARY")]
    pub binary: PathBuf,

    /// Directory for the cu-NNNN.stapsdt files (created if missing)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Worker threads (default: available parallelism)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Keep encoding other units when one fails
    #[arg(short, long)]
    pub keep_going: bool,

    /// Log encoder diagnostics at info level
    #[arg(short, long)]
    pub verbose: bool,

    /// Dump each function's lexical-block tree
    #[arg(long)]
    pub print_lexblocks: bool,

    /// Indentation per level in the lexical-block dump
    #[arg(long, default_value = "4", value_name = "N")]
    pub indent: usize,

    /// Prefix every tag in the dump with its DIE offset
    #[arg(long)]
    pub show_offsets: bool,

    /// Do not read the symbol table for diagnostics
    #[arg(long)]
    pub no_symbols: bool,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}

impl EncodeArgs {
    #[must_use]
    pub fn load_config(&self) -> LoadConfig {
        LoadConfig {
            print_lexblocks: self.print_lexblocks,
            fprintf: FprintfConfig { indent_width: self.indent, show_offsets: self.show_offsets },
        }
    }

    #[must_use]
    pub fn session_options(&self) -> SessionOptions {
        let defaults = SessionOptions::default();
        SessionOptions {
            jobs: self.jobs.filter(|&jobs| jobs > 0).unwrap_or(defaults.jobs),
            policy: if self.keep_going { FailurePolicy::Skip } else { FailurePolicy::Abort },
            verbose: self.verbose,
        }
    }
}

#[derive(ClapArgs)]
pub struct DumpArgs {
    /// Note files written by `encode`
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Print records as JSON lines
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_args(argv: &[&str]) -> EncodeArgs {
        let args = Args::try_parse_from(argv).unwrap();
        match args.command {
            Command::Encode(encode) => encode,
            Command::Dump(_) => panic!("expected encode"),
        }
    }

    #[test]
    fn test_encode_defaults() {
        let args = encode_args(&["sdt-probes", "encode", "./app", "-o", "out"]);
        assert_eq!(args.binary, PathBuf::from("./app"));
        assert_eq!(args.load_config(), LoadConfig::default());

        let options = args.session_options();
        assert_eq!(options.policy, FailurePolicy::Abort);
        assert!(options.jobs >= 1);
        assert!(!options.verbose);
    }

    #[test]
    fn test_encode_flags() {
        let args = encode_args(&[
            "sdt-probes",
            "encode",
            "./app",
            "--output-dir",
            "out",
            "-j",
            "3",
            "--keep-going",
            "--print-lexblocks",
            "--indent",
            "2",
            "--show-offsets",
        ]);
        let conf = args.load_config();
        assert!(conf.print_lexblocks);
        assert_eq!(conf.fprintf, FprintfConfig { indent_width: 2, show_offsets: true });

        let options = args.session_options();
        assert_eq!(options.jobs, 3);
        assert_eq!(options.policy, FailurePolicy::Skip);
    }

    #[test]
    fn test_output_dir_required() {
        assert!(Args::try_parse_from(["sdt-probes", "encode", "./app"]).is_err());
    }

    #[test]
    fn test_dump_requires_file() {
        assert!(Args::try_parse_from(["sdt-probes", "dump"]).is_err());
        let args = Args::try_parse_from(["sdt-probes", "dump", "a", "b", "--json"]).unwrap();
        match args.command {
            Command::Dump(dump) => {
                assert_eq!(dump.files.len(), 2);
                assert!(dump.json);
            }
            Command::Encode(_) => panic!("expected dump"),
        }
    }
}
