//! # sdt-probes - SystemTap SDT notes for inlined calls
//!
//! sdt-probes reads the DWARF debug info of a compiled binary and, for every
//! inlined call inside a linked function, emits a SystemTap SDT probe
//! descriptor (an ELF note owned by `"stapsdt"`, type 3). Tools that consume
//! SDT notes can then place probes on call sites that no longer exist as
//! separate functions.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  Binary with DWARF debug info                   │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ object + gimli
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  debug_info: CompileUnit (functions, tag arena), SymbolTable    │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ one unit per job
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    session (worker threads)                     │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐         │
//! │  │ ProbeEncoder │──▶│    walker    │──▶│ ProbeRecord  │         │
//! │  │  (per unit)  │   │ (tag trees)  │   │  (note fmt)  │         │
//! │  └──────┬───────┘   └──────────────┘   └──────┬───────┘         │
//! │         │ register / remove                   │                 │
//! │         ▼                                     ▼                 │
//! │  ┌──────────────┐                     ┌──────────────┐          │
//! │  │   Encoder    │                     │ cu-NNNN.     │          │
//! │  │   Registry   │                     │   stapsdt    │          │
//! │  └──────────────┘                     └──────────────┘          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`debug_info`]: DWARF front end
//!   - `loader`: ELF + DWARF sections into [`debug_info::CompileUnit`]s
//!   - `symbols`: demangled text symbols, used only for diagnostics
//!
//! - [`encoder`]: [`encoder::ProbeEncoder`] and the shared
//!   [`encoder::EncoderRegistry`] of live encoders
//!
//! - [`note`]: the SDT note format
//!   - `record`: one probe descriptor and its byte layout
//!   - `writer` / `reader`: little-endian serialization and parsing
//!
//! - [`session`]: parallel encoding of every unit in a binary
//!
//! - [`cli`], [`config`], [`preflight`]: command line, diagnostic options,
//!   input checks
//!
//! - [`domain`]: identifiers and error types
//!
//! ## Typical Usage
//!
//! ```bash
//! # One note file per compilation unit
//! ./sdt-probes encode ./myapp --output-dir notes/
//!
//! # Show what was emitted
//! ./sdt-probes dump notes/*.stapsdt
//! ```
//!
//! ## Key Concepts
//!
//! - **DIE**: Debugging Information Entry, one node of the DWARF tree
//! - **Inline expansion**: a `DW_TAG_inlined_subroutine` DIE, the body of a
//!   callee copied into its caller at address `ip`
//! - **Abstract origin**: the subprogram DIE an inline expansion came from;
//!   its name becomes the probe name

pub mod cli;
pub mod config;
pub mod debug_info;
pub mod domain;
pub mod encoder;
pub mod note;
pub mod preflight;
pub mod session;
