//! # SDT Probe Notes
//!
//! Byte-exact encoding of probe descriptors in the `stapsdt` ELF note
//! convention understood by `perf`, `bpftrace` and `systemtap`.
//!
//! - **`writer`**: little-endian integers, terminated strings and padding over
//!   any `std::io::Write`
//! - **`record`**: [`ProbeRecord`] and its note layout
//! - **`reader`**: [`NoteReader`], the inverse of `record`, used by `dump`
//!
//! The layout constants themselves live in `sdt-probes-common`.

pub mod reader;
pub mod record;
pub mod writer;

pub use reader::NoteReader;
pub use record::ProbeRecord;
pub use writer::NoteWriter;
