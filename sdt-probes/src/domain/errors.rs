//! Structured error types for sdt-probes
//!
//! Using thiserror for automatic Display implementation and error chaining.

use super::types::DieRef;
use std::path::PathBuf;
use thiserror::Error;

/// Failures of a single encoder
///
/// None of these are retried. An encoder that returned one from
/// `encode_cu` is still valid and still has to be dropped by its owner.
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Failed to create probe output {}: {source}", .path.display())]
    Resource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot resolve origin {origin} of inlined call at {ip:#x} in {function}")]
    Resolution { function: String, ip: u64, origin: DieRef },

    #[error("Failed to write probe record: {0}")]
    Write(#[from] std::io::Error),
}

/// Failures of the DWARF front end
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No DWARF debug info in {}", .0.display())]
    MissingDebugInfo(PathBuf),

    #[error(transparent)]
    Object(#[from] object::Error),

    #[error(transparent)]
    Dwarf(#[from] gimli::Error),
}

/// Failures while parsing a note stream back into probe records
#[derive(Error, Debug, PartialEq, Eq)]
pub enum NoteReadError {
    #[error("Truncated note at offset {offset}: need {needed} bytes, {available} left")]
    Truncated { offset: usize, needed: usize, available: usize },

    #[error("Note at offset {offset} is not an SDT note (owner {name:?})")]
    UnexpectedName { offset: usize, name: Vec<u8> },

    #[error("Note at offset {offset} has type {note_type}, expected 3")]
    UnexpectedType { offset: usize, note_type: u32 },

    #[error("Note at offset {offset} has a {desc_size}-byte description, too short for a probe")]
    DescriptorTooShort { offset: usize, desc_size: usize },

    #[error("Unterminated {field} in note at offset {offset}")]
    Unterminated { offset: usize, field: &'static str },

    #[error("{field} in note at offset {offset} is not valid UTF-8")]
    InvalidUtf8 { offset: usize, field: &'static str },
}
