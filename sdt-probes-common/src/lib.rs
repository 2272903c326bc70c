//! # Shared SDT Note Layout (Writer ↔ Reader)
//!
//! Defines the constants and fixed-size layout of a `stapsdt` ELF note, shared
//! between the encoder that writes probe notes and any reader that parses them
//! back. Everything here is plain data with no allocation so it can be used
//! from `no_std` consumers (for example a tracer that only needs the layout).
//!
//! ## Note Layout
//!
//! ```text
//! ┌──────────────┬──────────────┬──────────────┬──────────────────────┐
//! │ name_size u32│ desc_size u32│ note_type u32│ "stapsdt\0" (8 bytes)│  header
//! ├──────────────┴──────────────┴──────────────┴──────────────────────┤
//! │ address u64 │ base_address u64 │ semaphore_address u64            │  description
//! │ provider\0  │ name\0           │ arguments\0                      │
//! ├───────────────────────────────────────────────────────────────────┤
//! │ zero padding up to a 4-byte boundary (only if desc_size % 4 != 0) │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian.
//!
//! ## Key Items
//!
//! - [`SDT_NOTE_NAME`] / [`SDT_NOTE_TYPE`] - identify a note as an SDT probe
//! - [`NoteHeader`] - the three leading `u32` words
//! - [`desc_size`] / [`desc_padding`] - length and alignment rules

#![no_std]

// ============================================================================
// Note Identification
// ============================================================================

/// Note owner name, including its NUL terminator
///
/// Tracing tools (`perf`, `bpftrace`, `systemtap`) match on this owner
/// together with [`SDT_NOTE_TYPE`].
pub const SDT_NOTE_NAME: &[u8; 8] = b"stapsdt\0";

/// Value of the header's `name_size` field
///
/// Always the length of [`SDT_NOTE_NAME`] with its terminator.
#[allow(clippy::cast_possible_truncation)]
pub const SDT_NOTE_NAME_SIZE: u32 = SDT_NOTE_NAME.len() as u32;

/// Note type of an SDT probe descriptor (`NT_STAPSDT`)
pub const SDT_NOTE_TYPE: u32 = 3;

// ============================================================================
// Sizes and Alignment
// ============================================================================

/// Size of the three `u32` header words
pub const NOTE_HEADER_SIZE: usize = 12;

/// Size of the header plus the owner name
///
/// `SDT_NOTE_NAME` is already 4-byte aligned, so no padding follows it.
pub const NOTE_PREAMBLE_SIZE: usize = NOTE_HEADER_SIZE + SDT_NOTE_NAME.len();

/// Size of the three address fields at the start of the description
pub const ADDRESS_FIELDS_SIZE: usize = 8 + 8 + 8;

/// Smallest valid description: three addresses and three empty strings
pub const MIN_DESC_SIZE: usize = ADDRESS_FIELDS_SIZE + 3;

/// Alignment of the description's end
pub const NOTE_ALIGN: u32 = 4;

// ============================================================================
// Shared Data Structures
// ============================================================================

/// Leading words of an ELF note
///
/// **Memory Layout**: `#[repr(C)]` matches `Elf64_Nhdr` / `Elf32_Nhdr`, which
/// share the same three 32-bit words.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteHeader {
    /// Length of the owner name including its terminator
    pub name_size: u32,

    /// Length of the description, excluding trailing padding
    pub desc_size: u32,

    /// Note type ([`SDT_NOTE_TYPE`] for probe descriptors)
    pub note_type: u32,
}

impl NoteHeader {
    /// Header for an SDT probe note with a description of `desc_size` bytes
    #[must_use]
    pub const fn sdt(desc_size: u32) -> Self {
        Self { name_size: SDT_NOTE_NAME_SIZE, desc_size, note_type: SDT_NOTE_TYPE }
    }

    /// Whether the owner size and type identify an SDT probe note
    #[must_use]
    pub const fn is_sdt(&self) -> bool {
        self.name_size == SDT_NOTE_NAME_SIZE && self.note_type == SDT_NOTE_TYPE
    }
}

/// Description length for the given string lengths (in bytes, without
/// terminators)
///
/// `8 + 8 + 8 + provider + 1 + name + 1 + arguments + 1`
#[must_use]
pub const fn desc_size(provider_len: usize, name_len: usize, arguments_len: usize) -> usize {
    ADDRESS_FIELDS_SIZE + provider_len + 1 + name_len + 1 + arguments_len + 1
}

/// Number of zero bytes written after a description of `desc_size` bytes
///
/// `4 - (desc_size % 4)` when the remainder is non-zero, otherwise 0. An
/// already aligned description is never followed by a full 4-byte pad.
#[must_use]
pub const fn desc_padding(desc_size: u32) -> u32 {
    let padding = NOTE_ALIGN - (desc_size % NOTE_ALIGN);
    if padding == NOTE_ALIGN {
        0
    } else {
        padding
    }
}
