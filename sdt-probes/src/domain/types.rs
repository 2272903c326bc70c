//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers keep the different kinds of indices apart: a
//! `TagId` indexes a unit's tag arena, a `FunctionId` its function table, and
//! a `DieOffset` is the DWARF offset a tag or function was read from.

use std::fmt;

/// Identity of a live encoder in an [`EncoderRegistry`]
///
/// Allocated from a monotonically increasing counter, so identities are never
/// reused within one registry.
///
/// [`EncoderRegistry`]: crate::encoder::EncoderRegistry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EncoderId(pub u64);

impl fmt::Display for EncoderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Encoder#{}", self.0)
    }
}

/// Index into a compilation unit's function table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(pub usize);

/// Index into a compilation unit's tag arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagId(pub usize);

/// Offset of a DIE relative to the start of its compilation unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DieOffset(pub usize);

impl fmt::Display for DieOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{:#x}>", self.0)
    }
}

/// Reference from one DIE to another
///
/// Inline expansions name their origin this way. `Unit` references resolve
/// through the unit's function table; `Foreign` references point into
/// `.debug_info` outside the unit and never resolve within it. `Missing`
/// stands for an expansion that carried no origin attribute at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DieRef {
    Unit(DieOffset),
    Foreign(u64),
    Missing,
}

impl fmt::Display for DieRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DieRef::Unit(offset) => write!(f, "{offset}"),
            DieRef::Foreign(offset) => write!(f, "<.debug_info+{offset:#x}>"),
            DieRef::Missing => f.write_str("<none>"),
        }
    }
}
