//! # Debug-Info Front End
//!
//! The encoder walks compilation units; this module is where they come from.
//!
//! ## Model
//!
//! ```text
//! CompileUnit
//! ├── functions: [Function]          ← FunctionId indexes here
//! │     └── lexblock: [TagId]        top-level tags of the body
//! ├── tags: [Tag]                    ← TagId indexes here
//! │     └── children: [TagId]        nested blocks / inlined bodies
//! └── function_index: DieOffset → FunctionId
//! ```
//!
//! Inline expansions name their origin with a [`DieRef`]; resolving it is a
//! lookup in `function_index`. Nothing in the model points back into gimli,
//! so units outlive the DWARF sections they were read from.
//!
//! ## Module Structure
//!
//! - **`unit`**: the owned model and its builder
//! - **`loader`**: ELF + DWARF → units, via `object` and `gimli`
//! - **`symbols`**: address-sorted text symbols (the base symbol table)
//!
//! [`DieRef`]: crate::domain::DieRef

pub mod loader;
pub mod symbols;
pub mod unit;

pub use loader::{load_binary, LoadedBinary};
pub use symbols::{Symbol, SymbolTable};
pub use unit::{
    CompileUnit, CompileUnitBuilder, Function, InlineExpansion, Tag, TagKind, TagParent,
};
