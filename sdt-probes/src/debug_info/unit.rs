//! Owned model of one compilation unit
//!
//! Functions live in a table, tags in an arena, and the tree between them is
//! kept as index lists. Everything is plain owned data, so a unit can be moved
//! to whichever worker thread encodes it.

use std::collections::HashMap;

use crate::domain::{DieOffset, DieRef, FunctionId, TagId};

/// A function (`DW_TAG_subprogram`) of a compilation unit
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    /// Entry address; 0 for declarations, abstract instances and anything not
    /// yet linked
    pub addr: u64,
    pub offset: DieOffset,
    /// Top-level tags of the function's lexical block, in DIE order
    pub lexblock: Vec<TagId>,
}

/// An inlined call: where the callee's body starts and which function it was
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlineExpansion {
    pub ip: u64,
    pub origin: DieRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagKind {
    FormalParameter { name: Option<String> },
    InlinedSubroutine(InlineExpansion),
    LexicalBlock,
    Variable { name: Option<String> },
    /// Any other DWARF tag, by its `DW_TAG_*` code
    Other(u16),
}

#[derive(Debug, Clone)]
pub struct Tag {
    pub offset: DieOffset,
    pub kind: TagKind,
    pub children: Vec<TagId>,
}

/// Where a new tag hangs in the tree
#[derive(Debug, Clone, Copy)]
pub enum TagParent {
    Function(FunctionId),
    Tag(TagId),
}

#[derive(Debug, Clone, Default)]
pub struct CompileUnit {
    name: String,
    functions: Vec<Function>,
    tags: Vec<Tag>,
    function_index: HashMap<DieOffset, FunctionId>,
}

impl CompileUnit {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Functions in table order, with their ids
    pub fn functions(&self) -> impl Iterator<Item = (FunctionId, &Function)> {
        self.functions.iter().enumerate().map(|(idx, func)| (FunctionId(idx), func))
    }

    /// # Panics
    /// If `id` was not handed out by this unit.
    #[must_use]
    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id.0]
    }

    /// # Panics
    /// If `id` was not handed out by this unit.
    #[must_use]
    pub fn tag(&self, id: TagId) -> &Tag {
        &self.tags[id.0]
    }

    #[must_use]
    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    #[must_use]
    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    /// Look up the function a DIE reference points at
    ///
    /// Only references to a subprogram DIE of this unit resolve.
    #[must_use]
    pub fn resolve(&self, origin: DieRef) -> Option<FunctionId> {
        match origin {
            DieRef::Unit(offset) => self.function_index.get(&offset).copied(),
            DieRef::Foreign(_) | DieRef::Missing => None,
        }
    }
}

/// Incremental construction of a [`CompileUnit`]
///
/// Used by the DWARF loader, and directly by tests to describe small units.
#[derive(Debug, Default)]
pub struct CompileUnitBuilder {
    unit: CompileUnit,
}

impl CompileUnitBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self { unit: CompileUnit { name: name.into(), ..CompileUnit::default() } }
    }

    /// Add a function; a later function at the same offset replaces the
    /// earlier one in the lookup index.
    pub fn function(&mut self, offset: DieOffset, name: impl Into<String>, addr: u64) -> FunctionId {
        let id = FunctionId(self.unit.functions.len());
        self.unit.functions.push(Function { name: name.into(), addr, offset, lexblock: Vec::new() });
        self.unit.function_index.insert(offset, id);
        id
    }

    pub fn tag(&mut self, parent: TagParent, offset: DieOffset, kind: TagKind) -> TagId {
        let id = TagId(self.unit.tags.len());
        self.unit.tags.push(Tag { offset, kind, children: Vec::new() });
        match parent {
            TagParent::Function(func) => self.unit.functions[func.0].lexblock.push(id),
            TagParent::Tag(tag) => self.unit.tags[tag.0].children.push(id),
        }
        id
    }

    /// Convenience for the common case of an inlined call
    pub fn inline_expansion(
        &mut self,
        parent: TagParent,
        offset: DieOffset,
        ip: u64,
        origin: DieOffset,
    ) -> TagId {
        let kind = TagKind::InlinedSubroutine(InlineExpansion { ip, origin: DieRef::Unit(origin) });
        self.tag(parent, offset, kind)
    }

    #[must_use]
    pub fn function_id(&self, offset: DieOffset) -> Option<FunctionId> {
        self.unit.function_index.get(&offset).copied()
    }

    #[must_use]
    pub fn function_name(&self, id: FunctionId) -> &str {
        &self.unit.functions[id.0].name
    }

    pub fn set_function_name(&mut self, id: FunctionId, name: impl Into<String>) {
        self.unit.functions[id.0].name = name.into();
    }

    #[must_use]
    pub fn build(self) -> CompileUnit {
        self.unit
    }
}
