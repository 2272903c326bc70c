//! DWARF front end: ELF file → [`CompileUnit`]s
//!
//! Sections are loaded the same way the rest of the toolchain does it
//! (`object` for the container, `gimli` over `EndianRcSlice`), then every
//! unit's DIE tree is walked once and copied into the owned model. The gimli
//! readers are `!Send` but the resulting units are `Send`, so the session can
//! hand them to worker threads.

use gimli::{AttributeValue, EndianRcSlice, Reader, RunTimeEndian};
use log::{debug, info};
use object::{Object, ObjectSection};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use super::symbols::{demangle_symbol, SymbolTable};
use super::unit::{CompileUnit, CompileUnitBuilder, InlineExpansion, TagKind, TagParent};
use crate::domain::{DieOffset, DieRef, FunctionId, LoadError};

type DwarfReader = EndianRcSlice<RunTimeEndian>;
type Entry<'abbrev, 'unit> = gimli::DebuggingInformationEntry<'abbrev, 'unit, DwarfReader>;

/// Longest `DW_AT_specification` / `DW_AT_abstract_origin` chain followed
/// when looking for a function's name
const MAX_NAME_HOPS: usize = 8;

/// Everything the encoder needs from one binary
#[derive(Debug)]
pub struct LoadedBinary {
    pub units: Vec<CompileUnit>,
    pub symbols: SymbolTable,
}

/// Read `path` and convert all of its compilation units
///
/// # Errors
/// If the file cannot be read or parsed, has no `.debug_info`, or its DWARF
/// is malformed.
pub fn load_binary(path: &Path) -> Result<LoadedBinary, LoadError> {
    let data = fs::read(path).map_err(|source| LoadError::Io { path: path.to_path_buf(), source })?;
    let obj = object::File::parse(&*data)?;

    if !obj.section_by_name(".debug_info").is_some_and(|s| s.size() > 0) {
        return Err(LoadError::MissingDebugInfo(path.to_path_buf()));
    }

    let endian = if obj.is_little_endian() { RunTimeEndian::Little } else { RunTimeEndian::Big };

    let load_section = |id: gimli::SectionId| -> Result<DwarfReader, gimli::Error> {
        let data = obj
            .section_by_name(id.name())
            .and_then(|section| section.uncompressed_data().ok())
            .unwrap_or(std::borrow::Cow::Borrowed(&[][..]));
        Ok(EndianRcSlice::new(Rc::from(&*data), endian))
    };

    let dwarf = gimli::Dwarf::load(&load_section)?;
    let units = load_units(&dwarf)?;

    let symbols = SymbolTable::from_object(&obj);
    info!("{}: {} compilation units, {} text symbols", path.display(), units.len(), symbols.len());

    Ok(LoadedBinary { units, symbols })
}

/// Convert every unit of already loaded DWARF sections
fn load_units(dwarf: &gimli::Dwarf<DwarfReader>) -> Result<Vec<CompileUnit>, gimli::Error> {
    let mut units = Vec::new();
    let mut headers = dwarf.units();
    while let Some(header) = headers.next()? {
        let unit = dwarf.unit(header)?;
        let loaded = UnitLoader::new(dwarf, &unit).load()?;
        debug!(
            "Loaded unit {}: {} functions, {} tags",
            loaded.name(),
            loaded.function_count(),
            loaded.tag_count()
        );
        units.push(loaded);
    }
    Ok(units)
}

/// Where the walk currently is relative to the nearest enclosing function
#[derive(Clone, Copy)]
enum Scope {
    Outside,
    Inside(TagParent),
}

struct UnitLoader<'a> {
    dwarf: &'a gimli::Dwarf<DwarfReader>,
    unit: &'a gimli::Unit<DwarfReader>,
    builder: CompileUnitBuilder,
    /// Functions without a name of their own, and the DIE to take it from
    borrowed_names: HashMap<FunctionId, DieOffset>,
}

impl<'a> UnitLoader<'a> {
    fn new(dwarf: &'a gimli::Dwarf<DwarfReader>, unit: &'a gimli::Unit<DwarfReader>) -> Self {
        let name = unit
            .name
            .as_ref()
            .and_then(|name| name.to_string_lossy().ok().map(|s| s.into_owned()))
            .unwrap_or_else(|| "<unnamed unit>".to_string());
        Self { dwarf, unit, builder: CompileUnitBuilder::new(name), borrowed_names: HashMap::new() }
    }

    fn load(mut self) -> Result<CompileUnit, gimli::Error> {
        let mut tree = self.unit.entries_tree(None)?;
        let root = tree.root()?;
        self.walk(root, Scope::Outside)?;
        self.fill_borrowed_names();
        Ok(self.builder.build())
    }

    fn walk(
        &mut self,
        node: gimli::EntriesTreeNode<'_, '_, '_, DwarfReader>,
        scope: Scope,
    ) -> Result<(), gimli::Error> {
        let entry = node.entry();
        let offset = DieOffset(entry.offset().0);

        let inner = if entry.tag() == gimli::DW_TAG_subprogram {
            Scope::Inside(TagParent::Function(self.function(entry, offset)?))
        } else if let Scope::Inside(parent) = scope {
            let kind = self.tag_kind(entry)?;
            Scope::Inside(TagParent::Tag(self.builder.tag(parent, offset, kind)))
        } else {
            scope
        };

        let mut children = node.children();
        while let Some(child) = children.next()? {
            self.walk(child, inner)?;
        }
        Ok(())
    }

    fn function(&mut self, entry: &Entry<'_, '_>, offset: DieOffset) -> Result<FunctionId, gimli::Error> {
        let addr = match self.address(entry, gimli::DW_AT_low_pc)? {
            Some(addr) => addr,
            None => self.lowest_range_begin(entry)?.unwrap_or(0),
        };

        let name = match self.string(entry, gimli::DW_AT_name)? {
            Some(name) => Some(name),
            None => self.string(entry, gimli::DW_AT_linkage_name)?.map(|n| demangle_symbol(&n)),
        };

        let id = self.builder.function(offset, name.clone().unwrap_or_default(), addr);
        if name.is_none() {
            let target = self
                .unit_ref(entry, gimli::DW_AT_specification)?
                .or(self.unit_ref(entry, gimli::DW_AT_abstract_origin)?);
            if let Some(DieRef::Unit(target)) = target {
                self.borrowed_names.insert(id, target);
            }
        }
        Ok(id)
    }

    fn tag_kind(&self, entry: &Entry<'_, '_>) -> Result<TagKind, gimli::Error> {
        Ok(match entry.tag() {
            gimli::DW_TAG_formal_parameter => {
                TagKind::FormalParameter { name: self.string(entry, gimli::DW_AT_name)? }
            }
            gimli::DW_TAG_variable => TagKind::Variable { name: self.string(entry, gimli::DW_AT_name)? },
            gimli::DW_TAG_lexical_block => TagKind::LexicalBlock,
            gimli::DW_TAG_inlined_subroutine => TagKind::InlinedSubroutine(InlineExpansion {
                ip: self.expansion_ip(entry)?,
                origin: self.unit_ref(entry, gimli::DW_AT_abstract_origin)?.unwrap_or(DieRef::Missing),
            }),
            other => TagKind::Other(other.0),
        })
    }

    /// `DW_AT_low_pc`, else `DW_AT_entry_pc`, else the start of the first
    /// `DW_AT_ranges` entry
    fn expansion_ip(&self, entry: &Entry<'_, '_>) -> Result<u64, gimli::Error> {
        if let Some(addr) = self.address(entry, gimli::DW_AT_low_pc)? {
            return Ok(addr);
        }
        if let Some(addr) = self.address(entry, gimli::DW_AT_entry_pc)? {
            return Ok(addr);
        }
        let mut ranges = self.dwarf.die_ranges(self.unit, entry)?;
        Ok(ranges.next()?.map_or(0, |range| range.begin))
    }

    /// Functions split into hot and cold parts carry `DW_AT_ranges` instead
    /// of `DW_AT_low_pc`
    fn lowest_range_begin(&self, entry: &Entry<'_, '_>) -> Result<Option<u64>, gimli::Error> {
        let mut ranges = self.dwarf.die_ranges(self.unit, entry)?;
        let mut lowest: Option<u64> = None;
        while let Some(range) = ranges.next()? {
            lowest = Some(lowest.map_or(range.begin, |low| low.min(range.begin)));
        }
        Ok(lowest)
    }

    fn address(&self, entry: &Entry<'_, '_>, attr: gimli::DwAt) -> Result<Option<u64>, gimli::Error> {
        match entry.attr_value(attr)? {
            Some(value) => self.dwarf.attr_address(self.unit, value),
            None => Ok(None),
        }
    }

    fn string(&self, entry: &Entry<'_, '_>, attr: gimli::DwAt) -> Result<Option<String>, gimli::Error> {
        let Some(value) = entry.attr_value(attr)? else {
            return Ok(None);
        };
        let raw = self.dwarf.attr_string(self.unit, value)?;
        let text = raw.to_string_lossy()?.into_owned();
        Ok(Some(text))
    }

    fn unit_ref(&self, entry: &Entry<'_, '_>, attr: gimli::DwAt) -> Result<Option<DieRef>, gimli::Error> {
        Ok(match entry.attr_value(attr)? {
            Some(AttributeValue::UnitRef(offset)) => Some(DieRef::Unit(DieOffset(offset.0))),
            Some(AttributeValue::DebugInfoRef(offset)) => {
                Some(match offset.to_unit_offset(&self.unit.header) {
                    Some(local) => DieRef::Unit(DieOffset(local.0)),
                    None => DieRef::Foreign(offset.0 as u64),
                })
            }
            _ => None,
        })
    }

    fn fill_borrowed_names(&mut self) {
        let pending: Vec<_> = self.borrowed_names.iter().map(|(id, target)| (*id, *target)).collect();
        for (id, mut target) in pending {
            for _ in 0..MAX_NAME_HOPS {
                let Some(source) = self.builder.function_id(target) else {
                    break;
                };
                let name = self.builder.function_name(source);
                if !name.is_empty() {
                    let name = name.to_string();
                    self.builder.set_function_name(id, name);
                    break;
                }
                match self.borrowed_names.get(&source) {
                    Some(next) => target = *next,
                    None => break,
                }
            }
        }
    }
}
