//! Encoder diagnostics
//!
//! What the encoder says while walking a unit. Goes to the `log` facade at
//! `Info` for verbose encoders and `Debug` otherwise.

use log::{log, log_enabled, Level};
use std::fmt::Write as _;

use crate::config::{FprintfConfig, LoadConfig};
use crate::debug_info::{CompileUnit, Function, SymbolTable, TagKind};
use crate::domain::TagId;

pub(crate) struct Diagnostics<'a> {
    level: Level,
    conf: &'a LoadConfig,
    symbols: Option<&'a SymbolTable>,
}

impl<'a> Diagnostics<'a> {
    pub(crate) fn new(verbose: bool, conf: &'a LoadConfig, symbols: Option<&'a SymbolTable>) -> Self {
        let level = if verbose { Level::Info } else { Level::Debug };
        Self { level, conf, symbols }
    }

    pub(crate) fn function(&self, func: &Function) {
        log!(self.level, "{} @{:#x}", func.name, func.addr);
    }

    pub(crate) fn parameter(&self, name: Option<&str>) {
        log!(self.level, "  param: {}", name.unwrap_or("<unnamed>"));
    }

    pub(crate) fn inlined(&self, origin: &str, ip: u64) {
        match self.symbols.and_then(|symbols| symbols.describe(ip)) {
            Some(site) => log!(self.level, "  inlined: {origin} at {site}"),
            None => log!(self.level, "  inlined: {origin}"),
        }
    }

    pub(crate) fn lexblock(&self, unit: &CompileUnit, func: &Function) {
        if !self.conf.print_lexblocks || !log_enabled!(self.level) {
            return;
        }
        for line in render_lexblock(unit, func, &self.conf.fprintf).lines() {
            log!(self.level, "{line}");
        }
    }
}

/// Render a function's lexical-block tree as indented text
///
/// ```text
/// main() {
///     param argc
///     inline foo @0x1008 {
///         param x
///     }
/// }
/// ```
#[must_use]
pub fn render_lexblock(unit: &CompileUnit, func: &Function, conf: &FprintfConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}{}() {{", offset_prefix(conf, func.offset.0), func.name);
    for &tag in &func.lexblock {
        render_tag(&mut out, unit, tag, 1, conf);
    }
    out.push('}');
    out
}

fn render_tag(out: &mut String, unit: &CompileUnit, id: TagId, depth: usize, conf: &FprintfConfig) {
    let tag = unit.tag(id);
    let indent = " ".repeat(depth * conf.indent_width);
    let prefix = offset_prefix(conf, tag.offset.0);

    let opens = match &tag.kind {
        TagKind::FormalParameter { name } => {
            let _ = writeln!(out, "{indent}{prefix}param {}", name.as_deref().unwrap_or("<unnamed>"));
            false
        }
        TagKind::Variable { name } => {
            let _ = writeln!(out, "{indent}{prefix}var {}", name.as_deref().unwrap_or("<unnamed>"));
            false
        }
        TagKind::LexicalBlock => {
            let _ = writeln!(out, "{indent}{prefix}{{");
            true
        }
        TagKind::InlinedSubroutine(exp) => {
            let origin = match unit.resolve(exp.origin) {
                Some(origin) => unit.function(origin).name.clone(),
                None => exp.origin.to_string(),
            };
            let _ = writeln!(out, "{indent}{prefix}inline {origin} @{:#x} {{", exp.ip);
            true
        }
        TagKind::Other(code) => {
            let _ = writeln!(out, "{indent}{prefix}{}", gimli::DwTag(*code));
            false
        }
    };

    for &child in &tag.children {
        render_tag(out, unit, child, depth + 1, conf);
    }
    if opens {
        let _ = writeln!(out, "{indent}}}");
    }
}

fn offset_prefix(conf: &FprintfConfig, offset: usize) -> String {
    if conf.show_offsets {
        format!("<{offset:#x}> ")
    } else {
        String::new()
    }
}
