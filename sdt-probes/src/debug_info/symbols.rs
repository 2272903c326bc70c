//! Text symbols of the input binary, for annotating probe sites
//!
//! Never influences record content; encoders only use it to say which symbol
//! a probe address falls into when logging.

use object::{Object, ObjectSymbol, SymbolKind};
use rustc_demangle::demangle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub address: u64,
    /// 0 when the symbol table did not record a size
    pub size: u64,
}

/// Address-sorted text symbols
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    /// Collect every defined text symbol of `obj`, demangled
    #[must_use]
    pub fn from_object(obj: &object::File<'_>) -> Self {
        let symbols = obj
            .symbols()
            .filter(|sym| sym.kind() == SymbolKind::Text && sym.address() != 0)
            .filter_map(|sym| {
                let name = sym.name().ok()?;
                Some(Symbol { name: demangle_symbol(name), address: sym.address(), size: sym.size() })
            })
            .collect();
        Self::from_symbols(symbols)
    }

    #[must_use]
    pub fn from_symbols(mut symbols: Vec<Symbol>) -> Self {
        symbols.sort_by_key(|sym| sym.address);
        Self { symbols }
    }

    /// Symbol containing `addr`
    ///
    /// A sized symbol covers `[address, address + size)`; an unsized one
    /// covers everything up to the next symbol.
    #[must_use]
    pub fn lookup(&self, addr: u64) -> Option<&Symbol> {
        let idx = self.symbols.partition_point(|sym| sym.address <= addr);
        let sym = self.symbols.get(idx.checked_sub(1)?)?;
        (sym.size == 0 || addr - sym.address < sym.size).then_some(sym)
    }

    /// `name+0xoff` for `addr`, if a symbol covers it
    #[must_use]
    pub fn describe(&self, addr: u64) -> Option<String> {
        self.lookup(addr).map(|sym| match addr - sym.address {
            0 => sym.name.clone(),
            off => format!("{}+{off:#x}", sym.name),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Demangle a Rust symbol name, leaving other names as they are
#[must_use]
pub fn demangle_symbol(symbol: &str) -> String {
    format!("{:#}", demangle(symbol))
}
