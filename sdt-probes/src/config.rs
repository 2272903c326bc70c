//! Load configuration
//!
//! Options that shape the encoder's diagnostics. None of them change the
//! bytes of an emitted record.

/// Formatting of the lexical-block dump
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FprintfConfig {
    /// Spaces per nesting level
    pub indent_width: usize,
    /// Prefix every tag with its DIE offset
    pub show_offsets: bool,
}

impl Default for FprintfConfig {
    fn default() -> Self {
        Self { indent_width: 4, show_offsets: false }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadConfig {
    /// Dump each encoded function's lexical-block tree after walking it
    pub print_lexblocks: bool,
    pub fprintf: FprintfConfig,
}
