//! One encoder per compilation unit

use log::{debug, warn};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use super::diagnostics::Diagnostics;
use super::registry::EncoderRegistry;
use super::walker::CuWalker;
use crate::config::LoadConfig;
use crate::debug_info::{CompileUnit, SymbolTable};
use crate::domain::{EncodeError, EncoderId, FunctionId, TagId};
use crate::note::ProbeRecord;

/// Which inlined call a probe came from
///
/// Plain indices into the encoder's compilation unit; only meaningful
/// together with that unit, and never dereferenced after it is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlineExpansionRef {
    pub function: FunctionId,
    pub tag: TagId,
}

/// Writes the probe notes of one compilation unit to its own sink
///
/// Registered in the shared [`EncoderRegistry`] from construction until it is
/// dropped. Borrows the unit, so it cannot outlive it. Not meant to be shared
/// between threads: one owner drives it from start to finish.
pub struct ProbeEncoder<'cu, W: Write = BufWriter<File>> {
    id: EncoderId,
    unit: &'cu CompileUnit,
    sink: W,
    expansions: Vec<InlineExpansionRef>,
    base_symbols: Option<&'cu SymbolTable>,
    verbose: bool,
    probes_written: usize,
    registry: Arc<EncoderRegistry>,
}

impl<'cu> ProbeEncoder<'cu> {
    /// Create (or truncate) `output_target` and register a new encoder
    ///
    /// # Errors
    /// `EncodeError::Resource` if the file cannot be created; nothing is
    /// registered in that case.
    pub fn create(
        unit: &'cu CompileUnit,
        output_target: &Path,
        base_symbols: Option<&'cu SymbolTable>,
        verbose: bool,
        registry: Arc<EncoderRegistry>,
    ) -> Result<Self, EncodeError> {
        let file = File::create(output_target).map_err(|source| EncodeError::Resource {
            path: output_target.to_path_buf(),
            source,
        })?;
        Ok(Self::from_writer(unit, BufWriter::new(file), base_symbols, verbose, registry))
    }
}

impl<'cu, W: Write> ProbeEncoder<'cu, W> {
    /// Register a new encoder writing to an already open sink
    pub fn from_writer(
        unit: &'cu CompileUnit,
        sink: W,
        base_symbols: Option<&'cu SymbolTable>,
        verbose: bool,
        registry: Arc<EncoderRegistry>,
    ) -> Self {
        let id = registry.register(unit.name());
        debug!("{id} registered for {}", unit.name());
        Self {
            id,
            unit,
            sink,
            expansions: Vec::new(),
            base_symbols,
            verbose,
            probes_written: 0,
            registry,
        }
    }

    #[must_use]
    pub fn id(&self) -> EncoderId {
        self.id
    }

    /// Expansions recorded so far, in discovery order
    #[must_use]
    pub fn inline_expansions(&self) -> &[InlineExpansionRef] {
        &self.expansions
    }

    /// Records written over the encoder's whole life
    #[must_use]
    pub fn probes_written(&self) -> usize {
        self.probes_written
    }

    /// Write a probe note for every inlined call in the unit
    ///
    /// Returns the number of records this call wrote.
    ///
    /// # Errors
    /// The first `Resolution` or `Write` error. Records written before it
    /// stay in the sink, and the encoder remains usable.
    pub fn encode_cu(&mut self, conf: &LoadConfig) -> Result<usize, EncodeError> {
        let before = self.probes_written;
        let diag = Diagnostics::new(self.verbose, conf, self.base_symbols);

        let walked = CuWalker::new(self.unit, &diag).walk(|site| {
            self.expansions.push(InlineExpansionRef { function: site.function, tag: site.tag });
            ProbeRecord::inline_expansion(site.ip, site.origin.name.as_str()).write_to(&mut self.sink)?;
            self.probes_written += 1;
            Ok(())
        });
        let flushed = self.sink.flush();

        walked?;
        flushed?;
        Ok(self.probes_written - before)
    }

    /// Flush the sink and release the encoder
    ///
    /// # Errors
    /// If the final flush fails. The encoder is released either way.
    pub fn close(mut self) -> Result<(), EncodeError> {
        self.sink.flush()?;
        Ok(())
    }
}

impl<W: Write> Drop for ProbeEncoder<'_, W> {
    fn drop(&mut self) {
        if !self.registry.remove(self.id) {
            warn!("{} was already gone from the registry", self.id);
        }
        debug!(
            "{} released: {} probes, {} inline expansions",
            self.id,
            self.probes_written,
            self.expansions.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug_info::{CompileUnitBuilder, TagParent};
    use crate::domain::DieOffset;
    use crate::note::NoteReader;
    use std::io;

    fn single_call_unit() -> CompileUnit {
        let mut b = CompileUnitBuilder::new("a.c");
        b.function(DieOffset(0x10), "foo", 0);
        let main = b.function(DieOffset(0x20), "main", 0x1000);
        b.inline_expansion(TagParent::Function(main), DieOffset(0x30), 0x1008, DieOffset(0x10));
        b.build()
    }

    #[test]
    fn test_encode_single_inline_expansion() {
        let unit = single_call_unit();
        let registry = Arc::new(EncoderRegistry::new());
        let mut buf = Vec::new();

        let mut encoder = ProbeEncoder::from_writer(&unit, &mut buf, None, false, Arc::clone(&registry));
        assert!(registry.contains(encoder.id()));
        assert_eq!(encoder.encode_cu(&LoadConfig::default()).unwrap(), 1);
        assert_eq!(
            encoder.inline_expansions(),
            &[InlineExpansionRef { function: FunctionId(1), tag: TagId(0) }]
        );
        encoder.close().unwrap();
        assert!(registry.is_empty());

        let records = NoteReader::read_all(&buf).unwrap();
        assert_eq!(records, vec![ProbeRecord::inline_expansion(0x1008, "foo")]);
    }

    #[test]
    fn test_drop_deregisters() {
        let unit = single_call_unit();
        let registry = Arc::new(EncoderRegistry::new());
        {
            let _a = ProbeEncoder::from_writer(&unit, io::sink(), None, false, Arc::clone(&registry));
            let _b = ProbeEncoder::from_writer(&unit, io::sink(), None, false, Arc::clone(&registry));
            assert_eq!(registry.len(), 2);
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_create_failure_registers_nothing() {
        let unit = single_call_unit();
        let registry = Arc::new(EncoderRegistry::new());
        let result = ProbeEncoder::create(
            &unit,
            Path::new("/nonexistent-dir/for/sure/cu.stapsdt"),
            None,
            false,
            Arc::clone(&registry),
        );

        assert!(matches!(result, Err(EncodeError::Resource { .. })));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_write_error_keeps_encoder_usable() {
        struct Full;
        impl Write for Full {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "disk full"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let unit = single_call_unit();
        let registry = Arc::new(EncoderRegistry::new());
        let mut encoder = ProbeEncoder::from_writer(&unit, Full, None, false, Arc::clone(&registry));

        assert!(matches!(encoder.encode_cu(&LoadConfig::default()), Err(EncodeError::Write(_))));
        assert_eq!(encoder.probes_written(), 0);
        // The expansion was recorded before the write was attempted
        assert_eq!(encoder.inline_expansions().len(), 1);
        assert!(registry.contains(encoder.id()));

        drop(encoder);
        assert!(registry.is_empty());
    }
}
