//! Parse a concatenated note stream back into probe records
//!
//! Accepts exactly what [`ProbeRecord::write_to`] produces and applies the
//! same padding rule, so a stream written by one encoder reads back record
//! for record.

use sdt_probes_common::{
    desc_padding, NoteHeader, ADDRESS_FIELDS_SIZE, MIN_DESC_SIZE, NOTE_HEADER_SIZE,
    SDT_NOTE_NAME,
};

use super::record::ProbeRecord;
use crate::domain::NoteReadError;

/// Iterator over the probe notes in a byte stream
///
/// Stops after the first error.
pub struct NoteReader<'a> {
    data: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> NoteReader<'a> {
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0, failed: false }
    }

    /// Parse every note in `data`
    ///
    /// # Errors
    /// The first malformed note.
    pub fn read_all(data: &'a [u8]) -> Result<Vec<ProbeRecord>, NoteReadError> {
        Self::new(data).collect()
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], NoteReadError> {
        let available = self.data.len() - self.offset;
        if len > available {
            return Err(NoteReadError::Truncated { offset: self.offset, needed: len, available });
        }
        let bytes = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(bytes)
    }

    fn read_note(&mut self) -> Result<ProbeRecord, NoteReadError> {
        let start = self.offset;

        let header_bytes = self.take(NOTE_HEADER_SIZE)?;
        let header = NoteHeader {
            name_size: le_u32(&header_bytes[0..4]),
            desc_size: le_u32(&header_bytes[4..8]),
            note_type: le_u32(&header_bytes[8..12]),
        };

        let name = self.take(header.name_size as usize)?;
        if name != SDT_NOTE_NAME {
            return Err(NoteReadError::UnexpectedName { offset: start, name: name.to_vec() });
        }
        if !header.is_sdt() {
            return Err(NoteReadError::UnexpectedType { offset: start, note_type: header.note_type });
        }

        let desc_size = header.desc_size as usize;
        if desc_size < MIN_DESC_SIZE {
            return Err(NoteReadError::DescriptorTooShort { offset: start, desc_size });
        }
        let desc = self.take(desc_size)?;
        self.take(desc_padding(header.desc_size) as usize)?;

        let mut strings = Strings { rest: &desc[ADDRESS_FIELDS_SIZE..], offset: start };
        Ok(ProbeRecord {
            address: le_u64(&desc[0..8]),
            base_address: le_u64(&desc[8..16]),
            semaphore_address: le_u64(&desc[16..24]),
            provider: strings.next("provider")?,
            name: strings.next("name")?,
            arguments: strings.next("arguments")?,
        })
    }
}

impl Iterator for NoteReader<'_> {
    type Item = Result<ProbeRecord, NoteReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.data.len() {
            return None;
        }
        let result = self.read_note();
        self.failed = result.is_err();
        Some(result)
    }
}

/// Consecutive NUL-terminated strings inside one description
struct Strings<'a> {
    rest: &'a [u8],
    offset: usize,
}

impl Strings<'_> {
    fn next(&mut self, field: &'static str) -> Result<String, NoteReadError> {
        let end = self
            .rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(NoteReadError::Unterminated { offset: self.offset, field })?;
        let text = std::str::from_utf8(&self.rest[..end])
            .map_err(|_| NoteReadError::InvalidUtf8 { offset: self.offset, field })?;
        self.rest = &self.rest[end + 1..];
        Ok(text.to_string())
    }
}

fn le_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_le_bytes(buf)
}

fn le_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(records: &[ProbeRecord]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for record in records {
            record.write_to(&mut bytes).unwrap();
        }
        bytes
    }

    #[test]
    fn test_round_trip_several_records() {
        let records = vec![
            ProbeRecord::inline_expansion(0x1008, "foo"),
            ProbeRecord {
                address: 0x2000,
                base_address: 0x400,
                semaphore_address: 0x6010,
                provider: "app".to_string(),
                name: "request__start".to_string(),
                arguments: "-4@%edi 8@%rsi".to_string(),
            },
            ProbeRecord::inline_expansion(0x3000, "a"),
        ];

        let parsed = NoteReader::read_all(&stream(&records)).unwrap();
        assert_eq!(parsed, records);
    }

    #[test]
    fn test_empty_stream() {
        assert!(NoteReader::read_all(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_truncated_padding_is_an_error() {
        let mut bytes = stream(&[ProbeRecord::inline_expansion(0x1008, "foo")]);
        bytes.pop();

        let err = NoteReader::read_all(&bytes).unwrap_err();
        assert!(matches!(err, NoteReadError::Truncated { needed: 2, available: 1, .. }));
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let mut bytes = stream(&[ProbeRecord::inline_expansion(0x1008, "foo")]);
        bytes[8] = 1;

        let err = NoteReader::read_all(&bytes).unwrap_err();
        assert_eq!(err, NoteReadError::UnexpectedType { offset: 0, note_type: 1 });
    }

    #[test]
    fn test_wrong_owner_is_rejected() {
        let mut bytes = stream(&[ProbeRecord::inline_expansion(0x1008, "foo")]);
        bytes[12..20].copy_from_slice(b"GNU\0\0\0\0\0");

        let err = NoteReader::read_all(&bytes).unwrap_err();
        assert!(matches!(err, NoteReadError::UnexpectedName { offset: 0, .. }));
    }

    #[test]
    fn test_missing_terminator_is_rejected() {
        let mut bytes = stream(&[ProbeRecord::inline_expansion(0x1008, "foo")]);
        // arguments terminator is the last description byte (20 + 30 - 1)
        bytes[49] = b'x';

        let err = NoteReader::read_all(&bytes).unwrap_err();
        assert_eq!(err, NoteReadError::Unterminated { offset: 0, field: "arguments" });
    }

    #[test]
    fn test_reader_stops_after_error() {
        let mut reader = NoteReader::new(&[0u8; 5]);
        assert!(matches!(reader.next(), Some(Err(NoteReadError::Truncated { .. }))));
        assert!(reader.next().is_none());
    }
}
