//! One SDT probe and its note encoding

use sdt_probes_common::{
    desc_padding, desc_size, NoteHeader, NOTE_PREAMBLE_SIZE, SDT_NOTE_NAME,
};
use serde::Serialize;
use std::io::{self, Write};

use super::writer::NoteWriter;

/// A probe descriptor as carried in a `stapsdt` note
///
/// `provider`, `name` and `arguments` are measured in encoded bytes, not
/// characters, and must not contain NUL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeRecord {
    /// Instruction address of the probe site
    pub address: u64,
    /// Reference address for relocation (0 if unused)
    pub base_address: u64,
    /// Address of the enable/disable semaphore (0 if unused)
    pub semaphore_address: u64,
    pub provider: String,
    pub name: String,
    pub arguments: String,
}

impl ProbeRecord {
    /// Probe for an inline expansion: no provider, no arguments, no semaphore
    pub fn inline_expansion(ip: u64, origin_name: impl Into<String>) -> Self {
        Self {
            address: ip,
            base_address: 0,
            semaphore_address: 0,
            provider: String::new(),
            name: origin_name.into(),
            arguments: String::new(),
        }
    }

    /// Value of the note's `desc_size` field
    #[must_use]
    pub fn desc_size(&self) -> usize {
        desc_size(self.provider.len(), self.name.len(), self.arguments.len())
    }

    /// Total bytes this record occupies in a note stream, padding included
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        let desc = self.desc_size();
        // desc_padding only looks at desc % 4, so truncation cannot change it
        #[allow(clippy::cast_possible_truncation)]
        let padding = desc_padding(desc as u32) as usize;
        NOTE_PREAMBLE_SIZE + desc + padding
    }

    /// Serialize the record as one note
    ///
    /// # Errors
    /// Any sink error, or `InvalidInput` if a string contains NUL or the
    /// description does not fit the 32-bit size field. Input errors are
    /// caught before the first byte is written; on a sink error, bytes
    /// already handed to the sink stay there.
    pub fn write_to<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        for (field, text) in
            [("provider", &self.provider), ("name", &self.name), ("arguments", &self.arguments)]
        {
            if text.as_bytes().contains(&0) {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("probe {field} {text:?} contains a NUL byte"),
                ));
            }
        }
        let desc_size = u32::try_from(self.desc_size()).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "probe description exceeds 4 GiB")
        })?;
        let header = NoteHeader::sdt(desc_size);

        let mut writer = NoteWriter::new(sink);
        writer.write_u32(header.name_size)?;
        writer.write_u32(header.desc_size)?;
        writer.write_u32(header.note_type)?;
        writer.write_bytes(SDT_NOTE_NAME)?;

        writer.write_u64(self.address)?;
        writer.write_u64(self.base_address)?;
        writer.write_u64(self.semaphore_address)?;
        writer.write_cstr(&self.provider)?;
        writer.write_cstr(&self.name)?;
        writer.write_cstr(&self.arguments)?;

        writer.write_zeros(desc_padding(desc_size) as usize)
    }

    /// Serialize into a fresh buffer
    ///
    /// # Errors
    /// Same input checks as [`ProbeRecord::write_to`].
    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut bytes)?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(provider: &str, name: &str, arguments: &str) -> ProbeRecord {
        ProbeRecord {
            address: 0x1008,
            base_address: 0,
            semaphore_address: 0,
            provider: provider.to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }

    fn u32_at(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    }

    #[test]
    fn test_inline_expansion_layout() {
        let bytes = ProbeRecord::inline_expansion(0x1008, "foo").to_bytes().unwrap();

        assert_eq!(u32_at(&bytes, 0), 8);
        assert_eq!(u32_at(&bytes, 4), 30);
        assert_eq!(u32_at(&bytes, 8), 3);
        assert_eq!(&bytes[12..20], b"stapsdt\0");
        assert_eq!(&bytes[20..28], &0x1008u64.to_le_bytes());
        assert_eq!(&bytes[28..44], &[0; 16]);
        assert_eq!(&bytes[44..50], b"\0foo\0\0");
        // desc 30 → 2 padding bytes
        assert_eq!(&bytes[50..], &[0, 0]);
        assert_eq!(bytes.len(), 52);
    }

    #[test]
    fn test_desc_size_counts_bytes_not_chars() {
        let probe = record("", "héllo", "");
        assert_eq!(probe.desc_size(), 24 + 1 + 6 + 1 + 1);
    }

    #[test]
    fn test_no_padding_when_aligned() {
        // 24 + 1 + 2 + 1 = 28
        let aligned = record("", "a", "");
        assert_eq!(aligned.desc_size() % 4, 0);
        let bytes = aligned.to_bytes().unwrap();
        assert_eq!(bytes.len(), NOTE_PREAMBLE_SIZE + 28);
        assert_eq!(bytes.len(), aligned.encoded_len());
    }

    #[test]
    fn test_padding_for_each_remainder() {
        for (name, padding) in [("ab", 3), ("abc", 2), ("abcd", 1), ("abcde", 0)] {
            let probe = record("", name, "");
            let bytes = probe.to_bytes().unwrap();
            assert_eq!(
                bytes.len(),
                NOTE_PREAMBLE_SIZE + probe.desc_size() + padding,
                "name {name:?}"
            );
            assert!(bytes[NOTE_PREAMBLE_SIZE + probe.desc_size()..].iter().all(|&b| b == 0));
            assert_eq!(bytes.len() % 4, 0);
        }
    }

    #[test]
    fn test_all_fields_written_in_order() {
        let probe = ProbeRecord {
            address: 1,
            base_address: 2,
            semaphore_address: 3,
            provider: "libc".to_string(),
            name: "setjmp".to_string(),
            arguments: "8@%rdi".to_string(),
        };
        let bytes = probe.to_bytes().unwrap();
        assert_eq!(&bytes[28..36], &2u64.to_le_bytes());
        assert_eq!(&bytes[36..44], &3u64.to_le_bytes());
        assert_eq!(&bytes[44..63], b"libc\0setjmp\08@%rdi\0");
    }

    #[test]
    fn test_nul_in_name_is_rejected() {
        let err = record("", "a\0b", "").to_bytes().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_rejected_record_writes_nothing() {
        let mut stream = record("", "good", "").to_bytes().unwrap();
        let before = stream.len();

        for bad in [record("p\0", "x", ""), record("", "x", "a\0")] {
            let err = bad.write_to(&mut stream).unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        }
        assert_eq!(stream.len(), before);

        // The stream still parses, and later records append cleanly
        record("", "next", "").write_to(&mut stream).unwrap();
        let names: Vec<_> = crate::note::NoteReader::read_all(&stream)
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["good", "next"]);
    }
}
