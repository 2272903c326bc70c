//! Little-endian binary-structure writer
//!
//! Knows nothing about notes; it only lays out fixed-width integers,
//! terminated strings and padding over any [`Write`] sink and counts what it
//! wrote. Keeping it separate lets the note layout be checked against a plain
//! `Vec<u8>`.

use std::io::{self, Write};

pub struct NoteWriter<W: Write> {
    inner: W,
    written: u64,
}

impl<W: Write> NoteWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    pub fn write_u32(&mut self, value: u32) -> io::Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    pub fn write_u64(&mut self, value: u64) -> io::Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inner.write_all(bytes)?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    /// Write `text` followed by a NUL terminator
    ///
    /// # Errors
    /// `InvalidInput` if `text` contains a NUL byte, since the terminator
    /// would no longer mark its end.
    pub fn write_cstr(&mut self, text: &str) -> io::Result<()> {
        if text.as_bytes().contains(&0) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("string {text:?} contains a NUL byte"),
            ));
        }
        self.write_bytes(text.as_bytes())?;
        self.write_bytes(&[0])
    }

    pub fn write_zeros(&mut self, count: usize) -> io::Result<()> {
        const ZEROS: [u8; 8] = [0; 8];
        let mut remaining = count;
        while remaining > 0 {
            let chunk = remaining.min(ZEROS.len());
            self.write_bytes(&ZEROS[..chunk])?;
            remaining -= chunk;
        }
        Ok(())
    }

    /// Bytes successfully written since construction
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}
