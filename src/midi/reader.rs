//! Bounds-checked byte reading for the binary event stream
//!
//! All container integers are big-endian. Delta times and meta/sysex
//! lengths use the format's variable-length quantity: 7 data bits per
//! byte, high bit set on every byte except the last.

use crate::{HarmoniumError, Result};

/// Longest legal variable-length quantity (4 bytes = 28 data bits)
pub const VLQ_MAX_BYTES: usize = 4;

/// Cursor over an in-memory byte stream with offset-carrying errors.
///
/// Every read checks the remaining length first; running past the end is a
/// [`HarmoniumError::Truncated`] that names the offending offset.
#[derive(Debug)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Wrap a byte slice, starting at offset 0
    pub fn new(data: &'a [u8]) -> Self {
        ByteReader { data, pos: 0 }
    }

    /// Current offset into the stream
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Total stream length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Number of unread bytes
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Whether the cursor has reached the end of the stream
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn check(&self, needed: usize) -> Result<()> {
        if self.remaining() < needed {
            return Err(HarmoniumError::Truncated(format!(
                "need {} byte(s) at offset {}, only {} available",
                needed,
                self.pos,
                self.remaining()
            )));
        }
        Ok(())
    }

    /// Read the next byte without consuming it
    pub fn peek_u8(&self) -> Result<u8> {
        self.check(1)?;
        Ok(self.data[self.pos])
    }

    /// Read one byte
    pub fn read_u8(&mut self) -> Result<u8> {
        self.check(1)?;
        let b = self.data[self.pos];
        self.pos += 1;
        Ok(b)
    }

    /// Read a big-endian 16-bit integer
    pub fn read_u16_be(&mut self) -> Result<u16> {
        self.check(2)?;
        let v = u16::from_be_bytes([self.data[self.pos], self.data[self.pos + 1]]);
        self.pos += 2;
        Ok(v)
    }

    /// Read a big-endian 32-bit integer
    pub fn read_u32_be(&mut self) -> Result<u32> {
        self.check(4)?;
        let v = u32::from_be_bytes([
            self.data[self.pos],
            self.data[self.pos + 1],
            self.data[self.pos + 2],
            self.data[self.pos + 3],
        ]);
        self.pos += 4;
        Ok(v)
    }

    /// Read `n` bytes as a slice of the underlying stream
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.check(n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Skip `n` bytes
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.check(n)?;
        self.pos += n;
        Ok(())
    }

    /// Decode a variable-length quantity.
    ///
    /// Accumulates 7 bits per byte, big-endian, stopping at the first byte
    /// with the high bit clear. More than [`VLQ_MAX_BYTES`] continuation
    /// bytes is a format error.
    pub fn read_vlq(&mut self) -> Result<u32> {
        let start = self.pos;
        let mut value: u32 = 0;
        loop {
            if self.pos - start >= VLQ_MAX_BYTES {
                return Err(HarmoniumError::Format(format!(
                    "variable-length quantity at offset {start} exceeds {VLQ_MAX_BYTES} bytes"
                )));
            }
            let byte = self.read_u8()?;
            value = (value << 7) | (byte & 0x7F) as u32;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
    }
}

/// Fold a big-endian byte slice into an integer.
///
/// Used for meta-event payloads whose length is declared by the event
/// itself (the tempo payload is conventionally 3 bytes).
pub fn be_bytes_to_u32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32)
}

/// Encode a value as a variable-length quantity.
///
/// Inverse of [`ByteReader::read_vlq`].
pub fn encode_vlq(value: u32) -> Vec<u8> {
    let mut out = vec![(value & 0x7F) as u8];
    let mut rest = value >> 7;
    while rest > 0 {
        out.push(0x80 | (rest & 0x7F) as u8);
        rest >>= 7;
    }
    out.reverse();
    out
}
