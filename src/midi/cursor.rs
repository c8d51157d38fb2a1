//! Byte cursor over raw SMF data

use super::error::{MidiError, Result};

/// Longest variable length quantity the format allows.
pub const MAX_VLQ_BYTES: usize = 4;

/// Largest value that fits in [`MAX_VLQ_BYTES`].
pub const MAX_VLQ_VALUE: u32 = 0x0FFF_FFFF;

/// Forward-only reader over a byte slice.
///
/// Offsets reported in errors are relative to the start of the slice the
/// cursor was created with, plus the `base` it was created at.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::at(data, 0)
    }

    /// Cursor whose reported offsets start at `base`.
    pub fn at(data: &'a [u8], base: usize) -> Self {
        Self { data, pos: 0, base }
    }

    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let byte = self.peek().ok_or(MidiError::Truncated {
            offset: self.offset(),
            needed: 1,
        })?;
        self.pos += 1;
        Ok(byte)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(MidiError::Truncated {
                offset: self.offset(),
                needed: len - self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.read_bytes(len).map(|_| ())
    }

    pub fn read_u16_be(&mut self) -> Result<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u24_be(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(3)?;
        Ok(u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]))
    }

    pub fn read_u32_be(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Decodes a variable length quantity.
    ///
    /// Each byte contributes its low seven bits, most significant first;
    /// a set high bit means another byte follows. Fails if no terminating
    /// byte shows up within [`MAX_VLQ_BYTES`].
    pub fn read_vlq(&mut self) -> Result<u32> {
        let start = self.offset();
        let mut value = 0u32;
        for _ in 0..MAX_VLQ_BYTES {
            let byte = self.read_u8()?;
            value = (value << 7) | u32::from(byte & 0x7F);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(MidiError::VlqOverflow { offset: start })
    }
}

/// Appends the variable length encoding of `value` to `out` and returns
/// the number of bytes written. Values above [`MAX_VLQ_VALUE`] are
/// truncated to their low 28 bits.
pub fn write_vlq(value: u32, out: &mut Vec<u8>) -> usize {
    let value = value & MAX_VLQ_VALUE;
    let mut groups = [0u8; MAX_VLQ_BYTES];
    let mut len = 0;
    let mut rest = value;
    loop {
        groups[len] = (rest & 0x7F) as u8;
        len += 1;
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }
    for i in (0..len).rev() {
        let continuation = if i == 0 { 0 } else { 0x80 };
        out.push(groups[i] | continuation);
    }
    len
}
