//! Byte-level reading and writing helpers for the SMF codec.
//!
//! All multi-byte integers in a MIDI file are big-endian. Delta times and meta lengths
//! use the variable-length quantity (VLQ) encoding: 7 bits per byte, most significant
//! group first, high bit set on every byte except the last.

use crate::error::MidiError;

/// Largest value a 4-byte VLQ can hold
pub const MAX_VLQ: u32 = 0x0FFF_FFFF;

/// Forward-only reader over an in-memory MIDI byte buffer
pub struct ByteReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn error(&self, message: impl Into<String>) -> MidiError {
        MidiError::FormatError {
            offset: self.position,
            message: message.into(),
        }
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], MidiError> {
        let end = self
            .position
            .checked_add(count)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| {
                self.error(format!(
                    "unexpected end of data reading {} bytes ({} left)",
                    count,
                    self.data.len().saturating_sub(self.position)
                ))
            })?;
        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    pub fn read_byte(&mut self) -> Result<u8, MidiError> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, MidiError> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, MidiError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read a variable-length quantity (at most 4 bytes)
    pub fn read_vlq(&mut self) -> Result<u32, MidiError> {
        let start = self.position;
        let mut value: u32 = 0;
        for _ in 0..4 {
            let byte = self.read_byte()?;
            value = (value << 7) | u32::from(byte & 0x7F);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(MidiError::FormatError {
            offset: start,
            message: "variable-length quantity longer than 4 bytes".to_string(),
        })
    }
}

/// Append the VLQ encoding of `value` to `out`
pub fn write_vlq(out: &mut Vec<u8>, value: u32) -> Result<(), MidiError> {
    if value > MAX_VLQ {
        return Err(MidiError::FormatError {
            offset: out.len(),
            message: format!("delta {} does not fit in a variable-length quantity", value),
        });
    }

    // 7-bit groups, least significant first
    let mut groups = vec![(value & 0x7F) as u8];
    let mut rest = value >> 7;
    while rest > 0 {
        groups.push((rest & 0x7F) as u8);
        rest >>= 7;
    }

    for (i, group) in groups.iter().enumerate().rev() {
        if i == 0 {
            out.push(*group);
        } else {
            out.push(group | 0x80);
        }
    }
    Ok(())
}

/// Encode a single value as a variable-length quantity
///
/// ```
/// use notemidi::smf::encode_vlq;
///
/// assert_eq!(encode_vlq(0).unwrap(), vec![0x00]);
/// assert_eq!(encode_vlq(127).unwrap(), vec![0x7F]);
/// assert_eq!(encode_vlq(128).unwrap(), vec![0x81, 0x00]);
/// ```
pub fn encode_vlq(value: u32) -> Result<Vec<u8>, MidiError> {
    let mut out = Vec::with_capacity(4);
    write_vlq(&mut out, value)?;
    Ok(out)
}

/// Decode a variable-length quantity from the start of `bytes`.
///
/// Returns the value and the number of bytes it occupied.
pub fn decode_vlq(bytes: &[u8]) -> Result<(u32, usize), MidiError> {
    let mut reader = ByteReader::new(bytes);
    let value = reader.read_vlq()?;
    Ok((value, reader.position()))
}
