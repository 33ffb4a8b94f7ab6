/*
# Bits Reader Module

 Big-endian readers over byte slices with position tracking, used by every box parser, and a
 BitReader for the packed bit fields found in codec configuration records.

 Key components:
 - Slice readers: `read_u8()`, `read_u16()`, `read_u24()`, `read_u32()`, `read_i32()`, `read_u64()`
 - BitReader: Bit-precise reading with error accumulation
*/

use std::io::{self, Read};

/// Read one byte from a byte slice advancing the position.
pub fn read_u8(data: &[u8], pos: &mut usize) -> Option<u8> {
    let v = *data.get(*pos)?;
    *pos += 1;
    Some(v)
}

/// Read a 16-bit big endian value from a byte slice advancing the position.
pub fn read_u16(data: &[u8], pos: &mut usize) -> Option<u16> {
    let bytes = data.get(*pos..*pos + 2)?;
    *pos += 2;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

/// Read a 24-bit big endian value, as used by full box flags.
pub fn read_u24(data: &[u8], pos: &mut usize) -> Option<u32> {
    let bytes = data.get(*pos..*pos + 3)?;
    *pos += 3;
    Some(((bytes[0] as u32) << 16) | ((bytes[1] as u32) << 8) | bytes[2] as u32)
}

/// Read a 32-bit big endian value from a byte slice advancing the position.
pub fn read_u32(data: &[u8], pos: &mut usize) -> Option<u32> {
    let bytes = data.get(*pos..*pos + 4)?;
    *pos += 4;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

pub fn read_i32(data: &[u8], pos: &mut usize) -> Option<i32> {
    read_u32(data, pos).map(|v| v as i32)
}

/// Read a 64-bit big endian value from a byte slice advancing the position.
pub fn read_u64(data: &[u8], pos: &mut usize) -> Option<u64> {
    let bytes = data.get(*pos..*pos + 8)?;
    *pos += 8;
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    Some(u64::from_be_bytes(buf))
}

/// `BitReader` reads bits from an underlying reader and accumulates the first
/// error that occurs.
#[derive(Debug)]
pub struct BitReader<R: Read> {
    rd: R,
    err: Option<io::Error>,
    n: u32,
    value: u64,
}

impl<R: Read> BitReader<R> {
    pub fn new(rd: R) -> Self {
        Self {
            rd,
            err: None,
            n: 0,
            value: 0,
        }
    }

    /// Return the accumulated error if any.
    pub fn acc_error(&self) -> Option<&io::Error> {
        self.err.as_ref()
    }

    /// Read `n` bits and return them as the lowest bits of a `u32`.
    /// If an error has occurred, 0 is returned.
    pub fn read(&mut self, n: u32) -> u32 {
        if self.err.is_some() {
            return 0;
        }
        while self.n < n {
            let mut buf = [0u8; 1];
            match self.rd.read_exact(&mut buf) {
                Ok(()) => {
                    self.value = (self.value << 8) | u64::from(buf[0]);
                    self.n += 8;
                }
                Err(e) => {
                    self.err = Some(e);
                    return 0;
                }
            }
        }
        let value = (self.value >> (self.n - n)) as u32;
        self.n -= n;
        self.value &= (1u64 << self.n) - 1;
        value
    }

    /// Read a single bit interpreted as a boolean flag.
    pub fn read_flag(&mut self) -> bool {
        self.read(1) == 1
    }
}
