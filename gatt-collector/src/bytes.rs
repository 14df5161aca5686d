//! Utilities for decoding from and encoding into bytes.
//!
//! This module defines the (de)serialization traits [`ToBytes`] and [`FromBytes`], as well as the
//! helper structs [`ByteWriter`] and [`ByteReader`], which wrap a `&mut [u8]` or `&[u8]` and offer
//! useful utilities to read and write values.
//!
//! Characteristic values exchanged with a peer are little-endian and frequently use 24-bit
//! integers, which is why the readers and writers here go through `byteorder`.
//!
//! [`ToBytes`]: trait.ToBytes.html
//! [`FromBytes`]: trait.FromBytes.html
//! [`ByteWriter`]: struct.ByteWriter.html
//! [`ByteReader`]: struct.ByteReader.html

use {
    crate::{Error, MAX_WRITE_LEN},
    byteorder::{ByteOrder, LittleEndian},
    core::mem,
    heapless::Vec,
};

/// Wrapper around a byte slice that can be used to encode data into bytes.
///
/// All `write_*` methods on this type will return `Error::Eof` when the underlying buffer slice is
/// full.
pub struct ByteWriter<'a>(&'a mut [u8]);

impl<'a> ByteWriter<'a> {
    /// Creates a writer that will write to `buf`.
    pub fn new(buf: &'a mut [u8]) -> Self {
        ByteWriter(buf)
    }

    /// Consumes `self` and returns the part of the contained buffer that has not yet been written
    /// to.
    pub fn into_rest(self) -> &'a mut [u8] {
        self.0
    }

    /// Returns the number of bytes that can be written to `self` until it is full.
    pub fn space_left(&self) -> usize {
        self.0.len()
    }

    /// Writes all bytes from `other` to `self`.
    ///
    /// Returns `Error::Eof` when `self` does not have enough space left to fit `other`. In that
    /// case, `self` will not be modified.
    pub fn write_slice(&mut self, other: &[u8]) -> Result<(), Error> {
        if self.space_left() < other.len() {
            Err(Error::Eof)
        } else {
            self.0[..other.len()].copy_from_slice(other);
            let this = mem::replace(&mut self.0, &mut []);
            self.0 = &mut this[other.len()..];
            Ok(())
        }
    }

    /// Writes a single byte to `self`.
    ///
    /// Returns `Error::Eof` when no space is left.
    pub fn write_u8(&mut self, byte: u8) -> Result<(), Error> {
        self.write_slice(&[byte])
    }

    /// Writes a `u16` to `self`, using Little Endian byte order.
    ///
    /// If `self` does not have enough space left, an error will be returned and no bytes will be
    /// written to `self`.
    pub fn write_u16_le(&mut self, value: u16) -> Result<(), Error> {
        let mut buf = [0; 2];
        LittleEndian::write_u16(&mut buf, value);
        self.write_slice(&buf)
    }

    /// Writes the lower 24 bits of `value` to `self`, using Little Endian byte order.
    ///
    /// Returns `Error::InvalidValue` if `value` does not fit in 24 bits.
    pub fn write_u24_le(&mut self, value: u32) -> Result<(), Error> {
        if value > 0x00FF_FFFF {
            return Err(Error::InvalidValue);
        }
        let mut buf = [0; 3];
        LittleEndian::write_u24(&mut buf, value);
        self.write_slice(&buf)
    }

    /// Writes a signed 24-bit integer to `self`, using Little Endian byte order.
    ///
    /// Returns `Error::InvalidValue` if `value` is outside of the 24-bit two's complement range.
    pub fn write_i24_le(&mut self, value: i32) -> Result<(), Error> {
        if value < -0x0080_0000 || value > 0x007F_FFFF {
            return Err(Error::InvalidValue);
        }
        let mut buf = [0; 3];
        LittleEndian::write_i24(&mut buf, value);
        self.write_slice(&buf)
    }

    /// Writes a `u32` to `self`, using Little Endian byte order.
    ///
    /// If `self` does not have enough space left, an error will be returned and no bytes will be
    /// written to `self`.
    pub fn write_u32_le(&mut self, value: u32) -> Result<(), Error> {
        let mut buf = [0; 4];
        LittleEndian::write_u32(&mut buf, value);
        self.write_slice(&buf)
    }
}

/// Allows reading values from a borrowed byte slice.
pub struct ByteReader<'a>(&'a [u8]);

impl<'a> ByteReader<'a> {
    /// Creates a new `ByteReader` that will read from the given byte slice.
    pub fn new(bytes: &'a [u8]) -> Self {
        ByteReader(bytes)
    }

    /// Consumes `self` and returns the part of the contained buffer that has not yet been read
    /// from.
    pub fn into_rest(self) -> &'a [u8] {
        self.0
    }

    /// Returns the number of bytes that can still be read from `self`.
    pub fn bytes_left(&self) -> usize {
        self.0.len()
    }

    /// Returns whether `self` is at the end of the underlying buffer (EOF).
    ///
    /// If this returns `true`, no data can be read from `self` anymore.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reads a byte slice of length `len` from `self`.
    ///
    /// If `self` contains less than `len` bytes, `Error::Eof` will be returned and `self` will not
    /// be modified.
    pub fn read_slice(&mut self, len: usize) -> Result<&'a [u8], Error> {
        if self.bytes_left() < len {
            Err(Error::Eof)
        } else {
            let slice = &self.0[..len];
            self.0 = &self.0[len..];
            Ok(slice)
        }
    }

    /// Reads the remaining bytes from `self`.
    pub fn read_rest(&mut self) -> &'a [u8] {
        let rest = self.0;
        self.0 = &[];
        rest
    }

    /// Reads a single byte from `self`.
    ///
    /// Returns `Error::Eof` when `self` is empty.
    pub fn read_u8(&mut self) -> Result<u8, Error> {
        Ok(self.read_slice(1)?[0])
    }

    /// Reads a `u16` from `self`, using Little Endian byte order.
    pub fn read_u16_le(&mut self) -> Result<u16, Error> {
        Ok(LittleEndian::read_u16(self.read_slice(2)?))
    }

    /// Reads an `i16` from `self`, using Little Endian byte order.
    pub fn read_i16_le(&mut self) -> Result<i16, Error> {
        Ok(LittleEndian::read_i16(self.read_slice(2)?))
    }

    /// Reads an unsigned 24-bit integer from `self`, using Little Endian byte order.
    pub fn read_u24_le(&mut self) -> Result<u32, Error> {
        Ok(LittleEndian::read_u24(self.read_slice(3)?))
    }

    /// Reads a signed 24-bit integer from `self`, using Little Endian byte order.
    ///
    /// The result is sign-extended to 32 bits.
    pub fn read_i24_le(&mut self) -> Result<i32, Error> {
        Ok(LittleEndian::read_i24(self.read_slice(3)?))
    }

    /// Reads a `u32` from `self`, using Little Endian byte order.
    pub fn read_u32_le(&mut self) -> Result<u32, Error> {
        Ok(LittleEndian::read_u32(self.read_slice(4)?))
    }

    /// Reads an `i32` from `self`, using Little Endian byte order.
    pub fn read_i32_le(&mut self) -> Result<i32, Error> {
        Ok(LittleEndian::read_i32(self.read_slice(4)?))
    }
}

/// Trait for encoding a value into a byte buffer.
pub trait ToBytes {
    /// Converts `self` to bytes and writes them into `writer`, advancing `writer` to point past the
    /// encoded value.
    ///
    /// If `writer` does not contain enough space, an error will be returned and the state of the
    /// buffer is unspecified (eg. `self` may be partially written into `writer`).
    fn to_bytes(&self, writer: &mut ByteWriter<'_>) -> Result<(), Error>;

    /// Encodes `self` into an owned buffer suitable for a single attribute write.
    fn encode(&self) -> Result<Vec<u8, MAX_WRITE_LEN>, Error> {
        let mut buf = [0; MAX_WRITE_LEN];
        let mut writer = ByteWriter::new(&mut buf);
        self.to_bytes(&mut writer)?;
        let used = MAX_WRITE_LEN - writer.space_left();
        Vec::from_slice(&buf[..used]).map_err(|_| Error::Eof)
    }
}

/// Trait for decoding values from a byte slice.
pub trait FromBytes<'a>: Sized {
    /// Decode a `Self` from a byte slice, advancing `bytes` to point past the data that was read.
    ///
    /// If `bytes` contains data not valid for the target type, or contains an insufficient number
    /// of bytes, an error will be returned and the state of `bytes` is unspecified (it can point to
    /// arbitrary data).
    fn from_bytes(bytes: &mut ByteReader<'a>) -> Result<Self, Error>;

    /// Decodes a `Self` from `bytes`, requiring that all of `bytes` is consumed.
    fn from_slice(bytes: &'a [u8]) -> Result<Self, Error> {
        let mut reader = ByteReader::new(bytes);
        let this = Self::from_bytes(&mut reader)?;
        if reader.is_empty() {
            Ok(this)
        } else {
            Err(Error::IncompleteParse)
        }
    }
}

impl<'a> ToBytes for &'a [u8] {
    fn to_bytes(&self, writer: &mut ByteWriter<'_>) -> Result<(), Error> {
        writer.write_slice(*self)
    }
}

impl<'a> FromBytes<'a> for u8 {
    fn from_bytes(bytes: &mut ByteReader<'a>) -> Result<Self, Error> {
        bytes.read_u8()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_24_bit_fields() {
        let mut reader = ByteReader::new(&[0x01, 0x02, 0x03, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x80]);
        assert_eq!(reader.read_u24_le().unwrap(), 0x030201);
        assert_eq!(reader.read_i24_le().unwrap(), -1);
        assert_eq!(reader.read_i24_le().unwrap(), -0x80_0000);
        assert!(reader.is_empty());
        assert_eq!(reader.read_u8(), Err(Error::Eof));
    }

    #[test]
    fn short_read_does_not_advance() {
        let mut reader = ByteReader::new(&[0xAA, 0xBB, 0xCC]);
        assert_eq!(reader.read_u32_le(), Err(Error::Eof));
        assert_eq!(reader.bytes_left(), 3);
        assert_eq!(reader.read_u16_le().unwrap(), 0xBBAA);
    }

    #[test]
    fn writer_bounds() {
        let mut buf = [0; 5];
        let mut writer = ByteWriter::new(&mut buf);
        writer.write_u16_le(0x1234).unwrap();
        writer.write_i24_le(-2).unwrap();
        assert_eq!(writer.write_u8(0), Err(Error::Eof));
        assert_eq!(buf, [0x34, 0x12, 0xFE, 0xFF, 0xFF]);

        let mut buf = [0; 3];
        let mut writer = ByteWriter::new(&mut buf);
        assert_eq!(writer.write_u24_le(0x0100_0000), Err(Error::InvalidValue));
        assert_eq!(writer.write_i24_le(0x0080_0000), Err(Error::InvalidValue));
        assert_eq!(writer.space_left(), 3);
    }

    #[test]
    fn from_slice_rejects_trailing_data() {
        assert_eq!(u8::from_slice(&[1]), Ok(1));
        assert_eq!(u8::from_slice(&[1, 2]), Err(Error::IncompleteParse));
    }

    #[test]
    fn encode_into_buffer() {
        let data: &[u8] = &[1, 2, 3];
        assert_eq!(&data.encode().unwrap()[..], &[1, 2, 3]);
        let big: &[u8] = &[0; MAX_WRITE_LEN + 1];
        assert_eq!(big.encode(), Err(Error::Eof));
    }
}
