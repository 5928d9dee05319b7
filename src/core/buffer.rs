//! Checked byte cursor and encoding helpers
//!
//! Every read is bounds-checked against the remaining input before anything
//! is consumed or allocated, so a declared length can never make the decoder
//! read past the buffer or reserve memory the input cannot back.

use bytes::{Buf, BufMut, BytesMut};
use thiserror::Error;

// =============================================================================
// Errors
// =============================================================================

/// Malformed wire input. Always fatal: no partial record is produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Unexpected end of buffer at offset {offset}: needed {needed} bytes, {remaining} remaining")]
    Truncated {
        offset: usize,
        needed: usize,
        remaining: usize,
    },
    #[error("Buffer not exhausted: {0} trailing bytes")]
    TrailingBytes(usize),
    #[error("Unexpected block version: {0}")]
    UnexpectedBlockVersion(u32),
    #[error("Not ECDSA signature: leading byte {0:#04x}")]
    NotEcdsaSignature(u8),
    #[error("Declared length {declared} exceeds limit {limit}")]
    LengthOutOfBounds { declared: usize, limit: usize },
    #[error("Invalid UTF-8 in {0}")]
    InvalidUtf8(&'static str),
    #[error("Unknown transaction type {type_id} in group {type_group} (version {version})")]
    UnknownTransactionType {
        type_id: u16,
        type_group: u32,
        version: u8,
    },
    #[error("Invalid transaction bytes: {0}")]
    InvalidTransactionBytes(String),
}

/// A record that cannot be put on the wire
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Invalid hex in {0}")]
    InvalidHex(&'static str),
    #[error("{field} must be {expected} bytes, got {actual}")]
    InvalidLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Invalid block id: {0}")]
    InvalidBlockId(String),
    #[error("Previous block votes have no wire encoding")]
    UnsupportedVotes,
    #[error("{field} is {actual} bytes, limit is {limit}")]
    TooLong {
        field: &'static str,
        actual: usize,
        limit: usize,
    },
    #[error("Missing field: {0}")]
    MissingField(&'static str),
    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

// =============================================================================
// Reader
// =============================================================================

/// Little-endian cursor over an input slice
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    buf: &'a [u8],
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, buf: data }
    }

    /// Bytes consumed so far
    pub fn offset(&self) -> usize {
        self.data.len() - self.buf.len()
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    pub fn has_remaining(&self) -> bool {
        self.buf.has_remaining()
    }

    /// The span consumed so far
    pub fn consumed(&self) -> &'a [u8] {
        &self.data[..self.offset()]
    }

    fn ensure(&self, needed: usize) -> Result<(), DecodeError> {
        if self.buf.len() < needed {
            return Err(DecodeError::Truncated {
                offset: self.offset(),
                needed,
                remaining: self.buf.len(),
            });
        }
        Ok(())
    }

    /// Byte at `ahead` positions from the cursor, without consuming
    pub fn peek(&self, ahead: usize) -> Result<u8, DecodeError> {
        self.ensure(ahead + 1)?;
        Ok(self.buf[ahead])
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        self.ensure(2)?;
        Ok(self.buf.get_u16_le())
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        self.ensure(4)?;
        Ok(self.buf.get_u32_le())
    }

    pub fn read_u64(&mut self) -> Result<u64, DecodeError> {
        self.ensure(8)?;
        Ok(self.buf.get_u64_le())
    }

    pub fn read_u64_be(&mut self) -> Result<u64, DecodeError> {
        self.ensure(8)?;
        Ok(self.buf.get_u64())
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        self.ensure(len)?;
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    pub fn read_hex(&mut self, len: usize) -> Result<String, DecodeError> {
        Ok(hex::encode(self.read_bytes(len)?))
    }

    pub fn skip(&mut self, len: usize) -> Result<(), DecodeError> {
        self.ensure(len)?;
        self.buf.advance(len);
        Ok(())
    }

    /// Read a self-delimiting DER signature: total length is the byte at
    /// offset+1 plus the 2-byte header.
    pub fn read_der(&mut self) -> Result<&'a [u8], DecodeError> {
        let length = self.peek(1)? as usize + 2;
        self.read_bytes(length)
    }

    /// Fail unless the whole input has been consumed
    pub fn finish(&self) -> Result<(), DecodeError> {
        if self.has_remaining() {
            return Err(DecodeError::TrailingBytes(self.remaining()));
        }
        Ok(())
    }
}

// =============================================================================
// Writer helpers
// =============================================================================

/// Decode a hex field and check its length
pub fn decode_hex_exact(
    value: &str,
    field: &'static str,
    expected: usize,
) -> Result<Vec<u8>, EncodeError> {
    let bytes = hex::decode(value).map_err(|_| EncodeError::InvalidHex(field))?;
    if bytes.len() != expected {
        return Err(EncodeError::InvalidLength {
            field,
            expected,
            actual: bytes.len(),
        });
    }
    Ok(bytes)
}

/// Append a hex field of any length
pub fn put_hex(buf: &mut BytesMut, value: &str, field: &'static str) -> Result<(), EncodeError> {
    let bytes = hex::decode(value).map_err(|_| EncodeError::InvalidHex(field))?;
    buf.put_slice(&bytes);
    Ok(())
}

/// Append a hex field that must have an exact length
pub fn put_hex_exact(
    buf: &mut BytesMut,
    value: &str,
    field: &'static str,
    expected: usize,
) -> Result<(), EncodeError> {
    buf.put_slice(&decode_hex_exact(value, field, expected)?);
    Ok(())
}
