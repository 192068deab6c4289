//! Variable-Length Quantity codec
//!
//! Every integer in a XEN container (lengths, counts, version, payload sizes,
//! list elements) is stored as a VLQ: 7 data bits per byte, most significant
//! group first, with the top bit set on every byte except the last.
//!
//! ```text
//! 0        -> 00
//! 127      -> 7F
//! 128      -> 81 00
//! 16384    -> 81 80 00
//! ```
//!
//! This is the MIDI ordering, not LEB128: the high group comes first.

use crate::error::{Result, XenError};
use std::io::{self, Read, Write};

/// Longest encoding of a `u64` (ceil(64 / 7))
pub const MAX_VLQ_BYTES: usize = 10;

/// Number of bytes `value` encodes to (minimum 1)
pub fn encoded_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}

/// Encode `value` into a fresh buffer
pub fn encode(value: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(encoded_len(value));
    encode_into(value, &mut buf);
    buf
}

/// Append the encoding of `value` to `buf`
pub fn encode_into(value: u64, buf: &mut Vec<u8>) {
    let mut scratch = [0u8; MAX_VLQ_BYTES];
    let len = encode_groups(value, &mut scratch);
    buf.extend_from_slice(&scratch[..len]);
}

/// Write `value` to a writer, returning the number of bytes written
pub fn write_vlq<W: Write>(mut writer: W, value: u64) -> Result<usize> {
    let mut scratch = [0u8; MAX_VLQ_BYTES];
    let len = encode_groups(value, &mut scratch);
    writer.write_all(&scratch[..len])?;
    Ok(len)
}

/// Fill the front of `out` with the 7-bit groups of `value`, high group
/// first, and return how many bytes were used
fn encode_groups(value: u64, out: &mut [u8; MAX_VLQ_BYTES]) -> usize {
    let len = encoded_len(value);
    for (i, slot) in out[..len].iter_mut().enumerate() {
        let group = ((value >> (7 * (len - 1 - i))) & 0x7F) as u8;
        *slot = if i + 1 < len { group | 0x80 } else { group };
    }
    len
}

/// Read one VLQ from a reader, consuming bytes up to and including the
/// terminating byte.
///
/// Non-minimal encodings (leading `0x80` bytes) are accepted. Fails with
/// [`XenError::UnexpectedEndOfStream`] if the reader runs dry before a byte
/// with a clear continuation bit, and [`XenError::VlqOverflow`] if the value
/// would not fit in 64 bits.
pub fn read_vlq<R: Read>(mut reader: R) -> Result<u64> {
    let mut value: u64 = 0;
    let mut byte = [0u8; 1];
    loop {
        match reader.read_exact(&mut byte) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                return Err(XenError::UnexpectedEndOfStream)
            }
            Err(e) => return Err(XenError::Io(e)),
        }

        if value >> 57 != 0 {
            return Err(XenError::VlqOverflow);
        }
        value = (value << 7) | u64::from(byte[0] & 0x7F);

        if byte[0] & 0x80 == 0 {
            return Ok(value);
        }
    }
}

/// Decode one VLQ from the front of `bytes`, returning (value, bytes_consumed)
pub fn decode(bytes: &[u8]) -> Result<(u64, usize)> {
    let mut cursor = bytes;
    let value = read_vlq(&mut cursor)?;
    Ok((value, bytes.len() - cursor.len()))
}
