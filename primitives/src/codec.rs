//! Encode/decode entry points for trace messages.
//!
//! The host encodes one message per hook invocation; guests decode the
//! payload found at `(ptr, len)` with [`decode`].

use alloc::vec::Vec;

use prost::{DecodeError, EncodeError, Message};

/// Encode a message into a freshly sized buffer.
pub fn encode<M: Message>(msg: &M) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::with_capacity(msg.encoded_len());
    msg.encode(&mut buf)?;
    Ok(buf)
}

/// Decode a message from a payload.
pub fn decode<M: Message + Default>(data: &[u8]) -> Result<M, DecodeError> {
    M::decode(data)
}
