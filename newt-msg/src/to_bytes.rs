//! Serializing [`Message`]s to their binary representation.

use crate::msg::{opt, Byte1, Message};

impl Message {
  /// Serialize this message to its binary representation.
  ///
  /// Options are written in ascending number order with delta encoding;
  /// the payload, when non-empty, is preceded by the `0xFF` marker.
  ///
  /// Encoding cannot fail: the token type caps its own length and `Vec`
  /// has no fixed capacity to exceed.
  pub fn to_bytes(&self) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(self.encoded_size());

    let byte1: u8 = Byte1 { tkl: self.token.0.len() as u8,
                            ver: self.ver,
                            ty: self.ty }.into();

    bytes.push(byte1);
    bytes.push(self.code.into());
    bytes.extend(<[u8; 2]>::from(self.id));
    bytes.extend(self.token.as_bytes());

    let mut prev = 0u16;
    for (number, values) in &self.opts {
      for value in values {
        let (del, del_bytes) = opt::opt_len_or_delta(number.0 - prev);
        let (len, len_bytes) = opt::opt_len_or_delta(value.0.len() as u16);
        prev = number.0;

        bytes.push(del << 4 | len);

        if let Some(bs) = del_bytes {
          bytes.extend(bs);
        }

        if let Some(bs) = len_bytes {
          bytes.extend(bs);
        }

        bytes.extend(&value.0);
      }
    }

    if !self.payload.0.is_empty() {
      bytes.push(0b11111111);
      bytes.extend(&self.payload.0);
    }

    bytes
  }
}
