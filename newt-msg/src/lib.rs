//! Low-level representation of CoAP messages.
//!
//! The most notable item in `newt_msg` is [`Message`];
//! a CoAP message very close to the actual byte layout.
//!
//! ## Structure
//! A message stores its options in a `BTreeMap` keyed by [`OptNumber`],
//! which makes the canonical ascending-number serialization order a
//! property of the data structure rather than something the encoder has
//! to re-establish. Repeated options keep their insertion order inside
//! the per-number `Vec`.
//!
//! ## Codec
//! [`Message::from_bytes`] and [`Message::to_bytes`] implement the binary
//! format of [RFC7252 section 3](https://datatracker.ietf.org/doc/html/rfc7252#section-3),
//! including the option delta/length nibble encoding with its 1- and
//! 2-byte extensions and the `0xFF` payload marker.
//!
//! ```
//! use newt_msg::{Code, Id, Message, Token, Type};
//!
//! let msg = Message::new(Type::Con, Code::new(0, 1), Id(12345), Token::default());
//! assert_eq!(msg.to_bytes(), vec![0x40, 0x01, 0x30, 0x39]);
//! ```

#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![cfg_attr(not(test), deny(unsafe_code))]

pub(crate) mod cursor;

/// Message structs
pub mod msg;

#[doc(hidden)]
pub mod from_bytes;

#[doc(hidden)]
pub mod to_bytes;

#[doc(inline)]
pub use msg::*;

#[cfg(test)]
pub(crate) fn test_msg() -> (Message, Vec<u8>) {
  let header: [u8; 4] = 0b0100_0001_0100_0101_0000_0000_0000_0001_u32.to_be_bytes();
  let token: [u8; 1] = [254u8];
  let content_format: &[u8] = b"application/json";
  let options: [&[u8]; 2] = [&[0b_1100_1101u8, 0b00000011u8], content_format];
  let payload: [&[u8]; 2] = [&[0b1111_1111_u8], b"hello, world!"];
  let bytes = [header.as_ref(),
               token.as_ref(),
               options.concat().as_ref(),
               payload.concat().as_ref()].concat();

  let mut msg = Message::new(Type::Con,
                             Code { class: 2, detail: 5 },
                             Id(1),
                             Token(tinyvec::array_vec!([u8; 8] => 254)));
  msg.set(OptNumber(12), content_format);
  msg.payload = Payload(b"hello, world!".to_vec());

  (msg, bytes)
}
