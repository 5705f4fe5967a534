//! Parsing [`Message`]s from their binary representation.

use crate::cursor::Cursor;
use crate::msg::{opt, Byte1, Id, Message, MessageParseError, Payload, Token};

impl Message {
  /// Parse a message from its binary representation.
  ///
  /// ```
  /// use newt_msg::{Code, Message, Type};
  ///
  /// let msg = Message::from_bytes([0x40, 0x01, 0x30, 0x39]).unwrap();
  /// assert_eq!(msg.ty, Type::Con);
  /// assert_eq!(msg.code, Code::new(0, 1));
  /// assert_eq!(msg.id.0, 12345);
  /// ```
  ///
  /// # Errors
  /// Fails on inputs shorter than the 4-byte header, versions other
  /// than 1, token lengths over 8, malformed options, and a payload
  /// marker with nothing after it.
  pub fn from_bytes(bytes: impl AsRef<[u8]>) -> Result<Self, MessageParseError> {
    let mut bytes = Cursor::new(bytes.as_ref());

    let Byte1 { tkl, ty, ver } = bytes.next()
                                      .ok_or_else(MessageParseError::eof)?
                                      .try_into()?;

    if ver.0 != 1 {
      return Err(MessageParseError::InvalidVersion(ver.0));
    }

    if tkl > 8 {
      return Err(MessageParseError::InvalidTokenLength(tkl));
    }

    let code = bytes.next().ok_or_else(MessageParseError::eof)?.into();
    let id = match bytes.take_exact(2) {
      | Some(&[a, b]) => Id::from_be_bytes([a, b]),
      | _ => return Err(MessageParseError::eof()),
    };

    let token = bytes.take_exact(tkl as usize)
                     .ok_or_else(MessageParseError::eof)?;
    let token = Token::try_from(token).expect("tkl was checked to be <= 8");

    let (opts, saw_marker) = opt::parse_opts(&mut bytes)?;

    if saw_marker && bytes.remaining() == 0 {
      return Err(MessageParseError::PayloadMarkerWithoutPayload);
    }

    let payload = Payload(bytes.until_end().to_vec());

    Ok(Message { id,
                 ty,
                 ver,
                 code,
                 token,
                 opts,
                 payload })
  }
}
