use std::fmt;

/// Errors encounterable while parsing a message from bytes
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum MessageParseError {
  /// Reached end of stream before parsing was finished
  UnexpectedEndOfStream,

  /// Version was not 1
  InvalidVersion(u8),

  /// Token length was > 8
  InvalidTokenLength(u8),

  /// The message type is invalid (see [`Type`](crate::Type) for valid values)
  InvalidType(u8),

  /// A payload marker (`0xFF`) was seen with no payload bytes after it
  PayloadMarkerWithoutPayload,

  /// Error parsing option
  OptParseError(super::opt::parse_error::OptParseError),
}

impl MessageParseError {
  /// Shorthand for [`MessageParseError::UnexpectedEndOfStream`]
  pub fn eof() -> Self {
    Self::UnexpectedEndOfStream
  }
}

impl fmt::Display for MessageParseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    use MessageParseError::*;
    match self {
      | UnexpectedEndOfStream => f.write_str("unexpected end of stream"),
      | InvalidVersion(v) => write!(f, "version must be 1, got {}", v),
      | InvalidTokenLength(n) => write!(f, "token length must be <= 8, got {}", n),
      | InvalidType(b) => write!(f, "invalid message type {}", b),
      | PayloadMarkerWithoutPayload => {
        f.write_str("payload marker (0xFF) followed by zero-length payload")
      },
      | OptParseError(e) => write!(f, "option parse error: {}", e),
    }
  }
}

impl std::error::Error for MessageParseError {}

impl From<super::opt::parse_error::OptParseError> for MessageParseError {
  fn from(e: super::opt::parse_error::OptParseError) -> Self {
    Self::OptParseError(e)
  }
}
