use tinyvec::ArrayVec;

use super::MessageParseError;

/// # Message Token
///
/// 0 to 8 opaque bytes chosen by the client to correlate requests and
/// responses; the server echoes the token back verbatim.
///
/// Token equality is byte-wise. An empty token is permitted; messages
/// carrying one are correlated by [`Id`](crate::Id) instead.
///
/// See [RFC7252 section 5.3.1](https://datatracker.ietf.org/doc/html/rfc7252#section-5.3.1)
#[derive(Copy, Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Token(pub ArrayVec<[u8; 8]>);

impl Token {
  /// Whether this is the zero-length token.
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// The token bytes.
  pub fn as_bytes(&self) -> &[u8] {
    &self.0
  }
}

impl TryFrom<&[u8]> for Token {
  type Error = MessageParseError;

  fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
    match ArrayVec::try_from(bytes) {
      | Ok(arr) => Ok(Token(arr)),
      | Err(_) => Err(MessageParseError::InvalidTokenLength(bytes.len() as u8)),
    }
  }
}

impl From<[u8; 8]> for Token {
  fn from(bytes: [u8; 8]) -> Self {
    Token(bytes.into())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn try_from_slice() {
    assert_eq!(Token::try_from(&[1u8, 2, 3][..]).unwrap().as_bytes(),
               &[1, 2, 3]);
    assert!(Token::try_from(&[0u8; 9][..]).is_err());
  }

  #[test]
  fn empty() {
    assert!(Token::default().is_empty());
    assert!(!Token::try_from(&[0u8][..]).unwrap().is_empty());
  }
}
