use std::fmt;

/// # Message Code
///
/// 8-bit unsigned integer, split into a 3-bit class (most significant
/// bits) and a 5-bit detail (least significant bits), documented as
/// `c.dd` where `c` is the class and `dd` the detail.
///
/// See [RFC7252 section 3](https://datatracker.ietf.org/doc/html/rfc7252#section-3)
///
/// ```
/// use newt_msg::Code;
/// assert_eq!(Code { class: 2, detail: 5 }.to_string(), "2.05".to_string())
/// ```
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Code {
  /// The "class" of message codes identify it as a request or response, and provides the class of response status:
  ///
  /// |class|meaning|
  /// |---|---|
  /// |`0`|Message is a request|
  /// |`2`|Message is a success response|
  /// |`4`|Message is a client error response|
  /// |`5`|Message is a server error response|
  pub class: u8,

  /// 2-digit integer (range `[0, 32)`) that provides granular information about the response status.
  ///
  /// Will always be `0` for requests.
  pub detail: u8,
}

/// Whether a code identifies a request, a response, or an empty message.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum CodeKind {
  /// A code of 0.00; a ping or Reset
  Empty,
  /// Class 0 with a non-zero detail; a request method
  Request,
  /// Class 2, 4 or 5; a response status
  Response,
}

impl Code {
  /// Create a new Code
  ///
  /// ```
  /// use newt_msg::Code;
  ///
  /// let content = Code::new(2, 05);
  /// ```
  pub const fn new(class: u8, detail: u8) -> Self {
    Self { class, detail }
  }

  /// Numeric rendering of the code; `2.05` becomes `205`.
  pub fn number(&self) -> u16 {
    self.class as u16 * 100 + self.detail as u16
  }

  /// Whether this code identifies a request, response or empty message
  pub fn kind(&self) -> CodeKind {
    match (self.class, self.detail) {
      | (0, 0) => CodeKind::Empty,
      | (0, _) => CodeKind::Request,
      | _ => CodeKind::Response,
    }
  }

  /// Get the human string representation of a message code
  ///
  /// ```
  /// use newt_msg::Code;
  ///
  /// let code = Code { class: 2, detail: 5 };
  /// assert_eq!(String::from_iter(code.to_human()), "2.05".to_string());
  /// ```
  pub fn to_human(&self) -> [char; 4] {
    let to_char = |d: u8| char::from_digit(d.into(), 10).unwrap();
    [to_char(self.class),
     '.',
     to_char(self.detail / 10),
     to_char(self.detail % 10)]
  }
}

impl fmt::Display for Code {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.to_human().iter().try_for_each(|c| write!(f, "{}", c))
  }
}

impl From<u8> for Code {
  fn from(b: u8) -> Self {
    let class = b >> 5;
    let detail = b & 0b0011111;

    Code { class, detail }
  }
}

impl From<Code> for u8 {
  fn from(code: Code) -> u8 {
    let class = code.class << 5;
    let detail = code.detail;

    class | detail
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_code() {
    let byte = 0b_01_000101u8;
    let code = Code::from(byte);
    assert_eq!(code, Code { class: 2, detail: 5 })
  }

  #[test]
  fn serialize_code() {
    let code = Code { class: 2, detail: 5 };
    let actual: u8 = code.into();
    assert_eq!(actual, 0b_010_00101u8)
  }

  #[test]
  fn number() {
    assert_eq!(Code::new(2, 5).number(), 205);
    assert_eq!(Code::new(4, 4).number(), 404);
  }

  #[test]
  fn kind() {
    assert_eq!(Code::new(0, 0).kind(), CodeKind::Empty);
    assert_eq!(Code::new(0, 1).kind(), CodeKind::Request);
    assert_eq!(Code::new(2, 5).kind(), CodeKind::Response);
    assert_eq!(Code::new(5, 0).kind(), CodeKind::Response);
  }
}
