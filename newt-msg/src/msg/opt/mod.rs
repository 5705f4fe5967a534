use std::fmt;

use tinyvec::ArrayVec;

use crate::cursor::Cursor;

/// Known options and their registered definitions
pub mod known;

/// Option parsing errors
pub mod parse_error;

pub use parse_error::*;

use super::Opts;

/// # Option Number
///
/// 16-bit identifier of an option (e.g. Uri-Path is 11).
///
/// Properties of an option are encoded in bit patterns of its number:
/// odd numbers are *critical*, bit 1 marks the option unsafe to forward,
/// and `0x1c` in the low 5 bits marks it as not part of proxy cache keys.
///
/// See [RFC7252 section 5.4.6](https://datatracker.ietf.org/doc/html/rfc7252#section-5.4.6)
#[derive(Copy, Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct OptNumber(pub u16);

impl OptNumber {
  /// Whether a recipient must process this option or reject the message.
  ///
  /// <https://datatracker.ietf.org/doc/html/rfc7252#section-5.4.1>
  pub fn is_critical(&self) -> bool {
    self.0 & 0b1 == 1
  }

  /// Whether a proxy that does not understand this option must not
  /// forward it.
  ///
  /// <https://datatracker.ietf.org/doc/html/rfc7252#section-5.4.2>
  pub fn is_unsafe_to_forward(&self) -> bool {
    self.0 & 0b10 == 0b10
  }

  /// Whether this option is excluded from proxy cache keys.
  ///
  /// Only meaningful for options that are safe to forward.
  pub fn is_no_cache_key(&self) -> bool {
    self.0 & 0x1e == 0x1c
  }
}

/// # Option Value
///
/// The bytes of one option occurrence, stored in the registered value
/// format's wire representation: uints big-endian with leading zeroes
/// stripped, strings as UTF-8 without terminator, opaque verbatim.
///
/// See [RFC7252 section 3.2](https://datatracker.ietf.org/doc/html/rfc7252#section-3.2)
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct OptValue(pub Vec<u8>);

impl OptValue {
  /// Encode an unsigned integer option value.
  ///
  /// Big-endian with leading zeroes stripped; zero encodes to the empty
  /// byte string.
  ///
  /// ```
  /// use newt_msg::OptValue;
  ///
  /// assert_eq!(OptValue::uint(0).0, Vec::<u8>::new());
  /// assert_eq!(OptValue::uint(13).0, vec![0x0d]);
  /// assert_eq!(OptValue::uint(1024).0, vec![0x04, 0x00]);
  /// ```
  pub fn uint(n: u32) -> Self {
    let bytes = n.to_be_bytes();
    let zeroes = bytes.iter().take_while(|b| **b == 0).count();
    OptValue(bytes[zeroes..].to_vec())
  }

  /// Decode this value as an unsigned integer, zero-extending short
  /// values. Only the last 4 bytes participate.
  pub fn as_uint(&self) -> u32 {
    self.0
        .iter()
        .skip(self.0.len().saturating_sub(4))
        .fold(0u32, |acc, b| (acc << 8) | *b as u32)
  }

  /// Borrow the value bytes.
  pub fn as_bytes(&self) -> &[u8] {
    &self.0
  }

  /// Interpret the value as UTF-8, replacing invalid sequences.
  pub fn as_str_lossy(&self) -> std::borrow::Cow<'_, str> {
    String::from_utf8_lossy(&self.0)
  }

  /// The length of the value in bytes.
  pub fn len(&self) -> usize {
    self.0.len()
  }

  /// Whether the value is zero-length.
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl fmt::Display for OptValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.0.iter().try_for_each(|b| write!(f, "{:02x}", b))
  }
}

impl From<Vec<u8>> for OptValue {
  fn from(bytes: Vec<u8>) -> Self {
    OptValue(bytes)
  }
}

impl From<&[u8]> for OptValue {
  fn from(bytes: &[u8]) -> Self {
    OptValue(bytes.to_vec())
  }
}

impl From<&str> for OptValue {
  fn from(s: &str) -> Self {
    OptValue(s.as_bytes().to_vec())
  }
}

impl From<String> for OptValue {
  fn from(s: String) -> Self {
    OptValue(s.into_bytes())
  }
}

pub(crate) fn parse_opt_len_or_delta(head: u8,
                                     bytes: &mut Cursor<'_>,
                                     reserved_err: OptParseError)
                                     -> Result<u32, OptParseError> {
  match head {
    | 13 => {
      let n = bytes.next().ok_or_else(OptParseError::eof)?;
      Ok((n as u32) + 13)
    },
    | 14 => match bytes.take_exact(2) {
      | Some(&[a, b]) => Ok(u16::from_be_bytes([a, b]) as u32 + 269),
      | _ => Err(OptParseError::eof()),
    },
    | 15 => Err(reserved_err),
    | _ => Ok(head as u32),
  }
}

/// Parse the option stream, stopping at the payload marker or the end of
/// input. Returns the options and whether a payload marker was consumed.
///
/// Occurrences of elective options whose length is outside the registered
/// bounds are dropped (their bytes still consumed); critical ones fail the
/// parse.
pub(crate) fn parse_opts(bytes: &mut Cursor<'_>) -> Result<(Opts, bool), OptParseError> {
  let mut opts = Opts::default();
  let mut number = 0u32;

  loop {
    let byte1 = match bytes.next() {
      | None => return Ok((opts, false)),
      | Some(0xFF) => return Ok((opts, true)),
      | Some(b) => b,
    };

    // NOTE: delta must be consumed before the length; extension bytes are
    // laid out delta-first on the wire.
    let delta = parse_opt_len_or_delta(byte1 >> 4,
                                       bytes,
                                       OptParseError::OptionDeltaReservedValue(15))?;
    let len = parse_opt_len_or_delta(byte1 & 0b00001111,
                                     bytes,
                                     OptParseError::ValueLengthReservedValue(15))?
              as usize;

    number += delta;
    if number > u16::MAX as u32 {
      return Err(OptParseError::OptionNumberTooLarge(number));
    }
    let number = OptNumber(number as u16);

    let value = bytes.take_exact(len).ok_or_else(OptParseError::eof)?;

    match known::def(number) {
      | Some(def) if !def.len.contains(&len) => {
        if def.number.is_critical() {
          return Err(OptParseError::CriticalOptionLengthInvalid { number, len });
        }
        // elective option out of bounds: drop the occurrence
        continue;
      },
      | Some(def) if !def.repeatable && opts.contains_key(&number) => {
        // a supernumerary occurrence of a non-repeatable option is
        // treated like an unrecognized option
        if def.number.is_critical() {
          return Err(OptParseError::NonRepeatableOptionRepeated(number));
        }
        continue;
      },
      | _ => {},
    }

    opts.entry(number).or_default().push(OptValue(value.to_vec()));
  }
}

/// Split an option delta or value length into the 4-bit header nibble and
/// its extension bytes.
///
/// Values 0-12 are stored in place; 13 means one extension byte carrying
/// `actual - 13`; 14 means two big-endian extension bytes carrying
/// `actual - 269`.
pub(crate) fn opt_len_or_delta(val: u16) -> (u8, Option<ArrayVec<[u8; 2]>>) {
  match val {
    | n if n >= 269 => {
      let mut bytes = ArrayVec::new();
      bytes.extend((n - 269).to_be_bytes());
      (14, Some(bytes))
    },
    | n if n >= 13 => {
      let mut bytes = ArrayVec::new();
      bytes.push((n as u8) - 13);
      (13, Some(bytes))
    },
    | n => (n as u8, None),
  }
}
