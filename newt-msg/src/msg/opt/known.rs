use std::ops::RangeInclusive;

use super::{OptNumber, OptValue};

macro_rules! opt {
  (#[doc = $doc:expr] $name:ident = $n:literal) => {
    #[doc = $doc]
    pub const $name: crate::OptNumber = crate::OptNumber($n);
  };
}

/// Non-repeatable options
pub mod no_repeat {
  opt!(#[doc = "Uri-Host <https://datatracker.ietf.org/doc/html/rfc7252#section-5.10.1>"]
       HOST = 3);
  opt!(#[doc = "If-None-Match <https://datatracker.ietf.org/doc/html/rfc7252#section-5.10.8.2>"]
       IF_NONE_MATCH = 5);
  opt!(#[doc = "Observe <https://www.rfc-editor.org/rfc/rfc7641#section-2>"]
       OBSERVE = 6);
  opt!(#[doc = "Uri-Port; see [`HOST`]"]
       PORT = 7);
  opt!(#[doc = "Content-Format <https://datatracker.ietf.org/doc/html/rfc7252#section-5.10.3>"]
       CONTENT_FORMAT = 12);
  opt!(#[doc = "Max-Age <https://datatracker.ietf.org/doc/html/rfc7252#section-5.10.5>"]
       MAX_AGE = 14);
  opt!(#[doc = "Accept <https://datatracker.ietf.org/doc/html/rfc7252#section-5.10.4>"]
       ACCEPT = 17);
  opt!(#[doc = "Proxy-Uri <https://datatracker.ietf.org/doc/html/rfc7252#section-5.10.2>"]
       PROXY_URI = 35);
  opt!(#[doc = "Proxy-Scheme; see [`PROXY_URI`]"]
       PROXY_SCHEME = 39);
  opt!(#[doc = "Size1 <https://datatracker.ietf.org/doc/html/rfc7252#section-5.10.9>"]
       SIZE1 = 60);
}

/// Repeatable options
pub mod repeat {
  opt!(#[doc = "If-Match <https://datatracker.ietf.org/doc/html/rfc7252#section-5.10.8.1>"]
       IF_MATCH = 1);
  opt!(#[doc = "ETag <https://datatracker.ietf.org/doc/html/rfc7252#section-5.10.6>"]
       ETAG = 4);
  opt!(#[doc = "Location-Path <https://datatracker.ietf.org/doc/html/rfc7252#section-5.10.7>"]
       LOCATION_PATH = 8);
  opt!(#[doc = "Uri-Path; see [`super::no_repeat::HOST`]"]
       PATH = 11);
  opt!(#[doc = "Uri-Query; see [`super::no_repeat::HOST`]"]
       QUERY = 15);
  opt!(#[doc = "Location-Query; see [`LOCATION_PATH`]"]
       LOCATION_QUERY = 20);
}

/// The format a registered option's value is interpreted as.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValueFormat {
  /// Zero-length; presence is the whole signal
  Empty,
  /// Raw bytes
  Opaque,
  /// Big-endian unsigned integer, leading zeroes stripped
  Uint,
  /// UTF-8 text without terminator
  String,
}

/// The registered definition of an option number.
///
/// See [RFC7252 section 5.10, table 4](https://datatracker.ietf.org/doc/html/rfc7252#section-5.10)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionDef {
  /// The number the definition belongs to
  pub number: OptNumber,
  /// See [`ValueFormat`]
  pub format: ValueFormat,
  /// Permissible value lengths, in bytes
  pub len: RangeInclusive<usize>,
  /// Whether the option may occur more than once in a message
  pub repeatable: bool,
}

impl OptionDef {
  /// Render a value of this option according to its registered format:
  /// uints as decimal, strings as UTF-8, opaque bytes as hex.
  pub fn render(&self, value: &OptValue) -> String {
    match self.format {
      | ValueFormat::Empty => String::new(),
      | ValueFormat::Uint => value.as_uint().to_string(),
      | ValueFormat::String => value.as_str_lossy().into_owned(),
      | ValueFormat::Opaque => value.to_string(),
    }
  }
}

/// Look up the registered definition for an option number.
///
/// Unknown numbers yield `None` and are carried verbatim as opaque bytes.
pub fn def(number: OptNumber) -> Option<OptionDef> {
  use ValueFormat::*;

  let def = |format: ValueFormat, min: usize, max: usize, repeatable: bool| {
    Some(OptionDef { number,
                     format,
                     len: min..=max,
                     repeatable })
  };

  match number {
    | repeat::IF_MATCH => def(Opaque, 0, 8, true),
    | no_repeat::HOST => def(String, 1, 255, false),
    | repeat::ETAG => def(Opaque, 1, 8, true),
    | no_repeat::IF_NONE_MATCH => def(Empty, 0, 0, false),
    | no_repeat::OBSERVE => def(Uint, 0, 3, false),
    | no_repeat::PORT => def(Uint, 0, 2, false),
    | repeat::LOCATION_PATH => def(String, 0, 255, true),
    | repeat::PATH => def(String, 0, 255, true),
    | no_repeat::CONTENT_FORMAT => def(Uint, 0, 2, false),
    | no_repeat::MAX_AGE => def(Uint, 0, 4, false),
    | repeat::QUERY => def(String, 0, 255, true),
    | no_repeat::ACCEPT => def(Uint, 0, 2, false),
    | repeat::LOCATION_QUERY => def(String, 0, 255, true),
    | no_repeat::PROXY_URI => def(String, 1, 1034, false),
    | no_repeat::PROXY_SCHEME => def(String, 1, 255, false),
    | no_repeat::SIZE1 => def(Uint, 0, 4, false),
    | _ => None,
  }
}

/// Content-Format values
///
/// <https://datatracker.ietf.org/doc/html/rfc7252#section-12.3>
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentFormat {
  /// `text/plain; charset=utf-8`
  Text,
  /// `application/link-format`
  LinkFormat,
  /// `application/xml`
  Xml,
  /// `application/octet-stream`
  OctetStream,
  /// `application/exi`
  Exi,
  /// `application/json`
  Json,
  /// Another content format
  Other(u16),
}

impl<'a> From<&'a ContentFormat> for u16 {
  fn from(f: &'a ContentFormat) -> Self {
    use ContentFormat::*;
    match *f {
      | Text => 0,
      | LinkFormat => 40,
      | Xml => 41,
      | OctetStream => 42,
      | Exi => 47,
      | Json => 50,
      | Other(n) => n,
    }
  }
}

impl From<u16> for ContentFormat {
  fn from(n: u16) -> Self {
    use ContentFormat::*;
    match n {
      | 0 => Text,
      | 40 => LinkFormat,
      | 41 => Xml,
      | 42 => OctetStream,
      | 47 => Exi,
      | 50 => Json,
      | n => Other(n),
    }
  }
}

impl From<ContentFormat> for super::OptValue {
  fn from(f: ContentFormat) -> Self {
    super::OptValue::uint(u16::from(&f) as u32)
  }
}
