use std::collections::BTreeMap;

/// Message Code
pub mod code;

/// Message ID
pub mod id;

/// Message Options
pub mod opt;

/// Message parsing errors
pub mod parse_error;

/// Message Token
pub mod token;

/// Message Type
pub mod ty;

/// Message Version
pub mod ver;

pub use code::*;
pub use id::*;
pub use opt::*;
pub use parse_error::*;
pub use token::*;
pub use ty::*;
pub use ver::*;

/// Message payload; arbitrary bytes that follow the `0xFF` marker on the
/// wire.
///
/// See [RFC7252 section 5.5](https://datatracker.ietf.org/doc/html/rfc7252#section-5.5)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Payload(pub Vec<u8>);

/// The collection a message stores its options in.
///
/// The map keys give ascending option-number order, the `Vec` keeps
/// repeated options in insertion order.
pub type Opts = BTreeMap<OptNumber, Vec<OptValue>>;

/// Struct representing the first byte of a message.
///
/// ```text
/// CoAP version
/// |
/// |  Message type (CON, NON, ACK, RST)
/// |  |
/// |  |  Length of token, in bytes. (4-bit integer)
/// |  |  |
/// vv vv vvvv
/// 01 00 0000
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Byte1 {
  pub(crate) ver: Version,
  pub(crate) ty: Type,
  pub(crate) tkl: u8,
}

impl TryFrom<u8> for Byte1 {
  type Error = MessageParseError;

  fn try_from(b: u8) -> Result<Self, Self::Error> {
    let ver = b >> 6; // bits 0 & 1
    let ty = b >> 4 & 0b11; // bits 2 & 3
    let tkl = b & 0b1111u8; // last 4 bits

    Ok(Byte1 { ver: Version(ver),
               ty: Type::try_from(ty)?,
               tkl })
  }
}

impl From<Byte1> for u8 {
  fn from(b: Byte1) -> u8 {
    let ver = b.ver.0 << 6;
    let ty = u8::from(b.ty) << 4;
    let tkl = b.tkl;

    ver | ty | tkl
  }
}

/// # `Message` struct
/// Low-level representation of a CoAP message.
///
/// Messages serialize to bytes with [`Message::to_bytes`] and parse from
/// bytes with [`Message::from_bytes`].
///
/// <https://datatracker.ietf.org/doc/html/rfc7252#section-2.1>
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
  /// see [`Id`] for details
  pub id: Id,
  /// see [`Type`] for details
  pub ty: Type,
  /// see [`Version`] for details
  pub ver: Version,
  /// see [`Token`] for details
  pub token: Token,
  /// see [`Code`] for details
  pub code: Code,
  /// see [`Opts`]
  pub opts: Opts,
  /// see [`Payload`]
  pub payload: Payload,
}

impl Message {
  /// Create a new message with no options and an empty payload.
  pub fn new(ty: Type, code: Code, id: Id, token: Token) -> Self {
    Self { id,
           ty,
           code,
           token,
           ver: Version::default(),
           opts: Opts::default(),
           payload: Payload(Vec::new()) }
  }

  /// Create a new message that ACKs this one.
  ///
  /// This needs an [`Id`] to assign to the newly created message.
  pub fn ack(&self, id: Id) -> Self {
    Self { id,
           token: self.token,
           ver: Default::default(),
           ty: Type::Ack,
           code: Code::new(0, 0),
           payload: Payload(Vec::new()),
           opts: Default::default() }
  }

  /// Create a Reset message rejecting the message carrying `id`.
  ///
  /// Empty code, no token, no options, no payload.
  ///
  /// <https://datatracker.ietf.org/doc/html/rfc7252#section-4.2>
  pub fn rst(id: Id) -> Self {
    Self::new(Type::Reset, Code::new(0, 0), id, Token::default())
  }

  /// Append `value` to the occurrences of option `number`, keeping any
  /// existing occurrences.
  pub fn add(&mut self, number: OptNumber, value: impl Into<OptValue>) {
    self.opts.entry(number).or_default().push(value.into());
  }

  /// Replace all occurrences of option `number` with the single `value`.
  pub fn set(&mut self, number: OptNumber, value: impl Into<OptValue>) {
    self.opts.insert(number, vec![value.into()]);
  }

  /// Get the first occurrence of option `number`.
  pub fn get(&self, number: OptNumber) -> Option<&OptValue> {
    self.opts.get(&number).and_then(|vs| vs.first())
  }

  /// Get all occurrences of option `number`, in insertion order.
  pub fn get_all(&self, number: OptNumber) -> &[OptValue] {
    self.opts.get(&number).map(|vs| vs.as_slice()).unwrap_or(&[])
  }

  /// Remove all occurrences of option `number`.
  pub fn remove(&mut self, number: OptNumber) -> Option<Vec<OptValue>> {
    self.opts.remove(&number)
  }

  /// Read option `number` as an unsigned integer
  /// (see [`OptValue::as_uint`]).
  pub fn get_uint(&self, number: OptNumber) -> Option<u32> {
    self.get(number).map(OptValue::as_uint)
  }

  /// Replace option `number` with the uint encoding of `value`
  /// (see [`OptValue::uint`]).
  pub fn set_uint(&mut self, number: OptNumber, value: u32) {
    self.set(number, OptValue::uint(value));
  }

  /// Set the Uri-Path options from a `/`-separated path string.
  ///
  /// Every non-empty segment becomes one Uri-Path occurrence; a leading
  /// slash is ignored. Any previously set path is replaced.
  pub fn set_path(&mut self, path: &str) {
    self.remove(known::repeat::PATH);
    path.split('/')
        .filter(|seg| !seg.is_empty())
        .for_each(|seg| self.add(known::repeat::PATH, seg));
  }

  /// Join the Uri-Path option occurrences back into a `/`-separated
  /// string.
  pub fn path(&self) -> String {
    self.get_all(known::repeat::PATH)
        .iter()
        .map(|v| v.as_str_lossy())
        .collect::<Vec<_>>()
        .join("/")
  }

  /// Set the Uri-Query options from an `&`-separated query string,
  /// discarding empty segments. Any previously set query is replaced.
  pub fn set_query(&mut self, query: &str) {
    self.remove(known::repeat::QUERY);
    query.split('&')
         .filter(|q| !q.is_empty())
         .for_each(|q| self.add(known::repeat::QUERY, q));
  }

  /// The exact number of bytes [`Message::to_bytes`] will produce.
  pub(crate) fn encoded_size(&self) -> usize {
    let header_size = 4;
    let token_size = self.token.0.len();
    let payload_size = match self.payload.0.len() {
      | 0 => 0,
      | n => n + 1,
    };

    let mut prev = 0u16;
    let opts_size: usize = self.opts
                               .iter()
                               .flat_map(|(num, vs)| {
                                 vs.iter().map(move |v| (num, v))
                               })
                               .map(|(num, v)| {
                                 let delta = num.0 - prev;
                                 prev = num.0;
                                 opt_header_size(delta, v.0.len()) + v.0.len()
                               })
                               .sum();

    header_size + token_size + opts_size + payload_size
  }
}

fn opt_header_size(delta: u16, len: usize) -> usize {
  let ext = |n: usize| match n {
    | n if n >= 269 => 2,
    | n if n >= 13 => 1,
    | _ => 0,
  };

  1 + ext(delta as usize) + ext(len)
}
