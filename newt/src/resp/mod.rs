use std::fmt;
use std::string::FromUtf8Error;
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender};
use newt_msg::{Code, Message, OptNumber, OptValue};

use crate::req::Request;

/// Response codes
pub mod code;

/// Numeric response status plus its human rendering.
///
/// ```
/// use newt_msg::Code;
/// use newt::resp::Status;
///
/// let status = Status(Code::new(2, 5));
/// assert_eq!(status.number(), 205);
/// assert_eq!(status.to_string(), "2.05 Content");
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Status(pub Code);

impl Status {
  /// Class and detail folded into one number; `2.05` becomes `205`.
  pub fn number(&self) -> u16 {
    self.0.number()
  }
}

impl fmt::Display for Status {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{:02}", self.0.class, self.0.detail)?;
    match code::name(self.0) {
      | Some(name) => write!(f, " {}", name),
      | None => write!(f, " Unknown (0x{:02x})", u8::from(self.0)),
    }
  }
}

/// A response to one request, carrying the lazy tail of an Observe
/// notification stream.
///
/// When the request negotiated an observation, [`Response::next`] blocks
/// until the server pushes the next notification and yields it as a
/// fresh `Response` (itself carrying the following `next`). The chain
/// ends with `None` when the observation is cancelled or the connection
/// goes away; for plain request/response exchanges it ends immediately.
#[derive(Debug)]
pub struct Response {
  msg: Message,
  request: Arc<Request>,
  next: Receiver<Response>,
}

impl Response {
  /// Build a response for `request` out of an inbound message, returning
  /// the sender half of its `next` channel for the notification pump.
  pub(crate) fn fresh(request: Arc<Request>, msg: Message) -> (Sender<Response>, Response) {
    let (tx, next) = bounded(0);
    (tx, Response { msg, request, next })
  }

  /// The response status.
  pub fn status(&self) -> Status {
    Status(self.msg.code)
  }

  /// The payload's raw bytes.
  pub fn payload(&self) -> &[u8] {
    &self.msg.payload.0
  }

  /// The payload interpreted as a UTF-8 string.
  pub fn payload_string(&self) -> Result<String, FromUtf8Error> {
    String::from_utf8(self.payload().to_vec())
  }

  /// The first occurrence of option `number` on the response message.
  pub fn option(&self, number: OptNumber) -> Option<&OptValue> {
    self.msg.get(number)
  }

  /// The whole response message.
  pub fn msg(&self) -> &Message {
    &self.msg
  }

  /// The request this response answers.
  pub fn request(&self) -> &Request {
    &self.request
  }

  /// Block until the next Observe notification, or `None` when the
  /// stream has terminated.
  pub fn next(&self) -> Option<Response> {
    self.next.recv().ok()
  }
}

#[cfg(test)]
mod tests {
  use newt_msg::{Id, Token, Type};

  use super::*;
  use crate::req::Request;

  fn response(class: u8, detail: u8) -> Response {
    let req = Arc::new(Request::get("coap+uart://any/x".parse().unwrap()));
    let msg = Message::new(Type::Ack, Code::new(class, detail), Id(1), Token::default());
    Response::fresh(req, msg).1
  }

  #[test]
  fn status_strings() {
    assert_eq!(response(2, 5).status().to_string(), "2.05 Content");
    assert_eq!(response(4, 4).status().to_string(), "4.04 NotFound");
    assert_eq!(response(7, 31).status().to_string(), "7.31 Unknown (0xff)");
  }

  #[test]
  fn status_numbers() {
    assert_eq!(response(2, 5).status().number(), 205);
    assert_eq!(response(5, 3).status().number(), 503);
  }

  #[test]
  fn next_ends_immediately_without_observation() {
    // the pump never took the sender, so the chain is already closed
    assert!(response(2, 5).next().is_none());
  }
}
