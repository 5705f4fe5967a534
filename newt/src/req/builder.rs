use newt_msg::known::no_repeat;
use newt_msg::{OptNumber, OptValue, Token};

use super::{Method, Request, Uri};

/// Fluent builder for [`Request`]s.
///
/// ```
/// use newt::req::ReqBuilder;
/// use newt_msg::known::ContentFormat;
///
/// let req = ReqBuilder::get("coap+uart://any/sensors/temperature".parse().unwrap())
///             .accept(ContentFormat::Text)
///             .observe()
///             .build();
///
/// assert!(req.confirmable);
/// ```
#[derive(Clone, Debug)]
pub struct ReqBuilder {
  req: Request,
}

impl ReqBuilder {
  /// Start building a request with the given method and target.
  pub fn new(method: Method, uri: Uri) -> Self {
    ReqBuilder { req: Request::new(method, uri) }
  }

  /// Start building a GET request.
  pub fn get(uri: Uri) -> Self {
    Self::new(Method::Get, uri)
  }

  /// Start building a POST request.
  pub fn post(uri: Uri) -> Self {
    Self::new(Method::Post, uri)
  }

  /// Start building a PUT request.
  pub fn put(uri: Uri) -> Self {
    Self::new(Method::Put, uri)
  }

  /// Start building a DELETE request.
  pub fn delete(uri: Uri) -> Self {
    Self::new(Method::Delete, uri)
  }

  /// Send as Non-confirmable instead of the default Confirmable.
  pub fn non_confirmable(mut self) -> Self {
    self.req.confirmable = false;
    self
  }

  /// Use a specific token instead of a freshly generated one.
  pub fn token(mut self, token: Token) -> Self {
    self.req.token = token;
    self
  }

  /// Register for Observe notifications (sets Observe to 0).
  ///
  /// <https://www.rfc-editor.org/rfc/rfc7641#section-2>
  pub fn observe(self) -> Self {
    self.option(no_repeat::OBSERVE, OptValue::uint(0))
  }

  /// Ask the server to stop observing (sets Observe to 1).
  pub fn stop_observing(self) -> Self {
    self.option(no_repeat::OBSERVE, OptValue::uint(1))
  }

  /// Declare the representation format we accept.
  pub fn accept(self, format: newt_msg::known::ContentFormat) -> Self {
    self.option(no_repeat::ACCEPT, format)
  }

  /// Declare the representation format of the payload.
  pub fn content_format(self, format: newt_msg::known::ContentFormat) -> Self {
    self.option(no_repeat::CONTENT_FORMAT, format)
  }

  /// Replace option `number` with `value`.
  pub fn option(mut self, number: OptNumber, value: impl Into<OptValue>) -> Self {
    self.req.options.insert(number, vec![value.into()]);
    self
  }

  /// Append an occurrence of the repeatable option `number`.
  pub fn add_option(mut self, number: OptNumber, value: impl Into<OptValue>) -> Self {
    self.req.options.entry(number).or_default().push(value.into());
    self
  }

  /// Set the request body.
  pub fn payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
    self.req.payload = payload.into();
    self
  }

  /// Finish building.
  pub fn build(self) -> Request {
    self.req
  }
}

#[cfg(test)]
mod tests {
  use newt_msg::known::no_repeat;

  use super::*;

  #[test]
  fn observe_sets_option_zero() {
    let req = ReqBuilder::get("coap+uart://any/x".parse().unwrap()).observe().build();
    assert_eq!(req.option(no_repeat::OBSERVE), Some(&OptValue::uint(0)));
    assert_eq!(req.option(no_repeat::OBSERVE).unwrap().as_uint(), 0);
  }

  #[test]
  fn builder_round() {
    let req = ReqBuilder::post("coap+uart://COM3/actuate".parse().unwrap()).non_confirmable()
                                                                           .payload(b"on".to_vec())
                                                                           .build();

    assert_eq!(req.method, Method::Post);
    assert!(!req.confirmable);
    assert_eq!(req.payload, b"on".to_vec());
  }
}
