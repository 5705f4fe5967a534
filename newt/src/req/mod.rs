use std::fmt;
use std::str::FromStr;

use newt_msg::{Code, OptNumber, OptValue, Opts, Token};

/// Request builder
pub mod builder;

#[doc(inline)]
pub use builder::*;

/// Request methods
///
/// The four methods of [RFC7252 section 5.8](https://datatracker.ietf.org/doc/html/rfc7252#section-5.8).
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Method {
  /// Retrieve a representation of a resource (0.01)
  Get,
  /// Process the representation enclosed in the request (0.02)
  Post,
  /// Update or create the resource with the enclosed representation (0.03)
  Put,
  /// Delete the resource (0.04)
  Delete,
}

impl Method {
  /// The message code for this method.
  pub fn code(&self) -> Code {
    use Method::*;
    match self {
      | Get => Code::new(0, 1),
      | Post => Code::new(0, 2),
      | Put => Code::new(0, 3),
      | Delete => Code::new(0, 4),
    }
  }
}

impl fmt::Display for Method {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    use Method::*;
    f.write_str(match self {
       | Get => "GET",
       | Post => "POST",
       | Put => "PUT",
       | Delete => "DELETE",
     })
  }
}

/// A pre-parsed request target.
///
/// The host names a serial port (`COM3`, `ttyUSB0`, or the literal
/// `any`); path and query map to the Uri-Path and Uri-Query options.
/// Full URL parsing belongs to the application; [`Uri::from_str`] covers
/// the plain `scheme://host/path?query` shape.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Uri {
  /// URI scheme, e.g. `coap+uart`
  pub scheme: String,
  /// Port identifier
  pub host: String,
  /// `/`-separated resource path
  pub path: String,
  /// `&`-separated query
  pub query: String,
}

/// Errors from [`Uri::from_str`]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct UriParseError;

impl fmt::Display for UriParseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("expected scheme://host[/path][?query]")
  }
}

impl std::error::Error for UriParseError {}

impl FromStr for Uri {
  type Err = UriParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (scheme, rest) = s.split_once("://").ok_or(UriParseError)?;
    if scheme.is_empty() {
      return Err(UriParseError);
    }

    let (rest, query) = match rest.split_once('?') {
      | Some((rest, query)) => (rest, query),
      | None => (rest, ""),
    };

    let (host, path) = match rest.split_once('/') {
      | Some((host, path)) => (host, path),
      | None => (rest, ""),
    };

    Ok(Uri { scheme: scheme.into(),
             host: host.into(),
             path: path.into(),
             query: query.into() })
  }
}

impl fmt::Display for Uri {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}://{}", self.scheme, self.host)?;
    if !self.path.is_empty() {
      write!(f, "/{}", self.path)?;
    }
    if !self.query.is_empty() {
      write!(f, "?{}", self.query)?;
    }
    Ok(())
  }
}

/// A CoAP request, ready to hand to
/// [`UartTransport::round_trip`](crate::transport::UartTransport::round_trip).
///
/// ```
/// use newt::req::{Method, Request};
///
/// let req = Request::get("coap+uart://any/sensors/temperature".parse().unwrap());
/// assert_eq!(req.method, Method::Get);
/// assert_eq!(req.uri.host, "any");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
  /// See [`Method`]
  pub method: Method,
  /// See [`Uri`]
  pub uri: Uri,
  /// Whether to send the request as a Confirmable message
  pub confirmable: bool,
  /// Correlation token; left empty, the transport generates a fresh
  /// random one. Set it explicitly e.g. to cancel an observe.
  pub token: Token,
  /// Options copied onto the outgoing message
  pub options: Opts,
  /// Request body
  pub payload: Vec<u8>,
}

impl Request {
  /// Create a request with no options and an empty payload.
  pub fn new(method: Method, uri: Uri) -> Self {
    Request { method,
              uri,
              confirmable: true,
              token: Token::default(),
              options: Opts::default(),
              payload: Vec::new() }
  }

  /// Shorthand for a GET [`RequestBuilder`]-less request.
  pub fn get(uri: Uri) -> Self {
    Self::new(Method::Get, uri)
  }

  /// The first occurrence of option `number`, if set.
  pub fn option(&self, number: OptNumber) -> Option<&OptValue> {
    self.options.get(&number).and_then(|vs| vs.first())
  }
}
