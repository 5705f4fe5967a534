use std::fmt;
use std::io;

use newt_msg::Token;

/// The context that an error occurred in
#[derive(Debug)]
pub enum When {
  /// We were resolving or opening a connection to the named host
  Connecting(String),
  /// We were driving a round trip for the request with this token
  RoundTrip(Token),
  /// We were writing a packet
  Sending,
  /// We were reading or dispatching an inbound packet
  Receiving,
  /// No context worth mentioning
  None,
}

impl When {
  /// Construct a specific error from the context the error occurred in
  pub fn what(self, what: What) -> Error {
    Error { when: self, what }
  }
}

/// A contextless error with some additional debug data attached.
///
/// Malformed inbound bytes never surface here: the receive loop treats
/// them as fatal to the connection, so callers see them as
/// [`What::ConnectionClosed`] while the decode failure itself
/// ([`newt_msg::MessageParseError`]) goes to the log.
#[derive(Debug)]
pub enum What {
  /// The request was rejected before anything was sent
  InvalidRequest(RequestProblem),
  /// The underlying packet read or write failed
  Transport(io::Error),
  /// The operation was attempted on, or interrupted by, a closed
  /// connection
  ConnectionClosed,
  /// The caller-supplied cancellation handle fired
  Cancelled,
  /// Resolving host `"any"` exhausted all candidate ports
  NoUsablePort,
}

/// Ways a request can be unusable before anything touches the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestProblem {
  /// The request URI's scheme is not the one this transport serves
  #[allow(missing_docs)]
  WrongScheme { expected: &'static str, got: String },
  /// The request URI has no host
  MissingHost,
}

/// An error encounterable from within the runtime
#[derive(Debug)]
pub struct Error {
  /// What happened?
  pub what: What,
  /// What were we doing when it happened?
  pub when: When,
}

impl Error {
  /// Was this error caused by cancellation?
  pub fn is_cancelled(&self) -> bool {
    matches!(self.what, What::Cancelled)
  }

  /// Was this error caused by the connection going away?
  pub fn is_connection_closed(&self) -> bool {
    matches!(self.what, What::ConnectionClosed)
  }
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.when {
      | When::Connecting(host) => write!(f, "connecting to {}: ", host)?,
      | When::RoundTrip(token) => {
        write!(f, "round trip with token ")?;
        token.as_bytes()
             .iter()
             .try_for_each(|b| write!(f, "{:02x}", b))?;
        write!(f, ": ")?;
      },
      | When::Sending => write!(f, "sending packet: ")?,
      | When::Receiving => write!(f, "receiving packet: ")?,
      | When::None => {},
    }

    match &self.what {
      | What::InvalidRequest(RequestProblem::WrongScheme { expected, got }) => {
        write!(f, "invalid URL scheme, expected {} but got: {}", expected, got)
      },
      | What::InvalidRequest(RequestProblem::MissingHost) => f.write_str("missing URL host"),
      | What::Transport(e) => write!(f, "transport error: {}", e),
      | What::ConnectionClosed => f.write_str("connection closed"),
      | What::Cancelled => f.write_str("cancelled"),
      | What::NoUsablePort => f.write_str("failed to find usable serial port"),
    }
  }
}

impl std::error::Error for Error {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match &self.what {
      | What::Transport(e) => Some(e),
      | _ => None,
    }
  }
}
