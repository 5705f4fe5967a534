//! `newt` is a client-side CoAP runtime for framed serial transports.
//!
//! ## CoAP over UART
//! CoAP ([RFC7252](https://datatracker.ietf.org/doc/html/rfc7252))
//! copies the request/response semantics of HTTP into environments made
//! of **constrained** devices. It is usually spoken over UDP, but
//! nothing in the message layer requires datagrams from an IP stack;
//! any channel that can carry whole packets works. This crate drives
//! CoAP exchanges over such a channel, most notably a framed serial
//! link (e.g. SLIP over RS232), where the URI host names the port:
//!
//! ```text
//! coap+uart://COM3/sensors/temperature
//! coap+uart://ttyS2/sensors/temperature
//! coap+uart://any/sensors/temperature
//! ```
//!
//! ## Shape of the runtime
//! - [`transport::UartTransport`] is the front-end: it builds messages
//!   from [`req::Request`]s, resolves a [`net::Connection`] through a
//!   [`connector::Connector`], and returns [`resp::Response`]s.
//! - One [`connection::SerialConnection`] exists per port. It owns the
//!   receive loop that demultiplexes inbound messages onto
//!   [`interaction::Interaction`]s by token (or message id for
//!   empty-token Ack/Reset traffic), answers unknown traffic with RST,
//!   and closes itself after an idle timeout.
//! - Observe ([RFC7641](https://www.rfc-editor.org/rfc/rfc7641))
//!   notifications surface as a lazy chain of responses through
//!   [`resp::Response::next`].
//!
//! Independent requests multiplex freely over one shared connection,
//! from as many threads as the application likes.

#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![cfg_attr(not(test), deny(unsafe_code))]

#[cfg(test)]
pub(crate) mod test;

pub(crate) mod logging;

/// configuring runtime behavior
pub mod config;

/// serial connections and their receive loop
pub mod connection;

/// resolving hosts to connections
pub mod connector;

/// error types
pub mod error;

/// per-token request state machines
pub mod interaction;

/// packet transport and connection abstractions
pub mod net;

/// token and message-id generation
pub mod provision;

/// requests
pub mod req;

/// responses
pub mod resp;

/// the transport front-end
pub mod transport;

pub use config::Config;
pub use error::Error;
pub use interaction::{Cancel, Canceller};
pub use req::{Method, ReqBuilder, Request, Uri};
pub use resp::Response;
pub use transport::{UartTransport, UART_SCHEME};
