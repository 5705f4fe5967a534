use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender};
use newt_msg::known::no_repeat;
use newt_msg::{Message, Payload, Type};

use crate::connector::Connector;
use crate::error::{Error, RequestProblem, What, When};
use crate::interaction::{Cancel, Interaction};
use crate::net::Connection;
use crate::provision::{IdSequence, RandomTokenGenerator, TokenGenerator};
use crate::req::Request;
use crate::resp::Response;

/// The URI scheme served by [`UartTransport`].
pub const UART_SCHEME: &str = "coap+uart";

/// The transport front-end for serial links.
///
/// Accepts an application [`Request`], builds the CoAP message, resolves
/// or creates a connection through its [`Connector`], drives the
/// interaction and returns a [`Response`] whose `next` chain carries any
/// negotiated Observe notifications.
///
/// `round_trip` may be called from several threads at once; independent
/// interactions multiplex freely over one shared connection.
#[derive(Debug)]
pub struct UartTransport {
  msg_ids: IdSequence,
  token_generator: Box<dyn TokenGenerator>,
  connector: Box<dyn Connector>,
}

impl UartTransport {
  /// Create a transport resolving connections through `connector`.
  pub fn new(connector: impl Connector + 'static) -> Self {
    UartTransport { msg_ids: IdSequence::new(),
                    token_generator: Box::new(RandomTokenGenerator::new()),
                    connector: Box::new(connector) }
  }

  /// Swap the token generator, e.g. for deterministic tests.
  pub fn with_token_generator(mut self, gen: impl TokenGenerator + 'static) -> Self {
    self.token_generator = Box::new(gen);
    self
  }

  /// Issue a request and wait for its first response.
  ///
  /// Equivalent to [`round_trip`](Self::round_trip) with a cancellation
  /// handle that never fires.
  pub fn send(&self, req: Request) -> Result<Response, Error> {
    self.round_trip(&Cancel::never(), req)
  }

  /// Issue a request and wait for its first response, aborting early if
  /// `cancel` fires.
  ///
  /// If the request carried `Observe: 0` and the response negotiates the
  /// observation, subsequent notifications appear on the response's
  /// [`next`](Response::next) chain.
  pub fn round_trip(&self, cancel: &Cancel, mut req: Request) -> Result<Response, Error> {
    if req.uri.scheme != UART_SCHEME {
      return Err(When::None.what(What::InvalidRequest(RequestProblem::WrongScheme {
        expected: UART_SCHEME,
        got: req.uri.scheme.clone(),
      })));
    }
    if req.uri.host.is_empty() {
      return Err(When::None.what(What::InvalidRequest(RequestProblem::MissingHost)));
    }

    // the caller may set a specific token, e.g. to cancel an observe;
    // otherwise create a random one
    if req.token.is_empty() {
      req.token = self.token_generator.next_token();
    }

    let msg = self.build_request_message(&req);
    let observe_requested = msg.get_uint(no_repeat::OBSERVE) == Some(0);

    let conn = self.connector.connect(&req.uri.host)?;

    // when cancelling an observe we must reuse the interaction
    let ia = match conn.find_interaction(req.token, None) {
      | Some(ia) => {
        // a round trip during an active observation would race the
        // listener for the response, so stop listening first
        ia.stop_listening();
        ia
      },
      | None => {
        log::info!("start interaction with token {:?}", req.token);
        let ia = Arc::new(Interaction::new(Arc::downgrade(&conn), req.token));
        conn.add_interaction(Arc::clone(&ia));
        ia
      },
    };

    let token = req.token;
    let res_msg = match ia.round_trip(cancel, msg) {
      | Ok(res_msg) => res_msg,
      | Err(e) => {
        // the interaction is dead either way; keep the table bounded
        conn.remove_interaction(token);
        return Err(When::RoundTrip(token).what(e.what));
      },
    };

    let observing = observe_requested && res_msg.get(no_repeat::OBSERVE).is_some();

    let request = Arc::new(req);
    let (next_tx, res) = Response::fresh(Arc::clone(&request), res_msg);

    // an observe request sets Observe to 0 and the server answers with
    // the option present; everything else is done after one exchange
    if observing {
      let notifications = ia.listen_for_notifications();
      thread::spawn(move || pump_notifications(notifications, request, next_tx));
    } else {
      conn.remove_interaction(token);
    }

    Ok(res)
  }

  /// Build the CoAP message for a request.
  fn build_request_message(&self, req: &Request) -> Message {
    let ty = if req.confirmable { Type::Con } else { Type::Non };

    let mut msg = Message::new(ty, req.method.code(), self.msg_ids.next(), req.token);
    msg.opts = req.options.clone();
    msg.set_path(&req.uri.path);
    msg.set_query(&req.uri.query);
    msg.payload = Payload(req.payload.clone());

    msg
  }
}

/// Forward notifications into the response chain, each new message
/// producing a fresh [`Response`] carrying its own `next`. Dropping the
/// final sender closes the chain when the source closes.
fn pump_notifications(notifications: Receiver<Message>,
                      request: Arc<Request>,
                      mut next_tx: Sender<Response>) {
  while let Ok(msg) = notifications.recv() {
    let (tx, res) = Response::fresh(Arc::clone(&request), msg);

    if next_tx.send(res).is_err() {
      // the chain's consumer is gone
      return;
    }

    next_tx = tx;
  }

  log::info!("stopped observer, no more notifies expected");
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use newt_msg::known::repeat;
  use newt_msg::{Code, Id, OptValue, Token};

  use super::*;
  use crate::config::Config;
  use crate::error::RequestProblem;
  use crate::req::ReqBuilder;
  use crate::test::{TestConnector, TestLink};

  const SEC: Duration = Duration::from_secs(1);

  fn transport() -> (UartTransport, TestLink) {
    let (connector, link) = TestConnector::new(Config::default());
    (UartTransport::new(connector), link)
  }

  fn reply(link: &TestLink, req: &Message, code: Code, payload: &[u8]) {
    let mut res = req.ack(req.id);
    res.code = code;
    res.payload.0 = payload.to_vec();
    link.feed_message(&res);
  }

  #[test]
  fn round_trip_returns_first_response() {
    let (uart, link) = transport();

    let responder = std::thread::spawn(move || {
      let req = link.sent_message(SEC).expect("request never written");

      assert_eq!(req.ty, Type::Con);
      assert_eq!(req.code, Code::new(0, 1));
      assert_eq!(req.path(), "sensors/temperature");
      assert_eq!(req.get_all(repeat::QUERY), &[OptValue(b"fast".to_vec())]);
      assert_eq!(req.token.as_bytes().len(), 8);

      reply(&link, &req, Code::new(2, 5), b"22.3 C");
      link
    });

    let res = uart.send(Request::get("coap+uart://any/sensors/temperature?fast".parse().unwrap()))
                  .unwrap();

    assert_eq!(res.status().number(), 205);
    assert_eq!(res.status().to_string(), "2.05 Content");
    assert_eq!(res.payload(), b"22.3 C");
    assert_eq!(res.request().uri.host, "any");

    // no observation: the chain ends immediately
    assert!(res.next().is_none());
    responder.join().unwrap();
  }

  #[test]
  fn non_confirmable_request_keeps_type() {
    let (uart, link) = transport();

    let responder = std::thread::spawn(move || {
      let req = link.sent_message(SEC).expect("request never written");
      assert_eq!(req.ty, Type::Non);
      reply(&link, &req, Code::new(2, 4), b"");
    });

    let req = ReqBuilder::post("coap+uart://ttyS2/actuate".parse().unwrap()).non_confirmable()
                                                                            .payload(b"on".to_vec())
                                                                            .build();
    let res = uart.send(req).unwrap();
    assert_eq!(res.status().number(), 204);
    responder.join().unwrap();
  }

  #[test]
  fn message_ids_are_monotonic_per_transport() {
    let (uart, link) = transport();

    let responder = std::thread::spawn(move || {
      (0..3).map(|_| {
              let req = link.sent_message(SEC).expect("request never written");
              reply(&link, &req, Code::new(2, 5), b"");
              req.id.0
            })
            .collect::<Vec<_>>()
    });

    (0..3).for_each(|_| {
            uart.send(Request::get("coap+uart://any/x".parse().unwrap())).unwrap();
          });

    assert_eq!(responder.join().unwrap(), vec![1, 2, 3]);
  }

  #[derive(Debug)]
  struct FixedTokens;

  impl TokenGenerator for FixedTokens {
    fn next_token(&self) -> Token {
      Token::try_from(&[9u8; 8][..]).unwrap()
    }
  }

  #[test]
  fn empty_request_token_gets_generated() {
    let (connector, link) = TestConnector::new(Config::default());
    let uart = UartTransport::new(connector).with_token_generator(FixedTokens);

    let responder = std::thread::spawn(move || {
      let req = link.sent_message(SEC).expect("request never written");
      assert_eq!(req.token, Token::try_from(&[9u8; 8][..]).unwrap());
      reply(&link, &req, Code::new(2, 5), b"");
    });

    uart.send(Request::get("coap+uart://any/x".parse().unwrap())).unwrap();
    responder.join().unwrap();
  }

  #[test]
  fn wrong_scheme_is_rejected() {
    let (uart, _link) = transport();

    let err = uart.send(Request::get("coap://any/x".parse().unwrap())).unwrap_err();
    assert!(matches!(err.what,
                     What::InvalidRequest(RequestProblem::WrongScheme { .. })));
  }

  #[test]
  fn missing_host_is_rejected() {
    let (uart, _link) = transport();

    let err = uart.send(Request::get("coap+uart:///x".parse().unwrap())).unwrap_err();
    assert!(matches!(err.what, What::InvalidRequest(RequestProblem::MissingHost)));
  }

  #[test]
  fn caller_token_is_kept_and_errors_carry_it() {
    let (uart, _link) = transport();

    let token = Token::try_from(&[0xAB, 0xCD][..]).unwrap();
    let req = ReqBuilder::get("coap+uart://any/x".parse().unwrap()).token(token).build();

    let (canceller, cancel) = Cancel::handle();
    canceller.cancel();

    let err = uart.round_trip(&cancel, req).unwrap_err();
    assert!(err.is_cancelled());
    assert!(err.to_string().contains("abcd"));
  }

  #[test]
  fn cancelled_round_trip_fails() {
    let (uart, link) = transport();

    let (canceller, cancel) = Cancel::handle();

    let canceller_thread = std::thread::spawn(move || {
      link.sent_message(SEC).expect("request never written");
      canceller.cancel();
      link
    });

    let err = uart.round_trip(&cancel, Request::get("coap+uart://any/x".parse().unwrap()))
                  .unwrap_err();
    assert!(err.is_cancelled());
    canceller_thread.join().unwrap();
  }

  #[test]
  fn closed_connection_fails_round_trip() {
    let (connector, link) = TestConnector::new(Config::default());
    let conn = connector.connection();
    let uart = UartTransport::new(connector);

    let closer = std::thread::spawn(move || {
      link.sent_message(SEC).expect("request never written");
      conn.close();
      link
    });

    let err = uart.send(Request::get("coap+uart://any/x".parse().unwrap())).unwrap_err();
    assert!(err.is_connection_closed());
    closer.join().unwrap();
  }

  #[test]
  fn completed_interaction_is_evicted() {
    let (connector, link) = TestConnector::new(Config::default());
    let conn = connector.connection();
    let uart = UartTransport::new(connector);

    let responder = std::thread::spawn(move || {
      let req = link.sent_message(SEC).expect("request never written");
      reply(&link, &req, Code::new(2, 5), b"");
      req.token
    });

    uart.send(Request::get("coap+uart://any/x".parse().unwrap())).unwrap();
    let token = responder.join().unwrap();

    assert!(conn.find_interaction(token, None).is_none());
  }

  #[test]
  fn observe_streams_notifications_in_arrival_order() {
    let (connector, link) = TestConnector::new(Config::default());
    let conn = connector.connection();
    let uart = UartTransport::new(connector);

    let responder = std::thread::spawn(move || {
      let req = link.sent_message(SEC).expect("request never written");
      assert_eq!(req.get_uint(no_repeat::OBSERVE), Some(0));

      let mut res = req.ack(req.id);
      res.code = Code::new(2, 5);
      res.set_uint(no_repeat::OBSERVE, 1);
      res.payload.0 = b"v1".to_vec();
      link.feed_message(&res);

      (2u16..=3).for_each(|seq| {
                  let mut notification =
                    Message::new(Type::Non, Code::new(2, 5), Id(1000 + seq), req.token);
                  notification.set_uint(no_repeat::OBSERVE, seq as u32);
                  notification.payload.0 = format!("v{}", seq).into_bytes();
                  link.feed_message(&notification);
                });

      (link, req.token)
    });

    let req = ReqBuilder::get("coap+uart://any/sensors/temperature".parse().unwrap()).observe()
                                                                                     .build();
    let res = uart.send(req).unwrap();
    assert_eq!(res.payload(), b"v1");

    let second = res.next().expect("stream ended before first notification");
    assert_eq!(second.payload(), b"v2");
    assert_eq!(second.option(no_repeat::OBSERVE), Some(&OptValue::uint(2)));

    let third = second.next().expect("stream ended before second notification");
    assert_eq!(third.payload(), b"v3");

    let (_link, token) = responder.join().unwrap();

    // the streaming interaction stays registered until cancelled
    let ia = conn.find_interaction(token, None).expect("interaction evicted while streaming");
    assert!(ia.is_listening());

    // closing the connection terminates the stream
    conn.close();
    assert!(third.next().is_none());
  }

  #[test]
  fn new_round_trip_on_same_token_stops_streaming() {
    let (connector, link) = TestConnector::new(Config::default());
    let conn = connector.connection();
    let uart = UartTransport::new(connector);

    let token = Token::try_from(&[0x0B, 0x0E][..]).unwrap();

    let responder = std::thread::spawn(move || {
      // observe registration
      let req = link.sent_message(SEC).expect("request never written");
      let mut res = req.ack(req.id);
      res.code = Code::new(2, 5);
      res.set_uint(no_repeat::OBSERVE, 1);
      res.payload.0 = b"v1".to_vec();
      link.feed_message(&res);

      // deregistration on the same token
      let req = link.sent_message(SEC).expect("second request never written");
      assert_eq!(req.get_uint(no_repeat::OBSERVE), Some(1));
      reply(&link, &req, Code::new(2, 5), b"bye");
      link
    });

    let observe = ReqBuilder::get("coap+uart://any/x".parse().unwrap()).token(token)
                                                                       .observe()
                                                                       .build();
    let streaming = uart.send(observe).unwrap();
    assert_eq!(streaming.payload(), b"v1");

    let deregister = ReqBuilder::get("coap+uart://any/x".parse().unwrap()).token(token)
                                                                          .stop_observing()
                                                                          .build();
    let last = uart.send(deregister).unwrap();
    assert_eq!(last.payload(), b"bye");

    // the listener was cancelled, so the old stream terminates
    assert!(streaming.next().is_none());

    // the deregistration response negotiated nothing, so the
    // interaction is gone
    assert!(conn.find_interaction(token, None).is_none());
    responder.join().unwrap();
  }
}
