use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;

use newt_msg::{Id, Message, Token, Type};

use crate::config::Config;
use crate::error::{Error, What, When};
use crate::interaction::Interaction;
use crate::logging;
use crate::net::{Connection, PacketTransport};

/// A [`Connection`] over one framed serial link.
///
/// Owns the packet transport, hosts the receive loop, maintains the
/// interaction table and enforces the idle deadline. Created by a
/// [`Connector`](crate::connector::Connector), one per port name.
#[derive(Debug)]
pub struct SerialConnection<T> {
  name: String,
  transport: T,
  config: Config,
  /// Guards the transport's reader side; effectively only the receive
  /// loop reads.
  read_mu: Mutex<()>,
  /// Guards the transport's writer side.
  write_mu: Mutex<()>,
  deadline: Mutex<Instant>,
  closed: AtomicBool,
  interactions: Mutex<Vec<Arc<Interaction>>>,
}

impl<T: PacketTransport + 'static> SerialConnection<T> {
  /// Create a connection over `transport`. Call
  /// [`open`](SerialConnection::open) to start the receive loop and the
  /// idle watcher.
  pub fn new(name: impl Into<String>, transport: T, config: Config) -> Arc<Self> {
    Arc::new(SerialConnection { name: name.into(),
                                transport,
                                config,
                                read_mu: Mutex::new(()),
                                write_mu: Mutex::new(()),
                                deadline: Mutex::new(Instant::now() + config.idle_timeout),
                                closed: AtomicBool::new(false),
                                interactions: Mutex::new(Vec::new()) })
  }

  /// Mark the connection live and spawn the receive loop and the
  /// idle-deadline watcher.
  pub fn open(self: &Arc<Self>) {
    self.reset_deadline();

    let conn = Arc::clone(self);
    thread::spawn(move || conn.close_after_deadline());

    let conn = Arc::clone(self);
    thread::spawn(move || conn.receive_loop());
  }

  /// The port name this connection was opened for.
  pub fn name(&self) -> &str {
    &self.name
  }

  fn read_packet(&self) -> std::io::Result<Vec<u8>> {
    let _guard = self.read_mu.lock().expect("read mutex poisoned");
    let packet = self.transport.read_packet();
    if packet.is_ok() {
      self.reset_deadline();
    }
    packet
  }

  fn reset_deadline(&self) {
    *self.deadline.lock().expect("deadline mutex poisoned") =
      Instant::now() + self.config.idle_timeout;
  }

  /// Sleep until the idle deadline; if traffic moved it, re-arm,
  /// otherwise close the connection.
  fn close_after_deadline(self: Arc<Self>) {
    loop {
      let deadline = *self.deadline.lock().expect("deadline mutex poisoned");
      let now = Instant::now();

      if self.is_closed() {
        return;
      }

      if now >= deadline {
        self.close();
        log::info!("serial connection {} closed after idle deadline", self.name);
        return;
      }

      thread::sleep(deadline - now);
    }
  }

  /// Read packets until close: parse, look the interaction up, deliver.
  ///
  /// Parse failures are fatal to the connection since framing is
  /// presumed lost; unmatched messages get a Reset and are dropped.
  fn receive_loop(self: Arc<Self>) {
    loop {
      let packet = match self.read_packet() {
        | Ok(packet) => packet,
        | Err(e) => {
          if !self.is_closed() {
            log::error!("failed to read packet on {}, closing connection: {}", self.name, e);
            self.close();
          }
          return;
        },
      };

      let msg = match Message::from_bytes(&packet) {
        | Ok(msg) => msg,
        | Err(e) => {
          log::error!("failed to parse inbound message on {}, closing connection: {}",
                      self.name,
                      e);
          self.close();
          return;
        },
      };

      // Con/Non traffic must not be matched by message id alone
      let id_match = match msg.ty {
        | Type::Ack | Type::Reset => Some(msg.id),
        | Type::Con | Type::Non => None,
      };

      match self.find_interaction(msg.token, id_match) {
        | Some(ia) => ia.handle_message(msg, self.config.handoff_timeout),
        | None => {
          log::warn!("no interaction for inbound {} (id {}, options [{}]), sending RST and dropping",
                     logging::msg_summary(&msg),
                     msg.id.0,
                     logging::opts_summary(&msg));

          // even non-confirmable messages can be answered with a RST
          if let Err(e) = self.send(&Message::rst(msg.id).to_bytes()) {
            log::warn!("failed to send RST on {}: {}", self.name, e);
          }
        },
      }
    }
  }
}

impl<T: PacketTransport + 'static> Connection for SerialConnection<T> {
  fn send(&self, packet: &[u8]) -> Result<(), Error> {
    if self.is_closed() {
      return Err(When::Sending.what(What::ConnectionClosed));
    }

    let _guard = self.write_mu.lock().expect("write mutex poisoned");
    self.transport
        .write_packet(packet)
        .map_err(|e| When::Sending.what(What::Transport(e)))?;

    self.reset_deadline();
    Ok(())
  }

  fn add_interaction(&self, ia: Arc<Interaction>) {
    self.interactions
        .lock()
        .expect("interactions mutex poisoned")
        .push(ia);
  }

  fn find_interaction(&self, token: Token, id: Option<Id>) -> Option<Arc<Interaction>> {
    self.interactions
        .lock()
        .expect("interactions mutex poisoned")
        .iter()
        .find(|ia| {
          if !token.is_empty() {
            return ia.token() == token;
          }

          // for empty tokens the message id must match
          id.map(|id| ia.message_id() == id).unwrap_or(false)
        })
        .cloned()
  }

  fn remove_interaction(&self, token: Token) {
    self.interactions
        .lock()
        .expect("interactions mutex poisoned")
        .retain(|ia| ia.token() != token);
  }

  fn close(&self) {
    if self.closed.swap(true, Ordering::SeqCst) {
      return;
    }

    if let Err(e) = self.transport.close() {
      log::error!("failed to close serial port {}: {}", self.name, e);
    }

    let interactions =
      std::mem::take(&mut *self.interactions.lock().expect("interactions mutex poisoned"));
    interactions.iter().for_each(|ia| ia.fail());
  }

  fn is_closed(&self) -> bool {
    self.closed.load(Ordering::SeqCst)
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use newt_msg::{Code, Message, Token};

  use super::*;
  use crate::interaction::Cancel;
  use crate::test::{test_transport, TestLink, TestTransport};

  fn config(idle_ms: u64) -> Config {
    Config { idle_timeout: Duration::from_millis(idle_ms),
             ..Config::default() }
  }

  fn open_connection(config: Config) -> (Arc<SerialConnection<TestTransport>>, TestLink) {
    let (transport, link) = test_transport();
    let conn = SerialConnection::new("test", transport, config);
    conn.open();
    (conn, link)
  }

  fn con_get(id: u16, token: &[u8]) -> Message {
    Message::new(Type::Con,
                 Code::new(0, 1),
                 Id(id),
                 Token::try_from(token).unwrap())
  }

  fn spawn_round_trip(conn: &Arc<SerialConnection<TestTransport>>,
                      msg: Message)
                      -> (Arc<Interaction>, crossbeam_channel::Receiver<Result<Message, Error>>) {
    let as_dyn = Arc::clone(conn) as Arc<dyn Connection>;
    let ia = Arc::new(Interaction::new(Arc::downgrade(&as_dyn), msg.token));
    conn.add_interaction(Arc::clone(&ia));

    let (tx, rx) = crossbeam_channel::bounded(1);
    let worker = Arc::clone(&ia);
    thread::spawn(move || {
      tx.send(worker.round_trip(&Cancel::never(), msg)).ok();
    });

    (ia, rx)
  }

  #[test]
  fn unmatched_inbound_triggers_exactly_one_rst() {
    let (_conn, link) = open_connection(config(60_000));

    link.feed_message(&con_get(0x1234, &[1]));

    let rst = link.sent(Duration::from_secs(1)).expect("no RST sent");
    assert_eq!(rst, vec![0x70, 0x00, 0x12, 0x34]);

    let parsed = Message::from_bytes(&rst).unwrap();
    assert_eq!(parsed.ty, Type::Reset);
    assert_eq!(parsed.code, Code::new(0, 0));
    assert_eq!(parsed.id, Id(0x1234));
    assert!(parsed.token.is_empty());
    assert!(parsed.payload.0.is_empty());

    // exactly once
    assert_eq!(link.sent(Duration::from_millis(150)), None);
  }

  #[test]
  fn non_confirmable_unmatched_also_gets_rst() {
    let (_conn, link) = open_connection(config(60_000));

    let mut msg = con_get(0x77AA, &[]);
    msg.ty = Type::Non;
    link.feed_message(&msg);

    let rst = link.sent_message(Duration::from_secs(1)).expect("no RST sent");
    assert_eq!(rst.ty, Type::Reset);
    assert_eq!(rst.id, Id(0x77AA));
  }

  #[test]
  fn parse_failure_closes_connection() {
    let (conn, link) = open_connection(config(60_000));

    link.feed(vec![0xFF, 0x00]);

    // the receive loop treats lost framing as fatal
    let deadline = Instant::now() + Duration::from_secs(1);
    while !conn.is_closed() && Instant::now() < deadline {
      thread::sleep(Duration::from_millis(5));
    }
    assert!(conn.is_closed());
  }

  #[test]
  fn idle_deadline_closes_connection() {
    let (conn, _link) = open_connection(config(80));

    thread::sleep(Duration::from_millis(20));
    assert!(!conn.is_closed());

    thread::sleep(Duration::from_millis(250));
    assert!(conn.is_closed());
  }

  #[test]
  fn traffic_pushes_idle_deadline_out() {
    let (conn, link) = open_connection(config(400));

    thread::sleep(Duration::from_millis(200));
    // inbound traffic refreshes the deadline, even when it only earns a RST
    link.feed_message(&con_get(1, &[9]));

    thread::sleep(Duration::from_millis(300));
    assert!(!conn.is_closed());

    thread::sleep(Duration::from_millis(700));
    assert!(conn.is_closed());
  }

  #[test]
  fn close_is_idempotent() {
    let (conn, _link) = open_connection(config(60_000));
    conn.close();
    conn.close();
    assert!(conn.is_closed());
  }

  #[test]
  fn send_on_closed_connection_fails() {
    let (conn, _link) = open_connection(config(60_000));
    conn.close();

    let err = conn.send(&[0x40, 0x01, 0x00, 0x01]).unwrap_err();
    assert!(matches!(err.what, What::ConnectionClosed));
  }

  #[test]
  fn close_fails_pending_round_trips() {
    let (conn, link) = open_connection(config(60_000));

    let (_ia, result) = spawn_round_trip(&conn, con_get(7, &[1, 2]));
    link.sent(Duration::from_secs(1)).expect("request never written");

    conn.close();

    let err = result.recv_timeout(Duration::from_secs(1))
                    .expect("round trip still blocked")
                    .unwrap_err();
    assert!(matches!(err.what, What::ConnectionClosed));
  }

  #[test]
  fn response_with_token_reaches_interaction() {
    let (conn, link) = open_connection(config(60_000));

    let (_ia, result) = spawn_round_trip(&conn, con_get(7, &[1, 2]));
    let req = link.sent_message(Duration::from_secs(1)).expect("request never written");

    let mut reply = req.ack(req.id);
    reply.code = Code::new(2, 5);
    reply.payload.0 = b"ok".to_vec();
    link.feed_message(&reply);

    let res = result.recv_timeout(Duration::from_secs(1)).unwrap().unwrap();
    assert_eq!(res.code, Code::new(2, 5));
    assert_eq!(res.payload.0, b"ok".to_vec());
  }

  #[test]
  fn empty_token_ack_matches_by_message_id() {
    let (conn, link) = open_connection(config(60_000));

    let (_ia, result) = spawn_round_trip(&conn, con_get(42, &[1, 2, 3]));
    link.sent(Duration::from_secs(1)).expect("request never written");

    // separate-response style empty ACK: no token, matching id
    link.feed_message(&Message::new(Type::Ack, Code::new(0, 0), Id(42), Token::default()));

    let res = result.recv_timeout(Duration::from_secs(1)).unwrap().unwrap();
    assert_eq!(res.ty, Type::Ack);
    assert_eq!(res.id, Id(42));
  }

  #[test]
  fn empty_token_con_never_matches_by_message_id() {
    let (conn, link) = open_connection(config(60_000));

    let (_ia, result) = spawn_round_trip(&conn, con_get(42, &[1, 2, 3]));
    link.sent(Duration::from_secs(1)).expect("request never written");

    // a Con with a matching id but no token must be RST, not delivered
    link.feed_message(&Message::new(Type::Con, Code::new(2, 5), Id(42), Token::default()));

    let rst = link.sent_message(Duration::from_secs(1)).expect("no RST sent");
    assert_eq!(rst.ty, Type::Reset);
    assert_eq!(rst.id, Id(42));

    assert!(result.try_recv().is_err());
    conn.close();
  }

  #[test]
  fn find_interaction_prefers_token_match() {
    let (conn, _link) = open_connection(config(60_000));

    let as_dyn = Arc::clone(&conn) as Arc<dyn Connection>;
    let token = Token::try_from(&[5u8][..]).unwrap();
    let ia = Arc::new(Interaction::new(Arc::downgrade(&as_dyn), token));
    conn.add_interaction(Arc::clone(&ia));

    assert!(conn.find_interaction(token, None).is_some());
    assert!(conn.find_interaction(Token::try_from(&[6u8][..]).unwrap(), None).is_none());
    assert!(conn.find_interaction(Token::default(), None).is_none());

    conn.remove_interaction(token);
    assert!(conn.find_interaction(token, None).is_none());
  }
}
