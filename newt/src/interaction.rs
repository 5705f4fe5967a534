use std::sync::{Mutex, Weak};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, never, select, Receiver, Sender};
use newt_msg::{Id, Message, Token};

use crate::error::{Error, What, When};
use crate::logging;
use crate::net::Connection;

/// Cancellation handle observed by [`Interaction::round_trip`].
///
/// A round trip has no built-in timeout; callers impose one by passing
/// [`Cancel::after`], or cancel explicitly through a [`Canceller`].
#[derive(Clone, Debug)]
pub struct Cancel(pub(crate) Receiver<Instant>);

impl Cancel {
  /// A handle that never fires.
  pub fn never() -> Self {
    Cancel(never())
  }

  /// A handle that fires once `timeout` has elapsed.
  pub fn after(timeout: Duration) -> Self {
    Cancel(crossbeam_channel::after(timeout))
  }

  /// A handle fired manually through the returned [`Canceller`].
  ///
  /// Dropping the `Canceller` without calling
  /// [`cancel`](Canceller::cancel) also fires the handle.
  pub fn handle() -> (Canceller, Self) {
    let (tx, rx) = bounded(1);
    (Canceller(tx), Cancel(rx))
  }
}

/// The firing end of a [`Cancel::handle`] pair.
#[derive(Clone, Debug)]
pub struct Canceller(Sender<Instant>);

impl Canceller {
  /// Abort the round trip(s) waiting on the paired [`Cancel`].
  pub fn cancel(&self) {
    self.0.try_send(Instant::now()).ok();
  }
}

/// In-process record of one outstanding CoAP exchange and its optional
/// notification stream.
///
/// One interaction exists per outstanding request token. The owning
/// connection's receive loop feeds matched inbound messages into the
/// interaction over a rendezvous channel; the first one satisfies the
/// [`round_trip`](Interaction::round_trip) wait, later ones go to the
/// notification listener if Observe was negotiated.
#[derive(Debug)]
pub struct Interaction {
  token: Token,
  /// Message id of the most recent round trip; lets empty-token
  /// Ack/Reset traffic find its way back here.
  message_id: Mutex<Id>,
  /// The connection outlives or terminates all its interactions, so the
  /// back-reference must stay weak.
  conn: Weak<dyn Connection>,
  inbound_tx: Mutex<Option<Sender<Message>>>,
  inbound_rx: Receiver<Message>,
  /// Dropping this sender is what stops the notification listener.
  stop_listen: Mutex<Option<Sender<()>>>,
}

impl Interaction {
  /// Create an interaction for `token` on the given connection.
  pub fn new(conn: Weak<dyn Connection>, token: Token) -> Self {
    let (inbound_tx, inbound_rx) = bounded(0);
    Interaction { token,
                  conn,
                  message_id: Mutex::new(Id(0)),
                  inbound_tx: Mutex::new(Some(inbound_tx)),
                  inbound_rx,
                  stop_listen: Mutex::new(None) }
  }

  /// The request token this interaction correlates on.
  pub fn token(&self) -> Token {
    self.token
  }

  /// The message id of the most recent round trip.
  pub fn message_id(&self) -> Id {
    *self.message_id.lock().expect("message_id mutex poisoned")
  }

  /// Send `msg` on the owning connection and block until the first
  /// matched inbound message arrives.
  ///
  /// Fails with *cancelled* if `cancel` fires first, with
  /// *connection-closed* if the connection terminates first, and with
  /// *transport-error* if the send itself fails.
  pub fn round_trip(&self, cancel: &Cancel, msg: Message) -> Result<Message, Error> {
    let conn = match self.conn.upgrade() {
      | Some(conn) if !conn.is_closed() => conn,
      | _ => return Err(When::Sending.what(What::ConnectionClosed)),
    };

    *self.message_id.lock().expect("message_id mutex poisoned") = msg.id;

    log::info!("-> {}", logging::msg_summary(&msg));
    conn.send(&msg.to_bytes())?;

    select! {
      recv(self.inbound_rx) -> res => match res {
        | Ok(msg) => {
          log::info!("<- {}", logging::msg_summary(&msg));
          Ok(msg)
        },
        | Err(_) => Err(When::Receiving.what(What::ConnectionClosed)),
      },
      recv(cancel.0) -> _ => Err(When::Receiving.what(What::Cancelled)),
    }
  }

  /// Start forwarding inbound messages to the returned notification
  /// channel.
  ///
  /// The channel closes when [`stop_listening`](Self::stop_listening) is
  /// called, when the connection closes, or when the receiver side is
  /// dropped.
  pub fn listen_for_notifications(&self) -> Receiver<Message> {
    let (notify_tx, notify_rx) = bounded::<Message>(0);
    let (stop_tx, stop_rx) = bounded::<()>(1);

    *self.stop_listen.lock().expect("stop_listen mutex poisoned") = Some(stop_tx);

    let inbound_rx = self.inbound_rx.clone();
    thread::spawn(move || {
      loop {
        select! {
          recv(inbound_rx) -> res => match res {
            | Ok(msg) => {
              if notify_tx.send(msg).is_err() {
                // nobody reads the stream anymore
                break;
              }
            },
            | Err(_) => break,
          },
          recv(stop_rx) -> _ => break,
        }
      }
    });

    notify_rx
  }

  /// Stop the notification listener, closing its channel.
  ///
  /// A no-op when no listener is running.
  pub fn stop_listening(&self) {
    self.stop_listen
        .lock()
        .expect("stop_listen mutex poisoned")
        .take();
  }

  /// Whether a notification listener is currently attached.
  pub fn is_listening(&self) -> bool {
    self.stop_listen
        .lock()
        .expect("stop_listen mutex poisoned")
        .is_some()
  }

  /// Hand an inbound message to whoever is waiting on this interaction.
  ///
  /// Called only by the connection's receive loop. Delivery is a
  /// rendezvous; if no round trip or listener claims the message within
  /// `handoff`, it is dropped.
  pub(crate) fn handle_message(&self, msg: Message, handoff: Duration) {
    let tx = self.inbound_tx
                 .lock()
                 .expect("inbound_tx mutex poisoned")
                 .clone();

    match tx {
      | None => log::warn!("interaction already failed, dropping {}", logging::msg_summary(&msg)),
      | Some(tx) => {
        if let Err(e) = tx.send_timeout(msg, handoff) {
          log::warn!("nobody claimed inbound message within {:?}, dropping ({:?})",
                     handoff,
                     e);
        }
      },
    }
  }

  /// Terminate the interaction because its connection closed.
  ///
  /// Unblocks a pending round trip with connection-closed and ends the
  /// notification stream.
  pub(crate) fn fail(&self) {
    self.inbound_tx
        .lock()
        .expect("inbound_tx mutex poisoned")
        .take();
    self.stop_listening();
  }
}
