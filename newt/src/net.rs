use std::fmt::Debug;
use std::io;
use std::sync::Arc;

use newt_msg::{Id, Token};

use crate::error::Error;
use crate::interaction::Interaction;

/// A framed byte channel that delivers and accepts whole CoAP datagrams
/// as opaque packets.
///
/// One implementation wraps a serial link behind a packet framer (e.g.
/// SLIP); tests use an in-memory pair. The concrete serial driver is a
/// collaborator of this crate, not part of it.
///
/// Both operations take `&self`; implementations are expected to be
/// internally synchronized, and the owning connection additionally
/// serializes readers and writers with its own mutexes.
pub trait PacketTransport: Send + Sync + Debug {
  /// Block until one whole packet has been received.
  ///
  /// Must return an error (rather than block forever) once
  /// [`PacketTransport::close`] has been called.
  fn read_packet(&self) -> io::Result<Vec<u8>>;

  /// Write one whole packet.
  fn write_packet(&self, packet: &[u8]) -> io::Result<()>;

  /// Tear the channel down, unblocking any pending reads.
  fn close(&self) -> io::Result<()>;
}

/// The capability set the transport front-end needs from a connection:
/// sending packets, the interaction registry, and teardown.
///
/// The serial connection is one implementation; an in-memory test
/// connection is another.
pub trait Connection: Send + Sync + Debug {
  /// Write one packet, refreshing the idle deadline on success.
  ///
  /// Writes are totally ordered by the connection's write mutex.
  fn send(&self, packet: &[u8]) -> Result<(), Error>;

  /// Append an interaction to the registry.
  ///
  /// Duplicate-token policy is the caller's job; the front-end consults
  /// [`Connection::find_interaction`] first.
  fn add_interaction(&self, ia: Arc<Interaction>);

  /// Find the interaction an inbound message belongs to.
  ///
  /// Non-empty tokens match by token bytes alone. An empty token
  /// matches by message id when `id` is `Some`; passing `None` asks for
  /// a token-only match.
  fn find_interaction(&self, token: Token, id: Option<Id>) -> Option<Arc<Interaction>>;

  /// Drop the interaction registered for `token`, if any.
  fn remove_interaction(&self, token: Token);

  /// Idempotently close: no further packets will be read, and every
  /// pending interaction is failed with connection-closed.
  fn close(&self);

  /// Whether [`Connection::close`] has happened.
  fn is_closed(&self) -> bool;
}
