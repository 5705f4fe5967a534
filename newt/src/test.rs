use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam_channel::{select, unbounded, Receiver, Sender};
use newt_msg::Message;

use crate::config::Config;
use crate::connection::SerialConnection;
use crate::connector::Connector;
use crate::error::Error;
use crate::net::{Connection, PacketTransport};

/// In-memory [`PacketTransport`]: packets fed by the test show up in
/// `read_packet`, packets the client writes show up on the [`TestLink`].
#[derive(Debug)]
pub(crate) struct TestTransport {
  incoming: Receiver<Vec<u8>>,
  outgoing: Sender<Vec<u8>>,
  close_tx: Mutex<Option<Sender<()>>>,
  close_rx: Receiver<()>,
}

/// The test's end of a [`TestTransport`].
#[derive(Debug)]
pub(crate) struct TestLink {
  pub(crate) to_client: Sender<Vec<u8>>,
  pub(crate) from_client: Receiver<Vec<u8>>,
}

pub(crate) fn test_transport() -> (TestTransport, TestLink) {
  let (to_client, incoming) = unbounded();
  let (outgoing, from_client) = unbounded();
  let (close_tx, close_rx) = unbounded();

  (TestTransport { incoming,
                   outgoing,
                   close_tx: Mutex::new(Some(close_tx)),
                   close_rx },
   TestLink { to_client,
              from_client })
}

impl PacketTransport for TestTransport {
  fn read_packet(&self) -> io::Result<Vec<u8>> {
    select! {
      recv(self.incoming) -> res => {
        res.map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "test link dropped"))
      },
      recv(self.close_rx) -> _ => {
        Err(io::Error::new(io::ErrorKind::NotConnected, "transport closed"))
      },
    }
  }

  fn write_packet(&self, packet: &[u8]) -> io::Result<()> {
    self.outgoing
        .send(packet.to_vec())
        .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "test link dropped"))
  }

  fn close(&self) -> io::Result<()> {
    self.close_tx.lock().unwrap().take();
    Ok(())
  }
}

impl TestLink {
  /// Push raw bytes at the client as one packet.
  pub(crate) fn feed(&self, packet: Vec<u8>) {
    self.to_client.send(packet).unwrap();
  }

  /// Push a message at the client.
  pub(crate) fn feed_message(&self, msg: &Message) {
    self.feed(msg.to_bytes());
  }

  /// Wait for the next packet the client writes.
  pub(crate) fn sent(&self, timeout: Duration) -> Option<Vec<u8>> {
    self.from_client.recv_timeout(timeout).ok()
  }

  /// Wait for the next message the client writes.
  pub(crate) fn sent_message(&self, timeout: Duration) -> Option<Message> {
    self.sent(timeout).map(|p| Message::from_bytes(&p).unwrap())
  }
}

/// [`Connector`] handing out one fixed in-memory connection, whatever
/// the host.
#[derive(Debug)]
pub(crate) struct TestConnector {
  conn: Arc<SerialConnection<TestTransport>>,
}

impl TestConnector {
  pub(crate) fn new(config: Config) -> (Self, TestLink) {
    let (transport, link) = test_transport();
    let conn = SerialConnection::new("test", transport, config);
    conn.open();

    (TestConnector { conn }, link)
  }

  pub(crate) fn connection(&self) -> Arc<SerialConnection<TestTransport>> {
    Arc::clone(&self.conn)
  }
}

impl Connector for TestConnector {
  fn connect(&self, _host: &str) -> Result<Arc<dyn Connection>, Error> {
    Ok(self.connection() as Arc<dyn Connection>)
  }
}
