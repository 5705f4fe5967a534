use std::collections::HashMap;
use std::fmt::Debug;
use std::io;
use std::sync::{Arc, Mutex};

use crate::config::Config;
use crate::connection::SerialConnection;
use crate::error::{Error, What, When};
use crate::net::{Connection, PacketTransport};

/// Resolves a request URI host to a live [`Connection`], creating one
/// when none exists.
pub trait Connector: Send + Sync + Debug {
  /// Get the connection for `host`, opening it if necessary.
  fn connect(&self, host: &str) -> Result<Arc<dyn Connection>, Error>;
}

/// Opens the framed packet channel for a named serial port.
///
/// The concrete serial driver lives behind this trait; the runtime only
/// needs "give me a packet channel for this port name".
pub trait PortOpener: Send + Sync + Debug {
  /// The packet channel an opened port yields.
  type Port: PacketTransport + 'static;

  /// Try to open the port called `name`.
  fn open(&self, name: &str) -> io::Result<Self::Port>;
}

/// Last successful "any" port. Will be tried first before iterating.
static LAST_ANY: Mutex<String> = Mutex::new(String::new());

/// The port names "any" resolution walks, in order.
fn any_candidates() -> Vec<String> {
  if cfg!(windows) {
    (0..99).map(|i| format!("COM{}", i)).collect()
  } else {
    (0..99).map(|i| format!("/dev/tty{}", i))
           .chain((0..99).map(|i| format!("/dev/ttyS{}", i)))
           .chain((0..10).map(|i| format!("/dev/ttyUSB{}", i)))
           .collect()
  }
}

/// [`Connector`] keeping one live [`SerialConnection`] per host string.
///
/// The URI host names the port (`COM3`, `ttyS2`); on non-Windows systems
/// the `/dev/` prefix of the device file is added implicitly since host
/// names cannot contain a slash. The literal host `any` takes the first
/// port that opens, preferring the last one that worked (process-wide
/// cache).
#[derive(Debug)]
pub struct SerialConnector<O: PortOpener> {
  opener: O,
  config: Config,
  conns: Mutex<HashMap<String, Arc<SerialConnection<O::Port>>>>,
}

impl<O: PortOpener> SerialConnector<O> {
  /// Create a connector with the default [`Config`].
  pub fn new(opener: O) -> Self {
    Self::with_config(opener, Config::default())
  }

  /// Create a connector with a specific runtime config.
  pub fn with_config(opener: O, config: Config) -> Self {
    SerialConnector { opener,
                      config,
                      conns: Mutex::new(HashMap::new()) }
  }

  fn open_port(&self, host: &str) -> Result<(String, O::Port), Error> {
    if host != "any" {
      let name = port_name(host);
      let port = self.opener
                     .open(&name)
                     .map_err(|e| When::Connecting(host.into()).what(What::Transport(e)))?;
      return Ok((name, port));
    }

    let mut last = LAST_ANY.lock().expect("last-any mutex poisoned");

    if !last.is_empty() {
      if let Ok(port) = self.opener.open(&last) {
        return Ok((last.clone(), port));
      }
    }

    for name in any_candidates() {
      if let Ok(port) = self.opener.open(&name) {
        log::info!("resolved host 'any' to {}", name);
        *last = name.clone();
        return Ok((name, port));
      }
    }

    Err(When::Connecting(host.into()).what(What::NoUsablePort))
  }
}

/// Map a URI host to the platform's device name.
fn port_name(host: &str) -> String {
  if cfg!(windows) || host.starts_with("/dev/") {
    host.to_string()
  } else {
    format!("/dev/{}", host)
  }
}

impl<O: PortOpener> Connector for SerialConnector<O> {
  fn connect(&self, host: &str) -> Result<Arc<dyn Connection>, Error> {
    let mut conns = self.conns.lock().expect("connections mutex poisoned");

    if let Some(conn) = conns.get(host) {
      if !conn.is_closed() {
        return Ok(Arc::clone(conn) as Arc<dyn Connection>);
      }
    }

    let (name, port) = self.open_port(host)?;
    let conn = SerialConnection::new(name, port, self.config);
    conn.open();

    conns.insert(host.to_string(), Arc::clone(&conn));
    Ok(conn as Arc<dyn Connection>)
  }
}
