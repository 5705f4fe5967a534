use std::time::Duration;

/// Runtime config
///
/// ```
/// use std::time::Duration;
///
/// use newt::config::Config;
///
/// assert_eq!(Config::default().idle_timeout, Duration::from_secs(60));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
  /// How long a connection may sit without traffic in either direction
  /// before its idle watcher closes it.
  ///
  /// Every successful packet read or write pushes the deadline out by
  /// this much. Defaults to 60 seconds, a comfortable margin for slow
  /// UART links.
  pub idle_timeout: Duration,

  /// How long the receive loop will wait for someone to claim an inbound
  /// message matched to an interaction before dropping it.
  ///
  /// The window covers the gap between a first response being returned
  /// to the caller and the notification listener starting. Defaults to
  /// 250 milliseconds.
  pub handoff_timeout: Duration,
}

impl Default for Config {
  fn default() -> Self {
    Config { idle_timeout: Duration::from_secs(60),
             handoff_timeout: Duration::from_millis(250) }
  }
}
