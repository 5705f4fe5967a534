use std::fmt::Debug;
use std::sync::Mutex;

use newt_msg::{Id, Token};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Source of fresh request tokens.
///
/// Implementations must be safe to call from several threads at once.
pub trait TokenGenerator: Send + Sync + Debug {
  /// Produce a token for a new request.
  fn next_token(&self) -> Token;
}

/// [`TokenGenerator`] drawing 8 uniformly random bytes per token from a
/// ChaCha stream seeded with OS entropy.
#[derive(Debug)]
pub struct RandomTokenGenerator(Mutex<ChaCha8Rng>);

impl Default for RandomTokenGenerator {
  fn default() -> Self {
    RandomTokenGenerator(Mutex::new(ChaCha8Rng::from_entropy()))
  }
}

impl RandomTokenGenerator {
  /// Create a generator seeded from OS entropy.
  pub fn new() -> Self {
    Self::default()
  }
}

impl TokenGenerator for RandomTokenGenerator {
  fn next_token(&self) -> Token {
    let bytes: [u8; 8] = self.0
                             .lock()
                             .expect("token rng mutex poisoned")
                             .gen();
    Token::from(bytes)
  }
}

/// Monotonic 16-bit message id sequence, one per transport.
///
/// Wrap-around is permitted and not treated as an error. The counter
/// starts at 0, so the first issued id is 1.
#[derive(Debug, Default)]
pub struct IdSequence(Mutex<u16>);

impl IdSequence {
  /// Create a sequence starting at 0.
  pub fn new() -> Self {
    Self::default()
  }

  /// Issue the next message id.
  pub fn next(&self) -> Id {
    let mut last = self.0.lock().expect("id mutex poisoned");
    *last = last.wrapping_add(1);
    Id(*last)
  }
}
