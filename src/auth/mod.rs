//! Session-cookie authentication.

pub mod db;
pub mod middleware;

pub use middleware::AuthContext;

/// Generate a new session token (32 chars of [0-9a-z])
pub fn generate_session_token() -> String {
  use rand::Rng;
  let mut rng = rand::rng();
  (0..32)
    .map(|_| {
      let idx = rng.random_range(0..36u8);
      if idx < 10 {
        (b'0' + idx) as char
      } else {
        (b'a' + idx - 10) as char
      }
    })
    .collect()
}
