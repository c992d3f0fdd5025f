//! Temporary passwords for newly created accounts.

use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use rand_core::{OsRng, RngCore};

use crate::{Error, Result};

const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz23456789";
const LENGTH: usize = 10;

/// A random password drawn from an alphabet without look-alike characters.
pub fn generate(rng: &mut impl RngCore) -> String {
  let n = ALPHABET.len() as u32;
  let limit = u32::MAX - (u32::MAX % n);
  let mut out = String::with_capacity(LENGTH);
  while out.len() < LENGTH {
    let x = rng.next_u32();
    if x < limit {
      out.push(ALPHABET[(x % n) as usize] as char);
    }
  }
  out
}

/// Hash a password into an argon2 PHC string.
pub fn hash(password: &str) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| {
      tracing::error!(error = %e, "password hashing failed");
      Error::Internal(format!("password hashing: {e}"))
    })
}

#[cfg(test)]
mod tests {
  use argon2::{PasswordHash, PasswordVerifier};

  use super::*;

  #[test]
  fn generated_passwords_use_the_alphabet() {
    let password = generate(&mut OsRng);
    assert_eq!(password.len(), LENGTH);
    assert!(password.bytes().all(|b| ALPHABET.contains(&b)));
  }

  #[test]
  fn hash_verifies_with_argon2() {
    let phc = hash("hunter22").unwrap();
    let parsed = PasswordHash::new(&phc).unwrap();
    assert!(Argon2::default().verify_password(b"hunter22", &parsed).is_ok());
    assert!(Argon2::default().verify_password(b"hunter23", &parsed).is_err());
  }
}
