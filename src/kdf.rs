//! KDF Adapter: turns a passphrase into a 32-byte key via Argon2id.
//!
//! The salt is fixed to all-zero bytes. This is deliberate: determinism is
//! the entire point of the tool, at the cost of two users sharing a
//! passphrase also sharing a keystream.

use argon2::Argon2;
use zeroize::Zeroizing;

use crate::error::KeyedResult;

const SALT: [u8; 16] = [0u8; 16];
const KEY_LEN: usize = 32;

pub fn derive(passphrase: &[u8]) -> KeyedResult<Zeroizing<[u8; KEY_LEN]>> {
    let argon2 = Argon2::default();
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon2.hash_password_into(passphrase, &SALT, key.as_mut())?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_passphrase_derives_the_same_key() {
        let a = derive(b"hunter2").unwrap();
        let b = derive(b"hunter2").unwrap();
        assert_eq!(*a, *b);
    }

    #[test]
    fn different_passphrases_derive_different_keys() {
        let a = derive(b"hunter2").unwrap();
        let b = derive(b"hunter3").unwrap();
        assert_ne!(*a, *b);
    }

    #[test]
    fn derived_key_is_full_width() {
        let key = derive(b"hunter2").unwrap();
        assert_eq!(key.len(), 32);
    }
}
