//! Sealing and unsealing of profile secrets.
//!
//! Sealed secrets travel as base64-encoded AES-256-CBC ciphertext. Key and
//! IV come from the keyphrase via the OpenSSL legacy `EVP_BytesToKey`
//! scheme (MD5, no salt), so sealing is deterministic: the same plaintext
//! and keyphrase always produce the same sealed string.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use md5::{Digest, Md5};

use crate::error::{BerthError, Result};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Keyphrase used when the caller does not supply one.
pub const DEFAULT_KEYPHRASE: &str = "berth_secret";

/// Derive a 32-byte key and 16-byte IV from `keyphrase`.
///
/// This is `EVP_BytesToKey` with MD5, one round per digest and no salt:
/// `d1 = MD5(pass)`, `d2 = MD5(d1 || pass)`, `d3 = MD5(d2 || pass)`,
/// key `d1 || d2`, IV `d3`.
fn derive_key_iv(keyphrase: &str) -> ([u8; 32], [u8; 16]) {
	let d1 = Md5::digest(keyphrase.as_bytes());

	let mut hasher = Md5::new();
	hasher.update(d1);
	hasher.update(keyphrase.as_bytes());
	let d2 = hasher.finalize();

	let mut hasher = Md5::new();
	hasher.update(d2);
	hasher.update(keyphrase.as_bytes());
	let d3 = hasher.finalize();

	let mut key = [0u8; 32];
	key[..16].copy_from_slice(d1.as_slice());
	key[16..].copy_from_slice(d2.as_slice());
	let mut iv = [0u8; 16];
	iv.copy_from_slice(d3.as_slice());
	(key, iv)
}

/// Seal `plaintext` under `keyphrase` into a base64 string.
pub fn encrypt(plaintext: &str, keyphrase: &str) -> String {
	let (key, iv) = derive_key_iv(keyphrase);
	let cipher = Aes256CbcEnc::new(&key.into(), &iv.into());
	let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
	STANDARD.encode(ciphertext)
}

/// Unseal a base64 string produced by [`encrypt`] back into plaintext.
pub fn decrypt(sealed: &str, keyphrase: &str) -> Result<String> {
	let ciphertext = STANDARD
		.decode(sealed.trim())
		.map_err(|source| BerthError::SecretDecode { source })?;
	if ciphertext.is_empty() || ciphertext.len() % 16 != 0 {
		return Err(BerthError::SecretDecrypt);
	}

	let (key, iv) = derive_key_iv(keyphrase);
	let cipher = Aes256CbcDec::new(&key.into(), &iv.into());
	let plaintext = cipher
		.decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
		.map_err(|_| BerthError::SecretDecrypt)?;
	String::from_utf8(plaintext).map_err(|source| BerthError::SecretPlaintext { source })
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_seal_unseal_round_trip() {
		let sealed = encrypt("hunter2", DEFAULT_KEYPHRASE);
		assert_eq!(decrypt(&sealed, DEFAULT_KEYPHRASE).unwrap(), "hunter2");
	}

	#[test]
	fn test_seal_unseal_with_custom_keyphrase() {
		let sealed = encrypt("s3cret pa55word", "deploy-key");
		assert_eq!(decrypt(&sealed, "deploy-key").unwrap(), "s3cret pa55word");
	}

	#[test]
	fn test_sealing_is_deterministic() {
		assert_eq!(
			encrypt("hunter2", DEFAULT_KEYPHRASE),
			encrypt("hunter2", DEFAULT_KEYPHRASE)
		);
	}

	#[test]
	fn test_empty_and_unicode_plaintext_round_trip() {
		let empty = encrypt("", DEFAULT_KEYPHRASE);
		assert_eq!(decrypt(&empty, DEFAULT_KEYPHRASE).unwrap(), "");

		let unicode = encrypt("pässwörd \u{1F511}", DEFAULT_KEYPHRASE);
		assert_eq!(decrypt(&unicode, DEFAULT_KEYPHRASE).unwrap(), "pässwörd \u{1F511}");
	}

	#[test]
	fn test_unseal_with_wrong_keyphrase_never_recovers_plaintext() {
		let sealed = encrypt("hunter2", "correct horse");
		let recovered = decrypt(&sealed, "battery staple");
		assert!(recovered.map_or(true, |text| text != "hunter2"));
	}

	#[test]
	fn test_unseal_rejects_invalid_base64() {
		assert!(matches!(
			decrypt("not base64!!", DEFAULT_KEYPHRASE),
			Err(BerthError::SecretDecode { .. })
		));
	}

	#[test]
	fn test_unseal_rejects_truncated_ciphertext() {
		let sealed = STANDARD.encode(b"abc");
		assert!(matches!(
			decrypt(&sealed, DEFAULT_KEYPHRASE),
			Err(BerthError::SecretDecrypt)
		));
	}

	#[test]
	fn test_unseal_tolerates_surrounding_whitespace() {
		let sealed = format!("  {}\n", encrypt("hunter2", DEFAULT_KEYPHRASE));
		assert_eq!(decrypt(&sealed, DEFAULT_KEYPHRASE).unwrap(), "hunter2");
	}

	#[test]
	fn test_derived_material_depends_on_keyphrase() {
		let (key_a, iv_a) = derive_key_iv("one");
		let (key_b, iv_b) = derive_key_iv("two");
		assert_ne!(key_a, key_b);
		assert_ne!(iv_a, iv_b);

		let (key_a2, iv_a2) = derive_key_iv("one");
		assert_eq!(key_a, key_a2);
		assert_eq!(iv_a, iv_a2);
	}
}
