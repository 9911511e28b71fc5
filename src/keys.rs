//! RSA public-key import for the signing sections.
//!
//! The boot ROM verifies the configuration signature against a packed key
//! record stored in the image's key section. The record is little-endian
//! regardless of the big-endian container headers, because the ROM consumes
//! it directly from flash.

use anyhow::{Context, Result, bail};
use openssl::rsa::Rsa;

/// Modulus width of the packed record; only 2048-bit keys are accepted
pub const MODULUS_SIZE: usize = 256;

/// Exponent width of the packed record
pub const EXPONENT_SIZE: usize = 8;

/// Total size of the record stored in the key section
pub const KEY_RECORD_SIZE: usize = MODULUS_SIZE + EXPONENT_SIZE;

/// Convert a PEM-encoded RSA public key into the fixed little-endian
/// `{modulus, exponent}` record stored in the image's key section.
///
/// # Errors
///
/// Fails when the PEM does not hold an RSA public key, when the modulus is
/// not exactly 2048 bits, or when the public exponent does not fit the
/// 8-byte field.
pub fn import_public_key(pem: &[u8]) -> Result<Vec<u8>> {
    let key = Rsa::public_key_from_pem(pem).context("failed to parse PEM public key")?;

    if key.size() as usize != MODULUS_SIZE {
        bail!(
            "unsupported RSA key size: {} bits, need {}",
            key.n().num_bits(),
            MODULUS_SIZE * 8
        );
    }

    // BigNum serializes big-endian at minimal width; the record wants fixed
    // width little-endian
    let mut modulus = key.n().to_vec();
    modulus.reverse();
    modulus.resize(MODULUS_SIZE, 0);

    let mut exponent = key.e().to_vec();
    if exponent.len() > EXPONENT_SIZE {
        bail!("public exponent wider than {EXPONENT_SIZE} bytes");
    }
    exponent.reverse();
    exponent.resize(EXPONENT_SIZE, 0);

    let mut record = Vec::with_capacity(KEY_RECORD_SIZE);
    record.extend_from_slice(&modulus);
    record.extend_from_slice(&exponent);
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_a_2048_bit_key_little_endian() {
        let key = Rsa::generate(2048).unwrap();
        let pem = key.public_key_to_pem().unwrap();
        let record = import_public_key(&pem).unwrap();

        assert_eq!(record.len(), KEY_RECORD_SIZE);

        let mut expected = key.n().to_vec();
        expected.reverse();
        expected.resize(MODULUS_SIZE, 0);
        assert_eq!(&record[..MODULUS_SIZE], &expected[..]);

        // F4: 65537, little-endian in the 8-byte field
        assert_eq!(&record[MODULUS_SIZE..], &[0x01, 0x00, 0x01, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn rejects_keys_that_are_not_2048_bits() {
        for bits in [1024, 4096] {
            let key = Rsa::generate(bits).unwrap();
            let pem = key.public_key_to_pem().unwrap();
            assert!(import_public_key(&pem).is_err(), "{bits}-bit key accepted");
        }
    }

    #[test]
    fn rejects_garbage_input() {
        assert!(import_public_key(b"not a pem at all").is_err());
    }
}
