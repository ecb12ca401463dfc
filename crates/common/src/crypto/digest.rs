//! SHA-256 digests and certificate fingerprint comparison
//!
//! Fingerprints are compared in their normalized form: lower-case hex with
//! `:` separators and surrounding whitespace removed, so `AB:CD:..` and
//! `abcd..` refer to the same certificate.

use sha2::{Digest, Sha256};

/// Lower-case hex SHA-256 of `bytes`
///
/// # Examples
/// ```
/// use grantflow_common::crypto::sha256_hex;
///
/// assert_eq!(
///     sha256_hex(b"abc"),
///     "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
/// );
/// ```
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Normalize a hex fingerprint for comparison
#[must_use]
pub fn normalize_fingerprint(fingerprint: &str) -> String {
    fingerprint.trim().chars().filter(|c| *c != ':').flat_map(char::to_lowercase).collect()
}

/// Whether the SHA-256 fingerprint of `certificate` is among `trusted`
///
/// # Arguments
/// * `certificate` - DER bytes of a signing certificate
/// * `trusted` - Hex fingerprints in any case, with or without `:`
#[must_use]
pub fn fingerprint_matches(certificate: &[u8], trusted: &[String]) -> bool {
    let actual = sha256_hex(certificate);
    trusted.iter().any(|candidate| normalize_fingerprint(candidate) == actual)
}

#[cfg(test)]
mod tests {
    //! Unit tests for crypto::digest.
    use super::*;

    /// Validates `fingerprint_matches` behavior for the formatted fingerprint
    /// scenario.
    ///
    /// Assertions:
    /// - Ensures an upper-case, colon-separated fingerprint matches.
    /// - Ensures an unrelated fingerprint does not match.
    #[test]
    fn test_fingerprint_matches_normalized_forms() {
        let cert = b"release-certificate";
        let hex = sha256_hex(cert);
        let formatted = hex
            .as_bytes()
            .chunks(2)
            .map(|pair| String::from_utf8_lossy(pair).to_uppercase())
            .collect::<Vec<_>>()
            .join(":");

        assert!(fingerprint_matches(cert, &[formatted]));
        assert!(!fingerprint_matches(cert, &[sha256_hex(b"debug-certificate")]));
        assert!(!fingerprint_matches(cert, &[]));
    }
}
