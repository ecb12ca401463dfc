//! Integration tests for the security module
//!
//! These tests verify that code written against `SecretStore` behaves the
//! same over the in-memory mock as callers expect from the platform keychain,
//! and that certificate fingerprints are compared in normalized form.

#![cfg(feature = "platform")]

use grantflow_common::crypto::{fingerprint_matches, normalize_fingerprint, sha256_hex};
use grantflow_common::security::{KeychainError, SecretStore};
use grantflow_common::testing::MockKeychainProvider;

/// Writes a namespaced record through the trait object, the way token caches
/// do.
fn write_record(store: &dyn SecretStore, namespace: &str, fields: &[(&str, &str)]) {
    for (key, value) in fields {
        store.set_secret(&format!("{namespace}.{key}"), value).unwrap();
    }
}

/// Validates `SecretStore` usage through a trait object for the namespaced
/// record scenario.
///
/// Assertions:
/// - Confirms records of two namespaces do not collide.
/// - Ensures deleting one namespace leaves the other intact.
#[test]
fn test_namespaced_records_do_not_collide() {
    let keychain = MockKeychainProvider::new("grantflow.integration");

    write_record(&keychain, "app-a", &[("access", "A1"), ("refresh", "R1")]);
    write_record(&keychain, "app-b", &[("access", "B1")]);

    assert_eq!(keychain.get_secret("app-a.access").unwrap(), "A1");
    assert_eq!(keychain.get_secret("app-b.access").unwrap(), "B1");

    keychain.delete_secret("app-a.access").unwrap();
    keychain.delete_secret("app-a.refresh").unwrap();

    assert_eq!(keychain.keys(), vec!["app-b.access".to_string()]);
    assert!(matches!(keychain.get_secret("app-a.access"), Err(KeychainError::NotFound)));
}

/// Validates `fingerprint_matches` for the trusted certificate list scenario.
///
/// Assertions:
/// - Ensures the release certificate matches a list holding its fingerprint.
/// - Confirms normalization strips separators and lowers case.
#[test]
fn test_trusted_certificate_list() {
    let release = b"release-signing-certificate".to_vec();
    let trusted = vec![sha256_hex(b"other"), sha256_hex(&release).to_uppercase()];

    assert!(fingerprint_matches(&release, &trusted));
    assert_eq!(normalize_fingerprint(" AB:cd:EF "), "abcdef");
}
