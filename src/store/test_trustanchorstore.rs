// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::certbuffer::CertBuffer;
use super::errors::Error;
use super::{ITrustAnchorStore, KeyIdentifier};
use hex_literal::hex;

struct PaaEntry {
    key_id: KeyIdentifier,
    certificate: &'static [u8],
}

/// Matter Test PAA FFF1 and FFF2.  Not to be trusted outside development.
static TEST_PAA_TABLE: [PaaEntry; 2] = [
    PaaEntry {
        key_id: hex!("EF18E0ECD4660434DF0DBC911ED452169966839F"),
        certificate: include_bytes!("../../testdata/Chip-Test-PAA-FFF1-Cert.der"),
    },
    PaaEntry {
        key_id: hex!("E7EFEAC3335C5FD0C3E634529F167046C4BCA55C"),
        certificate: include_bytes!("../../testdata/Chip-Test-PAA-FFF2-Cert.der"),
    },
];

/// The fixed table of development PAAs
#[derive(Debug, Default, Clone, Copy)]
pub struct TestTrustAnchorStore;

impl TestTrustAnchorStore {
    pub fn new() -> Self {
        Self
    }

    /// Key identifiers of all the anchors in the table, in table order
    pub fn key_ids(&self) -> impl Iterator<Item = &'static KeyIdentifier> {
        TEST_PAA_TABLE.iter().map(|e| &e.key_id)
    }
}

impl ITrustAnchorStore for TestTrustAnchorStore {
    fn lookup(&self, key_id: &KeyIdentifier, out: &mut CertBuffer) -> Result<(), Error> {
        let e = TEST_PAA_TABLE
            .iter()
            .find(|e| e.key_id == *key_id)
            .ok_or_else(|| Error::NotFound(hex::encode(key_id)))?;

        out.copy_from(e.certificate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openssl::x509::X509;

    #[test]
    fn lookup_every_anchor_by_own_key_id() {
        let s = TestTrustAnchorStore::new();

        for e in TEST_PAA_TABLE.iter() {
            let mut out = CertBuffer::for_certificate().unwrap();

            s.lookup(&e.key_id, &mut out).unwrap();
            assert_eq!(out.as_slice(), e.certificate);
        }
    }

    #[test]
    fn key_ids_match_certificates() {
        for e in TEST_PAA_TABLE.iter() {
            let x509 = X509::from_der(e.certificate).unwrap();
            let skid = x509.subject_key_id().unwrap();

            assert_eq!(skid.as_slice(), e.key_id);
        }
    }

    #[test]
    fn key_ids_unique() {
        let s = TestTrustAnchorStore::new();
        let ids: Vec<_> = s.key_ids().collect();

        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn lookup_unregistered() {
        let s = TestTrustAnchorStore::new();
        let mut out = CertBuffer::for_certificate().unwrap();

        // one bit off the FFF1 identifier
        let near_miss = hex!("EF18E0ECD4660434DF0DBC911ED452169966839E");

        let r = s.lookup(&near_miss, &mut out);
        assert!(matches!(r, Err(Error::NotFound(_))));
        assert!(out.is_empty());

        let r = s.lookup(&[0; 20], &mut out);
        assert!(matches!(r, Err(Error::NotFound(_))));
    }
}
