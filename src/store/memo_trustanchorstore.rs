// Copyright 2023-2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::certbuffer::CertBuffer;
use super::errors::Error;
use super::trustanchor::TrustAnchor;
use super::{ITrustAnchorStore, KeyIdentifier};
use tracing::debug;

/// A provisioned store of PAA certificates, loaded once from JSON (or from a
/// set of DER certificates) and read-only afterwards.  Anchors are indexed by
/// their subject key identifier, which must be unique within the store.
#[derive(Debug, Default)]
pub struct MemoTrustAnchorStore {
    p: Vec<TrustAnchor>,
}

impl MemoTrustAnchorStore {
    /// Returns a new empty TrustAnchorStore
    pub fn new() -> Self {
        Self {
            p: Default::default(),
        }
    }

    /// Returns a TrustAnchorStore holding the given DER certificates, each
    /// one indexed by its own subject key identifier
    pub fn from_certs(certs: &[&[u8]]) -> Result<Self, Error> {
        let tas = certs
            .iter()
            .map(|der| TrustAnchor::from_der(der))
            .collect::<Result<Vec<_>, _>>()?;

        let mut s = Self::new();
        s.extend(tas)?;

        Ok(s)
    }

    /// Add to an existing (and possibly empty) TrustAnchorStore the trust
    /// anchors loaded from the given JSON file.  Nothing is added unless
    /// every entry is acceptable.
    pub fn load_json(&mut self, j: &str) -> Result<(), Error> {
        let tas: Vec<TrustAnchor> =
            serde_json::from_str(j).map_err(|e| Error::Syntax(e.to_string()))?;

        self.extend(tas)
    }

    fn extend(&mut self, tas: Vec<TrustAnchor>) -> Result<(), Error> {
        for (i, ta) in tas.iter().enumerate() {
            ta.validate()?;

            let dup = self.p.iter().chain(&tas[..i]).any(|x| x.key_id == ta.key_id);
            if dup {
                return Err(Error::Sema(format!(
                    "duplicated key-id {}",
                    hex::encode(ta.key_id)
                )));
            }
        }

        for ta in &tas {
            debug!(key_id = %hex::encode(ta.key_id), "trust anchor added");
        }

        self.p.extend(tas);

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.p.len()
    }

    pub fn is_empty(&self) -> bool {
        self.p.is_empty()
    }
}

impl ITrustAnchorStore for MemoTrustAnchorStore {
    fn lookup(&self, key_id: &KeyIdentifier, out: &mut CertBuffer) -> Result<(), Error> {
        let ta = self
            .p
            .iter()
            .find(|ta| ta.key_id == *key_id)
            .ok_or_else(|| Error::NotFound(hex::encode(key_id)))?;

        out.copy_from(ta.certificate.as_slice())
    }
}
