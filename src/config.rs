// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! Verifier configuration.
//!
//! The trust anchor policy is chosen here rather than in code, e.g.:
//!
//! ```json
//! { "policy": "trust-store", "trust-store": "paa.json" }
//! ```

use crate::attestation::{DacVerifier, DeviceAttestationVerifier};
use crate::store::{self, MemoTrustAnchorStore, TestTrustAnchorStore};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("configuration syntax error: {0}")]
    Syntax(String),
    #[error("trust-store path required by the trust-store policy")]
    MissingTrustStore,
    #[error("reading trust store {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("loading trust store: {0}")]
    Store(#[from] store::Error),
}

/// A verifier that can be shared between threads
pub type BoxedVerifier = Box<dyn DeviceAttestationVerifier + Send + Sync>;

/// Where trust anchors come from
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Policy {
    /// The built-in Matter development PAAs
    #[default]
    TestAnchors,
    /// PAAs loaded from a JSON trust store file
    TrustStore,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub policy: Policy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust_store: Option<PathBuf>,
}

impl Config {
    pub fn load_json(j: &str) -> Result<Self, Error> {
        serde_json::from_str(j).map_err(|e| Error::Syntax(e.to_string()))
    }

    /// Load the trust store file named by the configuration
    pub fn load_trust_store(&self) -> Result<MemoTrustAnchorStore, Error> {
        let path = self.trust_store.as_ref().ok_or(Error::MissingTrustStore)?;

        let j = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;

        let mut tas = MemoTrustAnchorStore::new();
        tas.load_json(&j)?;

        info!(
            path = %path.display(),
            anchors = tas.len(),
            "trust store loaded"
        );

        Ok(tas)
    }

    /// Build the verifier selected by the policy
    pub fn build_verifier(&self) -> Result<BoxedVerifier, Error> {
        let v: BoxedVerifier = match self.policy {
            Policy::TestAnchors => Box::new(DacVerifier::new(TestTrustAnchorStore::new())),
            Policy::TrustStore => Box::new(DacVerifier::new(self.load_trust_store()?)),
        };

        Ok(v)
    }
}
