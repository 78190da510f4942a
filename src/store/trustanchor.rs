// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::base64::Bytes;
use super::certbuffer::MAX_DER_CERT_LEN;
use super::errors::Error;
use super::{KeyIdentifier, KEY_IDENTIFIER_LEN};
use openssl::x509::X509;
use serde::{Deserialize, Serialize};

/// A Product Attestation Authority certificate and the key identifier it is
/// indexed by
#[serde_with::serde_as]
#[derive(Clone, Deserialize, Serialize, Debug, PartialEq, Eq)]
pub struct TrustAnchor {
    /// The Subject Key Identifier of the PAA.  It is a fixed-size, 20 bytes
    /// binary blob, hex encoded.  A DAC or PAI issued by this PAA carries
    /// the same value in its Authority Key Identifier extension.
    #[serde(rename = "key-id")]
    #[serde_as(as = "serde_with::hex::Hex")]
    pub key_id: KeyIdentifier,

    /// The DER encoded PAA certificate, base64 encoded
    #[serde(rename = "certificate")]
    pub certificate: Bytes,
}

impl TrustAnchor {
    /// Build a trust anchor from a DER certificate, using its Subject Key
    /// Identifier as the index
    pub fn from_der(der: &[u8]) -> Result<Self, Error> {
        let x509 = X509::from_der(der).map_err(|e| Error::Syntax(e.to_string()))?;

        let skid = x509
            .subject_key_id()
            .ok_or_else(|| Error::Sema("certificate has no subject key identifier".to_string()))?;

        let key_id: KeyIdentifier = skid.as_slice().try_into().map_err(|_| {
            Error::Sema(format!(
                "subject key identifier is {} bytes, expecting {KEY_IDENTIFIER_LEN}",
                skid.as_slice().len()
            ))
        })?;

        let ta = Self {
            key_id,
            certificate: Bytes::from(der),
        };

        ta.validate()?;

        Ok(ta)
    }

    /// Check that the certificate is well-formed, that it fits the lookup
    /// buffer, and that it agrees with the declared key identifier
    pub fn validate(&self) -> Result<(), Error> {
        let der = self.certificate.as_slice();

        if der.len() > MAX_DER_CERT_LEN {
            return Err(Error::Sema(format!(
                "certificate is {} bytes, maximum is {MAX_DER_CERT_LEN}",
                der.len()
            )));
        }

        let x509 = X509::from_der(der).map_err(|e| Error::Syntax(e.to_string()))?;

        if let Some(skid) = x509.subject_key_id() {
            if skid.as_slice() != self.key_id {
                return Err(Error::Sema(format!(
                    "key-id {} does not match the certificate subject key identifier {}",
                    hex::encode(self.key_id),
                    hex::encode(skid.as_slice())
                )));
            }
        }

        Ok(())
    }
}
