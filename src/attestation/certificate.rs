// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use crate::store::KeyIdentifier;

/// Length of an uncompressed SEC1 encoded P-256 point
pub const P256_PUBLIC_KEY_LEN: usize = 65;

/// Matter Vendor Identifier
pub type VendorId = u16;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertError {
    /// The requested attribute or extension is absent
    #[error("not found")]
    NotFound,
    /// The certificate (or the requested field) can't be parsed
    #[error("malformed certificate")]
    Malformed,
    /// The certificate chain doesn't validate
    #[error("invalid certificate chain")]
    Invalid,
}

/// An uncompressed SEC1 encoded P-256 public key
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct P256PublicKey([u8; P256_PUBLIC_KEY_LEN]);

impl P256PublicKey {
    pub fn from_slice(b: &[u8]) -> Result<Self, CertError> {
        let k: [u8; P256_PUBLIC_KEY_LEN] = b.try_into().map_err(|_| CertError::Malformed)?;

        // 0x04 marks the uncompressed form
        if k[0] != 0x04 {
            return Err(CertError::Malformed);
        }

        Ok(Self(k))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for P256PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P256PublicKey({})", hex::encode(self.0))
    }
}

/// X.509 operations the attestation verifier depends on.  All inputs are DER
/// encoded certificates.
pub trait CertificateCodec {
    /// Extract the Matter Vendor ID from the subject DN.  Returns
    /// [`CertError::NotFound`] when the attribute is absent.
    fn extract_vendor_id(&self, der: &[u8]) -> Result<VendorId, CertError>;

    /// Extract the subject public key, which must be on the P-256 curve
    fn extract_public_key(&self, der: &[u8]) -> Result<P256PublicKey, CertError>;

    /// Extract the key identifier from the Authority Key Identifier extension
    fn extract_authority_key_id(&self, der: &[u8]) -> Result<KeyIdentifier, CertError>;

    /// Validate `leaf` (optionally via `intermediate`) up to `anchor`
    fn validate_chain(
        &self,
        anchor: &[u8],
        intermediate: Option<&[u8]>,
        leaf: &[u8],
    ) -> Result<(), CertError>;
}
