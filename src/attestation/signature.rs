// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::certificate::P256PublicKey;

/// Length of a raw (r || s) ECDSA P-256 signature
pub const P256_ECDSA_SIGNATURE_LEN: usize = 64;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureError {
    #[error("malformed signature encoding")]
    Format,
    #[error("signature verification failed")]
    Invalid,
}

/// Fixed-capacity container for a raw ECDSA P-256 signature
#[derive(Clone, Copy)]
pub struct P256EcdsaSignature {
    bytes: [u8; P256_ECDSA_SIGNATURE_LEN],
    len: usize,
}

impl P256EcdsaSignature {
    /// Copy `b` into a new container.  Empty and oversized inputs are refused
    /// before anything else looks at them.
    pub fn from_slice(b: &[u8]) -> Result<Self, SignatureError> {
        if b.is_empty() || b.len() > P256_ECDSA_SIGNATURE_LEN {
            return Err(SignatureError::Format);
        }

        let mut bytes = [0u8; P256_ECDSA_SIGNATURE_LEN];
        bytes[..b.len()].copy_from_slice(b);

        Ok(Self {
            bytes,
            len: b.len(),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl std::fmt::Debug for P256EcdsaSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P256EcdsaSignature({})", hex::encode(self.as_bytes()))
    }
}

/// ECDSA verification the attestation verifier depends on
pub trait SignatureEngine {
    /// Verify `signature` with `key` over the concatenation of
    /// `message_parts`, hashed with SHA-256
    fn verify_p256(
        &self,
        key: &P256PublicKey,
        message_parts: &[&[u8]],
        signature: &P256EcdsaSignature,
    ) -> Result<(), SignatureError>;
}
