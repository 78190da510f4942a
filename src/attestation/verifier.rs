// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::certificate::{CertError, CertificateCodec, P256PublicKey};
use super::crypto::OpensslCrypto;
use super::elements::AttestationElements;
use super::signature::{P256EcdsaSignature, SignatureEngine};
use crate::store::{self, CertBuffer, ITrustAnchorStore};
use serde::Serialize;
use tracing::{debug, info, warn};

/// The outcome of one attestation verification.  Anything but
/// [`VerificationResult::Success`] means the device must not be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerificationResult {
    Success,
    VendorIdMismatch,
    IntermediateFormatInvalid,
    LeafFormatInvalid,
    SignatureFormatInvalid,
    SignatureInvalid,
    TrustAnchorNotFound,
    ChainInvalid,
    PayloadMalformed,
    NonceMismatch,
    ResourceExhausted,
}

/// Broad classes of verification failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureCategory {
    /// Malformed leaf, intermediate, signature or payload encoding
    Format,
    /// No recognised trust anchor
    Trust,
    /// Signature or chain of custody doesn't verify
    Crypto,
    /// Vendor ID or nonce mismatch
    Policy,
    /// Scratch buffer allocation failure
    Resource,
}

impl VerificationResult {
    pub fn is_success(&self) -> bool {
        *self == VerificationResult::Success
    }

    /// The failure class, or `None` on success.  A broken chain of custody
    /// is reported in the same class as a bad signature.
    pub fn category(&self) -> Option<FailureCategory> {
        use VerificationResult::*;

        let c = match self {
            Success => return None,
            IntermediateFormatInvalid
            | LeafFormatInvalid
            | SignatureFormatInvalid
            | PayloadMalformed => FailureCategory::Format,
            TrustAnchorNotFound => FailureCategory::Trust,
            SignatureInvalid | ChainInvalid => FailureCategory::Crypto,
            VendorIdMismatch | NonceMismatch => FailureCategory::Policy,
            ResourceExhausted => FailureCategory::Resource,
        };

        Some(c)
    }

    pub fn as_str(&self) -> &'static str {
        use VerificationResult::*;

        match self {
            Success => "success",
            VendorIdMismatch => "vendor-id-mismatch",
            IntermediateFormatInvalid => "intermediate-format-invalid",
            LeafFormatInvalid => "leaf-format-invalid",
            SignatureFormatInvalid => "signature-format-invalid",
            SignatureInvalid => "signature-invalid",
            TrustAnchorNotFound => "trust-anchor-not-found",
            ChainInvalid => "chain-invalid",
            PayloadMalformed => "payload-malformed",
            NonceMismatch => "nonce-mismatch",
            ResourceExhausted => "resource-exhausted",
        }
    }
}

impl std::fmt::Display for VerificationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The inputs of one attestation verification, all borrowed from the caller
#[derive(Debug, Clone, Copy)]
pub struct AttestationRequest<'a> {
    /// TLV encoded attestation elements
    pub payload: &'a [u8],
    /// Attestation challenge from the secure session
    pub challenge: &'a [u8],
    /// Raw ECDSA P-256 signature over `payload || challenge`
    pub signature: &'a [u8],
    /// DER encoded PAI, if any.  An empty slice is the same as `None`.
    pub intermediate: Option<&'a [u8]>,
    /// DER encoded DAC
    pub leaf: &'a [u8],
    /// The nonce the commissioner sent
    pub expected_nonce: &'a [u8],
}

impl<'a> AttestationRequest<'a> {
    fn intermediate(&self) -> Option<&'a [u8]> {
        self.intermediate.filter(|c| !c.is_empty())
    }
}

/// Capability of verifying a device attestation
pub trait DeviceAttestationVerifier {
    fn verify_attestation(&self, request: &AttestationRequest<'_>) -> VerificationResult;
}

type Stage<T> = Result<T, VerificationResult>;

/// Verifies device attestation information against the PAAs in a trust
/// anchor store.
///
/// The checks run in a fixed order and the first failure ends the
/// verification:
///
/// 1. PAI and DAC Vendor IDs agree (when the PAI carries one)
/// 2. the DAC public key can be extracted
/// 3. the attestation signature verifies under the DAC key
/// 4. a PAA matching the chain's AKID is known, and the chain validates
/// 5. the attestation elements decode
/// 6. the attestation nonce is the expected one
#[derive(Debug, Default, Clone)]
pub struct DacVerifier<S, C = OpensslCrypto> {
    store: S,
    crypto: C,
}

impl<S: ITrustAnchorStore> DacVerifier<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            crypto: OpensslCrypto,
        }
    }
}

impl<S, C> DacVerifier<S, C>
where
    S: ITrustAnchorStore,
    C: CertificateCodec + SignatureEngine,
{
    pub fn with_crypto(store: S, crypto: C) -> Self {
        Self { store, crypto }
    }

    fn check_vendor_id(&self, req: &AttestationRequest<'_>) -> Stage<()> {
        let Some(pai) = req.intermediate() else {
            return Ok(());
        };

        let pai_vid = match self.crypto.extract_vendor_id(pai) {
            Ok(vid) => vid,
            Err(CertError::NotFound) => {
                debug!("PAI carries no vendor id, skipping vendor id check");
                return Ok(());
            }
            Err(_) => return Err(VerificationResult::IntermediateFormatInvalid),
        };

        let dac_vid = self
            .crypto
            .extract_vendor_id(req.leaf)
            .map_err(|_| VerificationResult::LeafFormatInvalid)?;

        if pai_vid != dac_vid {
            debug!("PAI vendor id {pai_vid:#06x}, DAC vendor id {dac_vid:#06x}");
            return Err(VerificationResult::VendorIdMismatch);
        }

        Ok(())
    }

    fn leaf_public_key(&self, req: &AttestationRequest<'_>) -> Stage<P256PublicKey> {
        self.crypto
            .extract_public_key(req.leaf)
            .map_err(|_| VerificationResult::LeafFormatInvalid)
    }

    fn check_signature(&self, req: &AttestationRequest<'_>, key: &P256PublicKey) -> Stage<()> {
        let signature = P256EcdsaSignature::from_slice(req.signature)
            .map_err(|_| VerificationResult::SignatureFormatInvalid)?;

        self.crypto
            .verify_p256(key, &[req.payload, req.challenge], &signature)
            .map_err(|_| VerificationResult::SignatureInvalid)
    }

    fn check_chain(&self, req: &AttestationRequest<'_>) -> Stage<()> {
        let pai = req.intermediate();

        let akid = self
            .crypto
            .extract_authority_key_id(pai.unwrap_or(req.leaf))
            .map_err(|e| {
                debug!("no usable authority key identifier: {e}");
                VerificationResult::TrustAnchorNotFound
            })?;

        let mut paa = CertBuffer::for_certificate().map_err(|e| {
            warn!("{e}");
            VerificationResult::ResourceExhausted
        })?;

        self.store.lookup(&akid, &mut paa).map_err(|e| match e {
            store::Error::Alloc(_) => VerificationResult::ResourceExhausted,
            e => {
                debug!("PAA lookup for {} failed: {e}", hex::encode(akid));
                VerificationResult::TrustAnchorNotFound
            }
        })?;

        self.crypto
            .validate_chain(paa.as_slice(), pai, req.leaf)
            .map_err(|_| VerificationResult::ChainInvalid)
    }

    fn decode_elements(&self, req: &AttestationRequest<'_>) -> Stage<AttestationElements> {
        AttestationElements::decode(req.payload).map_err(|e| {
            debug!("attestation elements: {e}");
            VerificationResult::PayloadMalformed
        })
    }

    fn check_nonce(&self, req: &AttestationRequest<'_>, ae: &AttestationElements) -> Stage<()> {
        if ae.attestation_nonce.as_slice() != req.expected_nonce {
            return Err(VerificationResult::NonceMismatch);
        }

        Ok(())
    }

    fn run(&self, req: &AttestationRequest<'_>) -> Stage<()> {
        self.check_vendor_id(req)?;
        debug!("vendor id check passed");

        let key = self.leaf_public_key(req)?;
        debug!("DAC public key extracted");

        self.check_signature(req, &key)?;
        debug!("attestation signature verified");

        self.check_chain(req)?;
        debug!("certificate chain validated");

        let ae = self.decode_elements(req)?;
        debug!(timestamp = ae.timestamp, "attestation elements decoded");

        self.check_nonce(req, &ae)?;

        Ok(())
    }
}

impl<S, C> DeviceAttestationVerifier for DacVerifier<S, C>
where
    S: ITrustAnchorStore,
    C: CertificateCodec + SignatureEngine,
{
    fn verify_attestation(&self, request: &AttestationRequest<'_>) -> VerificationResult {
        match self.run(request) {
            Ok(()) => {
                info!("device attestation verified");
                VerificationResult::Success
            }
            Err(r) => {
                warn!(outcome = %r, "device attestation rejected");
                r
            }
        }
    }
}
