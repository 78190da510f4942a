// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! The attestation module provides a [`DacVerifier`] that decides whether a
//! commissioner may trust a Matter device, based on the attestation
//! information the device returned during commissioning: the signed
//! attestation elements, the DAC and (optionally) the PAI.
//!
//! # Example
//!
//! The following example uses the built-in table of development PAAs.  The
//! inputs are normally obtained from the device over the secure session.
//!
//! ```
//! use dacverifier::attestation::{
//!     AttestationRequest, DacVerifier, DeviceAttestationVerifier, VerificationResult,
//! };
//! use dacverifier::store::TestTrustAnchorStore;
//!
//! let v = DacVerifier::new(TestTrustAnchorStore::new());
//!
//! let nonce = [0u8; 32];
//! let req = AttestationRequest {
//!     payload: &[0x15, 0x18],
//!     challenge: &[0u8; 16],
//!     signature: &[0u8; 64],
//!     intermediate: None,
//!     leaf: b"not a certificate",
//!     expected_nonce: &nonce,
//! };
//!
//! let r = v.verify_attestation(&req);
//!
//! // anything but success means "do not trust this device"
//! assert!(!r.is_success());
//! assert_eq!(r, VerificationResult::LeafFormatInvalid);
//! ```

pub use self::certificate::{CertError, CertificateCodec, P256PublicKey, VendorId};
pub use self::crypto::{OpensslCrypto, MATTER_VID_OID};
pub use self::elements::{AttestationElements, ATTESTATION_NONCE_LEN, MAX_VENDOR_RESERVED};
pub use self::errors::Error;
pub use self::signature::{
    P256EcdsaSignature, SignatureEngine, SignatureError, P256_ECDSA_SIGNATURE_LEN,
};
pub use self::verifier::{
    AttestationRequest, DacVerifier, DeviceAttestationVerifier, FailureCategory,
    VerificationResult,
};

mod certificate;
mod crypto;
mod elements;
mod errors;
mod signature;
mod tlv;
mod verifier;

#[cfg(test)]
mod test_pki;
