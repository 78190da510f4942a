// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::certificate::{CertError, CertificateCodec, P256PublicKey, VendorId};
use super::signature::{
    P256EcdsaSignature, SignatureEngine, SignatureError, P256_ECDSA_SIGNATURE_LEN,
};
use crate::store::{KeyIdentifier, KEY_IDENTIFIER_LEN};
use openssl::bn::{BigNum, BigNumContext};
use openssl::ec::{EcGroup, EcKey, EcPoint, PointConversionForm};
use openssl::ecdsa::EcdsaSig;
use openssl::error::ErrorStack;
use openssl::hash::{Hasher, MessageDigest};
use openssl::nid::Nid;
use openssl::stack::Stack;
use openssl::x509::store::X509StoreBuilder;
use openssl::x509::{X509StoreContext, X509};
use tracing::debug;

/// OID of the Matter Vendor ID DN attribute
pub const MATTER_VID_OID: &str = "1.3.6.1.4.1.37244.2.1";

/// [`CertificateCodec`] and [`SignatureEngine`] backed by OpenSSL
#[derive(Debug, Default, Clone, Copy)]
pub struct OpensslCrypto;

fn parse(der: &[u8]) -> Result<X509, CertError> {
    X509::from_der(der).map_err(|e| {
        debug!("parsing certificate failed: {e}");
        CertError::Malformed
    })
}

fn malformed(e: ErrorStack) -> CertError {
    debug!("{e}");
    CertError::Malformed
}

fn invalid(e: ErrorStack) -> SignatureError {
    debug!("{e}");
    SignatureError::Invalid
}

/// Matter encodes the VID as exactly four upper-case hex digits
fn parse_vid(s: &str) -> Result<VendorId, CertError> {
    if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b)) {
        return Err(CertError::Malformed);
    }

    VendorId::from_str_radix(s, 16).map_err(|_| CertError::Malformed)
}

impl CertificateCodec for OpensslCrypto {
    fn extract_vendor_id(&self, der: &[u8]) -> Result<VendorId, CertError> {
        let x509 = parse(der)?;

        let mut vid: Option<VendorId> = None;

        for entry in x509.subject_name().entries() {
            if entry.object().to_string() != MATTER_VID_OID {
                continue;
            }

            if vid.is_some() {
                debug!("more than one VID attribute in subject");
                return Err(CertError::Malformed);
            }

            let s = entry.data().as_utf8().map_err(malformed)?;
            vid = Some(parse_vid(&s)?);
        }

        vid.ok_or(CertError::NotFound)
    }

    fn extract_public_key(&self, der: &[u8]) -> Result<P256PublicKey, CertError> {
        let x509 = parse(der)?;

        let pkey = x509.public_key().map_err(malformed)?;
        let ec = pkey.ec_key().map_err(malformed)?;

        if ec.group().curve_name() != Some(Nid::X9_62_PRIME256V1) {
            debug!("public key is not on P-256");
            return Err(CertError::Malformed);
        }

        let mut ctx = BigNumContext::new().map_err(malformed)?;
        let point = ec
            .public_key()
            .to_bytes(ec.group(), PointConversionForm::UNCOMPRESSED, &mut ctx)
            .map_err(malformed)?;

        P256PublicKey::from_slice(&point)
    }

    fn extract_authority_key_id(&self, der: &[u8]) -> Result<KeyIdentifier, CertError> {
        let x509 = parse(der)?;

        let akid = x509.authority_key_id().ok_or(CertError::NotFound)?;

        if akid.len() != KEY_IDENTIFIER_LEN {
            debug!("authority key identifier is {} bytes", akid.len());
            return Err(CertError::Malformed);
        }

        akid.as_slice().try_into().map_err(|_| CertError::Malformed)
    }

    fn validate_chain(
        &self,
        anchor: &[u8],
        intermediate: Option<&[u8]>,
        leaf: &[u8],
    ) -> Result<(), CertError> {
        let anchor = parse(anchor)?;
        let leaf = parse(leaf)?;

        let mut untrusted = Stack::new().map_err(malformed)?;
        if let Some(pai) = intermediate {
            untrusted.push(parse(pai)?).map_err(malformed)?;
        }

        let mut builder = X509StoreBuilder::new().map_err(malformed)?;
        builder.add_cert(anchor).map_err(malformed)?;
        let store = builder.build();

        let mut ctx = X509StoreContext::new().map_err(malformed)?;
        let ok = ctx
            .init(&store, &leaf, &untrusted, |c| {
                let ok = c.verify_cert()?;
                if !ok {
                    debug!(
                        depth = c.error_depth(),
                        "chain validation failed: {}",
                        c.error()
                    );
                }
                Ok(ok)
            })
            .map_err(|e| {
                debug!("chain validation error: {e}");
                CertError::Invalid
            })?;

        if ok {
            Ok(())
        } else {
            Err(CertError::Invalid)
        }
    }
}

impl SignatureEngine for OpensslCrypto {
    fn verify_p256(
        &self,
        key: &P256PublicKey,
        message_parts: &[&[u8]],
        signature: &P256EcdsaSignature,
    ) -> Result<(), SignatureError> {
        // a raw signature is always r || s, 32 bytes each
        if signature.len() != P256_ECDSA_SIGNATURE_LEN {
            return Err(SignatureError::Invalid);
        }

        let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).map_err(invalid)?;
        let mut ctx = BigNumContext::new().map_err(invalid)?;
        let point = EcPoint::from_bytes(&group, key.as_bytes(), &mut ctx).map_err(invalid)?;
        let ec = EcKey::from_public_key(&group, &point).map_err(invalid)?;

        let (r, s) = signature.as_bytes().split_at(P256_ECDSA_SIGNATURE_LEN / 2);
        let sig = EcdsaSig::from_private_components(
            BigNum::from_slice(r).map_err(invalid)?,
            BigNum::from_slice(s).map_err(invalid)?,
        )
        .map_err(invalid)?;

        let mut hasher = Hasher::new(MessageDigest::sha256()).map_err(invalid)?;
        for part in message_parts {
            hasher.update(part).map_err(invalid)?;
        }
        let digest = hasher.finish().map_err(invalid)?;

        match sig.verify(&digest, &ec) {
            Ok(true) => Ok(()),
            Ok(false) => Err(SignatureError::Invalid),
            Err(e) => Err(invalid(e)),
        }
    }
}
