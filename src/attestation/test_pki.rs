// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! Throw-away PAA -> PAI -> DAC hierarchies for tests.

use super::certificate::P256PublicKey;
use super::crypto::MATTER_VID_OID;
use crate::store::{KeyIdentifier, MemoTrustAnchorStore};
use openssl::asn1::Asn1Time;
use openssl::bn::{BigNum, BigNumContext, MsbOption};
use openssl::ec::{EcGroup, EcKey, PointConversionForm};
use openssl::ecdsa::EcdsaSig;
use openssl::hash::{Hasher, MessageDigest};
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::x509::extension::{
    AuthorityKeyIdentifier, BasicConstraints, KeyUsage, SubjectKeyIdentifier,
};
use openssl::x509::{X509Builder, X509NameBuilder, X509};

pub(crate) struct TestPki {
    pub paa: X509,
    pub pai: Option<X509>,
    pub dac: X509,
    pub dac_key: PKey<Private>,
}

fn p256_key() -> PKey<Private> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();

    PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
}

fn make_cert(
    cn: &str,
    vid: Option<u16>,
    key: &PKey<Private>,
    issuer: Option<(&X509, &PKey<Private>)>,
    ca: bool,
) -> X509 {
    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", cn).unwrap();
    if let Some(vid) = vid {
        name.append_entry_by_text(MATTER_VID_OID, &format!("{vid:04X}"))
            .unwrap();
    }
    let name = name.build();

    let mut b = X509Builder::new().unwrap();
    b.set_version(2).unwrap();

    let mut serial = BigNum::new().unwrap();
    serial.rand(63, MsbOption::MAYBE_ZERO, false).unwrap();
    b.set_serial_number(&serial.to_asn1_integer().unwrap())
        .unwrap();

    b.set_subject_name(&name).unwrap();
    match issuer {
        Some((cert, _)) => b.set_issuer_name(cert.subject_name()).unwrap(),
        None => b.set_issuer_name(&name).unwrap(),
    }
    b.set_pubkey(key).unwrap();
    b.set_not_before(&Asn1Time::from_str("20210628142343Z").unwrap())
        .unwrap();
    b.set_not_after(&Asn1Time::from_str("99991231235959Z").unwrap())
        .unwrap();

    if ca {
        b.append_extension(BasicConstraints::new().critical().ca().build().unwrap())
            .unwrap();
        b.append_extension(
            KeyUsage::new()
                .critical()
                .key_cert_sign()
                .crl_sign()
                .build()
                .unwrap(),
        )
        .unwrap();
    } else {
        b.append_extension(BasicConstraints::new().critical().build().unwrap())
            .unwrap();
        b.append_extension(
            KeyUsage::new()
                .critical()
                .digital_signature()
                .build()
                .unwrap(),
        )
        .unwrap();
    }

    let issuer_cert = issuer.map(|(cert, _)| &**cert);

    let skid = SubjectKeyIdentifier::new()
        .build(&b.x509v3_context(issuer_cert, None))
        .unwrap();
    b.append_extension(skid).unwrap();

    if issuer_cert.is_some() {
        let akid = AuthorityKeyIdentifier::new()
            .keyid(true)
            .build(&b.x509v3_context(issuer_cert, None))
            .unwrap();
        b.append_extension(akid).unwrap();
    }

    let signing_key = issuer.map(|(_, k)| k).unwrap_or(key);
    b.sign(signing_key, MessageDigest::sha256()).unwrap();

    b.build()
}

fn skid_of(cert: &X509) -> KeyIdentifier {
    cert.subject_key_id()
        .unwrap()
        .as_slice()
        .try_into()
        .unwrap()
}

impl TestPki {
    /// PAA -> PAI -> DAC, with the given Vendor IDs on PAI and DAC
    pub fn generate(pai_vid: Option<u16>, dac_vid: Option<u16>) -> Self {
        let paa_key = p256_key();
        let paa = make_cert("Test PAA", None, &paa_key, None, true);

        let pai_key = p256_key();
        let pai = make_cert("Test PAI", pai_vid, &pai_key, Some((&paa, &paa_key)), true);

        let dac_key = p256_key();
        let dac = make_cert("Test DAC", dac_vid, &dac_key, Some((&pai, &pai_key)), false);

        Self {
            paa,
            pai: Some(pai),
            dac,
            dac_key,
        }
    }

    /// PAA -> DAC, no intermediate
    pub fn generate_direct(dac_vid: Option<u16>) -> Self {
        let paa_key = p256_key();
        let paa = make_cert("Test PAA", None, &paa_key, None, true);

        let dac_key = p256_key();
        let dac = make_cert("Test DAC", dac_vid, &dac_key, Some((&paa, &paa_key)), false);

        Self {
            paa,
            pai: None,
            dac,
            dac_key,
        }
    }

    pub fn paa_der(&self) -> Vec<u8> {
        self.paa.to_der().unwrap()
    }

    /// Empty when the hierarchy has no intermediate
    pub fn pai_der(&self) -> Vec<u8> {
        self.pai
            .as_ref()
            .map(|c| c.to_der().unwrap())
            .unwrap_or_default()
    }

    pub fn dac_der(&self) -> Vec<u8> {
        self.dac.to_der().unwrap()
    }

    pub fn paa_skid(&self) -> KeyIdentifier {
        skid_of(&self.paa)
    }

    pub fn pai_skid(&self) -> KeyIdentifier {
        skid_of(self.pai.as_ref().unwrap())
    }

    pub fn dac_public_key(&self) -> P256PublicKey {
        let ec = self.dac_key.ec_key().unwrap();
        let mut ctx = BigNumContext::new().unwrap();

        let point = ec
            .public_key()
            .to_bytes(ec.group(), PointConversionForm::UNCOMPRESSED, &mut ctx)
            .unwrap();

        P256PublicKey::from_slice(&point).unwrap()
    }

    /// A trust anchor store holding only this hierarchy's PAA
    pub fn anchor_store(&self) -> MemoTrustAnchorStore {
        let der = self.paa_der();

        MemoTrustAnchorStore::from_certs(&[der.as_slice()]).unwrap()
    }
}

/// Raw (r || s) ECDSA P-256 signature over the concatenation of `parts`
pub(crate) fn sign_p256(key: &PKey<Private>, parts: &[&[u8]]) -> Vec<u8> {
    let mut hasher = Hasher::new(MessageDigest::sha256()).unwrap();
    for p in parts {
        hasher.update(p).unwrap();
    }
    let digest = hasher.finish().unwrap();

    let sig = EcdsaSig::sign(&digest, &key.ec_key().unwrap()).unwrap();

    let mut raw = sig.r().to_vec_padded(32).unwrap();
    raw.extend(sig.s().to_vec_padded(32).unwrap());

    raw
}
