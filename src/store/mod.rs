// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! Trust anchor (PAA) registries.
//!
//! The verifier only ever talks to an [`ITrustAnchorStore`].  Two
//! implementations are provided: [`TestTrustAnchorStore`], the fixed table of
//! Matter development PAAs, and [`MemoTrustAnchorStore`], which is populated
//! once from JSON or DER and stands in for a provisioned store.

pub use self::base64::Bytes;
pub use self::certbuffer::{CertBuffer, MAX_DER_CERT_LEN};
pub use self::errors::Error;
pub use self::itrustanchorstore::ITrustAnchorStore;
pub use self::memo_trustanchorstore::MemoTrustAnchorStore;
pub use self::test_trustanchorstore::TestTrustAnchorStore;
pub use self::trustanchor::TrustAnchor;

pub mod base64;
mod certbuffer;
mod errors;
mod itrustanchorstore;
mod memo_trustanchorstore;
mod test_trustanchorstore;
mod trustanchor;

/// Length of a subject/authority key identifier
pub const KEY_IDENTIFIER_LEN: usize = 20;

/// A subject/authority key identifier
pub type KeyIdentifier = [u8; KEY_IDENTIFIER_LEN];
