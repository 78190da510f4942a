// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::certbuffer::CertBuffer;
use super::errors::Error;
use super::KeyIdentifier;

/// Interface to the store where the recognised PAA certificates are stashed.
pub trait ITrustAnchorStore {
    /// Lookup a trust anchor given its subject key identifier and copy the
    /// DER certificate into `out`.  Fails with [`Error::NotFound`] when no
    /// anchor carries exactly `key_id`, and with [`Error::BufferTooSmall`]
    /// when the certificate does not fit.
    fn lookup(&self, key_id: &KeyIdentifier, out: &mut CertBuffer) -> Result<(), Error>;
}
