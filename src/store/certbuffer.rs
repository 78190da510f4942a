// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;

/// Maximum length of a DER encoded attestation certificate
pub const MAX_DER_CERT_LEN: usize = 600;

/// A bounded, owned buffer that receives a DER certificate.
///
/// The capacity is fixed when the buffer is created and is never grown:
/// copying in a certificate longer than the capacity fails instead of
/// reallocating.
#[derive(Debug)]
pub struct CertBuffer {
    buf: Vec<u8>,
    capacity: usize,
}

impl CertBuffer {
    /// Allocate a buffer able to hold `capacity` bytes.  Allocation failure is
    /// reported rather than aborting the process.
    pub fn try_with_capacity(capacity: usize) -> Result<Self, Error> {
        let mut buf = Vec::new();

        buf.try_reserve_exact(capacity)
            .map_err(|e| Error::Alloc(format!("{capacity} bytes: {e}")))?;

        Ok(Self { buf, capacity })
    }

    /// Allocate a buffer sized for the largest accepted certificate
    pub fn for_certificate() -> Result<Self, Error> {
        Self::try_with_capacity(MAX_DER_CERT_LEN)
    }

    /// Replace the buffer contents with `src`
    pub fn copy_from(&mut self, src: &[u8]) -> Result<(), Error> {
        if src.len() > self.capacity {
            return Err(Error::BufferTooSmall(format!(
                "need {} bytes, have {}",
                src.len(),
                self.capacity
            )));
        }

        self.buf.clear();
        self.buf.extend_from_slice(src);

        Ok(())
    }

    pub fn as_slice(&self) -> &[u8] {
        self.buf.as_slice()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}
