// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::AssemblyError;
use super::keypair::fingerprint;
use openssl::error::ErrorStack;
use openssl::x509::store::{X509Store, X509StoreBuilder};
use openssl::x509::verify::X509VerifyFlags;
use openssl::x509::{X509Ref, X509};

/// The set of certificates accepted as anchors when verifying a signer's
/// certificate chain.  A trust pool is only ever used for verification.
#[derive(Clone, Default)]
pub struct TrustPool {
    certs: Vec<X509>,
}

impl TrustPool {
    /// Returns a new empty TrustPool
    pub fn new() -> Self {
        Self { certs: Vec::new() }
    }

    /// Build a trust pool from a PEM bundle
    pub fn from_pem(pem: &[u8]) -> Result<Self, AssemblyError> {
        let mut p = Self::new();

        if p.add_pem(pem)? == 0 {
            return Err(AssemblyError::TrustPoolEmpty(
                "no certificate found in PEM input".to_string(),
            ));
        }

        Ok(p)
    }

    /// Add a certificate.  Returns false if it was already in the pool.
    pub fn add(&mut self, cert: X509) -> bool {
        if self.contains(&cert) {
            return false;
        }

        self.certs.push(cert);

        true
    }

    /// Add every certificate found in a PEM bundle and return how many
    /// were new to the pool
    pub fn add_pem(&mut self, pem: &[u8]) -> Result<usize, AssemblyError> {
        let certs = X509::stack_from_pem(pem).map_err(|e| AssemblyError::Syntax(e.to_string()))?;

        Ok(certs.into_iter().filter(|c| self.add(c.clone())).count())
    }

    pub fn contains(&self, cert: &X509Ref) -> bool {
        self.certs.iter().any(|c| c == cert)
    }

    pub fn len(&self) -> usize {
        self.certs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }

    pub fn certificates(&self) -> &[X509] {
        &self.certs
    }

    /// Every pool member is a trust anchor, including intermediates, hence
    /// `PARTIAL_CHAIN`.
    pub(crate) fn to_store(&self, flags: X509VerifyFlags) -> Result<X509Store, ErrorStack> {
        let mut b = X509StoreBuilder::new()?;

        for c in &self.certs {
            b.add_cert(c.clone())?;
        }

        b.set_flags(flags | X509VerifyFlags::PARTIAL_CHAIN)?;

        Ok(b.build())
    }
}

impl std::fmt::Debug for TrustPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.certs.iter().map(|c| fingerprint(c)))
            .finish()
    }
}
