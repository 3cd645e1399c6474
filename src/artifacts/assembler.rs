// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::AssemblyError;
use super::keypair::{fingerprint, name_to_string, KeyPair};
use super::trustpool::TrustPool;
use log::debug;
use openssl::pkey::{PKey, PKeyRef, Private};
use openssl::ssl::{SslAcceptor, SslAcceptorBuilder, SslContext, SslMethod};
use openssl::x509::verify::X509VerifyFlags;
use openssl::x509::{X509Ref, X509};
use std::collections::BTreeMap;

/// Certificate and key presented by the bootstrap server on TLS connections
#[derive(Clone)]
pub struct TlsIdentity {
    cert: X509,
    key: PKey<Private>,
}

impl TlsIdentity {
    /// Derive a TLS identity from a key pair, making sure that TLS would
    /// accept the combination
    pub fn new(kp: &KeyPair) -> Result<Self, AssemblyError> {
        let tls_err = |e: openssl::error::ErrorStack| {
            AssemblyError::TlsIdentityInvalid(format!("{}: {e}", kp.subject()))
        };

        let mut ctx = SslContext::builder(SslMethod::tls_server()).map_err(tls_err)?;
        ctx.set_certificate(kp.cert()).map_err(tls_err)?;
        ctx.set_private_key(kp.key()).map_err(tls_err)?;
        ctx.check_private_key().map_err(tls_err)?;

        Ok(Self {
            cert: kp.cert().to_owned(),
            key: kp.key().to_owned(),
        })
    }

    pub fn cert(&self) -> &X509Ref {
        &self.cert
    }

    pub fn key(&self) -> &PKeyRef<Private> {
        &self.key
    }
}

impl std::fmt::Debug for TlsIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsIdentity")
            .field("subject", &name_to_string(self.cert.subject_name()))
            .field("fingerprint", &fingerprint(&self.cert))
            .finish_non_exhaustive()
    }
}

/// Everything the bootstrap server needs to establish trust: its own TLS
/// identity, the owner (pinned domain) and vendor CA key pairs, the trust
/// pool and the ownership vouchers it hands out, indexed by an externally
/// defined identifier.
///
/// A `SecurityArtifacts` is built once at start-up and is read-only from
/// then on; share it with `Arc` if needed.
#[derive(Debug)]
pub struct SecurityArtifacts {
    server: KeyPair,
    domain: KeyPair,
    vendor_ca: KeyPair,
    vouchers: BTreeMap<String, Vec<u8>>,
    tls: TlsIdentity,
    trust_pool: TrustPool,
}

impl SecurityArtifacts {
    /// Put together the server's trust posture.  Vouchers are stored as-is,
    /// verification happens when a device asks for one.
    pub fn assemble(
        server: KeyPair,
        domain: KeyPair,
        vendor_ca: KeyPair,
        vouchers: BTreeMap<String, Vec<u8>>,
    ) -> Result<Self, AssemblyError> {
        let tls = TlsIdentity::new(&server)?;

        let trust_pool = TrustPool::from_pem(domain.cert_pem()?.as_bytes())?;

        debug!(
            "assembled security artifacts: tls={} domain={} vendor-ca={} vouchers={}",
            server.fingerprint(),
            domain.fingerprint(),
            vendor_ca.fingerprint(),
            vouchers.len()
        );

        Ok(Self {
            server,
            domain,
            vendor_ca,
            vouchers,
            tls,
            trust_pool,
        })
    }

    pub fn server(&self) -> &KeyPair {
        &self.server
    }

    pub fn domain(&self) -> &KeyPair {
        &self.domain
    }

    pub fn vendor_ca(&self) -> &KeyPair {
        &self.vendor_ca
    }

    pub fn tls_identity(&self) -> &TlsIdentity {
        &self.tls
    }

    pub fn trust_pool(&self) -> &TrustPool {
        &self.trust_pool
    }

    /// Raw signed voucher stored under `id`
    pub fn voucher(&self, id: &str) -> Option<&[u8]> {
        self.vouchers.get(id).map(Vec::as_slice)
    }

    pub fn voucher_ids(&self) -> impl Iterator<Item = &str> {
        self.vouchers.keys().map(String::as_str)
    }

    /// A TLS acceptor (Mozilla intermediate profile) presenting the server
    /// identity and using the trust pool as certificate store
    pub fn ssl_acceptor(&self) -> Result<SslAcceptorBuilder, AssemblyError> {
        let tls_err = |e: openssl::error::ErrorStack| AssemblyError::TlsIdentityInvalid(e.to_string());

        let mut b = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls_server()).map_err(tls_err)?;
        b.set_certificate(self.tls.cert()).map_err(tls_err)?;
        b.set_private_key(self.tls.key()).map_err(tls_err)?;
        b.check_private_key().map_err(tls_err)?;

        let store = self
            .trust_pool
            .to_store(X509VerifyFlags::empty())
            .map_err(|e| AssemblyError::Crypto(e.to_string()))?;
        b.set_cert_store(store);

        Ok(b)
    }
}
