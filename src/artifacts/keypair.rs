// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::AssemblyError;
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, PKeyRef, Private};
use openssl::x509::{X509NameRef, X509Ref, X509};

/// A certificate together with its private key
#[derive(Clone)]
pub struct KeyPair {
    cert: X509,
    key: PKey<Private>,
}

impl KeyPair {
    pub fn new(cert: X509, key: PKey<Private>) -> Self {
        Self { cert, key }
    }

    /// Parse a PEM-encoded certificate and the matching PEM-encoded private
    /// key.  Only the first certificate in `cert_pem` is retained.
    ///
    /// Whether the two halves actually belong together is not checked here,
    /// see [`KeyPair::matches`].
    pub fn from_pem(cert_pem: &[u8], key_pem: &[u8]) -> Result<Self, AssemblyError> {
        let cert = X509::from_pem(cert_pem)
            .map_err(|e| AssemblyError::Syntax(format!("parsing certificate: {e}")))?;

        let key = PKey::private_key_from_pem(key_pem)
            .map_err(|e| AssemblyError::Syntax(format!("parsing private key: {e}")))?;

        Ok(Self { cert, key })
    }

    pub fn cert(&self) -> &X509Ref {
        &self.cert
    }

    pub fn key(&self) -> &PKeyRef<Private> {
        &self.key
    }

    pub fn cert_pem(&self) -> Result<String, AssemblyError> {
        let pem = self
            .cert
            .to_pem()
            .map_err(|e| AssemblyError::Crypto(e.to_string()))?;

        String::from_utf8(pem).map_err(|e| AssemblyError::Syntax(e.to_string()))
    }

    /// Returns true if the private key corresponds to the public key in the
    /// certificate
    pub fn matches(&self) -> bool {
        self.cert
            .public_key()
            .map(|pk| pk.public_eq(&*self.key))
            .unwrap_or(false)
    }

    pub fn subject(&self) -> String {
        name_to_string(self.cert.subject_name())
    }

    /// Hex encoded SHA-256 of the DER certificate
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.cert)
    }
}

// never print the private key
impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("subject", &self.subject())
            .field("fingerprint", &self.fingerprint())
            .finish_non_exhaustive()
    }
}

pub(crate) fn fingerprint(cert: &X509Ref) -> String {
    cert.digest(MessageDigest::sha256())
        .map(hex::encode)
        .unwrap_or_default()
}

pub(crate) fn name_to_string(name: &X509NameRef) -> String {
    name.entries()
        .map(|e| {
            let k = e.object().nid().short_name().unwrap_or("?");
            let v = e
                .data()
                .to_string()
                .unwrap_or_default();

            format!("{k}={v}")
        })
        .collect::<Vec<String>>()
        .join(", ")
}
