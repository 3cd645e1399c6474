// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::claims::VoucherClaims;
use super::errors::VerificationError;
use crate::artifacts::keypair::{fingerprint, name_to_string};
use crate::artifacts::TrustPool;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use openssl::pkcs7::{Pkcs7, Pkcs7Flags};
use openssl::stack::Stack;
use openssl::x509::store::X509StoreRef;
use openssl::x509::verify::X509VerifyFlags;
use openssl::x509::{X509Ref, X509StoreContext, X509};

/// Verify a DER-encoded PKCS#7 signed voucher and return its claims-set.
///
/// Every signer certificate must chain up to a member of `pool` and every
/// signature must check out before the content is even looked at.  The
/// result depends on the inputs only: certificate validity periods and the
/// voucher's own `expires-on` are not compared to the clock (see
/// [`verify_at`] for that).
pub fn verify(buf: &[u8], pool: &TrustPool) -> Result<VoucherClaims, VerificationError> {
    let r = verify_inner(buf, pool);

    if let Err(e) = &r {
        warn!("rejecting ownership voucher: {e}");
    }

    r
}

/// Same as [`verify`], then also check that the voucher is within its
/// validity window at time `at`
pub fn verify_at(
    buf: &[u8],
    pool: &TrustPool,
    at: DateTime<Utc>,
) -> Result<VoucherClaims, VerificationError> {
    let c = verify(buf, pool)?;

    c.check_validity(at)?;

    Ok(c)
}

fn verify_inner(buf: &[u8], pool: &TrustPool) -> Result<VoucherClaims, VerificationError> {
    if buf.is_empty() {
        return Err(VerificationError::Empty);
    }

    let p7 = Pkcs7::from_der(buf).map_err(|e| VerificationError::Malformed(e.to_string()))?;

    let signed = p7
        .signed()
        .ok_or_else(|| VerificationError::Malformed("not a signed-data envelope".to_string()))?;

    // certificates shipped inside the envelope may help building the chain
    // but are never trusted on their own
    let mut untrusted: Stack<X509> = Stack::new().map_err(sig_err)?;
    if let Some(certs) = signed.certificates() {
        for c in certs {
            untrusted.push(c.to_owned()).map_err(sig_err)?;
        }
    }

    let signers = p7
        .signers(&untrusted, Pkcs7Flags::empty())
        .map_err(|e| VerificationError::SignatureInvalid(format!("locating signers: {e}")))?;

    if signers.is_empty() {
        return Err(VerificationError::SignatureInvalid(
            "no signer found".to_string(),
        ));
    }

    let store = pool
        .to_store(X509VerifyFlags::NO_CHECK_TIME)
        .map_err(sig_err)?;

    for signer in signers.iter() {
        check_chain(&store, signer, &untrusted)?;
    }

    // chains were checked above, only the signatures are left
    let mut content = Vec::new();
    p7.verify(
        &untrusted,
        &store,
        None,
        Some(&mut content),
        Pkcs7Flags::BINARY | Pkcs7Flags::NOVERIFY,
    )
    .map_err(|e| VerificationError::SignatureInvalid(e.to_string()))?;

    let claims =
        VoucherClaims::decode(&content).map_err(|e| VerificationError::SchemaInvalid(e.to_string()))?;

    debug!(
        "verified voucher for {} signed by {}",
        claims.serial_number,
        signers
            .iter()
            .map(fingerprint)
            .collect::<Vec<String>>()
            .join(", ")
    );

    Ok(claims)
}

fn check_chain(
    store: &X509StoreRef,
    signer: &X509Ref,
    untrusted: &Stack<X509>,
) -> Result<(), VerificationError> {
    let mut ctx = X509StoreContext::new().map_err(sig_err)?;

    let r = ctx
        .init(store, signer, untrusted, |c| {
            if c.verify_cert()? {
                Ok(Ok(()))
            } else {
                Ok(Err(c.error().error_string().to_string()))
            }
        })
        .map_err(sig_err)?;

    r.map_err(|e| {
        VerificationError::SignatureInvalid(format!(
            "untrusted signer {}: {e}",
            name_to_string(signer.subject_name())
        ))
    })
}

fn sig_err(e: openssl::error::ErrorStack) -> VerificationError {
    VerificationError::SignatureInvalid(e.to_string())
}
