// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! The voucher module mints and checks RFC 8366 ownership vouchers carried
//! in PKCS#7 SignedData envelopes.
//!
//! # Example
//!
//! The vendor CA signs a voucher binding device `123A` to the owner's
//! pinned domain certificate; the voucher is then verified against a trust
//! pool holding the vendor CA certificate.
//!
//! ```
//! use chrono::Duration;
//! use ownership_voucher::artifacts::{KeyPair, TrustPool};
//! use ownership_voucher::voucher;
//!
//! const VENDOR_CERT: &str = include_str!("../../testdata/vendorca_pub.pem");
//! const VENDOR_KEY: &str = include_str!("../../testdata/vendorca_priv.pem");
//! const PDC: &str = include_str!("../../testdata/pdc_pub.pem");
//!
//! let vendor_ca = KeyPair::from_pem(VENDOR_CERT.as_bytes(), VENDOR_KEY.as_bytes())
//!     .expect("loading vendor CA");
//!
//! let ov = voucher::sign("123A", PDC, &vendor_ca).expect("signing voucher");
//!
//! let pool = TrustPool::from_pem(VENDOR_CERT.as_bytes()).expect("building trust pool");
//! let claims = voucher::verify(&ov, &pool).expect("verifying voucher");
//!
//! assert_eq!(claims.serial_number, "123A");
//! assert_eq!(claims.pinned_domain_cert_pem(), PDC);
//! assert_eq!(claims.expires_on - claims.created_on, Duration::days(365));
//! ```

pub use self::claims::{Assertion, OwnershipVoucher, VoucherClaims, VOUCHER_VALIDITY_DAYS};
pub use self::errors::{FormatError, SigningError, VerificationError};
pub use self::pem::{add_pem_headers, strip_pem_headers};
pub use self::signer::{sign, Signer};
pub use self::verifier::{verify, verify_at};

mod claims;
mod errors;
mod pem;
mod signer;
mod verifier;

/// Canonical encoding of a claims-set, see [`VoucherClaims::encode`]
pub fn encode(claims: &VoucherClaims) -> Result<Vec<u8>, FormatError> {
    claims.encode()
}

/// See [`VoucherClaims::decode`]
pub fn decode(buf: &[u8]) -> Result<VoucherClaims, FormatError> {
    VoucherClaims::decode(buf)
}
