// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! Ownership voucher support for zero-touch bootstrap servers.
//!
//! An ownership voucher ([RFC 8366]) is a statement, signed by the device
//! vendor, that a device with a given serial number belongs to the domain
//! whose certificate is pinned in the voucher.
//!
//! The API allows:
//! * Encoding and decoding the voucher claims-set
//! * Minting PKCS#7 signed vouchers with a vendor CA key pair
//! * Verifying signed vouchers against a trust pool
//! * Assembling a server's security artifacts (TLS identity, trust pool,
//!   vouchers) from PEM material, optionally loaded from a directory
//!
//! [RFC 8366]: https://www.rfc-editor.org/rfc/rfc8366.html

pub mod artifacts;
pub mod voucher;

#[cfg(test)]
mod testutil;
