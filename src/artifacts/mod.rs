// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! Server-side security artifacts: key pairs, the verification trust pool,
//! the TLS identity and the ownership vouchers handed to devices.
//!
//! # Example
//!
//! ```
//! use ownership_voucher::artifacts::{KeyPair, SecurityArtifacts};
//! use std::collections::BTreeMap;
//!
//! let kp = |c: &str, k: &str| KeyPair::from_pem(c.as_bytes(), k.as_bytes()).expect("loading key pair");
//!
//! let server = kp(
//!     include_str!("../../testdata/oc_pub.pem"),
//!     include_str!("../../testdata/oc_priv.pem"),
//! );
//! let domain = kp(
//!     include_str!("../../testdata/pdc_pub.pem"),
//!     include_str!("../../testdata/pdc_priv.pem"),
//! );
//! let vendor_ca = kp(
//!     include_str!("../../testdata/vendorca_pub.pem"),
//!     include_str!("../../testdata/vendorca_priv.pem"),
//! );
//!
//! let ov = include_bytes!("../../testdata/ov_123A.der").to_vec();
//! let vouchers = BTreeMap::from([("123A".to_string(), ov)]);
//!
//! let sa = SecurityArtifacts::assemble(server, domain, vendor_ca, vouchers)
//!     .expect("assembling security artifacts");
//!
//! assert_eq!(sa.trust_pool().len(), 1);
//! assert!(sa.voucher("123A").is_some());
//! ```

pub use self::assembler::{SecurityArtifacts, TlsIdentity};
pub use self::errors::{AssemblyError, LoadError};
pub use self::keypair::KeyPair;
pub use self::loader::ArtifactDir;
pub use self::trustpool::TrustPool;

mod assembler;
mod errors;
pub(crate) mod keypair;
pub mod loader;
mod trustpool;
