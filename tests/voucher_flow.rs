// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use chrono::Duration;
use ownership_voucher::artifacts::{AssemblyError, KeyPair, SecurityArtifacts, TrustPool};
use ownership_voucher::voucher::{self, strip_pem_headers, VerificationError};
use std::collections::BTreeMap;

const OC_CERT: &str = include_str!("../testdata/oc_pub.pem");
const OC_KEY: &str = include_str!("../testdata/oc_priv.pem");
const PDC_CERT: &str = include_str!("../testdata/pdc_pub.pem");
const PDC_KEY: &str = include_str!("../testdata/pdc_priv.pem");
const VENDOR_CERT: &str = include_str!("../testdata/vendorca_pub.pem");
const VENDOR_KEY: &str = include_str!("../testdata/vendorca_priv.pem");
const ROGUE_CERT: &str = include_str!("../testdata/rogueca_pub.pem");
const ROGUE_KEY: &str = include_str!("../testdata/rogueca_priv.pem");

fn kp(cert: &str, key: &str) -> KeyPair {
    KeyPair::from_pem(cert.as_bytes(), key.as_bytes()).expect("loading key pair")
}

#[test]
fn vendor_signs_server_verifies() {
    let vendor_ca = kp(VENDOR_CERT, VENDOR_KEY);

    let ov = voucher::sign("123A", PDC_CERT, &vendor_ca).expect("signing voucher");

    let pool = TrustPool::from_pem(VENDOR_CERT.as_bytes()).expect("building trust pool");
    let claims = voucher::verify(&ov, &pool).expect("verifying voucher");

    assert_eq!(claims.serial_number, "123A");
    assert_eq!(
        claims.pinned_domain_cert,
        strip_pem_headers(PDC_CERT).unwrap()
    );
    assert_eq!(claims.expires_on - claims.created_on, Duration::days(365));
}

#[test]
fn rogue_vendor_is_rejected() {
    let rogue = kp(ROGUE_CERT, ROGUE_KEY);

    let ov = voucher::sign("123A", PDC_CERT, &rogue).expect("signing voucher");

    let pool = TrustPool::from_pem(VENDOR_CERT.as_bytes()).unwrap();

    assert!(matches!(
        voucher::verify(&ov, &pool),
        Err(VerificationError::SignatureInvalid(_))
    ));
}

#[test]
fn empty_voucher_is_rejected() {
    let pool = TrustPool::from_pem(VENDOR_CERT.as_bytes()).unwrap();

    assert_eq!(voucher::verify(&[], &pool), Err(VerificationError::Empty));
}

#[test]
fn server_serves_stored_voucher() {
    let vendor_ca = kp(VENDOR_CERT, VENDOR_KEY);
    let ov = voucher::sign("123B", PDC_CERT, &vendor_ca).unwrap();

    let sa = SecurityArtifacts::assemble(
        kp(OC_CERT, OC_KEY),
        kp(PDC_CERT, PDC_KEY),
        vendor_ca,
        BTreeMap::from([("123B".to_string(), ov)]),
    )
    .expect("assembling security artifacts");

    let pool = TrustPool::from_pem(&sa.vendor_ca().cert().to_pem().unwrap()).unwrap();
    let claims = voucher::verify(sa.voucher("123B").unwrap(), &pool).unwrap();

    // the device pins the domain certificate from the voucher, the server
    // trusts that same certificate
    let pdc = claims.pinned_domain_cert_x509().unwrap();
    assert!(sa.trust_pool().contains(&pdc));
}

#[test]
fn mismatched_server_key_refuses_to_assemble() {
    let r = SecurityArtifacts::assemble(
        kp(OC_CERT, VENDOR_KEY),
        kp(PDC_CERT, PDC_KEY),
        kp(VENDOR_CERT, VENDOR_KEY),
        BTreeMap::new(),
    );

    assert!(matches!(r, Err(AssemblyError::TlsIdentityInvalid(_))));
}
