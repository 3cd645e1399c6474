// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::claims::{Assertion, VoucherClaims, VOUCHER_VALIDITY_DAYS};
use super::errors::SigningError;
use crate::artifacts::KeyPair;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use log::debug;
use openssl::pkcs7::{Pkcs7, Pkcs7Flags};
use openssl::pkey::Id;
use openssl::stack::Stack;
use openssl::x509::X509;

/// Mints ownership vouchers on behalf of a vendor CA.
///
/// ```
/// use ownership_voucher::artifacts::KeyPair;
/// use ownership_voucher::voucher::{Assertion, Signer};
///
/// const CERT: &str = include_str!("../../testdata/vendorca_pub.pem");
/// const KEY: &str = include_str!("../../testdata/vendorca_priv.pem");
/// const PDC: &str = include_str!("../../testdata/pdc_pub.pem");
///
/// let vendor_ca = KeyPair::from_pem(CERT.as_bytes(), KEY.as_bytes()).expect("loading vendor CA");
///
/// let ov = Signer::new(&vendor_ca)
///     .assertion(Assertion::Verified)
///     .revocation_checks(true)
///     .sign("123A", PDC)
///     .expect("signing voucher");
///
/// assert!(!ov.is_empty());
/// ```
#[derive(Debug)]
pub struct Signer<'a> {
    vendor_ca: &'a KeyPair,
    assertion: Option<Assertion>,
    revocation_checks: bool,
    validity: Duration,
}

impl<'a> Signer<'a> {
    pub fn new(vendor_ca: &'a KeyPair) -> Self {
        Self {
            vendor_ca,
            assertion: None,
            revocation_checks: false,
            validity: Duration::days(VOUCHER_VALIDITY_DAYS),
        }
    }

    pub fn assertion(mut self, assertion: Assertion) -> Self {
        self.assertion = Some(assertion);
        self
    }

    pub fn revocation_checks(mut self, revocation_checks: bool) -> Self {
        self.revocation_checks = revocation_checks;
        self
    }

    pub fn validity(mut self, validity: Duration) -> Self {
        self.validity = validity;
        self
    }

    /// Sign a voucher for `serial_number` pinning `pdc_pem`, valid from now
    pub fn sign(&self, serial_number: &str, pdc_pem: &str) -> Result<Vec<u8>, SigningError> {
        self.sign_at(serial_number, pdc_pem, Utc::now().trunc_subsecs(0))
    }

    pub fn sign_at(
        &self,
        serial_number: &str,
        pdc_pem: &str,
        created_on: DateTime<Utc>,
    ) -> Result<Vec<u8>, SigningError> {
        let mut claims = VoucherClaims::new(serial_number, pdc_pem, created_on, self.validity)?;
        claims.assertion = self.assertion;
        claims.domain_cert_revocation_checks = self.revocation_checks;

        self.sign_claims(&claims)
    }

    /// Wrap an already populated claims-set into a PKCS#7 SignedData
    /// envelope.  The content is embedded and the vendor CA certificate is
    /// the only signer.
    pub fn sign_claims(&self, claims: &VoucherClaims) -> Result<Vec<u8>, SigningError> {
        let ca = self.vendor_ca;

        if !ca.matches() {
            return Err(SigningError::KeyMismatch(ca.subject()));
        }

        // PKCS7_sign picks the key's default digest, which is SHA-256 for
        // both of these
        match ca.key().id() {
            Id::RSA | Id::EC => {}
            id => {
                return Err(SigningError::UnsupportedKey(format!(
                    "{id:?} key for {}",
                    ca.subject()
                )))
            }
        }

        let content = claims.encode()?;

        let certs: Stack<X509> = Stack::new().map_err(|e| SigningError::Crypto(e.to_string()))?;

        let p7 = Pkcs7::sign(ca.cert(), ca.key(), &certs, &content, Pkcs7Flags::BINARY)
            .map_err(|e| SigningError::Crypto(e.to_string()))?;

        let der = p7.to_der().map_err(|e| SigningError::Crypto(e.to_string()))?;

        debug!(
            "signed voucher for {} (expires {}) with {}",
            claims.serial_number,
            claims.expires_on,
            ca.fingerprint()
        );

        Ok(der)
    }
}

/// Sign a voucher for `serial_number` pinning `pdc_pem` using the vendor CA
/// key pair, with default assertion, revocation-check and validity settings
pub fn sign(serial_number: &str, pdc_pem: &str, vendor_ca: &KeyPair) -> Result<Vec<u8>, SigningError> {
    Signer::new(vendor_ca).sign(serial_number, pdc_pem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use crate::voucher::FormatError;
    use chrono::TimeZone;
    use openssl::x509::store::X509StoreBuilder;

    const TEST_VENDOR_CERT: &str = include_str!("../../testdata/vendorca_pub.pem");
    const TEST_VENDOR_KEY: &str = include_str!("../../testdata/vendorca_priv.pem");
    const TEST_PDC_CERT: &str = include_str!("../../testdata/pdc_pub.pem");
    const TEST_PDC_KEY: &str = include_str!("../../testdata/pdc_priv.pem");
    const TEST_VOUCHER_JSON: &str = include_str!("../../testdata/voucher-123A.json");

    fn vendor_ca() -> KeyPair {
        KeyPair::from_pem(TEST_VENDOR_CERT.as_bytes(), TEST_VENDOR_KEY.as_bytes()).unwrap()
    }

    // DER of the id-sha256 and id-sha1 OBJECT IDENTIFIERs
    const OID_SHA256: &[u8] = &[
        0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01,
    ];
    const OID_SHA1: &[u8] = &[0x06, 0x05, 0x2b, 0x0e, 0x03, 0x02, 0x1a];

    fn occurrences(der: &[u8], oid: &[u8]) -> usize {
        der.windows(oid.len()).filter(|w| *w == oid).count()
    }

    // open the envelope with plain OpenSSL, trusting the vendor CA
    fn open(der: &[u8]) -> Vec<u8> {
        let p7 = Pkcs7::from_der(der).unwrap();

        let mut b = X509StoreBuilder::new().unwrap();
        b.add_cert(vendor_ca().cert().to_owned()).unwrap();
        let store = b.build();

        let certs: Stack<X509> = Stack::new().unwrap();
        let mut out = Vec::new();
        p7.verify(
            &certs,
            &store,
            None,
            Some(&mut out),
            Pkcs7Flags::BINARY | Pkcs7Flags::NOVERIFY,
        )
        .unwrap();

        out
    }

    #[test]
    fn sign_embeds_canonical_content() {
        let kp = vendor_ca();
        let t = Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap();

        let der = Signer::new(&kp).sign_at("123A", TEST_PDC_CERT, t).unwrap();

        assert_eq!(open(&der), TEST_VOUCHER_JSON.as_bytes());
    }

    #[test]
    fn sign_includes_signer_certificate() {
        let kp = vendor_ca();

        let der = sign("123A", TEST_PDC_CERT, &kp).unwrap();

        let p7 = Pkcs7::from_der(&der).unwrap();
        let certs: Stack<X509> = Stack::new().unwrap();
        let signers = p7.signers(&certs, Pkcs7Flags::empty()).unwrap();

        assert_eq!(signers.len(), 1);
        assert_eq!(
            signers.get(0).unwrap().to_der().unwrap(),
            kp.cert().to_der().unwrap()
        );
    }

    #[test]
    fn sign_sets_window_and_options() {
        let kp = vendor_ca();

        let der = Signer::new(&kp)
            .assertion(Assertion::Logged)
            .revocation_checks(true)
            .validity(Duration::days(7))
            .sign("123B", TEST_PDC_CERT)
            .unwrap();

        let c = VoucherClaims::decode(&open(&der)).unwrap();

        assert_eq!(c.serial_number, "123B");
        assert_eq!(c.assertion, Some(Assertion::Logged));
        assert!(c.domain_cert_revocation_checks);
        assert_eq!(c.validity(), Duration::days(7));
        assert_eq!(c.created_on.timestamp_subsec_nanos(), 0);
    }

    #[test]
    fn sign_default_window_is_one_year() {
        let kp = vendor_ca();

        let der = sign("123A", TEST_PDC_CERT, &kp).unwrap();
        let c = VoucherClaims::decode(&open(&der)).unwrap();

        assert_eq!(c.expires_on - c.created_on, Duration::days(365));
        assert!(c.assertion.is_none());
        assert!(!c.domain_cert_revocation_checks);
    }

    #[test]
    fn sign_key_mismatch() {
        let kp = KeyPair::from_pem(TEST_VENDOR_CERT.as_bytes(), TEST_PDC_KEY.as_bytes()).unwrap();

        let r = sign("123A", TEST_PDC_CERT, &kp);

        assert!(matches!(r, Err(SigningError::KeyMismatch(_))));
    }

    #[test]
    fn sign_malformed_pdc() {
        let kp = vendor_ca();

        let r = sign("123A", "-----BEGIN CERTIFICATE-----\nnope", &kp);
        assert!(matches!(r, Err(SigningError::Encoding(FormatError::Pem(_)))));

        let r = sign("123A", TEST_PDC_KEY, &kp);
        assert!(matches!(r, Err(SigningError::Encoding(FormatError::Pem(_)))));
    }

    #[test]
    fn sign_empty_serial() {
        let kp = vendor_ca();

        let r = sign("", TEST_PDC_CERT, &kp);

        assert!(matches!(r, Err(SigningError::Encoding(FormatError::Sema(_)))));
    }

    #[test]
    fn sign_with_ec_key() {
        let kp = testutil::ca("EC Vendor CA", testutil::ec_key());

        let der = sign("123A", TEST_PDC_CERT, &kp).unwrap();

        assert!(!der.is_empty());
    }

    #[test]
    fn sign_with_ed25519_key() {
        let kp = testutil::ca("Ed25519 Vendor CA", testutil::ed25519_key());

        let r = sign("123A", TEST_PDC_CERT, &kp);

        assert!(matches!(r, Err(SigningError::UnsupportedKey(_))));
    }

    #[test]
    fn sign_digest_is_sha256() {
        let rsa = vendor_ca();
        let ec = testutil::ca("EC Vendor CA", testutil::ec_key());

        for kp in [&rsa, &ec] {
            let der = sign("123A", TEST_PDC_CERT, kp).unwrap();

            // SignedData.digestAlgorithms and SignerInfo.digestAlgorithm
            assert!(occurrences(&der, OID_SHA256) >= 2, "{}", kp.subject());
            assert_eq!(occurrences(&der, OID_SHA1), 0, "{}", kp.subject());
        }
    }

    #[test]
    fn sign_validity_out_of_range() {
        let kp = vendor_ca();

        let r = Signer::new(&kp)
            .validity(Duration::days(100_000_000))
            .sign("123A", TEST_PDC_CERT);

        assert!(matches!(r, Err(SigningError::Encoding(FormatError::Sema(_)))));
    }
}
