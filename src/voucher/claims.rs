// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::{FormatError, VerificationError};
use super::pem;
use chrono::{DateTime, Duration, Utc};
use openssl::x509::X509;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level container of an RFC 8366 voucher
pub const VOUCHER_KEY: &str = "ietf-voucher:voucher";

/// Default lifetime of a freshly minted voucher
pub const VOUCHER_VALIDITY_DAYS: i64 = 365;

const CREATED_ON: &str = "created-on";
const EXPIRES_ON: &str = "expires-on";
const SERIAL_NUMBER: &str = "serial-number";
const PINNED_DOMAIN_CERT: &str = "pinned-domain-cert";

const REQUIRED_FIELDS: [&str; 4] = [CREATED_ON, EXPIRES_ON, SERIAL_NUMBER, PINNED_DOMAIN_CERT];

/// The basis on which the MASA asserted ownership of the device
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Assertion {
    Verified,
    Logged,
    Proximity,
}

impl Assertion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Assertion::Verified => "verified",
            Assertion::Logged => "logged",
            Assertion::Proximity => "proximity",
        }
    }
}

impl std::fmt::Display for Assertion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Assertion {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "verified" => Ok(Assertion::Verified),
            "logged" => Ok(Assertion::Logged),
            "proximity" => Ok(Assertion::Proximity),
            x => Err(FormatError::Sema(format!("unknown assertion {x:?}"))),
        }
    }
}

/// The claims-set of an ownership voucher.  See
/// <https://www.rfc-editor.org/rfc/rfc8366.html>.
///
/// Field order is the order of the keys on the wire and must not change:
/// the encoding is what gets signed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherClaims {
    #[serde(rename = "created-on", with = "timestamp")]
    pub created_on: DateTime<Utc>,

    #[serde(rename = "expires-on", with = "timestamp")]
    pub expires_on: DateTime<Utc>,

    #[serde(rename = "serial-number")]
    pub serial_number: String,

    /// encoded as the empty string when unset
    #[serde(default, with = "assertion_text")]
    pub assertion: Option<Assertion>,

    /// PEM body of the owner certificate, framing removed
    #[serde(rename = "pinned-domain-cert")]
    pub pinned_domain_cert: String,

    #[serde(rename = "domain-cert-revocation-checks", default)]
    pub domain_cert_revocation_checks: bool,
}

/// An ownership voucher document: the claims-set wrapped in its RFC 8366
/// container
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipVoucher {
    #[serde(rename = "ietf-voucher:voucher")]
    pub voucher: VoucherClaims,
}

#[derive(Serialize)]
struct OwnershipVoucherRef<'a> {
    #[serde(rename = "ietf-voucher:voucher")]
    voucher: &'a VoucherClaims,
}

impl VoucherClaims {
    /// Build a new claims-set for the device identified by `serial_number`,
    /// pinning the owner certificate `pdc_pem`.  The voucher is valid from
    /// `created_on` for `validity`.
    pub fn new(
        serial_number: &str,
        pdc_pem: &str,
        created_on: DateTime<Utc>,
        validity: Duration,
    ) -> Result<Self, FormatError> {
        let expires_on = created_on
            .checked_add_signed(validity)
            .ok_or_else(|| FormatError::Sema(format!("validity window {validity} out of range")))?;

        let c = Self {
            created_on,
            expires_on,
            serial_number: serial_number.to_string(),
            assertion: None,
            pinned_domain_cert: pem::strip_pem_headers(pdc_pem)?,
            domain_cert_revocation_checks: false,
        };

        c.validate()?;

        Ok(c)
    }

    fn validate(&self) -> Result<(), FormatError> {
        if self.serial_number.is_empty() {
            return Err(FormatError::Sema("empty serial-number".to_string()));
        }

        if self.expires_on < self.created_on {
            return Err(FormatError::Sema(format!(
                "expires-on {} precedes created-on {}",
                self.expires_on, self.created_on
            )));
        }

        pem::decode_body(&self.pinned_domain_cert)?;

        Ok(())
    }

    /// Encode the claims-set into its canonical (signed) representation
    pub fn encode(&self) -> Result<Vec<u8>, FormatError> {
        self.validate()?;

        serde_json::to_vec(&OwnershipVoucherRef { voucher: self })
            .map_err(|e| FormatError::Syntax(e.to_string()))
    }

    /// Decode a voucher document and return its claims-set
    pub fn decode(buf: &[u8]) -> Result<VoucherClaims, FormatError> {
        let v: Value = serde_json::from_slice(buf).map_err(|e| FormatError::Syntax(e.to_string()))?;

        let inner = v
            .get(VOUCHER_KEY)
            .ok_or_else(|| FormatError::MissingField(VOUCHER_KEY.to_string()))?;

        if !inner.is_object() {
            return Err(FormatError::Syntax(format!("{VOUCHER_KEY} MUST be object")));
        }

        for k in REQUIRED_FIELDS {
            if inner.get(k).is_none() {
                return Err(FormatError::MissingField(k.to_string()));
            }
        }

        let c = VoucherClaims::deserialize(inner).map_err(|e| FormatError::Syntax(e.to_string()))?;

        c.validate()?;

        Ok(c)
    }

    /// The pinned domain certificate with its PEM framing restored
    pub fn pinned_domain_cert_pem(&self) -> String {
        pem::add_pem_headers(&self.pinned_domain_cert)
    }

    pub fn pinned_domain_cert_x509(&self) -> Result<X509, FormatError> {
        let der = pem::decode_body(&self.pinned_domain_cert)?;

        X509::from_der(&der).map_err(|e| FormatError::Pem(e.to_string()))
    }

    pub fn validity(&self) -> Duration {
        self.expires_on - self.created_on
    }

    /// Check that the voucher is within its validity window at time `at`.
    /// `expires-on` is exclusive.
    pub fn check_validity(&self, at: DateTime<Utc>) -> Result<(), VerificationError> {
        if at < self.created_on {
            return Err(VerificationError::NotYetValid(format!(
                "voucher for {} is valid from {}, checked at {at}",
                self.serial_number, self.created_on
            )));
        }

        if at >= self.expires_on {
            return Err(VerificationError::Expired(format!(
                "voucher for {} expired on {}, checked at {at}",
                self.serial_number, self.expires_on
            )));
        }

        Ok(())
    }
}

mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(t: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        DateTime::parse_from_rfc3339(&s)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| de::Error::custom(format!("bad date-and-time {s:?}: {e}")))
    }
}

mod assertion_text {
    use super::Assertion;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(a: &Option<Assertion>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(a.as_ref().map_or("", Assertion::as_str))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Assertion>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        if s.is_empty() {
            return Ok(None);
        }

        s.parse().map(Some).map_err(de::Error::custom)
    }
}
