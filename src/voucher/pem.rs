// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use base64::{engine::general_purpose, Engine as _};

use super::errors::FormatError;

pub const CERT_HEADER: &str = "-----BEGIN CERTIFICATE-----";
pub const CERT_FOOTER: &str = "-----END CERTIFICATE-----";

/// Removes the PEM framing from a single certificate so that it can be
/// carried in the `pinned-domain-cert` leaf of a voucher.
///
/// The input must start with the header line and end with the footer line
/// (optionally followed by a single newline).  What is left in between must
/// be non-empty, newline separated base64 text.  Anything else is rejected
/// rather than passed through, so that malformed material never ends up in a
/// signed voucher.
pub fn strip_pem_headers(pem: &str) -> Result<String, FormatError> {
    let body = pem
        .strip_prefix(CERT_HEADER)
        .and_then(|s| s.strip_prefix('\n'))
        .ok_or_else(|| FormatError::Pem(format!("expecting \"{CERT_HEADER}\" header line")))?;

    let body = body.strip_suffix('\n').unwrap_or(body);

    let body = body
        .strip_suffix(CERT_FOOTER)
        .and_then(|s| s.strip_suffix('\n'))
        .ok_or_else(|| FormatError::Pem(format!("expecting \"{CERT_FOOTER}\" footer line")))?;

    validate_body(body)?;

    Ok(body.to_string())
}

/// Inverse of [`strip_pem_headers`]: re-frames a certificate body using LF
/// line endings.
pub fn add_pem_headers(body: &str) -> String {
    format!("{CERT_HEADER}\n{body}\n{CERT_FOOTER}\n")
}

/// Decodes a (stripped) certificate body into DER
pub fn decode_body(body: &str) -> Result<Vec<u8>, FormatError> {
    validate_body(body)?;

    let joined: String = body.lines().collect();

    general_purpose::STANDARD
        .decode(joined)
        .map_err(|e| FormatError::Pem(e.to_string()))
}

fn validate_body(body: &str) -> Result<(), FormatError> {
    if body.is_empty() {
        return Err(FormatError::Pem("empty certificate body".to_string()));
    }

    for (i, line) in body.split('\n').enumerate() {
        if line.is_empty() {
            return Err(FormatError::Pem(format!("empty line {i} in certificate body")));
        }

        if let Some(c) = line
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '=')))
        {
            return Err(FormatError::Pem(format!(
                "unexpected character {c:?} at line {i} of certificate body"
            )));
        }
    }

    Ok(())
}
