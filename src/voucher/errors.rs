// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

/// Failure to encode or decode the voucher document.
#[derive(thiserror::Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("Syntax error: {0}")]
    Syntax(String),
    #[error("Semantic error: {0}")]
    Sema(String),
    #[error("Missing field: {0}")]
    MissingField(String),
    #[error("PEM error: {0}")]
    Pem(String),
}

impl std::fmt::Debug for FormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatError::Syntax(e)
            | FormatError::Sema(e)
            | FormatError::MissingField(e)
            | FormatError::Pem(e) => {
                write!(f, "{}", e)
            }
        }
    }
}

#[derive(thiserror::Error, PartialEq, Eq)]
pub enum SigningError {
    #[error("Private key does not match certificate: {0}")]
    KeyMismatch(String),
    #[error("Unsupported signing key: {0}")]
    UnsupportedKey(String),
    #[error("Encoding error: {0}")]
    Encoding(#[from] FormatError),
    #[error("Crypto error: {0}")]
    Crypto(String),
}

impl std::fmt::Debug for SigningError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SigningError::KeyMismatch(e)
            | SigningError::UnsupportedKey(e)
            | SigningError::Crypto(e) => {
                write!(f, "{}", e)
            }
            SigningError::Encoding(e) => write!(f, "{:?}", e),
        }
    }
}

#[derive(thiserror::Error, PartialEq, Eq)]
pub enum VerificationError {
    #[error("Ownership voucher is empty")]
    Empty,
    #[error("Malformed signed data: {0}")]
    Malformed(String),
    #[error("Invalid voucher schema: {0}")]
    SchemaInvalid(String),
    #[error("Invalid signature: {0}")]
    SignatureInvalid(String),
    #[error("Voucher expired: {0}")]
    Expired(String),
    #[error("Voucher not yet valid: {0}")]
    NotYetValid(String),
}

impl std::fmt::Debug for VerificationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationError::Empty => write!(f, "empty"),
            VerificationError::Malformed(e)
            | VerificationError::SchemaInvalid(e)
            | VerificationError::SignatureInvalid(e)
            | VerificationError::Expired(e)
            | VerificationError::NotYetValid(e) => {
                write!(f, "{}", e)
            }
        }
    }
}
