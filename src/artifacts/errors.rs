// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

#[derive(thiserror::Error, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("Syntax error: {0}")]
    Syntax(String),
    #[error("Invalid TLS identity: {0}")]
    TlsIdentityInvalid(String),
    #[error("Empty trust pool: {0}")]
    TrustPoolEmpty(String),
    #[error("Crypto error: {0}")]
    Crypto(String),
}

impl std::fmt::Debug for AssemblyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssemblyError::Syntax(e)
            | AssemblyError::TlsIdentityInvalid(e)
            | AssemblyError::TrustPoolEmpty(e)
            | AssemblyError::Crypto(e) => {
                write!(f, "{}", e)
            }
        }
    }
}

#[derive(thiserror::Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(String),
    #[error("No ownership vouchers found: {0}")]
    NoVouchers(String),
    #[error("Duplicated ownership voucher: {0}")]
    DuplicatedVoucher(String),
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
}

impl std::fmt::Debug for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Io(e) | LoadError::NoVouchers(e) | LoadError::DuplicatedVoucher(e) => {
                write!(f, "{}", e)
            }
            LoadError::Assembly(e) => write!(f, "{:?}", e),
        }
    }
}
