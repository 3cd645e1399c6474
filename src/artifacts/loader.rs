// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::assembler::SecurityArtifacts;
use super::errors::LoadError;
use super::keypair::KeyPair;
use log::{debug, info};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Key pair presented on TLS connections (owner certificate)
pub const SERVER_KEYPAIR: &str = "oc";
/// Pinned domain certificate key pair
pub const DOMAIN_KEYPAIR: &str = "pdc";
pub const VENDOR_CA_KEYPAIR: &str = "vendorca";
pub const VOUCHER_PREFIX: &str = "ov_";

/// A directory holding the bootstrap server's security artifacts:
///
/// * `{name}_pub.pem` / `{name}_priv.pem` for each key pair
/// * `ov_{id}[.ext...]` for each signed voucher, keyed by `{id}` (everything
///   up to the first `.`)
#[derive(Debug, Clone)]
pub struct ArtifactDir {
    root: PathBuf,
}

impl ArtifactDir {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read(&self, file: &str) -> Result<Vec<u8>, LoadError> {
        let p = self.root.join(file);

        fs::read(&p).map_err(|e| LoadError::Io(format!("reading {}: {e}", p.display())))
    }

    /// Read the `{name}_pub.pem` / `{name}_priv.pem` pair
    pub fn read_keypair(&self, name: &str) -> Result<KeyPair, LoadError> {
        let cert = self.read(&format!("{name}_pub.pem"))?;
        let key = self.read(&format!("{name}_priv.pem"))?;

        let kp = KeyPair::from_pem(&cert, &key)?;

        debug!("loaded {name} key pair: {}", kp.subject());

        Ok(kp)
    }

    /// Collect every `ov_*` file in the directory
    pub fn read_vouchers(&self) -> Result<BTreeMap<String, Vec<u8>>, LoadError> {
        let entries = fs::read_dir(&self.root)
            .map_err(|e| LoadError::Io(format!("listing {}: {e}", self.root.display())))?;

        let mut ovs = BTreeMap::new();

        for entry in entries {
            let entry = entry.map_err(|e| LoadError::Io(e.to_string()))?;

            let is_file = entry
                .file_type()
                .map_err(|e| LoadError::Io(e.to_string()))?
                .is_file();
            if !is_file {
                continue;
            }

            let path = entry.path();
            let id = match voucher_id(&path) {
                Some(id) => id,
                None => continue,
            };

            let buf = fs::read(&path)
                .map_err(|e| LoadError::Io(format!("reading {}: {e}", path.display())))?;

            if ovs.insert(id.clone(), buf).is_some() {
                return Err(LoadError::DuplicatedVoucher(format!(
                    "{id} in {}",
                    self.root.display()
                )));
            }

            debug!("loaded voucher {id} from {}", path.display());
        }

        if ovs.is_empty() {
            return Err(LoadError::NoVouchers(self.root.display().to_string()));
        }

        Ok(ovs)
    }

    /// Load all the artifacts and assemble them
    pub fn load(&self) -> Result<SecurityArtifacts, LoadError> {
        info!(
            "loading security artifacts (OC, PDC, VendorCA, OVs) from {}",
            self.root.display()
        );

        let server = self.read_keypair(SERVER_KEYPAIR)?;
        let domain = self.read_keypair(DOMAIN_KEYPAIR)?;
        let vendor_ca = self.read_keypair(VENDOR_CA_KEYPAIR)?;
        let vouchers = self.read_vouchers()?;

        Ok(SecurityArtifacts::assemble(
            server, domain, vendor_ca, vouchers,
        )?)
    }
}

// ov_123A.der -> 123A, ov_123A.der.b64 -> 123A
fn voucher_id(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let rest = name.strip_prefix(VOUCHER_PREFIX)?;

    let id = match rest.split_once('.') {
        Some((id, _)) => id,
        None => rest,
    };

    if id.is_empty() {
        return None;
    }

    Some(id.to_string())
}
