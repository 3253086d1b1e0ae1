//! The license context: composition-root object owning the snapshot.
//!
//! [`LicenseContext`] wraps artifact discovery, the decrypt/normalize
//! pipeline, the machine-identity bootstrap, and the client resolver behind
//! an explicit load/reload lifecycle. Loading never fails: every pipeline
//! error is logged and collapsed into an invalid snapshot, so the host only
//! ever inspects `license_valid` and the expiration flags.
//!
//! Reload is not internally serialized; a host that can trigger concurrent
//! license updates must serialize them around the context.

use crate::error::{LicenseError, LicenseFault, LicenseResult};
use crate::expiration::ExpirationInfo;
use crate::info::LicenseInfo;
use crate::machine::{self, HardwareId, MachineIdSource};
use crate::resolver::{ClientId, ClientResolver, ClientStore};
use crate::verifier::LicenseVerifier;
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

/// Name of the license artifact.
pub const LICENSE_FILE: &str = "license.lic";

/// Recognized public-key file names, checked in priority order.
pub const PUBLIC_KEY_FILES: [&str; 2] = ["public.pem", "catpublickey.pem"];

/// Compatibility tag of the running build. Licenses carrying a tag must
/// carry this one.
pub const COMPAT_VERSION: &str = "62597d8fec95ff1d50fecac5";

/// Where and against what to validate the license.
#[derive(Debug, Clone)]
pub struct LicenseConfig {
    /// Directory holding the license artifacts.
    pub license_dir: PathBuf,
    /// Compatibility tag of the running build.
    pub compat_version: String,
}

impl LicenseConfig {
    /// Config for the given artifact directory with the build's own
    /// compatibility tag.
    #[must_use]
    pub fn new(license_dir: impl Into<PathBuf>) -> Self {
        Self {
            license_dir: license_dir.into(),
            compat_version: COMPAT_VERSION.to_string(),
        }
    }

    /// Overrides the compatibility tag. Used by tests and staging builds.
    #[must_use]
    pub fn with_compat_version(mut self, tag: impl Into<String>) -> Self {
        self.compat_version = tag.into();
        self
    }
}

/// The live license state for this process.
pub struct LicenseContext {
    config: LicenseConfig,
    machine_id: String,
    info: LicenseInfo,
    resolver: ClientResolver,
}

impl LicenseContext {
    /// Loads the license with the default hardware identity source.
    #[must_use]
    pub fn load(config: LicenseConfig) -> Self {
        Self::load_with(config, &HardwareId)
    }

    /// Loads the license with an explicit machine-identity source.
    #[must_use]
    pub fn load_with(config: LicenseConfig, source: &dyn MachineIdSource) -> Self {
        let machine_id = source.machine_id();
        let info = build_snapshot(&config, &machine_id, None);
        Self {
            config,
            machine_id,
            info,
            resolver: ClientResolver::new(),
        }
    }

    /// Re-runs the pipeline after an explicit license update, replacing the
    /// snapshot. The outgoing snapshot is captured first so the new record's
    /// client id is compared against what was actually live before.
    pub fn reload(&mut self) -> &LicenseInfo {
        let previous = self.info.clone();
        self.info = build_snapshot(&self.config, &self.machine_id, Some(&previous));
        &self.info
    }

    /// The current snapshot.
    #[must_use]
    pub fn info(&self) -> &LicenseInfo {
        &self.info
    }

    /// The current machine identity.
    #[must_use]
    pub fn machine_id(&self) -> &str {
        &self.machine_id
    }

    /// Whether the given serial number is licensed.
    #[must_use]
    pub fn is_valid_serial_number(&self, serial: &str) -> bool {
        self.info.is_valid_serial_number(serial)
    }

    /// Expiration flags as of the local calendar date.
    #[must_use]
    pub fn expiration(&self) -> ExpirationInfo {
        ExpirationInfo::compute(&self.info, Local::now().date_naive())
    }

    /// Lowers the license-updated flag once the host has reacted to it.
    pub fn clear_license_updated(&mut self) {
        self.info.is_license_updated = false;
    }

    /// Resolves the owning client record id, memoized per process.
    /// `Ok(None)` when the license has no client id or the store has no
    /// matching record yet.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn client_id(&self, store: &dyn ClientStore) -> LicenseResult<Option<ClientId>> {
        match self.info.client_id.as_deref() {
            Some(id) => self.resolver.resolve(store, id).await,
            None => Ok(None),
        }
    }

    /// Forcibly refreshes the memoized client id after re-confirming it
    /// against the store.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn update_client_id(
        &self,
        store: &dyn ClientStore,
    ) -> LicenseResult<Option<ClientId>> {
        match self.info.client_id.as_deref() {
            Some(id) => self.resolver.update(store, id).await,
            None => Ok(None),
        }
    }

    /// Drops the memoized client id; the next lookup hits the store.
    pub fn invalidate_client_id(&self) {
        self.resolver.invalidate();
    }
}

/// Runs the pipeline, collapsing any failure into an invalid snapshot.
fn build_snapshot(
    config: &LicenseConfig,
    machine_id: &str,
    previous: Option<&LicenseInfo>,
) -> LicenseInfo {
    match try_build(config, machine_id, previous) {
        Ok(info) => {
            debug!(valid = info.license_valid, "license snapshot rebuilt");
            info
        }
        Err(err) => {
            let fault = err.fault();
            match fault {
                LicenseFault::LegacyFormat => {
                    warn!(%machine_id, "license invalid: {err}");
                }
                _ => error!(%machine_id, "license invalid: {err}"),
            }
            LicenseInfo::invalid(machine_id, fault)
        }
    }
}

fn try_build(
    config: &LicenseConfig,
    machine_id: &str,
    previous: Option<&LicenseInfo>,
) -> LicenseResult<LicenseInfo> {
    machine::ensure_machine_key_file(&config.license_dir, machine_id)?;

    let license_path = find_file(&config.license_dir, &[LICENSE_FILE]).ok_or_else(|| {
        LicenseError::MissingArtifact(format!(
            "{LICENSE_FILE} not found in {}",
            config.license_dir.display()
        ))
    })?;
    let key_path = find_file(&config.license_dir, &PUBLIC_KEY_FILES).ok_or_else(|| {
        LicenseError::MissingArtifact(format!(
            "no public key found in {}",
            config.license_dir.display()
        ))
    })?;

    let pem = fs::read_to_string(&key_path)?;
    let payload = fs::read_to_string(&license_path)?;

    let verifier = LicenseVerifier::from_pem(&pem)?;
    let raw = verifier.parse(&payload)?;
    LicenseInfo::from_raw(&raw, &config.compat_version, machine_id, previous)
}

/// Returns the first existing candidate file under `dir`.
fn find_file(dir: &Path, candidates: &[&str]) -> Option<PathBuf> {
    candidates
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}
