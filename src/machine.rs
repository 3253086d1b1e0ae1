//! Machine identity for license binding.
//!
//! The license is bound to a stable, hardware-derived identifier. The
//! platform machine id is used where available; otherwise a fingerprint is
//! hashed from stable host components. The id is also cached on disk next
//! to the license (`MachineKey.json`) so the signing side can pick it up
//! when generating a license for this host.

use crate::error::LicenseResult;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::env;
use std::fs;
use std::path::Path;

/// File carrying the current machine identity, written on first run.
pub const MACHINE_KEY_FILE: &str = "MachineKey.json";

/// Source of the current machine's identity string.
pub trait MachineIdSource: Send + Sync {
    /// Returns a stable identifier for this machine.
    fn machine_id(&self) -> String;
}

/// The default source: platform machine id with a hashed-fingerprint
/// fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct HardwareId;

impl MachineIdSource for HardwareId {
    fn machine_id(&self) -> String {
        platform_machine_id().unwrap_or_else(fingerprint)
    }
}

/// A fixed identity, for tests and for hosts that manage their own ids.
#[derive(Debug, Clone)]
pub struct FixedMachineId(pub String);

impl MachineIdSource for FixedMachineId {
    fn machine_id(&self) -> String {
        self.0.clone()
    }
}

/// On-disk shape of [`MACHINE_KEY_FILE`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MachineKeyFile {
    #[serde(rename = "MachineId")]
    machine_id: String,
}

/// Writes [`MACHINE_KEY_FILE`] into `dir` when it does not exist yet.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be written.
pub(crate) fn ensure_machine_key_file(dir: &Path, machine_id: &str) -> LicenseResult<()> {
    let path = dir.join(MACHINE_KEY_FILE);
    if path.exists() {
        return Ok(());
    }
    let contents = serde_json::to_string(&MachineKeyFile {
        machine_id: machine_id.to_string(),
    })?;
    fs::write(&path, contents)?;
    Ok(())
}

/// Gets the platform machine id where the OS provides one.
fn platform_machine_id() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        fs::read_to_string("/etc/machine-id")
            .or_else(|_| fs::read_to_string("/var/lib/dbus/machine-id"))
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("ioreg")
            .args(["-rd1", "-c", "IOPlatformExpertDevice"])
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .and_then(|output| {
                output
                    .lines()
                    .find(|l| l.contains("IOPlatformUUID"))
                    .and_then(|l| l.split('"').nth(3))
                    .map(String::from)
            })
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

/// Hashes stable host components into a fingerprint id.
fn fingerprint() -> String {
    let mut components = vec![env::consts::OS.to_string(), env::consts::ARCH.to_string()];
    components.push(
        hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "unknown".to_string()),
    );
    if let Ok(user) = env::var("USER").or_else(|_| env::var("USERNAME")) {
        components.push(user);
    }

    let mut hasher = Sha256::new();
    hasher.update(components.join("|").as_bytes());
    let hash = hasher.finalize();
    BASE64.encode(&hash[..16])
}
