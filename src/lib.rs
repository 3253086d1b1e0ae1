//! Offline license validation for CAT Viewer.
//!
//! This crate handles:
//! - License payload decryption with the product public key
//! - Normalization of legacy and current license record shapes
//! - Machine binding and build-compatibility checks
//! - A date-based expiration state machine (active / grace / hard stop / expired)
//! - Resolution of the license's owning client record in the host store
//!
//! # Design Principles
//!
//! - **Offline-first**: validation never touches the network; the only I/O
//!   is reading the license artifacts and the optional client-store lookup
//! - **Never panics on bad input**: every malformed, tampered, or missing
//!   artifact collapses into a well-formed invalid [`LicenseInfo`] snapshot,
//!   so callers only ever inspect `license_valid` and the expiration flags
//! - **Machine binding**: the license is tied to a hardware-derived id
//!
//! # License Artifact Format
//!
//! The license file holds a base64 payload encrypted block-by-block with the
//! vendor's RSA *private* key; recovering it with the paired public key both
//! decrypts and authenticates it. The plaintext is a JSON record.

mod context;
mod error;
mod expiration;
mod info;
mod machine;
mod record;
mod resolver;
mod verifier;

pub use context::{COMPAT_VERSION, LICENSE_FILE, LicenseConfig, LicenseContext, PUBLIC_KEY_FILES};
pub use error::{LicenseError, LicenseFault, LicenseResult};
pub use expiration::{ExpirationInfo, ExpirationState};
pub use info::{DEFAULT_GRACE_DAYS, DEFAULT_HARD_STOP_DAYS, LicenseInfo};
pub use machine::{FixedMachineId, HardwareId, MACHINE_KEY_FILE, MachineIdSource};
pub use record::{RawLicense, StringOrList};
pub use resolver::{ClientId, ClientResolver, ClientStore};
pub use verifier::LicenseVerifier;
