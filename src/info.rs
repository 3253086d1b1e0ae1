//! The canonical license snapshot and the normalization that builds it.
//!
//! [`LicenseInfo`] is the single in-memory representation the rest of the
//! host application consumes. It is built once from a decrypted
//! [`RawLicense`] and only ever replaced wholesale; it is never half
//! populated. Records the normalizer cannot reconcile come back as errors,
//! which the loading path collapses into an invalid snapshot.

use crate::error::{LicenseError, LicenseFault, LicenseResult};
use crate::record::RawLicense;
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Days of grace after expiration when the license does not say.
pub const DEFAULT_GRACE_DAYS: i64 = 90;

/// Days of restricted operation after grace when the license does not say.
pub const DEFAULT_HARD_STOP_DAYS: i64 = 90;

/// The canonical, fully-normalized license snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicenseInfo {
    /// Whether the license is usable on this machine and build.
    pub license_valid: bool,
    /// The current machine's identity, populated even on invalid snapshots.
    pub machine_key: String,
    /// Licensed application names, always lowercase, always a list.
    pub app_name: Vec<String>,
    /// Licensed equipment serial numbers, split from the wire string.
    pub equipment_serial: Vec<String>,
    /// Client identifier embedded in the license.
    pub client_id: Option<String>,
    /// Days of grace after expiration.
    pub grace_period: i64,
    /// Days of restricted operation after the grace period.
    pub hard_stop: i64,
    /// Expiration date, date-only.
    pub expiration_date: Option<NaiveDate>,
    /// Whether the license targets the edge product line.
    pub is_cat_edge: bool,
    /// Set when this snapshot came from an explicit license update.
    pub is_license_updated: bool,
    /// On update, whether the new record kept the previous client id.
    pub is_same_client_id: bool,
    /// Viewer release the license was generated against.
    pub viewer_version: String,
    /// Sync-service release the license was generated against.
    pub sync_version: String,
    /// Licensed equipment descriptors, opaque to this crate.
    pub equipment: Vec<serde_json::Value>,
    /// Why the snapshot is invalid, when it is.
    pub fault: Option<LicenseFault>,

    // Descriptive metadata, passed through from the record.
    pub hospital_name: Option<String>,
    pub hospital_logo: Option<String>,
    pub sync_schedule: Option<String>,
    pub default_language: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub locality: Option<String>,
    pub organization: Option<String>,
    pub organizational_unit: Option<String>,
    pub common_name: Option<String>,
    pub email_address: Option<String>,
    pub super_admin_password: Option<String>,
    pub time_zone: Option<String>,
}

impl LicenseInfo {
    /// The fallback snapshot: invalid, carrying only the machine identity
    /// and the fault that produced it.
    #[must_use]
    pub fn invalid(machine_id: &str, fault: LicenseFault) -> Self {
        Self {
            license_valid: false,
            machine_key: machine_id.to_string(),
            app_name: Vec::new(),
            equipment_serial: Vec::new(),
            client_id: None,
            grace_period: DEFAULT_GRACE_DAYS,
            hard_stop: DEFAULT_HARD_STOP_DAYS,
            expiration_date: None,
            is_cat_edge: false,
            is_license_updated: false,
            is_same_client_id: true,
            viewer_version: "0.0.0".to_string(),
            sync_version: "0.0.0".to_string(),
            equipment: Vec::new(),
            fault: Some(fault),
            hospital_name: None,
            hospital_logo: None,
            sync_schedule: None,
            default_language: None,
            country: None,
            state: None,
            locality: None,
            organization: None,
            organizational_unit: None,
            common_name: None,
            email_address: None,
            super_admin_password: None,
            time_zone: None,
        }
    }

    /// Normalizes a decrypted record into the canonical snapshot.
    ///
    /// `previous` is the snapshot that was live before a license update
    /// began; passing it marks the result as an update and drives the
    /// `is_same_client_id` comparison. It must be captured *before* the
    /// new record is processed.
    ///
    /// # Errors
    ///
    /// - [`LicenseError::LegacyFormat`] for records without `AppName`
    /// - [`LicenseError::InvalidPayload`] for records missing serials or
    ///   the expiration date, or carrying an unparseable date
    pub fn from_raw(
        raw: &RawLicense,
        compat_version: &str,
        machine_id: &str,
        previous: Option<&LicenseInfo>,
    ) -> LicenseResult<Self> {
        let Some(raw_app_name) = raw.app_name.as_ref() else {
            warn!(
                product = raw.legacy_product_hint(),
                "license file uses a retired format, request a regenerated license"
            );
            return Err(LicenseError::LegacyFormat);
        };

        let serials = raw.raw_serials().ok_or_else(|| {
            LicenseError::InvalidPayload("record has no equipment serial field".to_string())
        })?;
        let equipment_serial: Vec<String> = serials.split(',').map(str::to_owned).collect();
        let app_name: Vec<String> = raw_app_name
            .to_vec()
            .iter()
            .map(|n| n.to_lowercase())
            .collect();
        let is_cat_edge = raw_app_name.joined().to_lowercase().contains("catedge");

        let expiration = raw.expiration_date.as_deref().ok_or_else(|| {
            LicenseError::InvalidPayload("record has no expiration date".to_string())
        })?;
        let expiration_date = parse_date(expiration).ok_or_else(|| {
            LicenseError::InvalidPayload(format!("unparseable expiration date {expiration:?}"))
        })?;

        let client_id = raw.client_id.clone();
        let is_same_client_id = match previous {
            Some(prev) => prev.client_id == client_id,
            None => true,
        };

        let compatible = version_compatible(raw, compat_version, machine_id);
        let machine_ok = raw.machine_matches(machine_id);

        Ok(Self {
            license_valid: compatible && machine_ok,
            machine_key: machine_id.to_string(),
            app_name,
            equipment_serial,
            client_id,
            grace_period: raw.grace_period.unwrap_or(DEFAULT_GRACE_DAYS),
            hard_stop: raw.hard_stop.unwrap_or(DEFAULT_HARD_STOP_DAYS),
            expiration_date: Some(expiration_date),
            is_cat_edge,
            is_license_updated: previous.is_some(),
            is_same_client_id,
            viewer_version: raw
                .cat_viewer_version
                .clone()
                .unwrap_or_else(|| "0.0.0".to_string()),
            sync_version: raw
                .cat_sync_version
                .clone()
                .unwrap_or_else(|| "0.0.0".to_string()),
            equipment: raw.items.clone(),
            fault: None,
            hospital_name: raw.hospital_name.clone(),
            hospital_logo: raw.hospital_logo.clone(),
            sync_schedule: raw.sync_schedule.clone(),
            default_language: raw.default_language.clone(),
            country: raw.country.clone(),
            state: raw.state.clone(),
            locality: raw.locality.clone(),
            organization: raw.organization.clone(),
            organizational_unit: raw.organizational_unit.clone(),
            common_name: raw.common_name.clone(),
            email_address: raw.email_address.clone(),
            super_admin_password: raw.password.clone(),
            time_zone: raw.time_zone.clone(),
        })
    }

    /// Whether the given serial number is licensed.
    #[must_use]
    pub fn is_valid_serial_number(&self, serial: &str) -> bool {
        self.equipment_serial.iter().any(|s| s == serial)
    }
}

/// Whether the record was issued for a compatible build and machine.
///
/// A record carrying a compatibility tag must match the running build's
/// tag exactly; a record without one predates version tagging and is
/// exempt from the version axis. Either way the bound machine identity
/// must equal the current one.
#[must_use]
pub fn version_compatible(raw: &RawLicense, compat_version: &str, machine_id: &str) -> bool {
    if raw.machine_key.as_deref() != Some(machine_id) {
        return false;
    }
    match raw.cat_version.as_deref() {
        Some(tag) => tag == compat_version,
        None => true,
    }
}

/// Parses an expiration date, tolerating plain dates and full timestamps.
fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}
