//! The raw decrypted license record.
//!
//! Field names match the JSON emitted by the license signing tool. Older
//! generations of the tool used different names for some fields (`machineId`
//! for `MachineKey`, `serialNumbers` for `EquipmentSerial`) and omitted
//! `AppName` entirely; [`RawLicense`] absorbs all of those shapes so the
//! normalizer can reconcile them.

use serde::{Deserialize, Serialize};

/// A JSON value that may be a single string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrList {
    /// A single scalar value.
    One(String),
    /// A list of values.
    Many(Vec<String>),
}

impl StringOrList {
    /// Returns the value as a list, cloning scalars into a one-element vec.
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Self::One(s) => vec![s.clone()],
            Self::Many(v) => v.clone(),
        }
    }

    /// Joins the raw value with commas, the form pattern checks run against.
    #[must_use]
    pub fn joined(&self) -> String {
        match self {
            Self::One(s) => s.clone(),
            Self::Many(v) => v.join(","),
        }
    }
}

/// The decrypted license record, field-for-field as signed by the vendor.
///
/// Everything is optional: legacy records omit whole fields and the
/// normalizer decides what absence means.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLicense {
    /// Licensed application name(s). Absent on legacy records.
    #[serde(rename = "AppName", skip_serializing_if = "Option::is_none")]
    pub app_name: Option<StringOrList>,

    /// Comma-delimited equipment serial numbers (current field name).
    #[serde(rename = "EquipmentSerial", skip_serializing_if = "Option::is_none")]
    pub equipment_serial: Option<String>,

    /// Comma-delimited equipment serial numbers (legacy field name).
    #[serde(rename = "serialNumbers", skip_serializing_if = "Option::is_none")]
    pub serial_numbers: Option<String>,

    /// Client identifier embedded at signing time.
    #[serde(rename = "ClientId", alias = "clientId", skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Machine identity the license is bound to.
    #[serde(rename = "MachineKey", skip_serializing_if = "Option::is_none")]
    pub machine_key: Option<String>,

    /// Legacy name for the bound machine identity.
    #[serde(rename = "machineId", skip_serializing_if = "Option::is_none")]
    pub machine_id: Option<String>,

    /// Expiration date, ISO formatted.
    #[serde(rename = "ExpirationDate", skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,

    /// Days of grace after expiration.
    #[serde(rename = "gracePeriod", skip_serializing_if = "Option::is_none")]
    pub grace_period: Option<i64>,

    /// Days of restricted operation after the grace period.
    #[serde(rename = "hardStop", skip_serializing_if = "Option::is_none")]
    pub hard_stop: Option<i64>,

    /// Build-compatibility tag the license was issued for.
    #[serde(rename = "CatVersion", skip_serializing_if = "Option::is_none")]
    pub cat_version: Option<String>,

    /// Viewer release the license was generated against.
    #[serde(rename = "CatViewerVersion", skip_serializing_if = "Option::is_none")]
    pub cat_viewer_version: Option<String>,

    /// Sync-service release the license was generated against.
    #[serde(rename = "CatSyncVersion", skip_serializing_if = "Option::is_none")]
    pub cat_sync_version: Option<String>,

    /// Licensed equipment descriptors, opaque to this crate.
    #[serde(rename = "items", default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<serde_json::Value>,

    // Descriptive metadata, passed through to the snapshot untouched.
    #[serde(rename = "HospitalName", skip_serializing_if = "Option::is_none")]
    pub hospital_name: Option<String>,
    #[serde(rename = "HospitalLogo", alias = "hospitalLogo", skip_serializing_if = "Option::is_none")]
    pub hospital_logo: Option<String>,
    #[serde(rename = "SyncSchedule", skip_serializing_if = "Option::is_none")]
    pub sync_schedule: Option<String>,
    #[serde(rename = "DefaultLanguage", skip_serializing_if = "Option::is_none")]
    pub default_language: Option<String>,
    #[serde(rename = "Country", skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(rename = "State", skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(rename = "Locality", skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    #[serde(rename = "Organization", skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(rename = "OrganizationalUnit", skip_serializing_if = "Option::is_none")]
    pub organizational_unit: Option<String>,
    #[serde(rename = "CommonName", skip_serializing_if = "Option::is_none")]
    pub common_name: Option<String>,
    #[serde(rename = "EmailAddress", skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(rename = "Password", skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(rename = "TimeZone", skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl RawLicense {
    /// A record without `AppName` predates the current format.
    #[must_use]
    pub fn is_legacy(&self) -> bool {
        self.app_name.is_none()
    }

    /// Which legacy product a format-less record was most likely issued
    /// for, used only to make the regeneration warning actionable.
    #[must_use]
    pub fn legacy_product_hint(&self) -> &'static str {
        if self.equipment_serial.is_none() {
            "catexport"
        } else {
            "catviewer"
        }
    }

    /// The serial-number field under either of its historical names.
    #[must_use]
    pub fn raw_serials(&self) -> Option<&str> {
        self.equipment_serial
            .as_deref()
            .or(self.serial_numbers.as_deref())
    }

    /// Whether the record is bound to the given machine identity, under
    /// either of the historical field names.
    #[must_use]
    pub fn machine_matches(&self, machine_id: &str) -> bool {
        self.machine_key.as_deref() == Some(machine_id)
            || self.machine_id.as_deref() == Some(machine_id)
    }
}
