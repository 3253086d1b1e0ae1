mod common;

use catviewer_license::{
    DEFAULT_GRACE_DAYS, DEFAULT_HARD_STOP_DAYS, LicenseError, LicenseInfo, RawLicense,
};
use chrono::NaiveDate;
use common::{TEST_COMPAT_VERSION, TEST_MACHINE_ID, base_license};

fn raw(value: serde_json::Value) -> RawLicense {
    serde_json::from_value(value).unwrap()
}

fn normalize(value: serde_json::Value) -> Result<LicenseInfo, LicenseError> {
    LicenseInfo::from_raw(&raw(value), TEST_COMPAT_VERSION, TEST_MACHINE_ID, None)
}

// ── Normalization ────────────────────────────────────────────────

#[test]
fn serials_split_on_comma() {
    let info = normalize(base_license()).unwrap();
    assert_eq!(info.equipment_serial, vec!["A1", "A2", "A3"]);
}

#[test]
fn legacy_serial_field_name_is_normalized() {
    let mut record = base_license();
    let serials = record.as_object_mut().unwrap().remove("EquipmentSerial");
    record["serialNumbers"] = serials.unwrap();
    let info = normalize(record).unwrap();
    assert_eq!(info.equipment_serial, vec!["A1", "A2", "A3"]);
}

#[test]
fn scalar_app_name_becomes_lowercase_list() {
    let info = normalize(base_license()).unwrap();
    assert_eq!(info.app_name, vec!["catviewer"]);
}

#[test]
fn list_app_name_is_lowercased() {
    let mut record = base_license();
    record["AppName"] = serde_json::json!(["CatViewer", "CatSync"]);
    let info = normalize(record).unwrap();
    assert_eq!(info.app_name, vec!["catviewer", "catsync"]);
}

#[test]
fn grace_and_hard_stop_default_to_ninety() {
    let mut record = base_license();
    record.as_object_mut().unwrap().remove("gracePeriod");
    record.as_object_mut().unwrap().remove("hardStop");
    let info = normalize(record).unwrap();
    assert_eq!(info.grace_period, DEFAULT_GRACE_DAYS);
    assert_eq!(info.hard_stop, DEFAULT_HARD_STOP_DAYS);
    assert_eq!(DEFAULT_GRACE_DAYS, 90);
    assert_eq!(DEFAULT_HARD_STOP_DAYS, 90);
}

#[test]
fn explicit_grace_and_hard_stop_are_kept() {
    let mut record = base_license();
    record["gracePeriod"] = serde_json::json!(10);
    record["hardStop"] = serde_json::json!(20);
    let info = normalize(record).unwrap();
    assert_eq!(info.grace_period, 10);
    assert_eq!(info.hard_stop, 20);
}

#[test]
fn expiration_date_is_parsed() {
    let info = normalize(base_license()).unwrap();
    assert_eq!(info.expiration_date, NaiveDate::from_ymd_opt(2099, 1, 1));
}

#[test]
fn rfc3339_expiration_date_is_accepted() {
    let mut record = base_license();
    record["ExpirationDate"] = serde_json::json!("2031-05-04T00:00:00Z");
    let info = normalize(record).unwrap();
    assert_eq!(info.expiration_date, NaiveDate::from_ymd_opt(2031, 5, 4));
}

#[test]
fn unparseable_expiration_date_is_rejected() {
    let mut record = base_license();
    record["ExpirationDate"] = serde_json::json!("next tuesday");
    assert!(matches!(
        normalize(record),
        Err(LicenseError::InvalidPayload(_))
    ));
}

#[test]
fn missing_serials_in_modern_record_is_rejected() {
    let mut record = base_license();
    record.as_object_mut().unwrap().remove("EquipmentSerial");
    assert!(matches!(
        normalize(record),
        Err(LicenseError::InvalidPayload(_))
    ));
}

#[test]
fn metadata_passes_through() {
    let info = normalize(base_license()).unwrap();
    assert_eq!(info.hospital_name.as_deref(), Some("General Hospital"));
    assert_eq!(info.default_language.as_deref(), Some("en"));
    assert_eq!(info.time_zone.as_deref(), Some("UTC"));
    assert_eq!(info.viewer_version, "0.0.0");
    assert_eq!(info.sync_version, "0.0.0");
}

// ── Legacy records ───────────────────────────────────────────────

#[test]
fn legacy_record_is_rejected_regardless_of_other_fields() {
    let mut record = base_license();
    record.as_object_mut().unwrap().remove("AppName");
    assert!(matches!(normalize(record), Err(LicenseError::LegacyFormat)));
}

#[test]
fn legacy_record_without_serials_is_also_rejected() {
    let mut record = base_license();
    record.as_object_mut().unwrap().remove("AppName");
    record.as_object_mut().unwrap().remove("EquipmentSerial");
    assert!(matches!(normalize(record), Err(LicenseError::LegacyFormat)));
}

// ── Edge-product detection ───────────────────────────────────────

#[test]
fn edge_product_is_detected_case_insensitively() {
    let mut record = base_license();
    record["AppName"] = serde_json::json!("CatEdge");
    assert!(normalize(record).unwrap().is_cat_edge);
}

#[test]
fn edge_product_is_detected_inside_a_list() {
    let mut record = base_license();
    record["AppName"] = serde_json::json!(["CatViewer", "CATEDGE"]);
    assert!(normalize(record).unwrap().is_cat_edge);
}

#[test]
fn non_edge_product_is_not_flagged() {
    assert!(!normalize(base_license()).unwrap().is_cat_edge);
}

// ── Validity: compatibility and machine binding ──────────────────

#[test]
fn matching_version_and_machine_is_valid() {
    let info = normalize(base_license()).unwrap();
    assert!(info.license_valid);
    assert!(info.fault.is_none());
}

#[test]
fn version_mismatch_is_invalid_even_with_matching_machine() {
    let mut record = base_license();
    record["CatVersion"] = serde_json::json!("different-build-tag");
    let info = normalize(record).unwrap();
    assert!(!info.license_valid);
}

#[test]
fn machine_mismatch_is_invalid() {
    let mut record = base_license();
    record["MachineKey"] = serde_json::json!("SOMEONE-ELSES-MACHINE");
    let info = normalize(record).unwrap();
    assert!(!info.license_valid);
    assert_eq!(info.machine_key, TEST_MACHINE_ID);
}

#[test]
fn missing_version_tag_is_exempt_from_version_matching() {
    let mut record = base_license();
    record.as_object_mut().unwrap().remove("CatVersion");
    let info = normalize(record).unwrap();
    assert!(info.license_valid);
}

#[test]
fn missing_version_tag_still_requires_machine_match() {
    let mut record = base_license();
    record.as_object_mut().unwrap().remove("CatVersion");
    record["MachineKey"] = serde_json::json!("SOMEONE-ELSES-MACHINE");
    let info = normalize(record).unwrap();
    assert!(!info.license_valid);
}

// ── Update flow ──────────────────────────────────────────────────

#[test]
fn first_load_is_not_marked_updated() {
    let info = normalize(base_license()).unwrap();
    assert!(!info.is_license_updated);
    assert!(info.is_same_client_id);
}

#[test]
fn update_with_same_client_id() {
    let previous = normalize(base_license()).unwrap();
    let info = LicenseInfo::from_raw(
        &raw(base_license()),
        TEST_COMPAT_VERSION,
        TEST_MACHINE_ID,
        Some(&previous),
    )
    .unwrap();
    assert!(info.is_license_updated);
    assert!(info.is_same_client_id);
}

#[test]
fn update_with_changed_client_id_is_flagged() {
    let previous = normalize(base_license()).unwrap();
    let mut record = base_license();
    record["ClientId"] = serde_json::json!("LC-9999");
    let info = LicenseInfo::from_raw(
        &raw(record),
        TEST_COMPAT_VERSION,
        TEST_MACHINE_ID,
        Some(&previous),
    )
    .unwrap();
    assert!(info.is_license_updated);
    assert!(!info.is_same_client_id);
}

// ── Fallback snapshot ────────────────────────────────────────────

#[test]
fn invalid_snapshot_carries_machine_identity_and_fault() {
    use catviewer_license::LicenseFault;
    let info = LicenseInfo::invalid(TEST_MACHINE_ID, LicenseFault::DecryptionFailure);
    assert!(!info.license_valid);
    assert_eq!(info.machine_key, TEST_MACHINE_ID);
    assert_eq!(info.fault, Some(LicenseFault::DecryptionFailure));
    assert!(info.app_name.is_empty());
    assert!(info.equipment_serial.is_empty());
}

// ── Serial lookup ────────────────────────────────────────────────

#[test]
fn serial_number_lookup() {
    let info = normalize(base_license()).unwrap();
    assert!(info.is_valid_serial_number("A2"));
    assert!(!info.is_valid_serial_number("Z9"));
}
