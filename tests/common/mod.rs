//! Shared test helpers for license tests.

#![allow(dead_code)]

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use catviewer_license::{ClientId, ClientStore, LicenseResult};
use rsa::hazmat::rsa_decrypt;
use rsa::pkcs8::{EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPrivateKey};
use std::collections::HashMap;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Machine identity injected into every test context.
pub const TEST_MACHINE_ID: &str = "TEST-MACHINE-0001";

/// Compatibility tag of the "running build" in tests.
pub const TEST_COMPAT_VERSION: &str = "63aa00c1d2e3f4a5b6c7d8e9";

/// Returns the fixture signing key, generated once per test binary.
pub fn test_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| {
        let mut rng = rand::rngs::OsRng;
        RsaPrivateKey::new(&mut rng, 2048).expect("generate test key")
    })
}

/// A second key pair, for wrong-key scenarios.
pub fn other_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| {
        let mut rng = rand::rngs::OsRng;
        RsaPrivateKey::new(&mut rng, 2048).expect("generate test key")
    })
}

/// PEM of the public half of a key.
pub fn public_pem(key: &RsaPrivateKey) -> String {
    key.to_public_key()
        .to_public_key_pem(LineEnding::LF)
        .expect("encode public key pem")
}

/// Encrypts plaintext with the private key the way the license signing
/// tool does: PKCS#1 v1.5 type-01 blocks, concatenated, base64 encoded.
pub fn encrypt_private(key: &RsaPrivateKey, plaintext: &str) -> String {
    let block_size = key.size();
    let max_chunk = block_size - 11;
    let mut cipher = Vec::new();

    for chunk in plaintext.as_bytes().chunks(max_chunk) {
        let mut em = Vec::with_capacity(block_size);
        em.push(0x00);
        em.push(0x01);
        em.resize(block_size - chunk.len() - 1, 0xff);
        em.push(0x00);
        em.extend_from_slice(chunk);

        let m = BigUint::from_bytes_be(&em);
        let mut rng = rand::rngs::OsRng;
        let c = rsa_decrypt(Some(&mut rng), key, &m).expect("rsa private op");
        let bytes = c.to_bytes_be();
        cipher.resize(cipher.len() + block_size - bytes.len(), 0u8);
        cipher.extend_from_slice(&bytes);
    }

    BASE64.encode(cipher)
}

/// A current-format license record bound to [`TEST_MACHINE_ID`] and
/// [`TEST_COMPAT_VERSION`]. Tests mutate the value before encrypting.
pub fn base_license() -> serde_json::Value {
    serde_json::json!({
        "AppName": "CatViewer",
        "EquipmentSerial": "A1,A2,A3",
        "ClientId": "LC-0001",
        "MachineKey": TEST_MACHINE_ID,
        "ExpirationDate": "2099-01-01",
        "gracePeriod": 90,
        "hardStop": 90,
        "CatVersion": TEST_COMPAT_VERSION,
        "HospitalName": "General Hospital",
        "DefaultLanguage": "en",
        "TimeZone": "UTC"
    })
}

/// Encrypts a record with the fixture key.
pub fn encrypt_license(record: &serde_json::Value) -> String {
    encrypt_private(test_key(), &record.to_string())
}

/// In-memory client store counting its lookups.
#[derive(Debug, Default)]
pub struct FakeStore {
    records: HashMap<String, ClientId>,
    lookups: AtomicUsize,
}

impl FakeStore {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_record(license_client_id: &str, record_id: &str) -> Self {
        let mut records = HashMap::new();
        records.insert(license_client_id.to_string(), ClientId::new(record_id));
        Self {
            records,
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn insert(&mut self, license_client_id: &str, record_id: &str) {
        self.records
            .insert(license_client_id.to_string(), ClientId::new(record_id));
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClientStore for FakeStore {
    async fn find_by_license_client_id(
        &self,
        license_client_id: &str,
    ) -> LicenseResult<Option<ClientId>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.get(license_client_id).cloned())
    }
}
