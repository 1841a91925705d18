//! Shared test doubles and manifest builders.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use threat_db::error::{Result, StoreErrorKind, ThreatDbError};
use threat_db::store::{GraphQlRequest, GraphQlResponse, StoreSession};

pub const CONFLICT: &str =
    "couldn't commit transaction: Transaction has been aborted. Please retry";

// ============================================================================
// Scripted session
// ============================================================================

/// Replays canned responses in order and records every request.
pub struct ScriptedSession {
    responses: Mutex<VecDeque<Result<GraphQlResponse>>>,
    sent: Mutex<Vec<GraphQlRequest>>,
}

impl ScriptedSession {
    pub fn new(responses: Vec<Result<GraphQlResponse>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn sent(&self) -> Vec<GraphQlRequest> {
        self.sent.lock().unwrap().clone()
    }
}

impl StoreSession for ScriptedSession {
    fn submit(&self, request: &GraphQlRequest) -> Result<GraphQlResponse> {
        self.sent.lock().unwrap().push(request.clone());
        self.responses.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(ThreatDbError::store(
                "scripted",
                StoreErrorKind::Connection("script exhausted".to_string()),
            ))
        })
    }

    fn is_alive(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Emulates the store's uniqueness rules on `Bom.serialNumber` and
/// `Component.purl`, answering with the store's own error messages.
#[derive(Default)]
pub struct MemoryStore {
    serials: Mutex<HashSet<String>>,
    purls: Mutex<HashSet<String>>,
    conflicts: AtomicU32,
    mutations: AtomicU32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the next `n` mutations with a transaction conflict.
    pub fn with_conflicts(self, n: u32) -> Self {
        self.conflicts.store(n, Ordering::SeqCst);
        self
    }

    pub fn bom_count(&self) -> usize {
        self.serials.lock().unwrap().len()
    }

    pub fn component_count(&self) -> usize {
        self.purls.lock().unwrap().len()
    }

    pub fn contains(&self, serial_number: &str) -> bool {
        self.serials.lock().unwrap().contains(serial_number)
    }

    pub fn mutations(&self) -> u32 {
        self.mutations.load(Ordering::SeqCst)
    }
}

impl StoreSession for MemoryStore {
    fn submit(&self, request: &GraphQlRequest) -> Result<GraphQlResponse> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        if self
            .conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Ok(GraphQlResponse::with_error(CONFLICT));
        }

        let bom = &request.variables["input"][0];
        let Some(serial) = bom["serialNumber"].as_str() else {
            return Ok(GraphQlResponse::with_error(
                "Non-nullable field 'serialNumber' (type String!) was not present in result from Dgraph.",
            ));
        };
        if bom["metadata"]["timestamp"].is_null() {
            return Ok(GraphQlResponse::with_error(
                "Non-nullable field 'timestamp' (type DateTime!) was not present in result from Dgraph.",
            ));
        }

        let mut serials = self.serials.lock().unwrap();
        if serials.contains(serial) {
            return Ok(GraphQlResponse::with_error(format!(
                "couldn't rewrite mutation addBom because failed to rewrite mutation payload because id {serial} already exists for field serialNumber inside type Bom"
            )));
        }

        let incoming: Vec<String> = bom["components"]
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|c| c["purl"].as_str())
            .map(str::to_string)
            .collect();
        let mut purls = self.purls.lock().unwrap();
        if let Some(existing) = incoming.iter().find(|p| purls.contains(*p)) {
            return Ok(GraphQlResponse::with_error(format!(
                "couldn't rewrite mutation addBom because failed to rewrite mutation payload because duplicate XID found: {existing}"
            )));
        }

        serials.insert(serial.to_string());
        purls.extend(incoming);
        Ok(GraphQlResponse::with_data(
            json!({"addBom": {"bom": [{"serialNumber": serial}]}}),
        ))
    }

    fn is_alive(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "memory"
    }
}

// ============================================================================
// Manifest builders
// ============================================================================

/// A manifest with `components` npm components and `vulnerabilities`
/// distinct vulnerability entries.
pub fn manifest(serial: &str, components: usize, vulnerabilities: usize) -> Value {
    let slug = serial.rsplit(':').next().unwrap_or(serial);
    let components: Vec<Value> = (0..components)
        .map(|i| {
            json!({
                "bom-ref": format!("pkg:npm/{slug}-pkg-{i}@1.0.{i}"),
                "type": "library",
                "name": format!("pkg-{i}"),
                "version": format!("1.0.{i}"),
                "purl": format!("pkg:npm/{slug}-pkg-{i}@1.0.{i}"),
                "licenses": [{"license": {"id": "MIT"}}]
            })
        })
        .collect();
    let vulnerabilities: Vec<Value> = (0..vulnerabilities)
        .map(|i| {
            json!({
                "bom-ref": format!("CVE-2024-{:05}", i + 1),
                "id": format!("CVE-2024-{:05}", i + 1),
                "ratings": [{"method": "CVSSv31", "severity": "high", "score": 7.5}],
                "affects": [{
                    "ref": format!("pkg:npm/{slug}-pkg-0@1.0.0"),
                    "versions": [{"version": "1.0.0", "status": "affected"}]
                }]
            })
        })
        .collect();

    json!({
        "bomFormat": "CycloneDX",
        "specVersion": "1.5",
        "serialNumber": serial,
        "metadata": {
            "timestamp": "2024-03-01T10:00:00Z",
            "component": {
                "type": "application",
                "name": "app",
                "version": "1.0.0",
                "purl": format!("pkg:generic/{slug}-app@1.0.0")
            }
        },
        "components": components,
        "services": [],
        "vulnerabilities": vulnerabilities
    })
}

/// Write `value` as `name` under `dir`, creating parent directories.
pub fn write_manifest(dir: &Path, name: &str, value: &Value) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
    path
}
