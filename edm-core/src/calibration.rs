//! Calibration store (C5): per-device calibration state with lifecycle
//! invariants, backed by a flat JSON key-per-device persistence file.
//!
//! The load/save shape follows the teacher's `persistence.rs`
//! (tolerate-missing-file, warn-and-default on parse failure) but keyed
//! per device rather than holding one global blob, and persistence writes
//! are fired via `tokio::spawn` the way `audit.rs` fires its appends —
//! a slow or failing write never blocks the calling Orchestrator operation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tokio::sync::RwLock;
use tracing::{info, warn};

use edm_types::{Calibration, CircleType};

const DEFAULT_PATH: &str = "calibration.json";

pub struct CalibrationStore {
    inner: Arc<RwLock<HashMap<String, Calibration>>>,
    path: PathBuf,
    persist_enabled: bool,
}

impl CalibrationStore {
    /// Load persisted calibrations from `path` (defaults to
    /// `calibration.json` in the working directory). Missing or corrupt
    /// files yield an empty store; per-record schema mismatches
    /// (unknown circle type) are silently discarded, not fatal.
    pub async fn load(path: Option<PathBuf>) -> Self {
        let path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_PATH));
        let records = load_records(&path).await;
        info!("Loaded {} calibration record(s) from {}", records.len(), path.display());
        Self {
            inner: Arc::new(RwLock::new(records)),
            path,
            persist_enabled: true,
        }
    }

    /// An empty, non-persisting store. Used in tests and by demo-mode
    /// orchestrators that don't need a calibration file on disk.
    pub fn new_in_memory() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            path: PathBuf::from(DEFAULT_PATH),
            persist_enabled: false,
        }
    }

    /// Current record for `device_id`, or a freshly initialised one for
    /// `default_circle_type` if none exists. Does not persist.
    pub async fn get(&self, device_id: &str, default_circle_type: CircleType) -> Calibration {
        let guard = self.inner.read().await;
        guard
            .get(device_id)
            .cloned()
            .unwrap_or_else(|| Calibration::fresh(device_id, default_circle_type))
    }

    /// Whether a record for `device_id` has ever been written (distinct
    /// from `get`, which always returns a usable default).
    pub async fn exists(&self, device_id: &str) -> bool {
        self.inner.read().await.contains_key(device_id)
    }

    /// Write `calibration` and persist asynchronously. Persistence
    /// failure does not roll back the in-memory update.
    pub async fn put(&self, calibration: Calibration) {
        let device_id = calibration.device_id.clone();
        {
            let mut guard = self.inner.write().await;
            guard.insert(device_id.clone(), calibration);
        }
        self.spawn_save(device_id).await;
    }

    /// Discard the record for `device_id`, in memory and on disk.
    pub async fn reset(&self, device_id: &str) {
        {
            let mut guard = self.inner.write().await;
            guard.remove(device_id);
        }
        self.spawn_save(device_id.to_string()).await;
    }

    /// Create a fresh record for `circle_type`, discarding any prior
    /// state, and persist it.
    pub async fn set_circle_type(&self, device_id: &str, circle_type: CircleType) -> Calibration {
        let fresh = Calibration::fresh(device_id, circle_type);
        self.put(fresh.clone()).await;
        fresh
    }

    async fn spawn_save(&self, device_id: String) {
        if !self.persist_enabled {
            return;
        }
        let inner = self.inner.clone();
        let path = self.path.clone();
        tokio::spawn(async move {
            let snapshot = inner.read().await.clone();
            if let Err(e) = save_records(&path, &snapshot).await {
                warn!("Failed to persist calibration for {device_id}: {e}");
            }
        });
    }
}

async fn load_records(path: &Path) -> HashMap<String, Calibration> {
    if !path.exists() {
        info!("No {} found, starting with empty calibration store", path.display());
        return HashMap::new();
    }

    let data = match fs::read_to_string(path).await {
        Ok(d) => d,
        Err(e) => {
            warn!("Failed to read {}: {e}, starting empty", path.display());
            return HashMap::new();
        }
    };

    let raw: HashMap<String, serde_json::Value> = match serde_json::from_str(&data) {
        Ok(v) => v,
        Err(e) => {
            warn!("Failed to parse {}: {e}, starting empty", path.display());
            return HashMap::new();
        }
    };

    let mut records = HashMap::new();
    for (device_id, value) in raw {
        match serde_json::from_value::<Calibration>(value) {
            Ok(record) => {
                records.insert(device_id, record);
            }
            Err(e) => {
                warn!("Discarding calibration record for {device_id}: {e}");
            }
        }
    }
    records
}

async fn save_records(path: &Path, records: &HashMap<String, Calibration>) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    fs::write(path, json).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use edm_types::{EdgeVerification, Point};
    use tempfile_like::TempPath;

    /// Minimal temp-path helper so tests don't collide on `calibration.json`
    /// in the working directory (no extra crate dependency needed).
    mod tempfile_like {
        use std::path::PathBuf;

        pub struct TempPath(pub PathBuf);

        impl TempPath {
            pub fn new(tag: &str) -> Self {
                let mut p = std::env::temp_dir();
                p.push(format!("edm-core-test-{tag}-{:?}.json", std::thread::current().id()));
                TempPath(p)
            }
        }

        impl Drop for TempPath {
            fn drop(&mut self) {
                let _ = std::fs::remove_file(&self.0);
            }
        }
    }

    #[tokio::test]
    async fn get_returns_fresh_default_when_absent() {
        let tmp = TempPath::new("fresh");
        let store = CalibrationStore::load(Some(tmp.0.clone())).await;
        let cal = store.get("dev-1", CircleType::Shot).await;
        assert!(!cal.centre_set);
        assert!(cal.edge.is_none());
        assert_eq!(cal.target_radius_m, CircleType::Shot.target_radius_m());
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let tmp = TempPath::new("roundtrip");
        let store = CalibrationStore::load(Some(tmp.0.clone())).await;
        let mut cal = Calibration::fresh("dev-1", CircleType::Discus);
        cal.station = Point::new(-5.1, 6.49);
        cal.centre_set = true;
        store.put(cal.clone()).await;

        let fetched = store.get("dev-1", CircleType::Shot).await;
        assert_eq!(fetched.circle_type, CircleType::Discus);
        assert!(fetched.centre_set);
        assert_eq!(fetched.station.x, -5.1);
    }

    #[tokio::test]
    async fn set_circle_type_discards_prior_state() {
        let tmp = TempPath::new("reset-circle");
        let store = CalibrationStore::load(Some(tmp.0.clone())).await;
        let mut cal = Calibration::fresh("dev-1", CircleType::Shot);
        cal.centre_set = true;
        cal.edge = Some(EdgeVerification {
            measured_radius_m: 1.07,
            diff_mm: 2.5,
            tolerance_mm: 5.0,
            in_tolerance: true,
        });
        store.put(cal).await;

        let fresh = store.set_circle_type("dev-1", CircleType::Hammer).await;
        assert!(!fresh.centre_set);
        assert!(fresh.edge.is_none());
        assert_eq!(fresh.target_radius_m, CircleType::Hammer.target_radius_m());
    }

    #[tokio::test]
    async fn reload_discards_unknown_circle_type_but_keeps_rest() {
        let tmp = TempPath::new("schema-tolerant");
        let mut raw: HashMap<String, serde_json::Value> = HashMap::new();
        raw.insert(
            "dev-good".to_string(),
            serde_json::json!({
                "deviceId": "dev-good",
                "circleType": "SHOT",
                "targetRadiusM": 1.0675,
                "station": {"x": 1.0, "y": 2.0},
                "centreSet": true
            }),
        );
        raw.insert(
            "dev-bad".to_string(),
            serde_json::json!({
                "deviceId": "dev-bad",
                "circleType": "TRAMPOLINE",
                "targetRadiusM": 1.0,
                "station": {"x": 0.0, "y": 0.0},
                "centreSet": false
            }),
        );
        std::fs::write(&tmp.0, serde_json::to_string(&raw).unwrap()).unwrap();

        let store = CalibrationStore::load(Some(tmp.0.clone())).await;
        let good = store.get("dev-good", CircleType::Shot).await;
        assert!(good.centre_set);
        let bad = store.get("dev-bad", CircleType::Shot).await;
        // discarded, so a fresh default is returned instead
        assert!(!bad.centre_set);
    }
}
