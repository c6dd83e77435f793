//! Measurement Orchestrator (C6): the four operator-facing operations,
//! each serialised through a per-device mutex held for the operation's
//! full duration, including any paired-read delay.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use edm_types::{AveragedReading, Calibration, CircleType, Point, RawReading};

use crate::calibration::CalibrationStore;
use crate::demo::DemoGenerator;
use crate::error::{Error, Result};
use crate::geometry;
use crate::transport::{SerialTransport, PAIRED_READ_DELAY, READ_TIMEOUT};
use crate::translator::Translator;

const PAIRED_SD_TOLERANCE_MM: f64 = 3.0;

/// Which calibration step a reading is being taken for. Only meaningful
/// in demo mode, where it selects the synthetic-reading generator.
#[derive(Debug, Clone, Copy)]
enum Purpose {
    Centre,
    Edge,
    Throw,
    Sector,
}

/// Real-hardware binding for a device: which serial port, baud rate, and
/// translator to use.
#[derive(Clone)]
pub struct DeviceLink {
    pub port_name: String,
    pub baud_rate: u32,
    pub translator: Arc<dyn Translator>,
}

/// One recorded throw. Append-only; not part of `Calibration`.
#[derive(Debug, Clone)]
pub struct ThrowRecord {
    pub device_id: String,
    pub timestamp: chrono::DateTime<Utc>,
    pub point: Point,
    pub distance_m: f64,
}

#[derive(Default)]
struct ThrowLog {
    entries: AsyncMutex<Vec<ThrowRecord>>,
}

impl ThrowLog {
    async fn append(&self, record: ThrowRecord) {
        self.entries.lock().await.push(record);
    }

    pub async fn snapshot(&self) -> Vec<ThrowRecord> {
        self.entries.lock().await.clone()
    }
}

pub struct ThrowResult {
    pub point: Point,
    pub distance_m: f64,
}

pub struct SectorResult {
    pub point: Point,
    pub angle_deg: f64,
    pub distance_from_centre_m: f64,
    pub distance_beyond_edge_m: f64,
}

pub struct Orchestrator {
    calibration: CalibrationStore,
    demo_mode: bool,
    default_circle_type: CircleType,
    demo: DemoGenerator,
    device_links: std::sync::Mutex<HashMap<String, DeviceLink>>,
    device_locks: std::sync::Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    throw_log: ThrowLog,
}

impl Orchestrator {
    pub fn new(calibration: CalibrationStore, demo_mode: bool, default_circle_type: CircleType) -> Self {
        Self {
            calibration,
            demo_mode,
            default_circle_type,
            demo: DemoGenerator::new(),
            device_links: std::sync::Mutex::new(HashMap::new()),
            device_locks: std::sync::Mutex::new(HashMap::new()),
            throw_log: ThrowLog::default(),
        }
    }

    /// Register the serial port and translator to use for `device_id`.
    /// Required before real (non-demo) operations on that device.
    pub fn register_device(&self, device_id: &str, link: DeviceLink) {
        self.device_links
            .lock()
            .unwrap()
            .insert(device_id.to_string(), link);
    }

    pub async fn throw_history(&self) -> Vec<ThrowRecord> {
        self.throw_log.snapshot().await
    }

    fn device_lock(&self, device_id: &str) -> Arc<AsyncMutex<()>> {
        self.device_locks
            .lock()
            .unwrap()
            .entry(device_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    // ── Operations ──────────────────────────────────────────────────────

    pub async fn set_circle_type(&self, device_id: &str, circle_type: CircleType) -> Result<Calibration> {
        let lock = self.device_lock(device_id);
        let _guard = lock.lock().await;
        info!("{device_id}: setCircleType({circle_type:?})");
        Ok(self.calibration.set_circle_type(device_id, circle_type).await)
    }

    pub async fn set_centre(&self, device_id: &str, single_mode: bool) -> Result<Calibration> {
        let lock = self.device_lock(device_id);
        let _guard = lock.lock().await;

        if !self.calibration.exists(device_id).await && !self.demo_mode {
            return Err(Error::NotConfigured {
                device_id: device_id.to_string(),
            });
        }
        let existing = self.calibration.get(device_id, self.default_circle_type).await;

        let reading = self
            .acquire_reading(device_id, single_mode, Purpose::Centre, existing.circle_type)
            .await?;
        let station = geometry::station_from_centre(&reading);

        let updated = Calibration {
            station,
            centre_set: true,
            edge: None,
            last_centre_set_at: Some(Utc::now()),
            ..existing
        };
        self.calibration.put(updated.clone()).await;
        info!("{device_id}: setCentre -> station=({:.4}, {:.4})", station.x, station.y);
        Ok(updated)
    }

    pub async fn verify_edge(&self, device_id: &str, single_mode: bool) -> Result<Calibration> {
        let lock = self.device_lock(device_id);
        let _guard = lock.lock().await;

        let existing = self.ensure_station(device_id).await?;
        if !existing.centre_set {
            return Err(Error::CentreNotSet {
                device_id: device_id.to_string(),
            });
        }

        let reading = self
            .acquire_reading(device_id, single_mode, Purpose::Edge, existing.circle_type)
            .await?;
        let edge = geometry::edge_verification(existing.station, &reading, existing.circle_type);
        if !edge.in_tolerance {
            warn!(
                "{device_id}: verifyEdge out of tolerance (diff={:.2}mm, tol={:.1}mm)",
                edge.diff_mm, edge.tolerance_mm
            );
        }

        let updated = Calibration {
            edge: Some(edge),
            ..existing
        };
        self.calibration.put(updated.clone()).await;
        Ok(updated)
    }

    pub async fn measure_throw(&self, device_id: &str, single_mode: bool) -> Result<ThrowResult> {
        let lock = self.device_lock(device_id);
        let _guard = lock.lock().await;

        let existing = self.ensure_station(device_id).await?;
        let ready = existing.edge.is_some_and(|e| e.in_tolerance) && existing.centre_set;
        if !ready && !self.demo_mode {
            return Err(Error::NotCalibrated {
                device_id: device_id.to_string(),
            });
        }

        let reading = self
            .acquire_reading(device_id, single_mode, Purpose::Throw, existing.circle_type)
            .await?;
        let (point, distance_m) = geometry::throw_measurement(existing.station, &reading, existing.target_radius_m);

        self.throw_log
            .append(ThrowRecord {
                device_id: device_id.to_string(),
                timestamp: Utc::now(),
                point,
                distance_m,
            })
            .await;

        debug!("{device_id}: measureThrow -> distance={distance_m:.4}m point=({:.3},{:.3})", point.x, point.y);
        Ok(ThrowResult { point, distance_m })
    }

    pub async fn sector_check(&self, device_id: &str, single_mode: bool) -> Result<SectorResult> {
        let lock = self.device_lock(device_id);
        let _guard = lock.lock().await;

        let existing = self.ensure_station(device_id).await?;
        if !existing.centre_set {
            return Err(Error::CentreNotSet {
                device_id: device_id.to_string(),
            });
        }

        let reading = self
            .acquire_reading(device_id, single_mode, Purpose::Sector, existing.circle_type)
            .await?;
        let sc = geometry::sector_check(existing.station, &reading, existing.target_radius_m);

        let updated = Calibration {
            sector_point: Some(sc.point),
            ..existing
        };
        self.calibration.put(updated).await;

        Ok(SectorResult {
            point: sc.point,
            angle_deg: sc.angle_deg,
            distance_from_centre_m: sc.distance_from_centre_m,
            distance_beyond_edge_m: sc.distance_beyond_edge_m,
        })
    }

    /// In demo mode, the "must be calibrated" gate is relaxed: establish a
    /// station automatically the first time a device is used, the way the
    /// real operator would have via `setCentre`. Outside demo mode this is
    /// a no-op passthrough to the stored calibration.
    async fn ensure_station(&self, device_id: &str) -> Result<Calibration> {
        let existing = self.calibration.get(device_id, self.default_circle_type).await;
        if existing.centre_set || !self.demo_mode {
            return Ok(existing);
        }
        let station = self.demo.station(device_id);
        let updated = Calibration {
            station,
            centre_set: true,
            last_centre_set_at: Some(Utc::now()),
            ..existing
        };
        self.calibration.put(updated.clone()).await;
        Ok(updated)
    }

    // ── Reading acquisition (§4.6) ──────────────────────────────────────

    async fn acquire_reading(
        &self,
        device_id: &str,
        single_mode: bool,
        purpose: Purpose,
        circle_type: CircleType,
    ) -> Result<AveragedReading> {
        if self.demo_mode {
            return Ok(self.synthesize(device_id, purpose, circle_type));
        }

        if single_mode {
            let raw = self.single_exchange(device_id).await?;
            self.log_status(device_id, &raw);
            return Ok(AveragedReading::from_single(&raw));
        }

        let r1 = self.single_exchange(device_id).await?;
        tokio::time::sleep(PAIRED_READ_DELAY).await;
        let r2 = self.single_exchange(device_id).await?;
        self.log_status(device_id, &r1);
        self.log_status(device_id, &r2);

        let diff_mm = (r1.slope_distance_mm - r2.slope_distance_mm).abs();
        if diff_mm > PAIRED_SD_TOLERANCE_MM {
            return Err(Error::Inconsistent {
                sd1_mm: r1.slope_distance_mm,
                sd2_mm: r2.slope_distance_mm,
                diff_mm,
            });
        }
        Ok(AveragedReading::mean(&r1, &r2))
    }

    fn synthesize(&self, device_id: &str, purpose: Purpose, circle_type: CircleType) -> AveragedReading {
        match purpose {
            Purpose::Centre => self.demo.centre_reading(device_id, true),
            Purpose::Edge => self.demo.edge_reading(device_id, circle_type, true),
            Purpose::Throw => self.demo.throw_reading(device_id, circle_type, true),
            Purpose::Sector => self.demo.sector_reading(device_id, circle_type, true),
        }
    }

    async fn single_exchange(&self, device_id: &str) -> Result<RawReading> {
        let link = self
            .device_links
            .lock()
            .unwrap()
            .get(device_id)
            .cloned()
            .ok_or_else(|| Error::PortUnavailable {
                port: device_id.to_string(),
                reason: "no transport registered for device".to_string(),
            })?;

        let mut transport = SerialTransport::open(&link.port_name, link.baud_rate).await?;
        transport.write(link.translator.measurement_command()).await?;
        let frame = transport.read_until(b'\n', READ_TIMEOUT).await?;
        transport.close();
        link.translator.parse_frame(&frame)
    }

    fn log_status(&self, device_id: &str, reading: &RawReading) {
        if let Some(status) = &reading.status {
            if status != crate::translator::STATUS_NORMAL {
                warn!("{device_id}: non-normal status token {status:?}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orchestrator_demo() -> Orchestrator {
        Orchestrator::new_for_test(true)
    }

    impl Orchestrator {
        fn new_for_test(demo_mode: bool) -> Self {
            Self {
                calibration: CalibrationStore::new_in_memory(),
                demo_mode,
                default_circle_type: CircleType::Shot,
                demo: DemoGenerator::new(),
                device_links: std::sync::Mutex::new(HashMap::new()),
                device_locks: std::sync::Mutex::new(HashMap::new()),
                throw_log: ThrowLog::default(),
            }
        }
    }

    #[tokio::test]
    async fn demo_mode_waives_calibration_gate_for_throw() {
        let orch = orchestrator_demo();
        orch.set_circle_type("dev-1", CircleType::Shot).await.unwrap();
        let result = orch.measure_throw("dev-1", true).await.unwrap();
        assert!(result.distance_m > 0.0);
    }

    #[tokio::test]
    async fn real_mode_rejects_throw_without_calibration() {
        let orch = Orchestrator::new_for_test(false);
        orch.set_circle_type("dev-2", CircleType::Shot).await.unwrap();
        let err = orch.measure_throw("dev-2", true).await.unwrap_err();
        assert!(matches!(err, Error::NotCalibrated { .. }));
    }

    #[tokio::test]
    async fn demo_set_centre_then_verify_edge_passes() {
        let orch = orchestrator_demo();
        orch.set_circle_type("dev-3", CircleType::Shot).await.unwrap();
        orch.set_centre("dev-3", true).await.unwrap();
        let cal = orch.verify_edge("dev-3", true).await.unwrap();
        assert!(cal.edge.unwrap().in_tolerance);
    }

    #[tokio::test]
    async fn sector_check_records_sector_point() {
        let orch = orchestrator_demo();
        orch.set_circle_type("dev-4", CircleType::Discus).await.unwrap();
        orch.set_centre("dev-4", true).await.unwrap();
        let result = orch.sector_check("dev-4", true).await.unwrap();
        assert!(result.distance_from_centre_m > 0.0);
    }
}
