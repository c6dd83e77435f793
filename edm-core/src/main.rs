//! Demo-runner binary: exercises the Orchestrator end-to-end in demo mode
//! with no UI or server attached, the way a smoke test would. Real
//! deployments embed `edm_core::orchestrator::Orchestrator` behind their
//! own UI/server process instead of this binary.

use anyhow::{Context, Result};
use edm_core::calibration::CalibrationStore;
use edm_core::config::Config;
use edm_core::orchestrator::Orchestrator;
use edm_types::CircleType;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "edm_core=info".into()),
        )
        .init();

    let mut config = Config::default();
    config.demo_mode = true;

    let calibration = CalibrationStore::load(Some(config.calibration_path.clone())).await;
    let orchestrator = Orchestrator::new(calibration, config.demo_mode, config.default_circle_type);

    let device_id = "demo-1";
    info!("Running demo sequence for {device_id} ({:?})", CircleType::Shot);

    orchestrator
        .set_circle_type(device_id, CircleType::Shot)
        .await
        .context("setCircleType failed")?;

    let after_centre = orchestrator
        .set_centre(device_id, false)
        .await
        .context("setCentre failed")?;
    info!(
        "station = ({:.4}, {:.4})",
        after_centre.station.x, after_centre.station.y
    );

    let after_edge = orchestrator
        .verify_edge(device_id, false)
        .await
        .context("verifyEdge failed")?;
    let edge = after_edge.edge.expect("edge set after verifyEdge");
    info!(
        "edge: measured_radius={:.4}m diff={:.2}mm in_tolerance={}",
        edge.measured_radius_m, edge.diff_mm, edge.in_tolerance
    );

    let throw = orchestrator
        .measure_throw(device_id, false)
        .await
        .context("measureThrow failed")?;
    info!("throw: distance={:.3}m point=({:.3}, {:.3})", throw.distance_m, throw.point.x, throw.point.y);

    let sector = orchestrator
        .sector_check(device_id, false)
        .await
        .context("sectorCheck failed")?;
    info!(
        "sector: angle={:.3}deg distance_from_centre={:.3}m",
        sector.angle_deg, sector.distance_from_centre_m
    );

    Ok(())
}
