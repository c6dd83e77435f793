//! Field-event EDM measurement controller: serial protocol, angle codec,
//! geometry engine, and calibration state machine for shot put, discus,
//! hammer, and javelin throwing circles.
//!
//! The touchscreen UI, competition/athlete bookkeeping, server sync, and
//! scoreboard output are declared external collaborators and are not
//! implemented here; this crate's surface is the operations in
//! [`orchestrator::Orchestrator`] plus the persisted [`edm_types::Calibration`]
//! record.

pub mod angle;
pub mod calibration;
pub mod config;
pub mod demo;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod orchestrator;
pub mod translator;
pub mod transport;

pub use error::{Error, Result};
