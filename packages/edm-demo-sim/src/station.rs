//! Station model for the emulator: wraps the same `DemoGenerator` the real
//! Orchestrator uses in demo mode, so the emulator and the in-process demo
//! path produce readings with identical statistics.

use edm_core::demo::DemoGenerator;
use edm_types::{AveragedReading, CircleType};

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum Mode {
    Centre,
    Edge,
    Throw,
    Sector,
}

pub struct Station {
    generator: DemoGenerator,
    device_id: String,
    circle_type: CircleType,
    mode: Mode,
}

impl Station {
    pub fn new(device_id: String, circle_type: CircleType, mode: Mode) -> Self {
        Self {
            generator: DemoGenerator::new(),
            device_id,
            circle_type,
            mode,
        }
    }

    /// Produce the next reading for the configured mode.
    pub fn next_reading(&self) -> AveragedReading {
        match self.mode {
            Mode::Centre => self.generator.centre_reading(&self.device_id, true),
            Mode::Edge => self.generator.edge_reading(&self.device_id, self.circle_type, true),
            Mode::Throw => self.generator.throw_reading(&self.device_id, self.circle_type, true),
            Mode::Sector => self.generator.sector_reading(&self.device_id, self.circle_type, true),
        }
    }
}
