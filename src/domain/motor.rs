// Derived motor metrics shown alongside the raw readings
use crate::domain::billing::power_kw;
use crate::domain::sample::{MotorProfile, PhaseKind, SensorSample};
use serde::Serialize;

/// 4-pole motor on a 50 Hz supply: 120 * 50 / 4
pub const SYNC_SPEED_RPM: f64 = 1500.0;

/// Induction motor slip as a percentage of synchronous speed.
pub fn slip_percent(speed: f64) -> f64 {
    (SYNC_SPEED_RPM - speed) / SYNC_SPEED_RPM * 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedMetrics {
    pub power_kw: f64,
    /// Only meaningful for three-phase induction motors.
    pub slip_percent: Option<f64>,
}

impl DerivedMetrics {
    pub fn compute(sample: &SensorSample, profile: &MotorProfile) -> Self {
        let slip_percent = match profile.phase_kind {
            PhaseKind::ThreePhase => Some(slip_percent(sample.speed)),
            PhaseKind::SinglePhase => None,
        };
        Self {
            power_kw: power_kw(sample, profile.phase_kind),
            slip_percent,
        }
    }
}
