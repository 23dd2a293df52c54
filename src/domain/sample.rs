// Sensor sample and motor profile domain models
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseKind {
    SinglePhase,
    ThreePhase,
}

/// One motor telemetry reading. Never mutated after it is produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    pub timestamp: DateTime<Utc>,
    /// Degrees Celsius
    pub temperature: f64,
    /// mm/s
    pub vibration: f64,
    /// RPM
    pub speed: f64,
    /// Amperes
    pub current: f64,
    /// Volts
    pub voltage: f64,
    /// Device-reported fault
    pub fault_flag: bool,
}

impl SensorSample {
    pub fn new(
        timestamp: DateTime<Utc>,
        temperature: f64,
        vibration: f64,
        speed: f64,
        current: f64,
        voltage: f64,
        fault_flag: bool,
    ) -> Self {
        Self {
            timestamp,
            temperature,
            vibration,
            speed,
            current,
            voltage,
            fault_flag,
        }
    }

    /// Same readings under a new timestamp.
    pub fn restamped(&self, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            ..self.clone()
        }
    }

    /// Same readings, different timestamp.
    #[cfg(test)]
    pub fn same_readings(&self, other: &SensorSample) -> bool {
        self.temperature == other.temperature
            && self.vibration == other.vibration
            && self.speed == other.speed
            && self.current == other.current
            && self.voltage == other.voltage
            && self.fault_flag == other.fault_flag
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MotorProfile {
    pub id: String,
    pub display_name: String,
    pub phase_kind: PhaseKind,
    pub nominal_voltage: f64,
    pub max_rated_current: f64,
}

impl MotorProfile {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        phase_kind: PhaseKind,
        nominal_voltage: f64,
        max_rated_current: f64,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            phase_kind,
            nominal_voltage,
            max_rated_current,
        }
    }

    /// Domestic single-phase induction motor.
    pub fn single_phase() -> Self {
        Self::new("m1", "1-Phase Induction Motor", PhaseKind::SinglePhase, 230.0, 15.0)
    }

    /// Industrial three-phase squirrel cage induction motor.
    pub fn three_phase() -> Self {
        Self::new(
            "m3",
            "3-Phase Squirrel Cage Induction Motor",
            PhaseKind::ThreePhase,
            230.0,
            10.0,
        )
    }

    pub fn presets() -> Vec<Self> {
        vec![Self::single_phase(), Self::three_phase()]
    }
}
