// Sample source - cyclic replay of a fixed telemetry dataset
use crate::domain::sample::{PhaseKind, SensorSample};
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigurationError {
    #[error("{phase:?} dataset is empty; at least one sample is required")]
    EmptyDataset { phase: PhaseKind },
    #[error("{phase:?} dataset row {row}: {field} must be a finite, non-negative number (got {value})")]
    MalformedRow {
        phase: PhaseKind,
        row: usize,
        field: &'static str,
        value: f64,
    },
}

/// One dataset entry; the timestamp is stamped when the row is replayed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatasetRow {
    pub temperature: f64,
    pub vibration: f64,
    pub speed: f64,
    pub current: f64,
    pub voltage: f64,
    pub fault_flag: bool,
}

impl DatasetRow {
    pub const fn new(
        temperature: f64,
        vibration: f64,
        speed: f64,
        current: f64,
        voltage: f64,
        fault_flag: bool,
    ) -> Self {
        Self {
            temperature,
            vibration,
            speed,
            current,
            voltage,
            fault_flag,
        }
    }

    fn stamp(&self, timestamp: DateTime<Utc>) -> SensorSample {
        SensorSample::new(
            timestamp,
            self.temperature,
            self.vibration,
            self.speed,
            self.current,
            self.voltage,
            self.fault_flag,
        )
    }

    fn validate(&self, phase: PhaseKind, row: usize) -> Result<(), ConfigurationError> {
        let fields = [
            ("temperature", self.temperature),
            ("vibration", self.vibration),
            ("speed", self.speed),
            ("current", self.current),
            ("voltage", self.voltage),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigurationError::MalformedRow {
                    phase,
                    row,
                    field,
                    value,
                });
            }
        }
        Ok(())
    }
}

/// A validated, non-empty list of rows.
#[derive(Debug, Clone)]
pub struct Dataset {
    rows: Vec<DatasetRow>,
}

impl Dataset {
    pub fn new(phase: PhaseKind, rows: Vec<DatasetRow>) -> Result<Self, ConfigurationError> {
        if rows.is_empty() {
            return Err(ConfigurationError::EmptyDataset { phase });
        }
        for (index, row) in rows.iter().enumerate() {
            row.validate(phase, index)?;
        }
        Ok(Self { rows })
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    fn row(&self, cursor: u64) -> &DatasetRow {
        // len >= 1 is guaranteed by construction
        let index = (cursor % self.rows.len() as u64) as usize;
        &self.rows[index]
    }
}

#[derive(Debug, Clone)]
pub struct SampleSource {
    single_phase: Dataset,
    three_phase: Dataset,
}

impl SampleSource {
    pub fn new(single_phase: Dataset, three_phase: Dataset) -> Self {
        Self {
            single_phase,
            three_phase,
        }
    }

    /// Single-phase data is a structural copy of the three-phase rows.
    pub fn from_rows(rows: &[DatasetRow]) -> Result<Self, ConfigurationError> {
        let three_phase = Dataset::new(PhaseKind::ThreePhase, rows.to_vec())?;
        let single_phase = Dataset::new(PhaseKind::SinglePhase, rows.to_vec())?;
        Ok(Self::new(single_phase, three_phase))
    }

    pub fn dataset(&self, phase_kind: PhaseKind) -> &Dataset {
        match phase_kind {
            PhaseKind::SinglePhase => &self.single_phase,
            PhaseKind::ThreePhase => &self.three_phase,
        }
    }

    /// Replay the row at `cursor mod len`, stamped now.
    pub fn next_sample(&self, cursor: u64, phase_kind: PhaseKind) -> SensorSample {
        self.sample_at(cursor, phase_kind, Utc::now())
    }

    pub fn sample_at(&self, cursor: u64, phase_kind: PhaseKind, timestamp: DateTime<Utc>) -> SensorSample {
        self.dataset(phase_kind).row(cursor).stamp(timestamp)
    }
}
