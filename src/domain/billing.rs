// Billing accrual - energy cost from sampled power draw
use crate::domain::sample::{PhaseKind, SensorSample};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const POWER_FACTOR: f64 = 0.85;
pub const DEFAULT_TARIFF_RATE: f64 = 8.50;

const SECONDS_PER_HOUR: f64 = 3600.0;

#[derive(Debug, Error, PartialEq)]
pub enum TariffError {
    #[error("tariff rate must be a finite number, got {0}")]
    NotFinite(f64),
    #[error("tariff rate must not be negative, got {0}")]
    Negative(f64),
}

/// Price per kWh, validated at the configuration boundary.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct TariffRate(f64);

impl TariffRate {
    pub fn new(rate: f64) -> Result<Self, TariffError> {
        if !rate.is_finite() {
            return Err(TariffError::NotFinite(rate));
        }
        if rate < 0.0 {
            return Err(TariffError::Negative(rate));
        }
        Ok(Self(rate))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for TariffRate {
    fn default() -> Self {
        Self(DEFAULT_TARIFF_RATE)
    }
}

impl TryFrom<f64> for TariffRate {
    type Error = TariffError;

    fn try_from(rate: f64) -> Result<Self, Self::Error> {
        Self::new(rate)
    }
}

impl From<TariffRate> for f64 {
    fn from(rate: TariffRate) -> Self {
        rate.0
    }
}

/// Instantaneous real power in kW.
pub fn power_kw(sample: &SensorSample, phase_kind: PhaseKind) -> f64 {
    let apparent = sample.voltage * sample.current * POWER_FACTOR / 1000.0;
    match phase_kind {
        PhaseKind::ThreePhase => 3f64.sqrt() * apparent,
        PhaseKind::SinglePhase => apparent,
    }
}

/// Cost of drawing the sample's power for `interval_seconds`.
/// Degenerate inputs contribute nothing so a total can never shrink.
pub fn cost_increment(
    sample: &SensorSample,
    interval_seconds: f64,
    phase_kind: PhaseKind,
    tariff_rate: TariffRate,
) -> f64 {
    if !interval_seconds.is_finite() || interval_seconds <= 0.0 {
        return 0.0;
    }
    let increment = power_kw(sample, phase_kind) * tariff_rate.value() * (interval_seconds / SECONDS_PER_HOUR);
    if increment.is_finite() && increment > 0.0 {
        increment
    } else {
        0.0
    }
}

pub fn accrue(
    sample: &SensorSample,
    interval_seconds: f64,
    phase_kind: PhaseKind,
    tariff_rate: TariffRate,
    prior_total: f64,
) -> f64 {
    prior_total + cost_increment(sample, interval_seconds, phase_kind, tariff_rate)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BillingState {
    pub accumulated_cost: f64,
    pub tariff_rate: TariffRate,
}

impl BillingState {
    pub fn new(tariff_rate: TariffRate) -> Self {
        Self {
            accumulated_cost: 0.0,
            tariff_rate,
        }
    }

    /// Accrue one interval at the current tariff, returning the increment.
    pub fn accrue_sample(&mut self, sample: &SensorSample, interval_seconds: f64, phase_kind: PhaseKind) -> f64 {
        let prior = self.accumulated_cost;
        self.accumulated_cost = accrue(sample, interval_seconds, phase_kind, self.tariff_rate, prior);
        self.accumulated_cost - prior
    }

    /// Takes effect on the next accrual; nothing already accrued is repriced.
    pub fn set_tariff_rate(&mut self, tariff_rate: TariffRate) {
        self.tariff_rate = tariff_rate;
    }

    /// Clears the total, keeping the operator's tariff.
    pub fn reset(&mut self) {
        self.accumulated_cost = 0.0;
    }
}
