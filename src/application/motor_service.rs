// Motor service - one simulation driver per configured motor, sharing the operator tariff
use crate::application::sample_source::SampleSource;
use crate::application::simulation::{IntervalPicker, SimulationDriver, SimulationEngine};
use crate::domain::billing::TariffRate;
use crate::domain::sample::MotorProfile;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct MotorService {
    drivers: Vec<Arc<SimulationDriver>>,
    profiles: Vec<MotorProfile>,
    tariff_rate: Arc<RwLock<TariffRate>>,
}

impl MotorService {
    pub fn new(
        profiles: Vec<MotorProfile>,
        source: Arc<SampleSource>,
        tariff_rate: TariffRate,
        intervals: Arc<dyn IntervalPicker>,
    ) -> Self {
        let drivers = profiles
            .iter()
            .map(|profile| {
                let engine = SimulationEngine::new(profile.clone(), source.clone(), tariff_rate);
                Arc::new(SimulationDriver::new(engine, intervals.clone()))
            })
            .collect();

        Self {
            drivers,
            profiles,
            tariff_rate: Arc::new(RwLock::new(tariff_rate)),
        }
    }

    pub fn list_profiles(&self) -> &[MotorProfile] {
        &self.profiles
    }

    pub fn driver(&self, motor_id: &str) -> Option<Arc<SimulationDriver>> {
        self.drivers
            .iter()
            .find(|driver| driver.motor_id() == motor_id)
            .cloned()
    }

    pub async fn tariff_rate(&self) -> TariffRate {
        *self.tariff_rate.read().await
    }

    /// Applies to every motor from its next tick on.
    pub async fn set_tariff_rate(&self, tariff_rate: TariffRate) {
        let mut current = self.tariff_rate.write().await;
        *current = tariff_rate;
        for driver in &self.drivers {
            driver.set_tariff_rate(tariff_rate).await;
        }
        tracing::info!(tariff_rate = tariff_rate.value(), "tariff rate updated");
    }

    /// Clears data, charts and billing for every motor.
    pub async fn reset_all(&self) {
        for driver in &self.drivers {
            driver.reset().await;
        }
    }
}
