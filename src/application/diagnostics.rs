// Diagnostics service - on-demand narrative from an external language-model collaborator
use crate::application::simulation::{Narrative, NarrativeStatus, SimulationDriver};
use crate::domain::classifier::{
    HIGH_LOAD_FRACTION, TEMP_CRITICAL, TEMP_WARNING, VIB_LOWER_LIMIT, VIB_SPIKE_LIMIT,
    VIB_STABILITY_THRESHOLD, VIB_UPPER_LIMIT,
};
use crate::domain::history::RollingHistory;
use crate::domain::sample::{MotorProfile, SensorSample};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

pub const SERVICE_UNAVAILABLE: &str =
    "System Error: AI Diagnostic Service is currently unavailable. Please check network connectivity.";
pub const EMPTY_ANALYSIS: &str = "Analysis complete. System parameters are within nominal ranges.";

/// Samples of trend context sent along with the current reading.
pub const NARRATIVE_HISTORY_LEN: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct Thresholds {
    pub vib_upper_limit: f64,
    pub vib_lower_limit: f64,
    pub vib_spike_limit: f64,
    pub vib_stability_threshold: f64,
    pub temp_warning: f64,
    pub temp_critical: f64,
    pub max_rated_current: f64,
    pub high_load_current: f64,
}

impl Thresholds {
    pub fn for_profile(profile: &MotorProfile) -> Self {
        Self {
            vib_upper_limit: VIB_UPPER_LIMIT,
            vib_lower_limit: VIB_LOWER_LIMIT,
            vib_spike_limit: VIB_SPIKE_LIMIT,
            vib_stability_threshold: VIB_STABILITY_THRESHOLD,
            temp_warning: TEMP_WARNING,
            temp_critical: TEMP_CRITICAL,
            max_rated_current: profile.max_rated_current,
            high_load_current: HIGH_LOAD_FRACTION * profile.max_rated_current,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NarrativeRequest {
    pub profile: MotorProfile,
    pub thresholds: Thresholds,
    /// Oldest first, at most `NARRATIVE_HISTORY_LEN` entries.
    pub history: Vec<SensorSample>,
    pub current: SensorSample,
}

impl NarrativeRequest {
    pub fn new(profile: MotorProfile, history: &RollingHistory, current: SensorSample) -> Self {
        Self {
            thresholds: Thresholds::for_profile(&profile),
            profile,
            history: history.recent(NARRATIVE_HISTORY_LEN).cloned().collect(),
            current,
        }
    }
}

/// Identifies one in-flight request so a late reply can be recognised as stale.
#[derive(Debug, Clone)]
pub struct NarrativeTicket {
    pub generation: u64,
    pub sequence: u64,
    pub request: NarrativeRequest,
}

/// Turns a sample, its history and the motor profile into free-form text.
#[async_trait]
pub trait NarrativeProvider: Send + Sync {
    async fn analyze(&self, request: &NarrativeRequest) -> anyhow::Result<String>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum NarrativeOutcome {
    /// No sample has been produced yet.
    NoData,
    /// A reset or a newer request superseded this one; the reply was discarded.
    Superseded,
    Delivered(Narrative),
}

#[derive(Clone)]
pub struct DiagnosticsService {
    provider: Arc<dyn NarrativeProvider>,
}

impl DiagnosticsService {
    pub fn new(provider: Arc<dyn NarrativeProvider>) -> Self {
        Self { provider }
    }

    /// The engine lock is released while the provider runs, so ticks keep flowing.
    ///
    /// The provider call and its completion run on a spawned task, so the narrative
    /// slot leaves `Loading` even if the caller stops waiting.
    pub async fn request(&self, driver: &SimulationDriver) -> NarrativeOutcome {
        let ticket = match driver.engine().lock().await.begin_narrative() {
            Some(ticket) => ticket,
            None => return NarrativeOutcome::NoData,
        };

        let engine = driver.engine().clone();
        let provider = self.provider.clone();
        let motor_id = driver.motor_id().to_string();
        let task = {
            let ticket = ticket.clone();
            tokio::spawn(async move {
                let narrative = narrative_from(provider.analyze(&ticket.request).await, &motor_id);
                let delivered = engine.lock().await.complete_narrative(&ticket, narrative.clone());
                (delivered, narrative)
            })
        };

        let (delivered, narrative) = match task.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(motor = %driver.motor_id(), error = %e, "narrative task failed");
                let narrative = unavailable();
                let delivered = driver
                    .engine()
                    .lock()
                    .await
                    .complete_narrative(&ticket, narrative.clone());
                (delivered, narrative)
            }
        };

        if delivered {
            NarrativeOutcome::Delivered(narrative)
        } else {
            tracing::debug!(
                motor = %driver.motor_id(),
                generation = ticket.generation,
                sequence = ticket.sequence,
                "discarding stale narrative"
            );
            NarrativeOutcome::Superseded
        }
    }
}

fn narrative_from(reply: anyhow::Result<String>, motor_id: &str) -> Narrative {
    match reply {
        Ok(text) if text.trim().is_empty() => Narrative {
            status: NarrativeStatus::Success,
            text: EMPTY_ANALYSIS.to_string(),
        },
        Ok(text) => Narrative {
            status: NarrativeStatus::Success,
            text,
        },
        Err(e) => {
            tracing::error!(motor = %motor_id, error = %e, "narrative service failed");
            unavailable()
        }
    }
}

fn unavailable() -> Narrative {
    Narrative {
        status: NarrativeStatus::Error,
        text: SERVICE_UNAVAILABLE.to_string(),
    }
}
