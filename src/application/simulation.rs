// Simulation driver - replays samples on a randomized timer and applies billing + classification
use crate::application::diagnostics::{NarrativeRequest, NarrativeTicket};
use crate::application::sample_source::SampleSource;
use crate::domain::billing::{BillingState, TariffRate};
use crate::domain::classifier::{resolve, Signals};
use crate::domain::diagnosis::Diagnosis;
use crate::domain::history::RollingHistory;
use crate::domain::motor::DerivedMetrics;
use crate::domain::sample::{MotorProfile, SensorSample};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;

pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1000);
pub const MAX_TICK_INTERVAL: Duration = Duration::from_millis(3000);

const EVENT_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    Stopped,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeStatus {
    Idle,
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Narrative {
    pub status: NarrativeStatus,
    pub text: String,
}

impl Narrative {
    pub fn idle() -> Self {
        Self {
            status: NarrativeStatus::Idle,
            text: String::new(),
        }
    }
}

/// Everything one tick produced, applied together.
#[derive(Debug, Clone, Serialize)]
pub struct TickEvent {
    pub motor_id: String,
    pub cursor: u64,
    pub sample: SensorSample,
    pub diagnosis: Diagnosis,
    pub billing: BillingState,
    pub cost_increment: f64,
    pub metrics: DerivedMetrics,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DriverEvent {
    Tick(TickEvent),
    Started { motor_id: String },
    Paused { motor_id: String },
    Reset { motor_id: String },
    BillingReset { motor_id: String },
}

/// Consistent view of one motor, taken under a single lock.
#[derive(Debug, Clone, Serialize)]
pub struct MotorSnapshot {
    pub profile: MotorProfile,
    pub is_running: bool,
    pub cursor: u64,
    pub current: Option<SensorSample>,
    pub history: Vec<SensorSample>,
    pub diagnosis: Option<Diagnosis>,
    pub signals: Option<Signals>,
    pub billing: BillingState,
    pub metrics: Option<DerivedMetrics>,
    pub narrative: Narrative,
}

/// Picks the wait before the next tick.
pub trait IntervalPicker: Send + Sync {
    fn next_interval(&self) -> Duration;
}

/// Uniform over [min, max) in whole milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct RandomInterval {
    min: Duration,
    max: Duration,
}

impl RandomInterval {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }
}

impl Default for RandomInterval {
    fn default() -> Self {
        Self::new(MIN_TICK_INTERVAL, MAX_TICK_INTERVAL)
    }
}

impl IntervalPicker for RandomInterval {
    fn next_interval(&self) -> Duration {
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        if max <= min {
            return self.min;
        }
        Duration::from_millis(rand::thread_rng().gen_range(min..max))
    }
}

#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedInterval(pub Duration);

#[cfg(test)]
impl IntervalPicker for FixedInterval {
    fn next_interval(&self) -> Duration {
        self.0
    }
}

/// Synchronous state machine behind the driver. Ticks are applied by whoever owns it,
/// so tests can step it by hand.
pub struct SimulationEngine {
    profile: MotorProfile,
    source: Arc<SampleSource>,
    run_state: RunState,
    cursor: u64,
    history: RollingHistory,
    billing: BillingState,
    current: Option<SensorSample>,
    diagnosis: Option<Diagnosis>,
    signals: Option<Signals>,
    metrics: Option<DerivedMetrics>,
    narrative: Narrative,
    /// Bumped by reset; pending narrative replies from an older generation are dropped.
    generation: u64,
    /// Bumped by every start/pause/reset; timers from an older epoch are dropped.
    epoch: u64,
    narrative_seq: u64,
    last_stamp: Option<DateTime<Utc>>,
}

impl SimulationEngine {
    pub fn new(profile: MotorProfile, source: Arc<SampleSource>, tariff_rate: TariffRate) -> Self {
        Self {
            profile,
            source,
            run_state: RunState::Stopped,
            cursor: 0,
            history: RollingHistory::new(),
            billing: BillingState::new(tariff_rate),
            current: None,
            diagnosis: None,
            signals: None,
            metrics: None,
            narrative: Narrative::idle(),
            generation: 0,
            epoch: 0,
            narrative_seq: 0,
            last_stamp: None,
        }
    }

    pub fn profile(&self) -> &MotorProfile {
        &self.profile
    }

    pub fn is_running(&self) -> bool {
        self.run_state == RunState::Running
    }

    /// Resume ticking without clearing anything. Returns the new run epoch.
    pub fn start(&mut self) -> u64 {
        self.run_state = RunState::Running;
        self.epoch += 1;
        self.epoch
    }

    pub fn pause(&mut self) {
        self.run_state = RunState::Stopped;
        self.epoch += 1;
    }

    /// Back to the initial state; only the operator's tariff survives.
    pub fn reset(&mut self) {
        self.run_state = RunState::Stopped;
        self.cursor = 0;
        self.history.clear();
        self.billing.reset();
        self.current = None;
        self.diagnosis = None;
        self.signals = None;
        self.metrics = None;
        self.narrative = Narrative::idle();
        self.generation += 1;
        self.epoch += 1;
    }

    pub fn set_tariff_rate(&mut self, tariff_rate: TariffRate) {
        self.billing.set_tariff_rate(tariff_rate);
    }

    /// Zero the session bill only; ticking, cursor and history carry on.
    pub fn reset_billing(&mut self) {
        self.billing.reset();
    }

    /// Apply one tick that waited `elapsed`. Ignored while stopped.
    pub fn tick(&mut self, elapsed: Duration) -> Option<TickEvent> {
        if !self.is_running() {
            return None;
        }

        self.cursor += 1;
        let sample = self.stamp_monotonic(self.source.next_sample(self.cursor, self.profile.phase_kind));

        let cost_increment =
            self.billing
                .accrue_sample(&sample, elapsed.as_secs_f64(), self.profile.phase_kind);

        self.history.push(sample.clone());
        let signals = Signals::compute(&sample, &self.history, &self.profile);
        let diagnosis = resolve(&sample, &signals);
        let metrics = DerivedMetrics::compute(&sample, &self.profile);

        self.current = Some(sample.clone());
        self.diagnosis = Some(diagnosis.clone());
        self.signals = Some(signals);
        self.metrics = Some(metrics);

        Some(TickEvent {
            motor_id: self.profile.id.clone(),
            cursor: self.cursor,
            sample,
            diagnosis,
            billing: self.billing,
            cost_increment,
            metrics,
        })
    }

    /// Tick only if no start/pause/reset happened since `epoch` was issued.
    pub fn tick_for_epoch(&mut self, epoch: u64, elapsed: Duration) -> Option<TickEvent> {
        if epoch != self.epoch {
            return None;
        }
        self.tick(elapsed)
    }

    /// Restamp with the previous timestamp if the wall clock stepped backwards.
    fn stamp_monotonic(&mut self, sample: SensorSample) -> SensorSample {
        let sample = match self.last_stamp {
            Some(last) if last > sample.timestamp => sample.restamped(last),
            _ => sample,
        };
        self.last_stamp = Some(sample.timestamp);
        sample
    }

    pub fn snapshot(&self) -> MotorSnapshot {
        MotorSnapshot {
            profile: self.profile.clone(),
            is_running: self.is_running(),
            cursor: self.cursor,
            current: self.current.clone(),
            history: self.history.iter().cloned().collect(),
            diagnosis: self.diagnosis.clone(),
            signals: self.signals,
            billing: self.billing,
            metrics: self.metrics,
            narrative: self.narrative.clone(),
        }
    }

    /// Mark a narrative request in flight. `None` until the first sample arrives.
    pub fn begin_narrative(&mut self) -> Option<NarrativeTicket> {
        let current = self.current.clone()?;
        self.narrative_seq += 1;
        self.narrative = Narrative {
            status: NarrativeStatus::Loading,
            text: String::new(),
        };
        Some(NarrativeTicket {
            generation: self.generation,
            sequence: self.narrative_seq,
            request: NarrativeRequest::new(self.profile.clone(), &self.history, current),
        })
    }

    /// Store a narrative reply unless a reset or a newer request made it stale.
    pub fn complete_narrative(&mut self, ticket: &NarrativeTicket, narrative: Narrative) -> bool {
        if ticket.generation != self.generation || ticket.sequence != self.narrative_seq {
            return false;
        }
        self.narrative = narrative;
        true
    }
}

#[cfg(test)]
impl SimulationEngine {
    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn history(&self) -> &RollingHistory {
        &self.history
    }

    pub fn billing(&self) -> &BillingState {
        &self.billing
    }

    pub fn diagnosis(&self) -> Option<&Diagnosis> {
        self.diagnosis.as_ref()
    }

    pub fn narrative(&self) -> &Narrative {
        &self.narrative
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// Runs a `SimulationEngine` on tokio timers. One tick in flight at a time.
pub struct SimulationDriver {
    motor_id: String,
    engine: Arc<Mutex<SimulationEngine>>,
    intervals: Arc<dyn IntervalPicker>,
    events: broadcast::Sender<DriverEvent>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SimulationDriver {
    pub fn new(engine: SimulationEngine, intervals: Arc<dyn IntervalPicker>) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            motor_id: engine.profile().id.clone(),
            engine: Arc::new(Mutex::new(engine)),
            intervals,
            events,
            task: Mutex::new(None),
        }
    }

    pub fn motor_id(&self) -> &str {
        &self.motor_id
    }

    pub fn engine(&self) -> &Arc<Mutex<SimulationEngine>> {
        &self.engine
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DriverEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> MotorSnapshot {
        self.engine.lock().await.snapshot()
    }

    pub async fn start(&self) {
        let mut engine = self.engine.lock().await;
        if engine.is_running() {
            return;
        }
        let epoch = engine.start();
        let _ = self.events.send(DriverEvent::Started {
            motor_id: self.motor_id.clone(),
        });

        let handle = tokio::spawn(run_loop(
            self.engine.clone(),
            self.intervals.clone(),
            self.events.clone(),
            epoch,
        ));
        if let Some(stale) = self.task.lock().await.replace(handle) {
            stale.abort();
        }
        tracing::info!(motor = %self.motor_id, epoch, "simulation started");
    }

    pub async fn pause(&self) {
        let mut engine = self.engine.lock().await;
        engine.pause();
        self.cancel_pending().await;
        let _ = self.events.send(DriverEvent::Paused {
            motor_id: self.motor_id.clone(),
        });
        tracing::info!(motor = %self.motor_id, "simulation paused");
    }

    pub async fn reset(&self) {
        let mut engine = self.engine.lock().await;
        engine.reset();
        self.cancel_pending().await;
        let _ = self.events.send(DriverEvent::Reset {
            motor_id: self.motor_id.clone(),
        });
        tracing::info!(motor = %self.motor_id, "simulation reset");
    }

    /// Clears the accumulated cost without stopping the simulation.
    pub async fn reset_billing(&self) {
        let mut engine = self.engine.lock().await;
        engine.reset_billing();
        let _ = self.events.send(DriverEvent::BillingReset {
            motor_id: self.motor_id.clone(),
        });
        tracing::info!(motor = %self.motor_id, "session billing reset");
    }

    pub async fn set_tariff_rate(&self, tariff_rate: TariffRate) {
        self.engine.lock().await.set_tariff_rate(tariff_rate);
    }

    async fn cancel_pending(&self) {
        if let Some(handle) = self.task.lock().await.take() {
            handle.abort();
        }
    }
}

async fn run_loop(
    engine: Arc<Mutex<SimulationEngine>>,
    intervals: Arc<dyn IntervalPicker>,
    events: broadcast::Sender<DriverEvent>,
    epoch: u64,
) {
    loop {
        let delay = intervals.next_interval();
        tokio::time::sleep(delay).await;

        let mut guard = engine.lock().await;
        let Some(event) = guard.tick_for_epoch(epoch, delay) else {
            tracing::debug!(epoch, "stale tick dropped");
            break;
        };
        tracing::debug!(
            motor = %event.motor_id,
            cursor = event.cursor,
            tier = %event.diagnosis.tier,
            cost = event.billing.accumulated_cost,
            "tick applied"
        );
        // Published under the lock so no observer sees a tick after a later reset
        let _ = events.send(DriverEvent::Tick(event));
    }
}
