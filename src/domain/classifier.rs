// Anomaly classifier - reduces a sample and its recent history to a severity tier
use crate::domain::diagnosis::{Diagnosis, SeverityTier};
use crate::domain::history::RollingHistory;
use crate::domain::sample::{MotorProfile, SensorSample};
use serde::Serialize;

pub const VIB_UPPER_LIMIT: f64 = 1.60;
pub const VIB_LOWER_LIMIT: f64 = 1.00;
pub const VIB_SPIKE_LIMIT: f64 = 0.40;
pub const VIB_STABILITY_THRESHOLD: f64 = 0.30;
pub const TEMP_WARNING: f64 = 40.0;
pub const TEMP_CRITICAL: f64 = 50.0;
pub const HIGH_LOAD_FRACTION: f64 = 0.85;
pub const STALL_SPEED_THRESHOLD: f64 = 1000.0;

/// Samples averaged for the stability check.
pub const STABILITY_WINDOW: usize = 5;

pub const NORMAL_DESCRIPTION: &str = "All parameters within nominal safety limits.";

/// Every boolean signal the tier resolution reads, plus the raw vibration metrics behind them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Signals {
    pub vib_delta: f64,
    pub avg_vib: f64,
    pub deviation: f64,
    pub is_vib_spike: bool,
    pub is_vib_high: bool,
    pub is_vib_low: bool,
    pub is_unstable: bool,
    pub is_critical_flag: bool,
    pub is_stall_condition: bool,
    pub is_overheat_critical: bool,
    pub is_high_load_attention: bool,
    pub is_warm_attention: bool,
}

impl Signals {
    /// `history` is expected to already end with `current`.
    pub fn compute(current: &SensorSample, history: &RollingHistory, profile: &MotorProfile) -> Self {
        let vib_delta = history
            .previous()
            .map(|previous| (current.vibration - previous.vibration).abs())
            .unwrap_or(0.0);

        let window: Vec<f64> = history.recent(STABILITY_WINDOW).map(|s| s.vibration).collect();
        let avg_vib = if window.is_empty() {
            current.vibration
        } else {
            window.iter().sum::<f64>() / window.len() as f64
        };
        let deviation = (current.vibration - avg_vib).abs();

        let is_critical_flag = current.fault_flag;

        Self {
            vib_delta,
            avg_vib,
            deviation,
            is_vib_spike: vib_delta > VIB_SPIKE_LIMIT,
            is_vib_high: current.vibration > VIB_UPPER_LIMIT,
            is_vib_low: current.vibration < VIB_LOWER_LIMIT,
            is_unstable: deviation > VIB_STABILITY_THRESHOLD,
            is_critical_flag,
            is_stall_condition: is_critical_flag
                && current.speed < STALL_SPEED_THRESHOLD
                && current.current > profile.max_rated_current,
            is_overheat_critical: is_critical_flag && current.temperature > TEMP_CRITICAL,
            is_high_load_attention: !is_critical_flag
                && current.current > HIGH_LOAD_FRACTION * profile.max_rated_current,
            is_warm_attention: !is_critical_flag
                && current.temperature > TEMP_WARNING
                && current.temperature <= TEMP_CRITICAL,
        }
    }

    pub fn is_vibration_issue(&self) -> bool {
        self.is_vib_high || self.is_vib_low || self.is_vib_spike || self.is_unstable
    }
}

/// Pure function of its inputs: first matching tier wins, fault flag first.
pub fn classify(current: &SensorSample, history: &RollingHistory, profile: &MotorProfile) -> Diagnosis {
    let signals = Signals::compute(current, history, profile);
    resolve(current, &signals)
}

/// Tier resolution over already computed signals.
pub fn resolve(current: &SensorSample, signals: &Signals) -> Diagnosis {
    if signals.is_critical_flag {
        return critical(current, signals);
    }

    if signals.is_vibration_issue() {
        let description = if signals.is_vib_spike {
            "Transient mechanical shock detected (Delta > 0.4 mm/s)."
        } else if signals.is_unstable {
            "Rotational instability detected (Deviation > 0.3)."
        } else if signals.is_vib_high {
            "Vibration amplitude exceeds upper threshold."
        } else {
            "Vibration amplitude below lower threshold (Possible Coupling Loss)."
        };
        return Diagnosis::new(SeverityTier::Warning, "VIBRATION ANOMALY", description);
    }

    if signals.is_high_load_attention || signals.is_warm_attention {
        let description = match (signals.is_high_load_attention, signals.is_warm_attention) {
            (true, true) => {
                "High load combined with rising temperatures. Monitor cooling efficiency.".to_string()
            }
            (true, false) => format!(
                "Motor running near maximum capacity ({}A). Efficiency may drop.",
                current.current
            ),
            _ => format!(
                "Elevated operating temperature ({:.1}°C). Ensure ventilation is clear.",
                current.temperature
            ),
        };
        return Diagnosis::new(SeverityTier::Attention, "ATTENTION REQUIRED", description);
    }

    Diagnosis::new(SeverityTier::Normal, "SYSTEM OPERATIONAL", NORMAL_DESCRIPTION)
}

fn critical(current: &SensorSample, signals: &Signals) -> Diagnosis {
    if signals.is_stall_condition {
        Diagnosis::new(
            SeverityTier::Critical,
            "CRITICAL: MOTOR STALL DETECTED",
            format!(
                "Zero speed with dangerous current spike ({}A). Immediate shutdown advised.",
                current.current
            ),
        )
    } else if signals.is_overheat_critical {
        Diagnosis::new(
            SeverityTier::Critical,
            "CRITICAL: OVERHEATING",
            format!(
                "Core temperature ({:.1}°C) exceeds safety threshold. Insulation failure risk.",
                current.temperature
            ),
        )
    } else {
        Diagnosis::new(
            SeverityTier::Critical,
            "SYSTEM FAULT TRIGGERED",
            "General fault flag received from controller. Check sensors and connections.",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sample::PhaseKind;
    use chrono::Utc;
    use proptest::prelude::*;

    fn profile(max_rated_current: f64) -> MotorProfile {
        MotorProfile::new("test", "Test Motor", PhaseKind::ThreePhase, 230.0, max_rated_current)
    }

    fn sample(temperature: f64, vibration: f64, speed: f64, current: f64, fault: bool) -> SensorSample {
        SensorSample::new(Utc::now(), temperature, vibration, speed, current, 230.0, fault)
    }

    /// History as the driver builds it: prior samples followed by the current one.
    fn classify_after(prior: &[SensorSample], current: &SensorSample, profile: &MotorProfile) -> Diagnosis {
        let history = RollingHistory::from_samples(prior.iter().cloned().chain([current.clone()]));
        classify(current, &history, profile)
    }

    #[test]
    fn test_nominal_sample_is_normal() {
        let current = sample(26.4, 1.12, 0.0, 4.5, false);
        let diagnosis = classify_after(&[], &current, &profile(10.0));

        assert_eq!(diagnosis.tier, SeverityTier::Normal);
        assert_eq!(diagnosis.title, "SYSTEM OPERATIONAL");
        assert_eq!(diagnosis.description, NORMAL_DESCRIPTION);
    }

    #[test]
    fn test_stall_is_critical() {
        let current = SensorSample::new(Utc::now(), 51.1, 1.28, 500.0, 21.0, 220.0, true);
        let diagnosis = classify_after(&[], &current, &profile(10.0));

        assert_eq!(diagnosis.tier, SeverityTier::Critical);
        assert_eq!(diagnosis.title, "CRITICAL: MOTOR STALL DETECTED");
        assert!(diagnosis.description.contains("21A"));
    }

    #[test]
    fn test_overheat_without_stall() {
        let current = sample(56.3, 1.2, 1400.0, 4.5, true);
        let diagnosis = classify_after(&[], &current, &profile(10.0));

        assert_eq!(diagnosis.title, "CRITICAL: OVERHEATING");
        assert!(diagnosis.description.contains("56.3°C"));
    }

    #[test]
    fn test_generic_fault() {
        let current = sample(35.1, 1.03, 1390.0, 4.5, true);
        let diagnosis = classify_after(&[], &current, &profile(10.0));

        assert_eq!(diagnosis.tier, SeverityTier::Critical);
        assert_eq!(diagnosis.title, "SYSTEM FAULT TRIGGERED");
    }

    #[test]
    fn test_vibration_spike_is_warning() {
        let previous = sample(30.0, 1.00, 1400.0, 4.5, false);
        let current = sample(30.0, 1.50, 1400.0, 4.5, false);
        let diagnosis = classify_after(&[previous], &current, &profile(10.0));

        assert_eq!(diagnosis.tier, SeverityTier::Warning);
        assert_eq!(diagnosis.title, "VIBRATION ANOMALY");
        assert!(diagnosis.description.starts_with("Transient mechanical shock"));
    }

    #[test]
    fn test_instability_without_spike() {
        // Gradual climb: each step under the spike limit, but far from the window average.
        let prior: Vec<SensorSample> = [1.00, 1.02, 1.05, 1.30]
            .iter()
            .map(|v| sample(30.0, *v, 1400.0, 4.5, false))
            .collect();
        let current = sample(30.0, 1.59, 1400.0, 4.5, false);
        let history = RollingHistory::from_samples(prior.iter().cloned().chain([current.clone()]));
        let signals = Signals::compute(&current, &history, &profile(10.0));

        assert!(!signals.is_vib_spike);
        assert!(signals.is_unstable);
        let diagnosis = classify(&current, &history, &profile(10.0));
        assert!(diagnosis.description.starts_with("Rotational instability"));
    }

    #[test]
    fn test_spike_wins_over_instability() {
        let prior: Vec<SensorSample> = (0..4).map(|_| sample(30.0, 1.0, 1400.0, 4.5, false)).collect();
        let current = sample(30.0, 1.5, 1400.0, 4.5, false);
        let history = RollingHistory::from_samples(prior.iter().cloned().chain([current.clone()]));
        let signals = Signals::compute(&current, &history, &profile(10.0));

        assert!(signals.is_vib_spike && signals.is_unstable);
        let diagnosis = resolve(&current, &signals);
        assert!(diagnosis.description.starts_with("Transient mechanical shock"));
    }

    #[test]
    fn test_spike_wins_over_high_amplitude() {
        let previous = sample(30.0, 1.2, 1400.0, 4.5, false);
        let current = sample(30.0, 1.7, 1400.0, 4.5, false);
        let diagnosis = classify_after(&[previous], &current, &profile(10.0));

        assert_eq!(diagnosis.tier, SeverityTier::Warning);
        assert!(diagnosis.description.starts_with("Transient mechanical shock"));
    }

    #[test]
    fn test_vibration_outranks_high_load() {
        let previous = sample(30.0, 1.0, 1400.0, 9.0, false);
        let current = sample(45.0, 1.5, 1400.0, 9.0, false);
        let diagnosis = classify_after(&[previous], &current, &profile(10.0));

        assert_eq!(diagnosis.tier, SeverityTier::Warning);
        assert_eq!(diagnosis.title, "VIBRATION ANOMALY");
    }

    #[test]
    fn test_high_and_low_vibration() {
        let high = sample(30.0, 1.89, 1400.0, 4.5, false);
        let diagnosis = classify_after(&[sample(30.0, 1.7, 1400.0, 4.5, false)], &high, &profile(10.0));
        assert_eq!(diagnosis.description, "Vibration amplitude exceeds upper threshold.");

        let low = sample(30.0, 0.84, 1400.0, 4.5, false);
        let diagnosis = classify_after(&[sample(30.0, 0.9, 1400.0, 4.5, false)], &low, &profile(10.0));
        assert_eq!(
            diagnosis.description,
            "Vibration amplitude below lower threshold (Possible Coupling Loss)."
        );
    }

    #[test]
    fn test_high_load_is_attention() {
        let current = sample(30.0, 1.2, 1400.0, 9.0, false);
        let diagnosis = classify_after(&[], &current, &profile(10.0));

        assert_eq!(diagnosis.tier, SeverityTier::Attention);
        assert_eq!(
            diagnosis.description,
            "Motor running near maximum capacity (9A). Efficiency may drop."
        );
    }

    #[test]
    fn test_warm_attention_band() {
        let warm = sample(45.3, 1.2, 1400.0, 4.5, false);
        let diagnosis = classify_after(&[], &warm, &profile(10.0));
        assert_eq!(diagnosis.tier, SeverityTier::Attention);
        assert!(diagnosis.description.contains("45.3°C"));

        // 40 is exclusive, 50 inclusive
        let at_forty = sample(40.0, 1.2, 1400.0, 4.5, false);
        assert_eq!(classify_after(&[], &at_forty, &profile(10.0)).tier, SeverityTier::Normal);
        let at_fifty = sample(50.0, 1.2, 1400.0, 4.5, false);
        assert_eq!(classify_after(&[], &at_fifty, &profile(10.0)).tier, SeverityTier::Attention);
        // Hot without a fault flag is not critical and falls outside the warm band
        let hot = sample(55.0, 1.2, 1400.0, 4.5, false);
        assert_eq!(classify_after(&[], &hot, &profile(10.0)).tier, SeverityTier::Normal);
    }

    #[test]
    fn test_combined_attention_message() {
        let current = sample(45.0, 1.2, 1400.0, 9.5, false);
        let diagnosis = classify_after(&[], &current, &profile(10.0));
        assert!(diagnosis.description.starts_with("High load combined"));
    }

    #[test]
    fn test_empty_history_uses_current_as_average() {
        let current = sample(30.0, 1.2, 1400.0, 4.5, false);
        let signals = Signals::compute(&current, &RollingHistory::new(), &profile(10.0));
        assert_eq!(signals.vib_delta, 0.0);
        assert_eq!(signals.avg_vib, 1.2);
        assert_eq!(signals.deviation, 0.0);
    }

    fn arb_sample() -> impl Strategy<Value = SensorSample> {
        (0.0f64..80.0, 0.0f64..3.0, 0.0f64..1600.0, 0.0f64..30.0, any::<bool>())
            .prop_map(|(t, v, s, c, f)| sample(t, v, s, c, f))
    }

    proptest! {
        #[test]
        fn prop_classify_is_pure(
            prior in prop::collection::vec(arb_sample(), 0..35),
            current in arb_sample(),
            max_current in 1.0f64..25.0,
        ) {
            let p = profile(max_current);
            let history = RollingHistory::from_samples(prior.into_iter().chain([current.clone()]));
            prop_assert_eq!(classify(&current, &history, &p), classify(&current, &history, &p));
        }

        #[test]
        fn prop_fault_flag_dominates(
            prior in prop::collection::vec(arb_sample(), 0..35),
            current in arb_sample(),
            max_current in 1.0f64..25.0,
        ) {
            let faulted = SensorSample { fault_flag: true, ..current };
            let history = RollingHistory::from_samples(prior.into_iter().chain([faulted.clone()]));
            let diagnosis = classify(&faulted, &history, &profile(max_current));
            prop_assert_eq!(diagnosis.tier, SeverityTier::Critical);
        }

        #[test]
        fn prop_without_fault_never_critical(
            prior in prop::collection::vec(arb_sample(), 0..35),
            current in arb_sample(),
        ) {
            let healthy = SensorSample { fault_flag: false, ..current };
            let history = RollingHistory::from_samples(prior.into_iter().chain([healthy.clone()]));
            let diagnosis = classify(&healthy, &history, &profile(10.0));
            prop_assert!(diagnosis.tier < SeverityTier::Critical);
        }

        #[test]
        fn prop_tier_follows_signals_without_fault(
            prior in prop::collection::vec(arb_sample(), 0..35),
            current in arb_sample(),
            max_current in 1.0f64..25.0,
        ) {
            let p = profile(max_current);
            let healthy = SensorSample { fault_flag: false, ..current };
            let history = RollingHistory::from_samples(prior.into_iter().chain([healthy.clone()]));
            let signals = Signals::compute(&healthy, &history, &p);
            let diagnosis = classify(&healthy, &history, &p);

            let expected = if signals.is_vibration_issue() {
                SeverityTier::Warning
            } else if signals.is_high_load_attention || signals.is_warm_attention {
                SeverityTier::Attention
            } else {
                SeverityTier::Normal
            };
            prop_assert_eq!(diagnosis.tier, expected);
            prop_assert_eq!(resolve(&healthy, &signals), diagnosis);
        }
    }
}
