// Rolling history of recent samples
use crate::domain::sample::SensorSample;
use serde::Serialize;
use std::collections::VecDeque;

pub const HISTORY_CAPACITY: usize = 30;

/// Fixed-capacity FIFO window. Insertion order is temporal order.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct RollingHistory {
    samples: VecDeque<SensorSample>,
}

impl Default for RollingHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl RollingHistory {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(HISTORY_CAPACITY + 1),
        }
    }

    /// Append a sample, evicting the oldest once capacity is exceeded.
    pub fn push(&mut self, sample: SensorSample) {
        self.samples.push_back(sample);
        while self.samples.len() > HISTORY_CAPACITY {
            self.samples.pop_front();
        }
    }

    /// Second-to-last entry
    pub fn previous(&self) -> Option<&SensorSample> {
        let len = self.samples.len();
        if len < 2 {
            return None;
        }
        self.samples.get(len - 2)
    }

    /// Last `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &SensorSample> {
        let skip = self.samples.len().saturating_sub(n);
        self.samples.iter().skip(skip)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SensorSample> {
        self.samples.iter()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
impl RollingHistory {
    pub fn from_samples(samples: impl IntoIterator<Item = SensorSample>) -> Self {
        let mut history = Self::new();
        for sample in samples {
            history.push(sample);
        }
        history
    }

    pub fn latest(&self) -> Option<&SensorSample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample(vibration: f64) -> SensorSample {
        SensorSample::new(Utc::now(), 30.0, vibration, 1400.0, 4.5, 230.0, false)
    }

    #[test]
    fn test_evicts_oldest_beyond_capacity() {
        let mut history = RollingHistory::new();
        for i in 0..(HISTORY_CAPACITY + 5) {
            history.push(sample(i as f64));
        }

        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.iter().next().unwrap().vibration, 5.0);
        assert_eq!(history.latest().unwrap().vibration, (HISTORY_CAPACITY + 4) as f64);
    }

    #[test]
    fn test_previous_and_recent() {
        let mut history = RollingHistory::new();
        assert!(history.previous().is_none());

        history.push(sample(1.0));
        assert!(history.previous().is_none());

        history.push(sample(2.0));
        history.push(sample(3.0));
        assert_eq!(history.previous().unwrap().vibration, 2.0);

        let recent: Vec<f64> = history.recent(2).map(|s| s.vibration).collect();
        assert_eq!(recent, vec![2.0, 3.0]);

        let all: Vec<f64> = history.recent(10).map(|s| s.vibration).collect();
        assert_eq!(all, vec![1.0, 2.0, 3.0]);
    }
}
