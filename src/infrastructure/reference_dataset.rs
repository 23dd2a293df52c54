// Hand-authored motor telemetry replayed by the simulation
use crate::application::sample_source::DatasetRow;

pub static REFERENCE_ROWS: &[DatasetRow] = &[
    // Normal operation
    DatasetRow::new(26.4, 1.12, 0.0, 4.5, 230.0, false),
    DatasetRow::new(29.0, 1.41, 1430.0, 4.5, 230.0, false),
    DatasetRow::new(29.5, 1.32, 1423.0, 4.5, 230.0, false),
    DatasetRow::new(28.2, 1.38, 1400.0, 4.5, 230.0, false),
    DatasetRow::new(28.9, 1.40, 1420.0, 4.5, 230.0, false),
    DatasetRow::new(30.0, 1.26, 1390.0, 4.5, 230.0, false),
    DatasetRow::new(31.0, 1.32, 1430.0, 4.5, 230.0, false),
    DatasetRow::new(32.3, 1.29, 1440.0, 4.5, 230.0, false),
    // Minor heating / vibration anomalies
    DatasetRow::new(35.1, 1.03, 1390.0, 4.5, 230.0, true),
    DatasetRow::new(35.6, 1.04, 1390.0, 4.5, 230.0, true),
    DatasetRow::new(34.7, 0.82, 1360.0, 4.5, 230.0, true),
    DatasetRow::new(36.3, 0.97, 1380.0, 4.5, 230.0, true),
    // Back to normal
    DatasetRow::new(29.1, 1.45, 1420.0, 4.5, 230.0, false),
    DatasetRow::new(29.3, 1.32, 1430.0, 4.5, 230.0, false),
    DatasetRow::new(29.4, 1.23, 1450.0, 4.5, 230.0, false),
    // High load, speed collapses while current climbs
    DatasetRow::new(31.0, 1.12, 500.0, 21.0, 220.0, false),
    DatasetRow::new(33.1, 1.20, 500.0, 21.0, 220.0, false),
    DatasetRow::new(35.0, 1.24, 500.0, 21.0, 220.0, false),
    DatasetRow::new(34.3, 1.18, 500.0, 21.0, 220.0, false),
    DatasetRow::new(36.2, 1.25, 500.0, 21.0, 220.0, false),
    // Controller raises the fault flag as temperature climbs
    DatasetRow::new(51.1, 1.28, 500.0, 21.0, 220.0, true),
    DatasetRow::new(51.2, 1.29, 500.0, 21.0, 220.0, true),
    DatasetRow::new(45.3, 1.08, 500.0, 21.0, 220.0, true),
    DatasetRow::new(45.4, 1.06, 500.0, 21.0, 220.0, true),
    DatasetRow::new(43.1, 1.35, 500.0, 21.0, 220.0, true),
    DatasetRow::new(46.2, 1.39, 500.0, 21.0, 220.0, true),
    DatasetRow::new(51.2, 1.34, 500.0, 21.0, 220.0, true),
    DatasetRow::new(56.3, 1.89, 500.0, 21.0, 220.0, true),
    DatasetRow::new(41.1, 0.84, 500.0, 21.0, 220.0, true),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::sample_source::SampleSource;

    #[test]
    fn test_reference_rows_are_valid() {
        assert_eq!(REFERENCE_ROWS.len(), 29);
        assert!(SampleSource::from_rows(REFERENCE_ROWS).is_ok());
    }
}
