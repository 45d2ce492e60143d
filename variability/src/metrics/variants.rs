//! Variant Variability
//!
//! The simplest measure of how diverse a log is: the number of distinct activity sequences.

use crate::EventLogActivityProjection;

/// Number of variants (distinct activity sequences) in the log
pub fn compute_variant_variability(projection: &EventLogActivityProjection) -> usize {
    projection.variant_count()
}

/// Number of variants relative to the number of traces, in percent
///
/// A log in which every trace is unique has a variability of 100%. Empty logs have a variability of 0%.
pub fn variant_percentage(projection: &EventLogActivityProjection) -> f64 {
    let log_size = projection.log_size();
    if log_size == 0 {
        return 0.0;
    }
    compute_variant_variability(projection) as f64 * 100.0 / log_size as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_percentage() {
        let projection = EventLogActivityProjection {
            traces: vec![(vec![0, 1], 3), (vec![1], 1)],
            ..Default::default()
        };
        assert_eq!(compute_variant_variability(&projection), 2);
        assert_eq!(variant_percentage(&projection), 50.0);
    }

    #[test]
    fn test_empty_log() {
        let projection = EventLogActivityProjection::default();
        assert_eq!(compute_variant_variability(&projection), 0);
        assert_eq!(variant_percentage(&projection), 0.0);
    }
}
