//! Tolerance tier lookup

use crate::practice::ScoringTier;

/// First tier whose `max_error` is at or above `error`
///
/// Tiers are expected in ascending `max_error` order; ties resolve to the
/// earlier tier. Returns `None` for a NaN error or an error above every tier.
pub fn select_tier(tiers: &[ScoringTier], error: f64) -> Option<&ScoringTier> {
    if error.is_nan() {
        return None;
    }
    tiers.iter().find(|tier| error <= tier.max_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiers() -> Vec<ScoringTier> {
        vec![
            ScoringTier::new(0.1, 25.0, "excellent"),
            ScoringTier::new(0.3, 20.0, "very good"),
            ScoringTier::new(0.3, 18.0, "shadowed"),
            ScoringTier::new(1.0, 10.0, "poor"),
            ScoringTier::new(999.0, 0.0, "incorrect"),
        ]
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let tiers = tiers();
        assert_eq!(select_tier(&tiers, 0.0).unwrap().score, 25.0);
        assert_eq!(select_tier(&tiers, 0.1).unwrap().score, 25.0);
        assert_eq!(select_tier(&tiers, 0.1000001).unwrap().score, 20.0);
        assert_eq!(select_tier(&tiers, 0.3).unwrap().feedback, "very good");
        assert_eq!(select_tier(&tiers, 5.0).unwrap().score, 0.0);
    }

    #[test]
    fn test_score_never_increases_with_error() {
        let tiers = tiers();
        let mut last = f64::INFINITY;
        for step in 0..2000 {
            let error = step as f64 * 0.001;
            let score = select_tier(&tiers, error).unwrap().score;
            assert!(score <= last);
            last = score;
        }
    }

    #[test]
    fn test_out_of_table() {
        let tiers = tiers();
        assert!(select_tier(&tiers, 1000.0).is_none());
        assert!(select_tier(&tiers, f64::NAN).is_none());
        assert!(select_tier(&[], 0.0).is_none());
    }
}
