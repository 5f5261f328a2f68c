//! Centroid defuzzification.

/// `Σ μ_i · o_i / Σ μ_i`; zero total membership yields `0` rather than
/// `NaN`.
pub fn centroid(memberships: &[f64], centers: &[f64]) -> f64 {
    debug_assert_eq!(memberships.len(), centers.len());

    let total: f64 = memberships.iter().sum();
    if total.abs() <= f64::EPSILON {
        return 0.0;
    }

    memberships
        .iter()
        .zip(centers)
        .map(|(m, c)| m * c)
        .sum::<f64>()
        / total
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn zero_total_membership_yields_zero() {
        assert_relative_eq!(centroid(&[0.0, 0.0], &[3.0, -3.0]), 0.0);
    }

    #[test]
    fn weighted_average_of_centers() {
        // one rule fully on, one fully off -> centroid collapses to the
        // single active center.
        assert_relative_eq!(centroid(&[1.0, 0.0], &[3.0, -3.0]), 3.0);
    }

    #[test]
    fn splits_between_two_active_rules() {
        assert_relative_eq!(centroid(&[0.5, 0.5], &[2.0, 0.0]), 1.0);
    }
}
