//! Fuzzy controller.
//!
//! Pipeline per update: fuzzify the error into the seven terms, evaluate
//! the one-rule-per-term base, defuzzify by centroid into a crisp delta,
//! apply the delta to the in-force window and saturate.
//!
//! Each rule's output centre comes from a fixed grid scan over the output
//! actions; since the scan is input-independent its result is precomputed
//! once here as [`OUTPUT_CENTERS`] rather than rescanned on every update:
//! `LI=3, MI=2, SI=1, Maintain=0, SD=-1, MD=-2, LD=-3`.

use super::Controller;
use crate::defuzzifier::centroid;
use crate::membership;
use crate::parameters::AllParameters;
use crate::shared::MembershipFamily;

/// Output centres, in the same rule order as [`membership::ERROR_TERMS`]
/// (EP, LP, SP, ZE, SN, LN, EN) mapped to (LargeIncrease, MediumIncrease,
/// SmallIncrease, Maintain, SmallDecrease, MediumDecrease, LargeDecrease).
const OUTPUT_CENTERS: [f64; 7] = [3.0, 2.0, 1.0, 0.0, -1.0, -2.0, -3.0];

#[derive(Debug)]
pub struct FuzzyController {
    family: MembershipFamily,
    min: f64,
    max: f64,
}

impl FuzzyController {
    pub fn new(p: &AllParameters) -> Self {
        FuzzyController {
            family: p.membership_function.unwrap_or(MembershipFamily::Triangular),
            min: p.min,
            max: p.max,
        }
    }
}

impl Controller for FuzzyController {
    fn update(&mut self, setpoint: f64, measured: f64, current_window: f64) -> f64 {
        let err = setpoint - measured;
        let memberships = membership::fuzzify_error(err, self.family);
        let delta = centroid(&memberships, &OUTPUT_CENTERS);
        (current_window + delta).clamp(self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn params(min: f64, max: f64, family: Option<MembershipFamily>) -> AllParameters {
        let mf = family.map(|f| match f {
            MembershipFamily::Triangular => "Triangular",
            MembershipFamily::Gaussian => "Gaussian",
            MembershipFamily::Pi => "Pi",
        });
        let raw = crate::parameters::RawParameters {
            controller_type: Some("FuzzyController".to_string()),
            execution_type: Some("ClosedLoop".to_string()),
            min: Some(min),
            max: Some(max),
            pc: Some(0.0),
            membership_function: mf.map(str::to_string),
            set_points: Some(vec![500]),
            ..Default::default()
        };
        raw.finish().unwrap()
    }

    #[test]
    fn zero_error_holds_window() {
        let p = params(0.0, 1000.0, Some(MembershipFamily::Gaussian));
        let mut c = FuzzyController::new(&p);
        let u = c.update(500.0, 500.0, 100.0);
        assert_relative_eq!(u, 100.0, epsilon = 1e-6);
    }

    #[test]
    fn gaussian_symmetric_error_mirrors_delta() {
        let p = params(0.0, 100_000.0, Some(MembershipFamily::Gaussian));
        let mut up = FuzzyController::new(&p);
        let mut down = FuzzyController::new(&p);

        let pc = 1000.0;
        let r = 500.0;
        let k = 750.0;

        let u_up = up.update(r, r + k, pc); // err = -k
        let u_down = down.update(r, r - k, pc); // err = +k

        assert_relative_eq!((u_up - pc), -(u_down - pc), epsilon = 1e-9);
    }

    #[test]
    fn large_positive_error_increases_window() {
        let p = params(0.0, 100_000.0, Some(MembershipFamily::Triangular));
        let mut c = FuzzyController::new(&p);
        let u = c.update(10000.0, 0.0, 100.0); // err = 10000, strongly EP
        assert!(u > 100.0);
    }

    #[test]
    fn large_negative_error_decreases_window() {
        let p = params(0.0, 100_000.0, Some(MembershipFamily::Triangular));
        let mut c = FuzzyController::new(&p);
        let u = c.update(0.0, 10000.0, 5000.0); // err = -10000, strongly EN
        assert!(u < 5000.0);
    }

    #[test]
    fn output_saturates_to_bounds() {
        let p = params(0.0, 105.0, Some(MembershipFamily::Triangular));
        let mut c = FuzzyController::new(&p);
        let u = c.update(10000.0, 0.0, 100.0);
        assert!(u <= 105.0);
    }
}
