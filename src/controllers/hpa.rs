//! HPA ratio rule.
//!
//! `u = round(pc * r / y)`, saturated; the window used as the ratio's base
//! is carried inside the controller (`self.pc`), not the `current_window`
//! argument.

use super::Controller;
use crate::parameters::AllParameters;

/// Below this measured rate, `r / y` is treated as a failed measurement
/// rather than propagated as `inf`/`NaN`.
const EPSILON: f64 = 1e-9;

#[derive(Debug)]
pub struct Hpa {
    min: f64,
    max: f64,
    pc: f64,
}

impl Hpa {
    pub fn new(p: &AllParameters) -> Self {
        Hpa {
            min: p.min,
            max: p.max,
            pc: p.pc,
        }
    }
}

impl Controller for Hpa {
    fn update(&mut self, r: f64, y: f64, _current_window: f64) -> f64 {
        if y.abs() <= EPSILON {
            return self.pc.clamp(self.min, self.max);
        }

        let u = (self.pc * r / y).round().clamp(self.min, self.max);
        self.pc = u;
        u
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn params(min: f64, max: f64, pc: f64) -> AllParameters {
        let raw = crate::parameters::RawParameters {
            controller_type: Some("HPA".to_string()),
            execution_type: Some("ClosedLoop".to_string()),
            min: Some(min),
            max: Some(max),
            pc: Some(pc),
            set_points: Some(vec![50]),
            ..Default::default()
        };
        raw.finish().unwrap()
    }

    #[test]
    fn ratio_rule_holds_window_once_rate_matches_setpoint() {
        let p = params(1.0, 1000.0, 10.0);
        let mut c = Hpa::new(&p);
        assert_relative_eq!(c.update(50.0, 25.0, 0.0), 20.0);
        assert_relative_eq!(c.update(50.0, 50.0, 0.0), 20.0);
    }

    #[test]
    fn zero_rate_holds_previous_window_instead_of_diverging() {
        let p = params(1.0, 1000.0, 10.0);
        let mut c = Hpa::new(&p);
        let u = c.update(50.0, 0.0, 0.0);
        assert_relative_eq!(u, 10.0);
        assert!(u.is_finite());
    }

    #[test]
    fn saturates_to_max() {
        let p = params(1.0, 15.0, 10.0);
        let mut c = Hpa::new(&p);
        let u = c.update(500.0, 1.0, 0.0);
        assert_relative_eq!(u, 15.0);
    }
}
