//! ASTAR hysteresis heuristic.

use super::Controller;
use crate::parameters::AllParameters;

#[derive(Debug)]
pub struct Astar {
    min: f64,
    max: f64,
    hysteresis_band: f64,
    prev_rate: f64,
    prev_out: f64,
}

impl Astar {
    pub fn new(p: &AllParameters) -> Self {
        Astar {
            min: p.min,
            max: p.max,
            hysteresis_band: p.hysteresis_band,
            prev_rate: 0.0,
            prev_out: 0.0,
        }
    }
}

impl Controller for Astar {
    fn update(&mut self, r: f64, y: f64, _current_window: f64) -> f64 {
        let u = if y < r - self.hysteresis_band {
            // below the goal
            if y > self.prev_rate {
                self.prev_out + 1.0
            } else {
                self.prev_out * 2.0
            }
        } else if y > r + self.hysteresis_band {
            // above the goal
            if y < self.prev_rate {
                self.prev_out - 1.0
            } else {
                self.prev_out / 2.0
            }
        } else {
            // at the setpoint, no action
            self.prev_out
        };

        let u = u.clamp(self.min, self.max);
        self.prev_out = u;
        self.prev_rate = y;
        u
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn astar_with_state(min: f64, max: f64, band: f64, prev_out: f64, prev_rate: f64) -> Astar {
        Astar {
            min,
            max,
            hysteresis_band: band,
            prev_rate,
            prev_out,
        }
    }

    #[test]
    fn increments_when_climbing_toward_goal_from_below() {
        let mut c = astar_with_state(1.0, 1000.0, 1.0, 4.0, 0.0);
        assert_relative_eq!(c.update(100.0, 2.0, 0.0), 5.0);
    }

    #[test]
    fn doubles_when_stalled_below_goal() {
        let mut c = astar_with_state(1.0, 1000.0, 1.0, 4.0, 0.0);
        assert_relative_eq!(c.update(100.0, 0.0, 0.0), 8.0);
    }

    #[test]
    fn decrements_when_falling_toward_goal_from_above() {
        let mut c = astar_with_state(1.0, 1000.0, 1.0, 10.0, 50.0);
        // y=30 > r+H=21, and y(30) < prevRate(50) -> decrement
        assert_relative_eq!(c.update(20.0, 30.0, 0.0), 9.0);
    }

    #[test]
    fn halves_when_stalled_above_goal() {
        let mut c = astar_with_state(1.0, 1000.0, 1.0, 10.0, 10.0);
        // y=30 > r+H=21, and y(30) >= prevRate(10) -> halve
        assert_relative_eq!(c.update(20.0, 30.0, 0.0), 5.0);
    }

    #[test]
    fn holds_inside_hysteresis_band() {
        let mut c = astar_with_state(1.0, 1000.0, 5.0, 7.0, 0.0);
        assert_relative_eq!(c.update(100.0, 100.0, 0.0), 7.0);
    }

    #[test]
    fn saturates_to_bounds() {
        let mut c = astar_with_state(0.0, 10.0, 1.0, 9.0, 0.0);
        assert_relative_eq!(c.update(100.0, 0.0, 0.0), 10.0);
    }
}
