//! Discrete-time PID family: rectangular integration, simple
//! backward-difference derivative, saturation-only anti-windup.
//!
//! Shared preliminaries per update, reproduced in every variant rather than
//! factored into a superclass (each variant's update body differs in
//! non-trivial structure):
//!
//!   err = Direction * (r - y)
//!   P   = Kp * err
//!   I   = (sumErr + err) * Ki * Δt
//!   D   = Kd * (err - prevErr) / Δt

use super::Controller;
use crate::parameters::AllParameters;

fn saturate(u: f64, min: f64, max: f64) -> f64 {
    u.clamp(min, max)
}

/// `u = P + I + D`.
#[derive(Debug)]
pub struct BasicPid {
    kp: f64,
    ki: f64,
    kd: f64,
    direction: f64,
    delta_time: f64,
    min: f64,
    max: f64,
    prev_error: f64,
    sum_prev_errors: f64,
    out: f64,
}

impl BasicPid {
    pub fn new(p: &AllParameters) -> Self {
        BasicPid {
            kp: p.kp,
            ki: p.ki,
            kd: p.kd,
            direction: p.direction,
            delta_time: p.delta_time,
            min: p.min,
            max: p.max,
            prev_error: 0.0,
            sum_prev_errors: 0.0,
            out: 0.0,
        }
    }
}

impl Controller for BasicPid {
    fn update(&mut self, r: f64, y: f64, _pc: f64) -> f64 {
        let err = self.direction * (r - y);
        let proportional = self.kp * err;
        let integrator = (self.sum_prev_errors + err) * self.ki * self.delta_time;
        let differentiator = self.kd * (err - self.prev_error) / self.delta_time;

        self.out = saturate(proportional + integrator + differentiator, self.min, self.max);

        self.prev_error = err;
        self.sum_prev_errors += err;
        self.out
    }
}

/// `if |err| > Deadzone { u = P + I + D } else { u unchanged }`.
#[derive(Debug)]
pub struct DeadzonePid {
    kp: f64,
    ki: f64,
    kd: f64,
    direction: f64,
    delta_time: f64,
    min: f64,
    max: f64,
    prev_error: f64,
    sum_prev_errors: f64,
    out: f64,
    deadzone: f64,
}

impl DeadzonePid {
    pub fn new(p: &AllParameters) -> Self {
        DeadzonePid {
            kp: p.kp,
            ki: p.ki,
            kd: p.kd,
            direction: p.direction,
            delta_time: p.delta_time,
            min: p.min,
            max: p.max,
            prev_error: 0.0,
            sum_prev_errors: 0.0,
            out: 0.0,
            deadzone: p.deadzone,
        }
    }
}

impl Controller for DeadzonePid {
    fn update(&mut self, r: f64, y: f64, _pc: f64) -> f64 {
        let err = self.direction * (r - y);

        if err.abs() > self.deadzone {
            let proportional = self.kp * err;
            let integrator = (self.sum_prev_errors + err) * self.ki * self.delta_time;
            let differentiator = self.kd * (err - self.prev_error) / self.delta_time;
            self.out = proportional + integrator + differentiator;
        }
        // else: hold previous output, no action.

        self.out = saturate(self.out, self.min, self.max);
        self.prev_error = err;
        self.sum_prev_errors += err;
        self.out
    }
}

/// `u = |err| * (P + I + D)`.
#[derive(Debug)]
pub struct ErrorSquareFull {
    kp: f64,
    ki: f64,
    kd: f64,
    direction: f64,
    delta_time: f64,
    min: f64,
    max: f64,
    prev_error: f64,
    sum_prev_errors: f64,
    out: f64,
}

impl ErrorSquareFull {
    pub fn new(p: &AllParameters) -> Self {
        ErrorSquareFull {
            kp: p.kp,
            ki: p.ki,
            kd: p.kd,
            direction: p.direction,
            delta_time: p.delta_time,
            min: p.min,
            max: p.max,
            prev_error: 0.0,
            sum_prev_errors: 0.0,
            out: 0.0,
        }
    }
}

impl Controller for ErrorSquareFull {
    fn update(&mut self, r: f64, y: f64, _pc: f64) -> f64 {
        let err = self.direction * (r - y);
        let proportional = self.kp * err;
        let integrator = (self.sum_prev_errors + err) * self.ki * self.delta_time;
        let differentiator = self.kd * (err - self.prev_error) / self.delta_time;

        self.out = saturate(
            err.abs() * (proportional + integrator + differentiator),
            self.min,
            self.max,
        );

        self.prev_error = err;
        self.sum_prev_errors += err;
        self.out
    }
}

/// `u = |err|*P + I + D`.
#[derive(Debug)]
pub struct ErrorSquareProportional {
    kp: f64,
    ki: f64,
    kd: f64,
    direction: f64,
    delta_time: f64,
    min: f64,
    max: f64,
    prev_error: f64,
    sum_prev_errors: f64,
    out: f64,
}

impl ErrorSquareProportional {
    pub fn new(p: &AllParameters) -> Self {
        ErrorSquareProportional {
            kp: p.kp,
            ki: p.ki,
            kd: p.kd,
            direction: p.direction,
            delta_time: p.delta_time,
            min: p.min,
            max: p.max,
            prev_error: 0.0,
            sum_prev_errors: 0.0,
            out: 0.0,
        }
    }
}

impl Controller for ErrorSquareProportional {
    fn update(&mut self, r: f64, y: f64, _pc: f64) -> f64 {
        let err = self.direction * (r - y);
        let proportional = self.kp * err;
        let integrator = (self.sum_prev_errors + err) * self.ki * self.delta_time;
        let differentiator = self.kd * (err - self.prev_error) / self.delta_time;

        self.out = saturate(
            err.abs() * proportional + integrator + differentiator,
            self.min,
            self.max,
        );

        self.prev_error = err;
        self.sum_prev_errors += err;
        self.out
    }
}

/// `Δu = Kp(err-prevErr) + Ki*err*Δt + Kd(err-2*prevErr+prev2Err)/Δt; u += Δu`.
#[derive(Debug)]
pub struct IncrementalPid {
    kp: f64,
    ki: f64,
    kd: f64,
    direction: f64,
    delta_time: f64,
    min: f64,
    max: f64,
    prev_error: f64,
    prev2_error: f64,
    sum_prev_errors: f64,
    out: f64,
}

impl IncrementalPid {
    pub fn new(p: &AllParameters) -> Self {
        IncrementalPid {
            kp: p.kp,
            ki: p.ki,
            kd: p.kd,
            direction: p.direction,
            delta_time: p.delta_time,
            min: p.min,
            max: p.max,
            prev_error: 0.0,
            prev2_error: 0.0,
            sum_prev_errors: 0.0,
            out: 0.0,
        }
    }
}

impl Controller for IncrementalPid {
    fn update(&mut self, r: f64, y: f64, _pc: f64) -> f64 {
        let err = self.direction * (r - y);

        let delta_u = self.kp * (err - self.prev_error)
            + self.ki * err * self.delta_time
            + self.kd * (err - 2.0 * self.prev_error + self.prev2_error) / self.delta_time;

        self.out = saturate(self.out + delta_u, self.min, self.max);

        self.prev2_error = self.prev_error;
        self.prev_error = err;
        self.sum_prev_errors += err;
        self.out
    }
}

/// `P = Kp*Direction*(α*r - y)`; dedicated integrator accumulates `Δt*err`;
/// `D = Kd*((1-β)*r - y - prevErr)/Δt`.
#[derive(Debug)]
pub struct SetPointWeighting {
    kp: f64,
    ki: f64,
    kd: f64,
    direction: f64,
    delta_time: f64,
    min: f64,
    max: f64,
    prev_error: f64,
    sum_prev_errors: f64,
    out: f64,
    alfa: f64,
    beta: f64,
    integrator: f64,
}

impl SetPointWeighting {
    pub fn new(p: &AllParameters) -> Self {
        SetPointWeighting {
            kp: p.kp,
            ki: p.ki,
            kd: p.kd,
            direction: p.direction,
            delta_time: p.delta_time,
            min: p.min,
            max: p.max,
            prev_error: 0.0,
            sum_prev_errors: 0.0,
            out: 0.0,
            alfa: p.alfa,
            beta: p.beta,
            integrator: 0.0,
        }
    }
}

impl Controller for SetPointWeighting {
    fn update(&mut self, r: f64, y: f64, _pc: f64) -> f64 {
        let err = self.direction * (r - y);

        let proportional = self.kp * self.direction * (self.alfa * r - y);

        self.integrator += self.delta_time * err;
        let integrator = self.integrator * self.ki;

        let differentiator =
            self.kd * ((1.0 - self.beta) * r - y - self.prev_error) / self.delta_time;

        self.out = saturate(proportional + integrator + differentiator, self.min, self.max);

        self.prev_error = err;
        self.sum_prev_errors += err;
        self.out
    }
}

/// `D = Kd*(α*(err-prevErr)/Δt + (1-α)*prevD)`, retaining `prevD` across ticks.
#[derive(Debug)]
pub struct SmoothingPid {
    kp: f64,
    ki: f64,
    kd: f64,
    direction: f64,
    delta_time: f64,
    min: f64,
    max: f64,
    prev_error: f64,
    sum_prev_errors: f64,
    out: f64,
    alfa: f64,
    prev_differentiator: f64,
}

impl SmoothingPid {
    pub fn new(p: &AllParameters) -> Self {
        SmoothingPid {
            kp: p.kp,
            ki: p.ki,
            kd: p.kd,
            direction: p.direction,
            delta_time: p.delta_time,
            min: p.min,
            max: p.max,
            prev_error: 0.0,
            sum_prev_errors: 0.0,
            out: 0.0,
            alfa: p.alfa,
            prev_differentiator: 0.0,
        }
    }
}

impl Controller for SmoothingPid {
    fn update(&mut self, r: f64, y: f64, _pc: f64) -> f64 {
        let err = self.direction * (r - y);

        let proportional = self.kp * err;
        let integrator = (self.sum_prev_errors + err) * self.ki * self.delta_time;

        let differentiator = self.kd
            * (self.alfa * (err - self.prev_error) / self.delta_time
                + (1.0 - self.alfa) * self.prev_differentiator);
        self.prev_differentiator = differentiator;

        self.out = saturate(proportional + integrator + differentiator, self.min, self.max);

        self.prev_error = err;
        self.sum_prev_errors += err;
        self.out
    }
}
