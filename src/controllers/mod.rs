//! Controller contract and factory.
//!
//! Nine variants share the two-operation contract (`Initialise` folded into
//! construction, `Update`); each variant's update body differs in
//! non-trivial structure, so this is a closed sum dispatched through a
//! trait object rather than one generic PID superclass.

mod astar;
mod fuzzy;
mod hpa;
mod pid;

pub use astar::Astar;
pub use fuzzy::FuzzyController;
pub use hpa::Hpa;
pub use pid::{
    BasicPid, DeadzonePid, ErrorSquareFull, ErrorSquareProportional, IncrementalPid,
    SetPointWeighting, SmoothingPid,
};

use crate::errors::ConfigError;
use crate::parameters::AllParameters;
use crate::shared;

/// Every controller saturates its output to `[Min, Max]` before returning
/// and mutates its own private state; no controller is thread-safe and a
/// single loop owns one instance.
pub trait Controller: std::fmt::Debug {
    /// `Update(setpoint r, measured y, currentWindow pc) -> newWindow u`.
    fn update(&mut self, setpoint: f64, measured: f64, current_window: f64) -> f64;
}

/// Name -> fresh zeroed controller instance. Unknown names fail fast.
pub fn build(controller_type: &str, params: &AllParameters) -> Result<Box<dyn Controller>, ConfigError> {
    match controller_type {
        shared::BASIC_PID => Ok(Box::new(BasicPid::new(params))),
        shared::DEADZONE_PID => Ok(Box::new(DeadzonePid::new(params))),
        shared::ERROR_SQUARE_FULL => Ok(Box::new(ErrorSquareFull::new(params))),
        shared::ERROR_SQUARE_PROPORTIONAL => Ok(Box::new(ErrorSquareProportional::new(params))),
        shared::INCREMENTAL_PID => Ok(Box::new(IncrementalPid::new(params))),
        shared::SETPOINT_WEIGHTING => Ok(Box::new(SetPointWeighting::new(params))),
        shared::SMOOTHING_PID => Ok(Box::new(SmoothingPid::new(params))),
        shared::HPA => Ok(Box::new(Hpa::new(params))),
        shared::ASTAR => Ok(Box::new(Astar::new(params))),
        shared::FUZZY_CONTROLLER => Ok(Box::new(FuzzyController::new(params))),
        shared::CONGYING_2008 => Err(ConfigError::Unsupported(
            controller_type.to_string(),
            "omitted: the upstream Congying-2008 controller is syntactically broken \
             (undefined `de` term) and its contract was never finished",
        )),
        other => Err(ConfigError::UnknownController(other.to_string())),
    }
}
