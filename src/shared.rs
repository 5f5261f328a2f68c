//! Small constants and name tables shared across the controller family and
//! the loop driver.

/// Number of deliveries drained (at prefetch 0, then restored) before the
/// loop starts measuring. See [`crate::sampler::warmup`].
pub const WARMUP_MESSAGES: u64 = 100_000;

pub const BASIC_PID: &str = "BasicPID";
pub const DEADZONE_PID: &str = "DeadzonePID";
pub const HPA: &str = "HPA";
pub const ASTAR: &str = "ASTAR";
pub const ERROR_SQUARE_FULL: &str = "ErrorSquareFull";
pub const ERROR_SQUARE_PROPORTIONAL: &str = "ErrorSquareProportional";
pub const INCREMENTAL_PID: &str = "IncrementalPID";
pub const SETPOINT_WEIGHTING: &str = "SetPointWeighting";
pub const SMOOTHING_PID: &str = "SmoothingPID";
pub const FUZZY_CONTROLLER: &str = "FuzzyController";

/// Recognised but intentionally unimplemented: this controller's update
/// law was never finished (it depends on an undefined `de` term). Kept as
/// a name so misconfiguration is diagnosed precisely instead of falling
/// through to "unknown controller".
pub const CONGYING_2008: &str = "Congying2008";

/// Execution modes the loop driver can be started in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    OpenLoop,
    MonitoredOpenLoop,
    ClosedLoop,
    ExperimentClosedLoop,
}

impl ExecutionMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "OpenLoop" => Some(Self::OpenLoop),
            "MonitoredOpenLoop" => Some(Self::MonitoredOpenLoop),
            "ClosedLoop" => Some(Self::ClosedLoop),
            "ExperimentClosedLoop" => Some(Self::ExperimentClosedLoop),
            _ => None,
        }
    }
}

/// Membership-function family selector for the fuzzy controller's input
/// fuzzification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipFamily {
    Triangular,
    Gaussian,
    Pi,
}

impl MembershipFamily {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Triangular" => Some(Self::Triangular),
            "Gaussian" => Some(Self::Gaussian),
            "Pi" => Some(Self::Pi),
            _ => None,
        }
    }
}
