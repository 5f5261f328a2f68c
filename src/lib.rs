//! Adaptive prefetch-window consumer: a closed-loop controller that tracks
//! a message-broker's delivery rate to a setpoint by adjusting the
//! consumer's flow-control window (prefetch count).

pub mod broker;
pub mod controllers;
pub mod defuzzifier;
pub mod errors;
pub mod loadgen;
pub mod membership;
pub mod parameters;
pub mod sampler;
pub mod shared;
pub mod sink;
