//! Sampler / loop driver.
//!
//! Split into a pure, synchronously testable state machine ([`Loop`],
//! advanced by [`Loop::on_delivery`] / [`Loop::on_tick`]) and an async
//! driver ([`drive_closed_loop`] etc.) that owns the [`Broker`] and
//! multiplexes delivery vs. tick with `tokio::select! { biased; ... }`:
//! the delivery branch is listed first, so a tick observed simultaneously
//! with a pending delivery runs only after that delivery's ack+count
//! completes.

use std::time::Duration;

use tracing::{debug, info};

use crate::broker::Broker;
use crate::controllers::Controller;
use crate::errors::{AppError, BrokerError};
use crate::parameters::AllParameters;
use crate::shared::WARMUP_MESSAGES;
use crate::sink::SampleSink;

/// One emitted row: the window in force during the measurement interval,
/// the rate observed over it, and the setpoint active at the time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub pc: f64,
    pub rate: f64,
    pub setpoint: u64,
}

/// Pure, controller-driving state machine for the two controller-bearing
/// modes (`ClosedLoop`, `ExperimentClosedLoop`). Owns the counter `n`, the
/// in-force window `pc`, and the setpoint schedule position; advancing it
/// has no side effects beyond its own fields, which is what makes it
/// synchronously testable without a broker.
pub struct Loop {
    controller: Box<dyn Controller>,
    pc: f64,
    n: u64,
    monitor_time: f64,
    set_points: Vec<u64>,
    sample_size_per_level: u64,
    current_level: usize,
    current_sample: u64,
    /// `true` for `ExperimentClosedLoop` (schedule advances and the loop
    /// terminates); `false` for `ClosedLoop` (schedule frozen at level 0,
    /// runs indefinitely).
    scheduled: bool,
}

impl Loop {
    pub fn new(controller: Box<dyn Controller>, params: &AllParameters, scheduled: bool) -> Self {
        Loop {
            controller,
            pc: params.pc.round(),
            n: 0,
            monitor_time: params.monitor_time,
            set_points: params.set_points.clone(),
            sample_size_per_level: params.sample_size_per_level.max(1),
            current_level: 0,
            current_sample: 0,
            scheduled,
        }
    }

    /// The window currently in force, e.g. for the loop's initial QoS
    /// application before the first tick.
    pub fn current_window(&self) -> f64 {
        self.pc
    }

    pub fn current_setpoint(&self) -> u64 {
        self.set_points[self.current_level]
    }

    /// Ack precedes counting at the driver layer; this only does the
    /// counting half.
    pub fn on_delivery(&mut self) {
        self.n += 1;
    }

    /// Advance one tick: compute the rate over the window that just
    /// closed, emit a sample for it, run the controller, advance the
    /// schedule. Returns the sample to emit (reflecting the *old* window)
    /// and the new window to apply to the broker, plus whether the
    /// schedule has now been exhausted.
    pub fn on_tick(&mut self) -> (Sample, f64, bool) {
        let rate = self.n as f64 / self.monitor_time;
        let setpoint = self.current_setpoint();
        let sample = Sample {
            pc: self.pc,
            rate,
            setpoint,
        };

        let new_pc = self
            .controller
            .update(setpoint as f64, rate, self.pc)
            .round();
        self.pc = new_pc;
        self.n = 0;

        let mut terminated = false;
        if self.scheduled {
            self.current_sample += 1;
            if self.current_sample >= self.sample_size_per_level {
                self.current_sample = 0;
                self.current_level += 1;
                if self.current_level >= self.set_points.len() {
                    terminated = true;
                }
            }
        }

        (sample, new_pc, terminated)
    }
}

/// Drain deliveries with ack only, no counting, no controller.
pub async fn drive_open_loop<B: Broker>(broker: &mut B) -> Result<(), BrokerError> {
    loop {
        match broker.next_delivery().await? {
            Some(delivery) => broker.ack(delivery.tag).await?,
            None => return Err(BrokerError::StreamClosed),
        }
    }
}

/// Drain deliveries with ack, additionally computing and logging `rate`
/// every tick; never touches the controller or prefetch. Counts each
/// delivery exactly once.
pub async fn drive_monitored_open_loop<B: Broker>(
    broker: &mut B,
    monitor_time: f64,
) -> Result<(), BrokerError> {
    let mut n: u64 = 0;
    let mut ticker = tokio::time::interval(Duration::from_secs_f64(monitor_time));
    ticker.tick().await; // first tick fires immediately; discard

    loop {
        tokio::select! {
            biased;
            delivery = broker.next_delivery() => {
                match delivery? {
                    Some(d) => {
                        broker.ack(d.tag).await?;
                        n += 1;
                    }
                    None => return Err(BrokerError::StreamClosed),
                }
            }
            _ = ticker.tick() => {
                let rate = n as f64 / monitor_time;
                debug!(rate, n, "monitored open-loop tick");
                n = 0;
            }
        }
    }
}

/// The controller-bearing modes: `ClosedLoop` (single fixed setpoint,
/// indefinite) and `ExperimentClosedLoop` (schedule advances, terminates
/// when exhausted). Both share this driver; `Loop::scheduled` picks the
/// behaviour.
///
/// Returns [`AppError`] rather than [`BrokerError`] because this driver
/// owns two distinct fatal-error sources: broker transport/ack/QoS
/// failures, and file-sink failures from the sample sink. Collapsing a
/// sink failure into a broker error variant would misdirect whoever reads
/// the diagnostic.
pub async fn drive_closed_loop<B: Broker>(
    broker: &mut B,
    queue_name: &str,
    mut state: Loop,
    sink: &mut SampleSink,
) -> Result<(), AppError> {
    broker.set_prefetch(state.current_window() as u32).await?;

    let mut ticker = tokio::time::interval(Duration::from_secs_f64(state.monitor_time));
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            delivery = broker.next_delivery() => {
                match delivery? {
                    Some(d) => {
                        broker.ack(d.tag).await?;
                        state.on_delivery();
                    }
                    None => return Err(BrokerError::StreamClosed.into()),
                }
            }
            _ = ticker.tick() => {
                // observational; a failed inspect is still treated as fatal.
                let _depth = broker.queue_depth(queue_name).await?;

                let (sample, new_pc, terminated) = state.on_tick();
                sink.write_sample(&sample)?;
                sink.flush()?;

                // prefetch applied *after* the sample is emitted, so the
                // sample reflects the window in force during the interval
                // that was just measured.
                broker.set_prefetch(new_pc as u32).await?;

                if terminated {
                    info!("setpoint schedule exhausted, terminating");
                    return Ok(());
                }
            }
        }
    }
}

/// Optional pre-roll: temporarily set prefetch to 0, drain
/// [`WARMUP_MESSAGES`] deliveries, then restore `round(pc0)`.
pub async fn warmup<B: Broker>(broker: &mut B, pc0: f64) -> Result<(), BrokerError> {
    info!("beginning warm-up");
    broker.set_prefetch(0).await?;

    for _ in 0..WARMUP_MESSAGES {
        match broker.next_delivery().await? {
            Some(d) => broker.ack(d.tag).await?,
            None => return Err(BrokerError::StreamClosed),
        }
    }

    broker.set_prefetch(pc0.round() as u32).await?;
    info!("warm-up complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers;
    use crate::parameters::RawParameters;

    fn experiment_params(set_points: Vec<u64>, sample_size: u64) -> AllParameters {
        let raw = RawParameters {
            controller_type: Some("BasicPID".to_string()),
            execution_type: Some("ExperimentClosedLoop".to_string()),
            kp: Some(1.0),
            min: Some(0.0),
            max: Some(1_000_000.0),
            pc: Some(10.0),
            monitor_time: Some(1.0),
            set_points: Some(set_points),
            sample_size_per_level: Some(sample_size),
            ..Default::default()
        };
        raw.finish().unwrap()
    }

    #[test]
    fn schedule_advances_after_l_samples_and_terminates_at_k_times_l() {
        let params = experiment_params(vec![100, 200], 3);
        let controller = controllers::build(&params.controller_type, &params).unwrap();
        let mut state = Loop::new(controller, &params, true);

        let mut setpoints_seen = Vec::new();
        let mut terminated_at = None;
        for i in 0..10 {
            let (sample, _new_pc, terminated) = state.on_tick();
            setpoints_seen.push(sample.setpoint);
            if terminated {
                terminated_at = Some(i);
                break;
            }
        }

        assert_eq!(terminated_at, Some(5)); // 0-indexed: 6th tick (i=5) terminates
        assert_eq!(setpoints_seen, vec![100, 100, 100, 200, 200, 200]);
    }

    #[test]
    fn rate_is_n_over_monitor_time_seconds() {
        let params = experiment_params(vec![10], 100);
        let controller = controllers::build(&params.controller_type, &params).unwrap();
        let mut state = Loop::new(controller, &params, true);

        for _ in 0..7 {
            state.on_delivery();
        }
        let (sample, _, _) = state.on_tick();
        assert!((sample.rate - 7.0).abs() < 1e-9);
    }

    // Sample reflects the window that was in force *before* this tick's
    // controller update, not the freshly computed one.
    #[test]
    fn sample_window_precedes_controller_update() {
        let params = experiment_params(vec![10], 100);
        let controller = controllers::build(&params.controller_type, &params).unwrap();
        let mut state = Loop::new(controller, &params, true);

        let (first_sample, new_pc, _) = state.on_tick();
        assert_eq!(first_sample.pc, 10.0); // the initial PC, unchanged by this tick

        let (second_sample, _, _) = state.on_tick();
        assert_eq!(second_sample.pc, new_pc); // reflects the window the first tick produced
    }

    #[test]
    fn counter_resets_after_each_tick() {
        let params = experiment_params(vec![10], 100);
        let controller = controllers::build(&params.controller_type, &params).unwrap();
        let mut state = Loop::new(controller, &params, true);

        state.on_delivery();
        state.on_delivery();
        let (first, ..) = state.on_tick();
        assert!((first.rate - 2.0).abs() < 1e-9);

        // no deliveries before the next tick -> rate 0
        let (second, ..) = state.on_tick();
        assert!((second.rate - 0.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn async_driver_terminates_when_schedule_exhausts() {
        use crate::broker::test_support::InMemoryBroker;

        // Near-zero monitor time so the test completes quickly; the tick
        // interval is a wall-clock detail, not part of the state machine
        // under test.
        let mut params = experiment_params(vec![5], 2);
        params.monitor_time = 0.01;
        let controller = controllers::build(&params.controller_type, &params).unwrap();
        let state = Loop::new(controller, &params, true);

        let mut broker = InMemoryBroker::new();
        for _ in 0..20 {
            broker.push_message(vec![0u8; 8]);
        }

        let dir = std::env::temp_dir();
        let path = dir.join(format!(
            "prefetch-ctl-driver-test-{}.csv",
            std::process::id()
        ));
        let mut sink = SampleSink::create(&path).unwrap();

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            drive_closed_loop(&mut broker, "queue", state, &mut sink),
        )
        .await;

        assert!(result.is_ok(), "driver did not terminate in time");
        assert!(result.unwrap().is_ok());
        assert!(!broker.prefetch_history.is_empty());

        std::fs::remove_file(&path).ok();
    }
}
