//! The periodic touch pad read loop.
//!
//! `SamplingTask` runs the sampler's one-time setup, waits for the controller
//! to settle, prints the format header and then sweeps the pad table once per
//! period. It only sleeps between sweeps; reads and console writes never block
//! on anything else.

use core::fmt::Write;
use core::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::delay::DelayNs;

use crate::sampler::TouchSampler;
use crate::SamplerConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskState {
    /// Hardware setup has not run yet
    Initializing,
    /// Sweeping the pad table. Only left when a stop is requested.
    Sampling,
}

/// Request for a running [`SamplingTask`] to return after its current sweep
pub struct StopToken {
    stop: AtomicBool,
}

impl StopToken {
    pub const fn new() -> Self {
        Self {
            stop: AtomicBool::new(false),
        }
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }
}

pub struct SamplingTask<S, D> {
    sampler: S,
    delay: D,
    period_ms: u32,
    state: TaskState,
    sweeps: u32,
}

impl<S: TouchSampler, D: DelayNs> SamplingTask<S, D> {
    pub fn new(sampler: S, delay: D, config: &SamplerConfig) -> Self {
        Self {
            sampler,
            delay,
            period_ms: config.sweep_period_ms,
            state: TaskState::Initializing,
            sweeps: 0,
        }
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Number of completed sweeps
    pub fn sweeps(&self) -> u32 {
        self.sweeps
    }

    #[cfg(test)]
    pub fn sampler(&self) -> &S {
        &self.sampler
    }

    #[cfg(test)]
    pub fn delay(&self) -> &D {
        &self.delay
    }

    /// Configure the hardware, wait for it to settle and print the header.
    ///
    /// Only the first call has any effect.
    pub fn start<W: Write>(&mut self, out: &mut W) {
        if self.state != TaskState::Initializing {
            return;
        }

        self.sampler.configure();

        let settle_ms = self.sampler.settle_ms();
        if settle_ms > 0 {
            self.delay.delay_ms(settle_ms);
        }

        out.write_str(self.sampler.header()).ok();
        self.state = TaskState::Sampling;
        log::info!(
            "Sampling {} touch pads every {} ms",
            self.sampler.pads().len(),
            self.period_ms
        );
    }

    /// Read every pad once, print the line and sleep for one period
    pub fn sweep<W: Write>(&mut self, out: &mut W) {
        self.sampler.write_sweep(out).ok();
        out.write_char('\n').ok();
        self.sweeps = self.sweeps.wrapping_add(1);
        self.delay.delay_ms(self.period_ms);
    }

    /// Sweep until `stop` is requested. The token is checked before every sweep.
    pub fn run<W: Write>(&mut self, out: &mut W, stop: &StopToken) {
        self.start(out);
        while !stop.is_stop_requested() {
            self.sweep(out);
        }
        log::info!("Touch pad sampling stopped after {} sweeps", self.sweeps);
    }

    pub fn run_forever<W: Write>(mut self, out: &mut W) -> ! {
        self.start(out);
        loop {
            self.sweep(out);
        }
    }
}

#[cfg(test)]
pub mod test {
    use std::sync::Arc;

    use super::*;
    use crate::pad::{all_pads, DENOISE_PADS};
    use crate::sampler::{ClassicSampler, DenoiseSampler, DENOISE_HEADER, FILTER_HEADER, NORMAL_HEADER};
    use crate::testing::{FakeDelay, FakeDriver};
    use crate::DEFAULT_SAMPLER_CONFIG;

    fn classic_task<const N: usize>(
        filter_mode: bool,
        raw: u32,
        filtered: u32,
        delay: FakeDelay,
    ) -> SamplingTask<ClassicSampler<FakeDriver, N>, FakeDelay> {
        let config = SamplerConfig {
            filter_mode,
            ..DEFAULT_SAMPLER_CONFIG
        };
        let sampler = ClassicSampler::new(FakeDriver::new(raw, filtered), all_pads::<N>(), &config);
        SamplingTask::new(sampler, delay, &config)
    }

    #[test]
    fn test_filtered_line() {
        let mut task = classic_task::<4>(true, 5, 7, FakeDelay::default());
        let mut out = String::new();
        task.start(&mut out);
        assert_eq!(out, FILTER_HEADER);

        out.clear();
        task.sweep(&mut out);
        assert_eq!(out, "T0:[   5,   7] T1:[   5,   7] T2:[   5,   7] T3:[   5,   7] \n");
    }

    #[test]
    fn test_normal_line() {
        let mut task = classic_task::<2>(false, 9, 0, FakeDelay::default());
        let mut out = String::new();
        task.start(&mut out);
        assert_eq!(out, NORMAL_HEADER);

        out.clear();
        task.sweep(&mut out);
        assert_eq!(out, "T0:[   9] T1:[   9] \n");
    }

    #[test]
    fn test_sweep_period_is_fixed() {
        let stop = Arc::new(StopToken::new());
        let mut task = classic_task::<10>(true, 1, 1, FakeDelay::stopping_after(3, stop.clone()));
        task.run(&mut String::new(), &stop);
        assert_eq!(task.delay().delays_ms, vec![200, 200, 200]);

        let stop = Arc::new(StopToken::new());
        let mut task = classic_task::<1>(false, 1, 1, FakeDelay::stopping_after(3, stop.clone()));
        task.run(&mut String::new(), &stop);
        assert_eq!(task.delay().delays_ms, vec![200, 200, 200]);
    }

    #[test]
    fn test_classic_has_no_settle_wait() {
        let mut task = classic_task::<2>(true, 1, 1, FakeDelay::default());
        task.start(&mut String::new());
        assert!(task.delay().delays_ms.is_empty());
    }

    #[test]
    fn test_denoise_settles_once() {
        let stop = Arc::new(StopToken::new());
        let sampler = DenoiseSampler::new(FakeDriver::new(3, 0), DENOISE_PADS, &DEFAULT_SAMPLER_CONFIG);
        let mut task = SamplingTask::new(
            sampler,
            FakeDelay::stopping_after(4, stop.clone()),
            &DEFAULT_SAMPLER_CONFIG,
        );
        let mut out = String::new();
        task.run(&mut out, &stop);

        assert_eq!(task.delay().delays_ms, vec![100, 200, 200, 200]);
        assert_eq!(task.sweeps(), 3);
        assert!(out.starts_with(DENOISE_HEADER));

        let lines: Vec<&str> = out[DENOISE_HEADER.len()..].lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("T1: [   3] T2: [   3] "));
        assert!(lines[0].ends_with("T14: [   3] "));
    }

    #[test]
    fn test_start_runs_once() {
        let mut task = classic_task::<2>(true, 1, 1, FakeDelay::default());
        let mut out = String::new();
        task.start(&mut out);
        let calls = task.sampler().driver().calls.len();

        task.start(&mut out);
        assert_eq!(task.sampler().driver().calls.len(), calls, "Hardware was configured twice");
        assert_eq!(out, FILTER_HEADER);
    }

    #[test]
    fn test_state_transitions() {
        let mut task = classic_task::<2>(true, 1, 1, FakeDelay::default());
        assert_eq!(task.state(), TaskState::Initializing);
        task.start(&mut String::new());
        assert_eq!(task.state(), TaskState::Sampling);
    }

    #[test]
    fn test_still_sampling_after_k_sweeps() {
        for k in [1usize, 5, 20] {
            let stop = Arc::new(StopToken::new());
            let mut task = classic_task::<3>(false, 4, 0, FakeDelay::stopping_after(k, stop.clone()));
            let mut out = String::new();
            task.run(&mut out, &stop);

            assert_eq!(task.sweeps() as usize, k);
            assert_eq!(task.state(), TaskState::Sampling);

            // Nothing was torn down, so the next sweep goes ahead as usual
            task.sweep(&mut out);
            assert_eq!(task.sweeps() as usize, k + 1);
            assert_eq!(out[NORMAL_HEADER.len()..].lines().count(), k + 1);
        }
    }

    #[test]
    fn test_stop_before_first_sweep() {
        let stop = StopToken::new();
        stop.request_stop();
        let mut task = classic_task::<2>(true, 1, 1, FakeDelay::default());
        let mut out = String::new();
        task.run(&mut out, &stop);

        assert_eq!(task.sweeps(), 0);
        assert_eq!(out, FILTER_HEADER);
    }
}
