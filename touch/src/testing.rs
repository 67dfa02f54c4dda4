//! Recording fakes for the driver and delay boundaries.

use std::sync::Arc;

use embedded_hal::delay::DelayNs;

use crate::driver::{
    ClassicTouchDriver, DenoiseConfig, DenoiseTouchDriver, FsmMode, TouchDriver, VoltageConfig,
};
use crate::task::StopToken;
use crate::{PadId, TouchError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Call {
    Init,
    ConfigPad(PadId),
    SetThreshold(PadId, u32),
    ReadRaw(PadId),
    SetVoltage(VoltageConfig),
    FilterStart(u32),
    ReadFiltered(PadId),
    DenoiseSetConfig(DenoiseConfig),
    DenoiseEnable,
    FsmStart(FsmMode),
}

pub struct FakeDriver {
    pub calls: Vec<Call>,
    pub raw: u32,
    /// Added to `raw` once per pad index, so reads can be told apart
    pub raw_step: u32,
    pub filtered: u32,
    pub fail_reads: bool,
    pub fail_config: bool,
}

impl FakeDriver {
    pub fn new(raw: u32, filtered: u32) -> Self {
        Self {
            calls: Vec::new(),
            raw,
            raw_step: 0,
            filtered,
            fail_reads: false,
            fail_config: false,
        }
    }

    fn record(&mut self, call: Call) -> Result<(), TouchError> {
        self.calls.push(call);
        if self.fail_config {
            Err(TouchError::Timeout)
        } else {
            Ok(())
        }
    }
}

impl TouchDriver for FakeDriver {
    type Error = TouchError;

    fn init(&mut self) -> Result<(), TouchError> {
        self.record(Call::Init)
    }

    fn config_pad(&mut self, pad: PadId) -> Result<(), TouchError> {
        self.record(Call::ConfigPad(pad))
    }

    fn set_threshold(&mut self, pad: PadId, threshold: u32) -> Result<(), TouchError> {
        self.record(Call::SetThreshold(pad, threshold))
    }

    fn read_raw(&mut self, pad: PadId) -> Result<u32, TouchError> {
        self.calls.push(Call::ReadRaw(pad));
        if self.fail_reads {
            Err(TouchError::Timeout)
        } else {
            Ok(self.raw + self.raw_step * pad.0 as u32)
        }
    }
}

impl ClassicTouchDriver for FakeDriver {
    fn set_voltage(&mut self, voltage: VoltageConfig) -> Result<(), TouchError> {
        self.record(Call::SetVoltage(voltage))
    }

    fn filter_start(&mut self, period_ms: u32) -> Result<(), TouchError> {
        self.record(Call::FilterStart(period_ms))
    }

    fn read_filtered(&mut self, pad: PadId) -> Result<u32, TouchError> {
        self.calls.push(Call::ReadFiltered(pad));
        if self.fail_reads {
            Err(TouchError::NotReady)
        } else {
            Ok(self.filtered)
        }
    }
}

impl DenoiseTouchDriver for FakeDriver {
    const THRESHOLD_MAX: u32 = 0x1F_FFFF;

    fn denoise_set_config(&mut self, config: DenoiseConfig) -> Result<(), TouchError> {
        self.record(Call::DenoiseSetConfig(config))
    }

    fn denoise_enable(&mut self) -> Result<(), TouchError> {
        self.record(Call::DenoiseEnable)
    }

    fn fsm_start(&mut self, mode: FsmMode) -> Result<(), TouchError> {
        self.record(Call::FsmStart(mode))
    }
}

/// Records every delay in milliseconds. Optionally requests a stop once `stop_after` delays
/// have elapsed.
#[derive(Default)]
pub struct FakeDelay {
    pub delays_ms: Vec<u32>,
    pub stop_after: Option<(usize, Arc<StopToken>)>,
}

impl FakeDelay {
    pub fn stopping_after(count: usize, stop: Arc<StopToken>) -> Self {
        Self {
            delays_ms: Vec::new(),
            stop_after: Some((count, stop)),
        }
    }
}

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.delay_ms(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays_ms.push(ms);
        if let Some((count, stop)) = &self.stop_after {
            if self.delays_ms.len() >= *count {
                stop.request_stop();
            }
        }
    }
}
