//! Per-controller initialization and sweep formatting.
//!
//! A [`TouchSampler`] owns the touch driver. `configure` is the one-time
//! hardware setup, and `write_sweep` reads every pad of its table in order and
//! writes one segment per pad. Driver statuses are discarded: a failed read is
//! printed as 0, in the same format as any other count.

use core::fmt::{self, Write};

use crate::driver::{
    ClassicTouchDriver, DenoiseConfig, DenoiseTouchDriver, FsmMode, VoltageConfig,
    THRESHOLD_NO_USE,
};
use crate::{PadId, SamplerConfig};

pub const FILTER_HEADER: &str =
    "Touch Sensor filter mode read, the output format is: \nTouchpad num:[raw data, filtered data]\n\n";
pub const NORMAL_HEADER: &str =
    "Touch Sensor normal mode read, the output format is: \nTouchpad num:[raw data]\n\n";
pub const DENOISE_HEADER: &str =
    "Touch Sensor read, the output format is: \nTouchpad num:[raw data]\n\n";

pub trait TouchSampler {
    /// One-time hardware setup. Must run before the first sweep.
    fn configure(&mut self);

    /// Pads read on each sweep, in order
    fn pads(&self) -> &[PadId];

    /// Description of the column format, printed once before sampling starts
    fn header(&self) -> &'static str;

    /// Time the controller needs after `configure` before counts are meaningful
    fn settle_ms(&self) -> u32 {
        0
    }

    /// Read every pad once and write its segment. The line terminator is left to the caller.
    fn write_sweep<W: Write>(&mut self, out: &mut W) -> fmt::Result;
}

/// Sampler for the classic controller: software triggered, all pads, optional filtered counts
pub struct ClassicSampler<D, const N: usize> {
    driver: D,
    pads: [PadId; N],
    filter_mode: bool,
    filter_period_ms: u32,
    voltage: VoltageConfig,
}

impl<D: ClassicTouchDriver, const N: usize> ClassicSampler<D, N> {
    pub fn new(driver: D, pads: [PadId; N], config: &SamplerConfig) -> Self {
        Self {
            driver,
            pads,
            filter_mode: config.filter_mode,
            filter_period_ms: config.filter_period_ms,
            voltage: config.voltage,
        }
    }

    #[cfg(test)]
    pub fn driver(&self) -> &D {
        &self.driver
    }
}

impl<D: ClassicTouchDriver, const N: usize> TouchSampler for ClassicSampler<D, N> {
    fn configure(&mut self) {
        log::debug!("Initializing classic touch controller");
        self.driver.init().ok();
        self.driver.set_voltage(self.voltage).ok();
        for pad in self.pads {
            self.driver.config_pad(pad).ok();
            self.driver.set_threshold(pad, THRESHOLD_NO_USE).ok();
        }
        if self.filter_mode {
            log::debug!("Starting touch filter, period {} ms", self.filter_period_ms);
            self.driver.filter_start(self.filter_period_ms).ok();
        }
        log::info!("Touch pads configured: {}", N);
    }

    fn pads(&self) -> &[PadId] {
        &self.pads
    }

    fn header(&self) -> &'static str {
        if self.filter_mode {
            FILTER_HEADER
        } else {
            NORMAL_HEADER
        }
    }

    fn write_sweep<W: Write>(&mut self, out: &mut W) -> fmt::Result {
        for pad in self.pads {
            let raw = self.driver.read_raw(pad).unwrap_or(0);
            if self.filter_mode {
                let filtered = self.driver.read_filtered(pad).unwrap_or(0);
                write!(out, "T{}:[{:4},{:4}] ", pad, raw, filtered)?;
            } else {
                write!(out, "T{}:[{:4}] ", pad, raw)?;
            }
        }
        Ok(())
    }
}

/// Sampler for the denoise-capable controller: fixed pad table, timer-driven FSM
pub struct DenoiseSampler<D, const N: usize> {
    driver: D,
    pads: [PadId; N],
    denoise: DenoiseConfig,
    settle_ms: u32,
}

impl<D: DenoiseTouchDriver, const N: usize> DenoiseSampler<D, N> {
    pub fn new(driver: D, pads: [PadId; N], config: &SamplerConfig) -> Self {
        Self {
            driver,
            pads,
            denoise: config.denoise,
            settle_ms: config.settle_ms,
        }
    }

    #[cfg(test)]
    pub fn driver(&self) -> &D {
        &self.driver
    }
}

impl<D: DenoiseTouchDriver, const N: usize> TouchSampler for DenoiseSampler<D, N> {
    fn configure(&mut self) {
        log::debug!("Initializing denoise touch controller");
        self.driver.init().ok();
        for pad in self.pads {
            self.driver.config_pad(pad).ok();
            self.driver.set_threshold(pad, D::THRESHOLD_MAX).ok();
        }

        self.driver.denoise_set_config(self.denoise).ok();
        self.driver.denoise_enable().ok();
        log::info!("Denoise function init");

        self.driver.fsm_start(FsmMode::Timer).ok();
        log::info!("Touch pads configured: {}", N);
    }

    fn pads(&self) -> &[PadId] {
        &self.pads
    }

    fn header(&self) -> &'static str {
        DENOISE_HEADER
    }

    fn settle_ms(&self) -> u32 {
        self.settle_ms
    }

    fn write_sweep<W: Write>(&mut self, out: &mut W) -> fmt::Result {
        for pad in self.pads {
            let raw = self.driver.read_raw(pad).unwrap_or(0);
            write!(out, "T{}: [{:4}] ", pad, raw)?;
        }
        Ok(())
    }
}
