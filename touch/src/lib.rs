#![cfg_attr(not(test), no_std)]

pub mod console;
pub mod driver;
pub mod error;
pub mod filter;
pub mod pad;
pub mod sampler;
pub mod task;

#[cfg(feature = "esp32")]
pub mod esp32;
#[cfg(feature = "esp32s2")]
pub mod esp32s2;

#[cfg(test)]
mod testing;

pub use error::TouchError;
pub use pad::PadId;

use driver::{
    Attenuation, DenoiseCap, DenoiseConfig, DenoiseGrade, HighVoltage, LowVoltage, VoltageConfig,
};

/// Configuration for touch pad initialization and the read loop
#[derive(Clone, Copy, Debug)]
pub struct SamplerConfig {
    /// Report a filtered count next to each raw count. Only used by the classic controller.
    pub filter_mode: bool,
    /// Period of the IIR filter update, in milliseconds
    pub filter_period_ms: u32,
    /// Time slept after each sweep over the pad table, in milliseconds
    pub sweep_period_ms: u32,
    /// One-time wait before the first sweep on controllers running a timer-triggered FSM,
    /// in milliseconds
    pub settle_ms: u32,
    /// Charge / discharge reference voltages for the classic controller
    pub voltage: VoltageConfig,
    /// Denoise channel settings for the denoise-capable controller
    pub denoise: DenoiseConfig,
}

impl SamplerConfig {
    pub const fn default() -> Self {
        Self {
            filter_mode: true,
            filter_period_ms: 10,
            sweep_period_ms: 200,
            settle_ms: 100,
            // High reference 2.7V - 1V = 1.7V, low reference 0.5V.
            // The larger the range, the larger the pulse count value.
            voltage: VoltageConfig {
                high: HighVoltage::V2_7,
                low: LowVoltage::V0_5,
                atten: Attenuation::V1_0,
            },
            denoise: DenoiseConfig {
                grade: DenoiseGrade::Bit4,
                cap_level: DenoiseCap::L7,
            },
        }
    }
}

pub const DEFAULT_SAMPLER_CONFIG: SamplerConfig = SamplerConfig::default();
