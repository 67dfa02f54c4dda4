//! Driver boundary for the touch sensing controller.
//!
//! The sampling logic only talks to the hardware through these traits. Each
//! call reports a status, which callers are free to ignore; the register
//! backends in [`crate::esp32`] and [`crate::esp32s2`] implement them for real
//! silicon.

use crate::PadId;

/// Threshold value that leaves threshold-triggered detection unused
pub const THRESHOLD_NO_USE: u32 = 0;

/// Operations shared by every touch controller
pub trait TouchDriver {
    type Error: core::fmt::Debug;

    /// Bring up the touch controller. The measurement FSM is left in software trigger mode.
    fn init(&mut self) -> Result<(), Self::Error>;

    /// Route a pad to the touch controller and enable it for measurement
    fn config_pad(&mut self, pad: PadId) -> Result<(), Self::Error>;

    fn set_threshold(&mut self, pad: PadId, threshold: u32) -> Result<(), Self::Error>;

    /// Read the last raw count measured on a pad
    fn read_raw(&mut self, pad: PadId) -> Result<u32, Self::Error>;
}

/// Controller with configurable reference voltages and a filtered read-out
pub trait ClassicTouchDriver: TouchDriver {
    fn set_voltage(&mut self, voltage: VoltageConfig) -> Result<(), Self::Error>;

    /// Start updating the filtered counts every `period_ms`
    fn filter_start(&mut self, period_ms: u32) -> Result<(), Self::Error>;

    fn read_filtered(&mut self, pad: PadId) -> Result<u32, Self::Error>;
}

/// Controller with a denoise channel and a timer-driven measurement FSM
pub trait DenoiseTouchDriver: TouchDriver {
    /// Largest threshold the controller can represent
    const THRESHOLD_MAX: u32;

    fn denoise_set_config(&mut self, config: DenoiseConfig) -> Result<(), Self::Error>;

    fn denoise_enable(&mut self) -> Result<(), Self::Error>;

    fn fsm_start(&mut self, mode: FsmMode) -> Result<(), Self::Error>;
}

/// Upper charge reference voltage
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HighVoltage {
    V2_4 = 0b00,
    V2_5 = 0b01,
    V2_6 = 0b10,
    V2_7 = 0b11,
}

/// Lower discharge reference voltage
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LowVoltage {
    V0_5 = 0b00,
    V0_6 = 0b01,
    V0_7 = 0b10,
    V0_8 = 0b11,
}

/// Attenuation subtracted from the high reference voltage
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attenuation {
    V1_5 = 0b00,
    V1_0 = 0b01,
    V0_5 = 0b10,
    V0_0 = 0b11,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoltageConfig {
    pub high: HighVoltage,
    pub low: LowVoltage,
    pub atten: Attenuation,
}

/// Number of low bits cancelled by the denoise channel, chosen according to the noise level
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DenoiseGrade {
    Bit12 = 0,
    Bit10 = 1,
    Bit8 = 2,
    Bit4 = 3,
}

/// Internal reference capacitance of the denoise channel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DenoiseCap {
    /// 5.0pF
    L0 = 0,
    /// 6.4pF
    L1 = 1,
    /// 7.8pF
    L2 = 2,
    /// 9.2pF
    L3 = 3,
    /// 10.6pF
    L4 = 4,
    /// 12.0pF
    L5 = 5,
    /// 13.4pF
    L6 = 6,
    /// 14.8pF
    L7 = 7,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DenoiseConfig {
    pub grade: DenoiseGrade,
    pub cap_level: DenoiseCap,
}

/// What starts a measurement cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FsmMode {
    /// The controller measures on its own, paced by the sleep timer
    Timer,
    /// Each measurement is started by software
    Software,
}
