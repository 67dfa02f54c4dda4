//! Register level driver for the touch sensor of the ESP32-S2.
//!
//! The S2 controller scans pads 1 to 14 on its own once its FSM is started in
//! timer mode, and keeps a denoise channel on pad 0 that is subtracted from
//! every measurement. As with [`crate::esp32`], the RTC_CNTL, SENS and RTC_IO
//! blocks are accessed through the PAC directly.

use ::esp32s2 as pac;

use crate::driver::{DenoiseConfig, DenoiseTouchDriver, FsmMode, TouchDriver};
use crate::{PadId, TouchError};

/// Charge / discharge cycles per measurement
const MEASURE_TIMES: u16 = 500;
/// Cycles of the 150kHz clock between two scans
const SLEEP_CYCLES: u16 = 0xf;
const XPD_WAIT_CYCLES: u8 = 0xff;
/// Enable bits of the denoise channel and the 14 pads
const CHANNEL_MASK: u16 = 0x7fff;
/// `touch_data_sel` value selecting raw counts in the status registers
const DATA_SEL_RAW: u8 = 0;

/// Pad 0 is the denoise channel
const PAD_MIN: u8 = 1;
const PAD_MAX: u8 = 14;

fn rtc_cntl() -> &'static pac::rtc_cntl::RegisterBlock {
    unsafe { &*pac::RTC_CNTL::ptr() }
}

fn sens() -> &'static pac::sens::RegisterBlock {
    unsafe { &*pac::SENS::ptr() }
}

fn rtc_io() -> &'static pac::rtc_io::RegisterBlock {
    unsafe { &*pac::RTC_IO::ptr() }
}

pub struct Esp32s2Touch {
    /// Bit mask of configured pads, by pad number
    configured: u16,
}

impl Esp32s2Touch {
    pub const fn new() -> Self {
        Self { configured: 0 }
    }

    fn check_pad(pad: PadId) -> Result<usize, TouchError> {
        if (PAD_MIN..=PAD_MAX).contains(&pad.0) {
            Ok(pad.index())
        } else {
            Err(TouchError::InvalidPad(pad))
        }
    }

    fn enable_channels(mask: u16) {
        let mask = mask & CHANNEL_MASK;
        sens()
            .sar_touch_conf()
            .modify(|r, w| unsafe { w.touch_outen().bits(r.touch_outen().bits() | mask) });
        rtc_cntl().touch_scan_ctrl().modify(|r, w| unsafe {
            w.touch_scan_pad_map().bits(r.touch_scan_pad_map().bits() | mask)
        });
    }
}

impl TouchDriver for Esp32s2Touch {
    type Error = TouchError;

    fn init(&mut self) -> Result<(), TouchError> {
        let rtc_cntl = rtc_cntl();

        rtc_cntl.touch_ctrl2().modify(|_, w| {
            w.touch_clkgate_en().set_bit();
            w.touch_reset().set_bit()
        });
        rtc_cntl.touch_ctrl2().modify(|_, w| w.touch_reset().clear_bit());

        rtc_cntl.touch_ctrl1().modify(|_, w| unsafe {
            w.touch_meas_num().bits(MEASURE_TIMES);
            w.touch_sleep_cycles().bits(SLEEP_CYCLES)
        });
        rtc_cntl
            .touch_ctrl2()
            .modify(|_, w| unsafe { w.touch_xpd_wait().bits(XPD_WAIT_CYCLES) });

        // Idle pads are grounded, every channel off
        rtc_cntl.touch_scan_ctrl().modify(|_, w| unsafe {
            w.touch_inactive_connection().set_bit();
            w.touch_scan_pad_map().bits(0)
        });
        sens().sar_touch_conf().modify(|_, w| unsafe { w.touch_outen().bits(0) });

        // Software trigger mode
        rtc_cntl.touch_ctrl2().modify(|_, w| {
            w.touch_start_force().set_bit();
            w.touch_slp_timer_en().clear_bit()
        });

        self.configured = 0;
        Ok(())
    }

    fn config_pad(&mut self, pad: PadId) -> Result<(), TouchError> {
        let num = Self::check_pad(pad)?;
        rtc_io().touch_pad(num).modify(|_, w| {
            w.xpd().set_bit();
            w.tie_opt().clear_bit()
        });
        Self::enable_channels(1 << num);
        self.configured |= 1 << num;
        Ok(())
    }

    fn set_threshold(&mut self, pad: PadId, threshold: u32) -> Result<(), TouchError> {
        let num = Self::check_pad(pad)?;
        let th = threshold.min(Self::THRESHOLD_MAX);
        sens()
            .sar_touch_thres(num - 1)
            .modify(|_, w| unsafe { w.touch_out_th().bits(th) });
        Ok(())
    }

    fn read_raw(&mut self, pad: PadId) -> Result<u32, TouchError> {
        let num = Self::check_pad(pad)?;
        let sens = sens();
        sens.sar_touch_conf()
            .modify(|_, w| unsafe { w.touch_data_sel().bits(DATA_SEL_RAW) });
        Ok(sens.sar_touch_status(num - 1).read().touch_pad_data().bits())
    }
}

impl DenoiseTouchDriver for Esp32s2Touch {
    const THRESHOLD_MAX: u32 = 0x001f_ffff;

    fn denoise_set_config(&mut self, config: DenoiseConfig) -> Result<(), TouchError> {
        let rtc_cntl = rtc_cntl();
        rtc_cntl
            .touch_scan_ctrl()
            .modify(|_, w| unsafe { w.touch_denoise_res().bits(config.grade as u8) });
        rtc_cntl
            .touch_ctrl2()
            .modify(|_, w| unsafe { w.touch_refc().bits(config.cap_level as u8) });
        Ok(())
    }

    fn denoise_enable(&mut self) -> Result<(), TouchError> {
        rtc_cntl()
            .touch_scan_ctrl()
            .modify(|_, w| w.touch_denoise_en().set_bit());
        // The denoise channel is scanned like any other pad
        Self::enable_channels(1);
        Ok(())
    }

    fn fsm_start(&mut self, mode: FsmMode) -> Result<(), TouchError> {
        let ctrl2 = rtc_cntl().touch_ctrl2();
        match mode {
            FsmMode::Timer => {
                ctrl2.modify(|_, w| {
                    w.touch_start_force().clear_bit();
                    w.touch_slp_timer_en().set_bit()
                });
            }
            FsmMode::Software => {
                ctrl2.modify(|_, w| {
                    w.touch_start_force().set_bit();
                    w.touch_slp_timer_en().clear_bit()
                });
                ctrl2.modify(|_, w| w.touch_start_en().set_bit());
                ctrl2.modify(|_, w| w.touch_start_en().clear_bit());
            }
        }
        Ok(())
    }
}
