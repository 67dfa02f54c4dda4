//! Register level driver for the touch sensor of the classic ESP32.
//!
//! Like the rest of the RTC peripherals, the touch controller is spread over the
//! SENS and RTC_IO register blocks. `Esp32Touch` accesses them through the PAC
//! directly rather than taking a peripheral singleton from the HAL, so this
//! crate does not have to agree with the HAL on a PAC version. Nothing else in
//! a firmware using it should touch these registers.
//!
//! One software trigger makes the controller measure every enabled pad in turn,
//! and reads are served from a copy of the last completed scan.
//!
//! The controller has no smoothing of its own. Filtered counts come from an
//! [`IirFilter`] that is advanced by [`Esp32Touch::filter_tick`], which the
//! firmware calls from a periodic timer interrupt once the filter is started.
//! While the filter runs the tick owns the scans, and it never waits on the
//! hardware.

use ::esp32 as pac;

use crate::driver::{ClassicTouchDriver, TouchDriver, VoltageConfig};
use crate::filter::{IirFilter, FILTER_FACTOR};
use crate::pad::TOUCH_PAD_MAX;
use crate::{PadId, TouchError};

/// Cycles of the 8MHz clock spent measuring each pad, about 1ms
const MEASURE_CYCLES: u16 = 0x2000;
/// Cycles of the 150kHz clock between two timer triggered measurements
const SLEEP_CYCLES: u16 = 0x1000;
/// Cycles between powering a pad and starting its measurement
const XPD_WAIT_CYCLES: u8 = 0xff;
/// Charge / discharge slope
const PAD_SLOPE: u8 = 7;
/// Largest threshold the 16-bit threshold fields can hold
pub const THRESHOLD_MAX: u32 = 0xffff;

/// Polls of MEAS_DONE before a foreground scan is given up
const MEASURE_SPIN_LIMIT: u32 = 1_000_000;

/// Pads 8 and 9 are swapped in the register map
const fn reg_index(pad: usize) -> usize {
    match pad {
        8 => 9,
        9 => 8,
        other => other,
    }
}

fn sens() -> &'static pac::sens::RegisterBlock {
    unsafe { &*pac::SENS::ptr() }
}

fn rtc_io() -> &'static pac::rtc_io::RegisterBlock {
    unsafe { &*pac::RTC_IO::ptr() }
}

pub struct Esp32Touch {
    /// Bit mask of configured pads, by pad number
    configured: u16,
    /// Counts of the last completed scan, by pad number
    raw: [u32; TOUCH_PAD_MAX],
    /// Pads whose count in `raw` has not been read since that scan
    fresh: u16,
    /// A scan started by `filter_tick` has not been collected yet
    scanning: bool,
    filter: Option<IirFilter<TOUCH_PAD_MAX>>,
}

impl Esp32Touch {
    pub const fn new() -> Self {
        Self {
            configured: 0,
            raw: [0; TOUCH_PAD_MAX],
            fresh: 0,
            scanning: false,
            filter: None,
        }
    }

    /// Collect the scan started on the previous tick if it has finished, then
    /// start the next one. A scan still in progress is left alone.
    ///
    /// Does nothing until the filter has been started.
    pub fn filter_tick(&mut self) {
        if self.filter.is_none() {
            return;
        }
        if self.scanning {
            if !Self::scan_done() {
                return;
            }
            let raw = Self::read_outputs();
            self.filter_update(&raw);
        }
        Self::start_scan();
        self.scanning = true;
    }

    /// Feed one scan of raw counts, by pad number, to the filter. Counts of
    /// pads that are not configured are dropped.
    pub fn filter_update(&mut self, raw: &[u32; TOUCH_PAD_MAX]) {
        let Some(filter) = self.filter.as_mut() else {
            return;
        };
        for (pad, &count) in raw.iter().enumerate() {
            if self.configured & (1 << pad) != 0 {
                self.raw[pad] = count;
                filter.push(pad, count);
            }
        }
    }

    fn check_pad(pad: PadId) -> Result<usize, TouchError> {
        if pad.index() < TOUCH_PAD_MAX {
            Ok(pad.index())
        } else {
            Err(TouchError::InvalidPad(pad))
        }
    }

    fn start_scan() {
        let sens = sens();
        sens.sar_touch_ctrl2().modify(|_, w| w.touch_start_en().clear_bit());
        sens.sar_touch_ctrl2().modify(|_, w| w.touch_start_en().set_bit());
    }

    fn scan_done() -> bool {
        sens().sar_touch_ctrl2().read().touch_meas_done().bit_is_set()
    }

    /// Run one scan in the foreground and keep its counts
    fn scan(&mut self) -> Result<(), TouchError> {
        Self::start_scan();
        if !(0..MEASURE_SPIN_LIMIT).any(|_| Self::scan_done()) {
            return Err(TouchError::Timeout);
        }
        self.raw = Self::read_outputs();
        self.fresh = self.configured;
        Ok(())
    }

    /// Output field of every pad, by pad number
    fn read_outputs() -> [u32; TOUCH_PAD_MAX] {
        let mut raw = [0; TOUCH_PAD_MAX];
        for (pad, count) in raw.iter_mut().enumerate() {
            *count = Self::read_output(reg_index(pad));
        }
        raw
    }

    fn read_output(index: usize) -> u32 {
        let sens = sens();
        let count = match index {
            0 => sens.sar_touch_out1().read().touch_meas_out0().bits(),
            1 => sens.sar_touch_out1().read().touch_meas_out1().bits(),
            2 => sens.sar_touch_out2().read().touch_meas_out2().bits(),
            3 => sens.sar_touch_out2().read().touch_meas_out3().bits(),
            4 => sens.sar_touch_out3().read().touch_meas_out4().bits(),
            5 => sens.sar_touch_out3().read().touch_meas_out5().bits(),
            6 => sens.sar_touch_out4().read().touch_meas_out6().bits(),
            7 => sens.sar_touch_out4().read().touch_meas_out7().bits(),
            8 => sens.sar_touch_out5().read().touch_meas_out8().bits(),
            9 => sens.sar_touch_out5().read().touch_meas_out9().bits(),
            _ => 0,
        };
        count as u32
    }
}

impl TouchDriver for Esp32Touch {
    type Error = TouchError;

    fn init(&mut self) -> Result<(), TouchError> {
        let sens = sens();

        // No pads enabled until they are configured
        sens.sar_touch_enable().write(|w| unsafe { w.bits(0) });

        // Trigger when the count drops below threshold, on set 1
        sens.sar_touch_ctrl1().modify(|_, w| unsafe {
            w.touch_out_sel().clear_bit();
            w.touch_out_1en().set_bit();
            w.touch_meas_delay().bits(MEASURE_CYCLES);
            w.touch_xpd_wait().bits(XPD_WAIT_CYCLES)
        });
        sens.sar_touch_ctrl2()
            .modify(|_, w| unsafe { w.touch_sleep_cycles().bits(SLEEP_CYCLES) });

        // Clear touch status
        sens.sar_touch_ctrl2().modify(|_, w| w.touch_meas_en_clr().set_bit());
        sens.sar_touch_ctrl2().modify(|_, w| w.touch_meas_en_clr().clear_bit());

        // Software trigger mode
        sens.sar_touch_ctrl2().modify(|_, w| {
            w.touch_start_en().clear_bit();
            w.touch_start_force().set_bit();
            w.touch_start_fsm_en().set_bit()
        });

        self.configured = 0;
        self.fresh = 0;
        self.scanning = false;
        Ok(())
    }

    fn config_pad(&mut self, pad: PadId) -> Result<(), TouchError> {
        let index = reg_index(Self::check_pad(pad)?);
        rtc_io().touch_pad(index).modify(|_, w| unsafe {
            w.mux_sel().set_bit();
            w.xpd().set_bit();
            w.tie_opt().clear_bit();
            w.dac().bits(PAD_SLOPE)
        });
        }
        match index {
            0 => config_touch_pad!(touch_pad0),
            1 => config_touch_pad!(touch_pad1),
            2 => config_touch_pad!(touch_pad2),
            3 => config_touch_pad!(touch_pad3),
            4 => config_touch_pad!(touch_pad4),
            5 => config_touch_pad!(touch_pad5),
            6 => config_touch_pad!(touch_pad6),
            7 => config_touch_pad!(touch_pad7),
            8 => config_touch_pad!(touch_pad8),
            9 => config_touch_pad!(touch_pad9),
            _ => unreachable!(),
        };

        let bit = 1u16 << index;
        sens().sar_touch_enable().modify(|r, w| unsafe {
            w.touch_pad_worken().bits(r.touch_pad_worken().bits() | bit);
            w.touch_pad_outen1().bits(r.touch_pad_outen1().bits() | bit);
            w.touch_pad_outen2().bits(r.touch_pad_outen2().bits() | bit)
        });
        self.configured |= 1 << pad.index();
        Ok(())
    }

    fn set_threshold(&mut self, pad: PadId, threshold: u32) -> Result<(), TouchError> {
        let index = reg_index(Self::check_pad(pad)?);
        let th = threshold.min(THRESHOLD_MAX) as u16;
        let sens = sens();
        unsafe {
            match index {
                0 => sens.sar_touch_thres1().modify(|_, w| w.touch_out_th0().bits(th)),
                1 => sens.sar_touch_thres1().modify(|_, w| w.touch_out_th1().bits(th)),
                2 => sens.sar_touch_thres2().modify(|_, w| w.touch_out_th2().bits(th)),
                3 => sens.sar_touch_thres2().modify(|_, w| w.touch_out_th3().bits(th)),
                4 => sens.sar_touch_thres3().modify(|_, w| w.touch_out_th4().bits(th)),
                5 => sens.sar_touch_thres3().modify(|_, w| w.touch_out_th5().bits(th)),
                6 => sens.sar_touch_thres4().modify(|_, w| w.touch_out_th6().bits(th)),
                7 => sens.sar_touch_thres4().modify(|_, w| w.touch_out_th7().bits(th)),
                8 => sens.sar_touch_thres5().modify(|_, w| w.touch_out_th8().bits(th)),
                9 => sens.sar_touch_thres5().modify(|_, w| w.touch_out_th9().bits(th)),
                _ => return Err(TouchError::InvalidPad(pad)),
            };
        }
        Ok(())
    }

    fn read_raw(&mut self, pad: PadId) -> Result<u32, TouchError> {
        let index = Self::check_pad(pad)?;
        if let Some(filter) = self.filter.as_ref() {
            // Scans belong to the filter tick, serve what it captured
            return filter
                .value(index)
                .map(|_| self.raw[index])
                .ok_or(TouchError::NotReady);
        }

        // One scan covers every pad, so only rescan once this pad's count was used
        let bit = 1 << index;
        if self.fresh & bit == 0 {
            self.scan()?;
        }
        self.fresh &= !bit;
        Ok(self.raw[index])
    }
}

impl ClassicTouchDriver for Esp32Touch {
    fn set_voltage(&mut self, voltage: VoltageConfig) -> Result<(), TouchError> {
        rtc_io().touch_cfg().modify(|_, w| unsafe {
            w.touch_drefh().bits(voltage.high as u8);
            w.touch_drefl().bits(voltage.low as u8);
            w.touch_drange().bits(voltage.atten as u8)
        });
        Ok(())
    }

    /// Start or restart the filter. The caller is in charge of calling
    /// [`Esp32Touch::filter_tick`] every `period_ms`.
    fn filter_start(&mut self, period_ms: u32) -> Result<(), TouchError> {
        match self.filter.as_mut() {
            Some(filter) => filter.reset(),
            None => self.filter = Some(IirFilter::new(FILTER_FACTOR)),
        }
        self.scanning = false;
        log::debug!("Touch filter started, period {} ms", period_ms);
        Ok(())
    }

    fn read_filtered(&mut self, pad: PadId) -> Result<u32, TouchError> {
        let index = Self::check_pad(pad)?;
        let filter = self.filter.as_ref().ok_or(TouchError::FilterNotStarted)?;
        filter.value(index).ok_or(TouchError::NotReady)
    }
}

#[cfg(test)]
pub mod test {
    use super::*;

    /// Driver with pads marked configured, without going through the registers
    fn configured(pads: &[u8]) -> Esp32Touch {
        let mut touch = Esp32Touch::new();
        for &pad in pads {
            touch.configured |= 1 << pad;
        }
        touch
    }

    #[test]
    fn test_pads_8_and_9_swapped() {
        assert_eq!(reg_index(7), 7);
        assert_eq!(reg_index(8), 9);
        assert_eq!(reg_index(9), 8);
    }

    #[test]
    fn test_filtered_read_needs_filter() {
        let mut touch = configured(&[0]);
        assert_eq!(touch.read_filtered(PadId(0)), Err(TouchError::FilterNotStarted));

        // Ignored until the filter runs
        touch.filter_update(&[100; TOUCH_PAD_MAX]);
        assert_eq!(touch.read_filtered(PadId(0)), Err(TouchError::FilterNotStarted));

        touch.filter_start(10).unwrap();
        assert_eq!(touch.read_filtered(PadId(0)), Err(TouchError::NotReady));
        assert_eq!(
            touch.read_filtered(PadId(10)),
            Err(TouchError::InvalidPad(PadId(10)))
        );
    }

    #[test]
    fn test_filter_update_seeds_configured_pads() {
        let mut touch = configured(&[0, 2]);
        touch.filter_start(10).unwrap();

        let mut scan = [0; TOUCH_PAD_MAX];
        scan[0] = 100;
        scan[1] = 300;
        scan[2] = 800;
        touch.filter_update(&scan);

        assert_eq!(touch.read_filtered(PadId(0)), Ok(100));
        assert_eq!(touch.read_filtered(PadId(2)), Ok(800));
        assert_eq!(touch.read_filtered(PadId(1)), Err(TouchError::NotReady));

        scan[0] = 200;
        touch.filter_update(&scan);
        assert_eq!(touch.read_filtered(PadId(0)), Ok(125));
    }

    #[test]
    fn test_raw_read_served_from_filter_scan() {
        // With the filter running a raw read never starts a measurement, so
        // none of these touch the registers
        let mut touch = configured(&[3]);
        touch.filter_start(10).unwrap();
        assert_eq!(touch.read_raw(PadId(3)), Err(TouchError::NotReady));

        let mut scan = [0; TOUCH_PAD_MAX];
        scan[3] = 420;
        touch.filter_update(&scan);
        assert_eq!(touch.read_raw(PadId(3)), Ok(420));
        assert_eq!(touch.read_raw(PadId(3)), Ok(420), "Cached count should not be consumed");

        scan[3] = 500;
        touch.filter_update(&scan);
        assert_eq!(touch.read_raw(PadId(3)), Ok(500));
        assert_eq!(touch.read_filtered(PadId(3)), Ok(440));

        assert_eq!(touch.read_raw(PadId(4)), Err(TouchError::NotReady));
    }

    #[test]
    fn test_filter_restart_clears_state() {
        let mut touch = configured(&[1]);
        touch.filter_start(10).unwrap();
        touch.filter_update(&[50; TOUCH_PAD_MAX]);
        assert_eq!(touch.read_filtered(PadId(1)), Ok(50));

        touch.filter_start(20).unwrap();
        assert_eq!(touch.read_filtered(PadId(1)), Err(TouchError::NotReady));
    }
}
