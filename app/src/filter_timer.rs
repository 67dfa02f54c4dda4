//! Periodic interrupt driving the software touch filter of the ESP32.
//!
//! The touch driver lives in a static so the timer interrupt can advance the
//! filter while the read loop sleeps. The read loop gets a [`SharedTouch`]
//! handle, and every driver call it makes is a short critical section.

use core::cell::RefCell;

use critical_section::Mutex;
use esp_hal::peripherals::TIMG0;
use esp_hal::prelude::*;
use esp_hal::timer::timg::TimerGroup;
use esp_hal::timer::{AnyTimer, PeriodicTimer};

use touch_pad::driver::{ClassicTouchDriver, TouchDriver, VoltageConfig};
use touch_pad::esp32::Esp32Touch;
use touch_pad::{PadId, TouchError};

static TOUCH: Mutex<RefCell<Option<Esp32Touch>>> = Mutex::new(RefCell::new(None));
static TIMER: Mutex<RefCell<Option<PeriodicTimer<'static, AnyTimer>>>> =
    Mutex::new(RefCell::new(None));

/// Handle to the touch driver shared with the filter interrupt
pub struct SharedTouch {
    _private: (),
}

impl SharedTouch {
    fn with<R>(f: impl FnOnce(&mut Esp32Touch) -> Result<R, TouchError>) -> Result<R, TouchError> {
        critical_section::with(|cs| match TOUCH.borrow_ref_mut(cs).as_mut() {
            Some(touch) => f(touch),
            None => Err(TouchError::NotReady),
        })
    }
}

/// Must be called once during application initialization. The filter timer is
/// armed later, when the driver's filter is started.
pub fn init(timg0: TIMG0) -> SharedTouch {
    let timg0 = TimerGroup::new(timg0);
    let mut timer = PeriodicTimer::new(AnyTimer::from(timg0.timer0));
    timer.set_interrupt_handler(filter_tick);
    timer.enable_interrupt(true);

    critical_section::with(|cs| {
        TOUCH.borrow_ref_mut(cs).replace(Esp32Touch::new());
        TIMER.borrow_ref_mut(cs).replace(timer);
    });

    SharedTouch { _private: () }
}

#[handler]
fn filter_tick() {
    critical_section::with(|cs| {
        if let Some(timer) = TIMER.borrow_ref_mut(cs).as_mut() {
            timer.clear_interrupt();
        }
        if let Some(touch) = TOUCH.borrow_ref_mut(cs).as_mut() {
            touch.filter_tick();
        }
    });
}

impl TouchDriver for SharedTouch {
    type Error = TouchError;

    fn init(&mut self) -> Result<(), TouchError> {
        Self::with(|touch| touch.init())
    }

    fn config_pad(&mut self, pad: PadId) -> Result<(), TouchError> {
        Self::with(|touch| touch.config_pad(pad))
    }

    fn set_threshold(&mut self, pad: PadId, threshold: u32) -> Result<(), TouchError> {
        Self::with(|touch| touch.set_threshold(pad, threshold))
    }

    fn read_raw(&mut self, pad: PadId) -> Result<u32, TouchError> {
        Self::with(|touch| touch.read_raw(pad))
    }
}

impl ClassicTouchDriver for SharedTouch {
    fn set_voltage(&mut self, voltage: VoltageConfig) -> Result<(), TouchError> {
        Self::with(|touch| touch.set_voltage(voltage))
    }

    fn filter_start(&mut self, period_ms: u32) -> Result<(), TouchError> {
        critical_section::with(|cs| {
            TOUCH
                .borrow_ref_mut(cs)
                .as_mut()
                .ok_or(TouchError::NotReady)?
                .filter_start(period_ms)?;

            let mut timer = TIMER.borrow_ref_mut(cs);
            let timer = timer.as_mut().ok_or(TouchError::NotReady)?;
            timer.start((period_ms as u64).millis()).map_err(|_| {
                log::warn!("Touch filter timer did not start");
                TouchError::FilterTimer
            })
        })
    }

    fn read_filtered(&mut self, pad: PadId) -> Result<u32, TouchError> {
        Self::with(|touch| touch.read_filtered(pad))
    }
}
