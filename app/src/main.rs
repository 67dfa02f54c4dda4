#![no_main]
#![no_std]

use esp_backtrace as _;
use esp_hal::delay::Delay;
use esp_hal::prelude::*;
use esp_println::Printer;

use touch_pad::console::LineWriter;
use touch_pad::task::SamplingTask;
use touch_pad::{SamplerConfig, DEFAULT_SAMPLER_CONFIG};

#[cfg(feature = "esp32")]
mod filter_timer;

#[cfg(all(feature = "esp32", feature = "esp32s2"))]
compile_error!("The `esp32` and `esp32s2` features are mutually exclusive");
#[cfg(not(any(feature = "esp32", feature = "esp32s2")))]
compile_error!("Select a chip with the `esp32` or `esp32s2` feature");

/// Longest console line buffered before it is written out
const LINE_CAPACITY: usize = 256;

static CONFIG: SamplerConfig = DEFAULT_SAMPLER_CONFIG;

#[entry]
fn main() -> ! {
    esp_println::logger::init_logger_from_env();

    #[cfg(feature = "esp32")]
    let sampler = {
        use touch_pad::pad::CLASSIC_PADS;
        use touch_pad::sampler::ClassicSampler;

        let peripherals = esp_hal::init(esp_hal::Config::default());
        let touch = filter_timer::init(peripherals.TIMG0);
        ClassicSampler::new(touch, CLASSIC_PADS, &CONFIG)
    };

    #[cfg(feature = "esp32s2")]
    let sampler = {
        use touch_pad::esp32s2::Esp32s2Touch;
        use touch_pad::pad::DENOISE_PADS;
        use touch_pad::sampler::DenoiseSampler;

        // Clocks only, the touch registers are driven directly
        let _peripherals = esp_hal::init(esp_hal::Config::default());
        DenoiseSampler::new(Esp32s2Touch::new(), DENOISE_PADS, &CONFIG)
    };

    let mut console: LineWriter<Printer, LINE_CAPACITY> = LineWriter::new(Printer);

    log::info!("Starting touch pad read task");
    SamplingTask::new(sampler, Delay::new(), &CONFIG).run_forever(&mut console)
}
