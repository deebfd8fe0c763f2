//! Tasks and types related to the octave indicator, a single WS2812 LED.

use embassy_rp::{peripherals::PIO0, pio_programs::ws2812::PioWs2812};
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, signal::Signal};
use smart_leds::{RGB8, brightness};
use tiny_key_lib::{midi::OctaveIndicator, octave::octave_color};

/// The LED is bright enough to blind at full power.
const LED_BRIGHTNESS: u8 = 20;

/// Latest octave to display. Only the newest value matters, so intermediate ones may be skipped.
static OCTAVE: Signal<CriticalSectionRawMutex, i8> = Signal::new();

pub type OctaveLed = PioWs2812<'static, PIO0, 0, 1>;

/// [`OctaveIndicator`] handle used by the main loop.
pub struct SignalIndicator;

impl OctaveIndicator for SignalIndicator {
    fn set_octave_indicator(&mut self, octave: i8) {
        if octave_color(octave).is_some() {
            OCTAVE.signal(octave);
        }
    }
}

/// Task responsible for lighting the LED in the color of the selected octave.
#[embassy_executor::task]
pub async fn octave_led(mut led: OctaveLed) -> ! {
    loop {
        let octave = OCTAVE.wait().await;
        let Some([r, g, b]) = octave_color(octave) else {
            continue;
        };
        let mut frame = [RGB8::default(); 1];
        for (pixel, dimmed) in frame
            .iter_mut()
            .zip(brightness([RGB8::new(r, g, b)].into_iter(), LED_BRIGHTNESS))
        {
            *pixel = dimmed;
        }
        led.write(&frame).await;
    }
}
