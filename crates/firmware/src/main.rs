//! Kinoshi-Tiny Key 25 is [Embassy](https://embassy.dev)-based firmware for a compact 25-key MIDI keyboard
//! controller built around an RP2040. Besides the keys, the front panel carries sustain, modulation, octave shift
//! and pitch bend buttons, plus a single RGB LED whose color shows the selected octave.
//!
//! The switches are read through two daisy-chained 74HC165 shift registers (see [`tiny_key_lib::switches`]).
//! Outgoing MIDI goes to both a USB host and a serial MIDI jack.
//!
//! Holding Modulation and Octave- while plugging the keyboard in reboots it into the RP2040's USB mass storage
//! bootloader, from which new firmware can be copied onto the device.

#![no_std]
#![no_main]

mod midi;
mod octave_led;
mod pitch_bend;

use crate::{
    midi::SERIAL_MIDI_BAUD_RATE,
    octave_led::SignalIndicator,
    pitch_bend::PITCH_BEND,
};
use defmt::*;
use embassy_executor::{Executor, InterruptExecutor};
use embassy_futures::yield_now;
use embassy_rp::{
    bind_interrupts,
    gpio::{Input, Level, Output, Pull},
    interrupt,
    interrupt::{InterruptExt, Priority},
    peripherals::{PIO0, USB},
    pio::{self, Pio},
    pio_programs::ws2812::{PioWs2812, PioWs2812Program},
    rom_data, uart, usb,
};
use embassy_time::{Delay, Instant};
use embassy_usb::{Builder, class::midi::MidiClass};
use static_cell::StaticCell;
use tiny_key_lib::{
    application::{Application, Startup},
    midi::QueuedMidi,
    switches::Scanner,
};

use defmt_rtt as _;
#[cfg(not(feature = "panic-probe"))]
use panic_halt as _;
#[cfg(feature = "panic-probe")]
use panic_probe as _;

bind_interrupts!(
    #[doc(hidden)]
    struct Irqs {
        USBCTRL_IRQ => usb::InterruptHandler<USB>;
        PIO0_IRQ_0 => pio::InterruptHandler<PIO0>;
    }
);

type SwitchScanner = Scanner<Output<'static>, Output<'static>, Input<'static>>;
type Controller = Application<'static, SwitchScanner, QueuedMidi<'static>, SignalIndicator>;

static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();
static EXECUTOR_LOW: StaticCell<Executor> = StaticCell::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    unsafe { EXECUTOR_HIGH.on_interrupt() }
}

#[cortex_m_rt::entry]
fn main() -> ! {
    info!("Initializing Kinoshi-Tiny Key 25");
    let p = embassy_rp::init(Default::default());

    // the 74HC165s latch on a low load pulse and shift on the rising clock edge
    let load = Output::new(p.PIN_15, Level::High);
    let clock = Output::new(p.PIN_14, Level::Low);
    let read_lines = [
        Input::new(p.PIN_27, Pull::Up),
        Input::new(p.PIN_26, Pull::Up),
        Input::new(p.PIN_28, Pull::Up),
    ];
    // RP2040 pins cannot fail
    let Ok(scanner) = Scanner::new(load, clock, read_lines);

    let Ok(startup) = Application::boot(
        scanner,
        &mut Delay,
        Instant::now(),
        &PITCH_BEND,
        midi::queued_midi,
        || SignalIndicator,
    );
    let controller: Controller = match startup {
        Startup::FirmwareUpdate => {
            info!("Rebooting into the USB bootloader");
            rom_data::reset_to_usb_boot(0, 0);
            loop {
                cortex_m::asm::wfi();
            }
        }
        Startup::Running(controller) => controller,
    };

    let driver = usb::Driver::new(p.USB, Irqs);

    // per https://pid.codes, this is the shared testing PID; the device has no dedicated PID yet
    let vendor_id = 0x1209;
    let product_id = 0x0001;

    let mut config = embassy_usb::Config::new(vendor_id, product_id);
    config.manufacturer = Some("Kinoshita Laboratory");
    config.product = Some("Kinoshi-Tiny Key 25");
    config.serial_number = Some("0xdeadbeef");
    config.max_power = 100;

    // Create embassy-usb DeviceBuilder using the driver and config.
    // It needs some buffers for building the descriptors.
    static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
    static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
    static CONTROL_BUFFER: StaticCell<[u8; 64]> = StaticCell::new();

    let mut builder = Builder::new(
        driver,
        config,
        CONFIG_DESCRIPTOR.init([0; 256]),
        BOS_DESCRIPTOR.init([0; 256]),
        &mut [], // no msos descriptors
        CONTROL_BUFFER.init([0; 64]),
    );
    let class = MidiClass::new(&mut builder, 1, 1, 64);
    let usb = builder.build();

    let mut uart_config = uart::Config::default();
    uart_config.baudrate = SERIAL_MIDI_BAUD_RATE;
    let serial = uart::UartTx::new(p.UART1, p.PIN_8, p.DMA_CH0, uart_config);

    let Pio {
        mut common, sm0, ..
    } = Pio::new(p.PIO0, Irqs);
    let program = PioWs2812Program::new(&mut common);
    let led = PioWs2812::new(&mut common, sm0, p.DMA_CH1, p.PIN_29, &program);

    // the ramp must keep its rate while the main loop is busy, so it preempts everything else
    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let high_priority = EXECUTOR_HIGH.start(interrupt::SWI_IRQ_1);
    unwrap!(high_priority.spawn(pitch_bend::ramp_timer()));

    let executor = EXECUTOR_LOW.init(Executor::new());
    executor.run(|spawner| {
        unwrap!(spawner.spawn(midi::usb_task(usb)));
        unwrap!(spawner.spawn(midi::serial_midi_task(serial)));
        unwrap!(spawner.spawn(midi::usb_midi_task(class)));
        unwrap!(spawner.spawn(octave_led::octave_led(led)));
        unwrap!(spawner.spawn(main_loop(controller)));
    })
}

/// Task that scans the switches and turns their changes into MIDI, as fast as the executor lets it.
#[embassy_executor::task]
async fn main_loop(mut controller: Controller) -> ! {
    loop {
        let Ok(()) = controller.poll(Instant::now());
        yield_now().await;
    }
}
