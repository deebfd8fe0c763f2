//! Tasks that carry outgoing MIDI to the USB host and the serial MIDI jack.
//!
//! The main loop queues messages through [`QueuedMidi`] and never waits on a transport. Each transport drains its
//! own queue, so a USB host that stops reading stalls only [`usb_midi_task`] and serial MIDI keeps flowing.

use defmt::*;
use embassy_rp::{peripherals::USB, uart::Async, uart::UartTx, usb};
use embassy_usb::{UsbDevice, class::midi::MidiClass};
use tiny_key_lib::midi::{MidiQueue, QueuedMidi, usb_midi_packet};

/// Baud rate of the serial MIDI jack.
pub const SERIAL_MIDI_BAUD_RATE: u32 = 31_250;

static SERIAL_QUEUE: MidiQueue = MidiQueue::new();
static USB_QUEUE: MidiQueue = MidiQueue::new();

pub type UsbDriver = usb::Driver<'static, USB>;

/// The [`MidiOut`][tiny_key_lib::midi::MidiOut] handle for the main loop.
pub fn queued_midi() -> QueuedMidi<'static> {
    QueuedMidi::new(&SERIAL_QUEUE, &USB_QUEUE)
}

#[embassy_executor::task]
pub async fn usb_task(mut usb: UsbDevice<'static, UsbDriver>) -> ! {
    usb.run().await
}

/// Task responsible for writing queued messages to the serial MIDI jack.
#[embassy_executor::task]
pub async fn serial_midi_task(mut serial: UartTx<'static, Async>) -> ! {
    loop {
        let message = SERIAL_QUEUE.receive().await;
        let mut bytes = [0_u8; 3];
        let Ok(len) = message.copy_to_slice(&mut bytes) else {
            warn!("Unsupported outgoing MIDI message");
            continue;
        };
        if serial.write(&bytes[..len]).await.is_err() {
            warn!("Serial MIDI write failed");
        }
    }
}

/// Task responsible for writing queued messages to the USB host.
///
/// A write only completes once the host reads the endpoint, so this task may stay blocked for as long as no host
/// listens. Meanwhile [`QueuedMidi`] drops what no longer fits in the USB queue.
#[embassy_executor::task]
pub async fn usb_midi_task(mut class: MidiClass<'static, UsbDriver>) -> ! {
    loop {
        class.wait_connection().await;
        info!("USB MIDI connected");
        loop {
            let message = USB_QUEUE.receive().await;
            let Some(packet) = usb_midi_packet(&message) else {
                warn!("Unsupported outgoing MIDI message");
                continue;
            };
            if class.write_packet(&packet).await.is_err() {
                info!("USB MIDI disconnected");
                break;
            }
        }
    }
}
