use super::MidiOut;
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};
use wmidi::MidiMessage;

/// Number of messages each transport can hold before new ones are dropped.
pub const MIDI_QUEUE_DEPTH: usize = 32;

/// Outgoing messages waiting for one transport.
pub type MidiQueue = Channel<CriticalSectionRawMutex, MidiMessage<'static>, MIDI_QUEUE_DEPTH>;

/// [`MidiOut`] that copies every message into one queue per transport, never waiting on either.
///
/// The queues are drained independently, so a transport that stops accepting data (a USB host that is not reading,
/// say) only loses its own messages.
pub struct QueuedMidi<'a> {
    serial: &'a MidiQueue,
    usb: &'a MidiQueue,
}

impl<'a> QueuedMidi<'a> {
    /// Creates a handle feeding `serial` and `usb`.
    pub const fn new(serial: &'a MidiQueue, usb: &'a MidiQueue) -> Self {
        Self { serial, usb }
    }
}

impl MidiOut for QueuedMidi<'_> {
    fn send(&mut self, message: MidiMessage<'static>) {
        if self.serial.try_send(message.clone()).is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("Serial MIDI queue full, dropping message");
        }
        // the USB queue stays full whenever no host is reading, which is not worth a warning
        if self.usb.try_send(message).is_err() {
            #[cfg(feature = "defmt")]
            defmt::debug!("USB MIDI queue full, dropping message");
        }
    }
}

/// Encodes a channel voice message as a USB-MIDI event packet on cable 0.
///
/// Returns `None` for messages that do not fit in a single three-byte event.
pub fn usb_midi_packet(message: &MidiMessage<'_>) -> Option<[u8; 4]> {
    let mut bytes = [0_u8; 3];
    message.copy_to_slice(&mut bytes).ok()?;
    // for channel voice messages the Code Index Number matches the status nibble
    Some([bytes[0] >> 4, bytes[0], bytes[1], bytes[2]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::{note_off, note_on, pitch_bend};

    #[test]
    fn a_stalled_usb_queue_does_not_hold_back_serial() {
        let serial = MidiQueue::new();
        let usb = MidiQueue::new();
        let mut midi = QueuedMidi::new(&serial, &usb);

        // nobody drains the USB queue
        for note in 0..MIDI_QUEUE_DEPTH as u8 * 2 {
            midi.note_on(note, 127, 1);
            let Ok(received) = serial.try_receive() else {
                panic!("Expected note {note} on serial");
            };
            assert_eq!(note_on(note, 127, 1), Some(received), "Expected left but got right");
        }
        assert_eq!(MIDI_QUEUE_DEPTH, usb.len(), "Expected left but got right");
        assert_eq!(note_on(0, 127, 1), usb.try_receive().ok(), "USB keeps the oldest messages");
    }

    #[test]
    fn both_transports_get_every_message_in_order() {
        let serial = MidiQueue::new();
        let usb = MidiQueue::new();
        let mut midi = QueuedMidi::new(&serial, &usb);
        midi.note_on(60, 127, 1);
        midi.pitch_bend(0, 1);
        midi.note_off(60, 0, 1);

        let expected = [note_on(60, 127, 1), pitch_bend(0, 1), note_off(60, 0, 1)];
        for queue in [&serial, &usb] {
            for message in &expected {
                assert_eq!(*message, queue.try_receive().ok(), "Expected left but got right");
            }
            assert!(queue.is_empty());
        }
    }

    #[test]
    fn usb_packets_carry_the_code_index_number() {
        let packet = note_on(60, 127, 1).and_then(|message| usb_midi_packet(&message));
        assert_eq!(Some([0x09, 0x90, 60, 127]), packet, "Expected left but got right");

        let packet = pitch_bend(0, 2).and_then(|message| usb_midi_packet(&message));
        assert_eq!(Some([0x0e, 0xe1, 0x00, 0x40]), packet, "Expected left but got right");
    }
}
