//! USB-MIDI event packets plus the two halves of the engine's MIDI plumbing: the inbound
//! demultiplexer that classifies drained packets, and [`MidiOut`], the buffered outbound
//! stream that is flushed exactly once per tick.

use crate::config::Settings;
use crate::io::{MidiPort, SysexSink};
use crate::note_table::NoteTable;
use tinyvec::ArrayVec;
use wmidi::{Channel, Note, U7};

/// Code index numbers from the USB-MIDI event packet header (USB-MIDI 1.0, table 4-1). Only
/// the ones this core acts on are named; everything else is ignored on receipt.
pub mod cin {
    /// SysEx starts or continues, three payload bytes.
    pub const SYSEX_CONTINUE: u8 = 0x4;
    /// Single-byte System Common, or SysEx ends with one byte.
    pub const SYSEX_END_1: u8 = 0x5;
    /// SysEx ends with two bytes.
    pub const SYSEX_END_2: u8 = 0x6;
    /// SysEx ends with three bytes.
    pub const SYSEX_END_3: u8 = 0x7;
    /// Note-Off.
    pub const NOTE_OFF: u8 = 0x8;
    /// Note-On.
    pub const NOTE_ON: u8 = 0x9;
    /// Control Change.
    pub const CONTROL_CHANGE: u8 = 0xB;
    /// Single-byte message (System Real Time).
    pub const SINGLE_BYTE: u8 = 0xF;
}

const CLOCK: u8 = 0xF8;
const START: u8 = 0xFA;
const STOP: u8 = 0xFC;

/// One 32-bit USB-MIDI event packet: the cable/code-index header byte plus up to three MIDI
/// bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EventPacket {
    /// Cable number in the high nibble, code index number in the low nibble.
    pub header: u8,
    /// The MIDI bytes; trailing bytes are zero for short messages.
    pub data: [u8; 3],
}

impl EventPacket {
    /// The 4-bit code index number classifying the packet.
    pub const fn code_index(&self) -> u8 {
        self.header & 0x0f
    }

    /// Builds a Note-On packet.
    pub fn note_on(channel: Channel, note: Note, velocity: U7) -> Self {
        Self {
            header: cin::NOTE_ON,
            data: [0x90 | channel.index(), note as u8, u8::from(velocity)],
        }
    }

    /// Builds a Note-Off packet (release velocity zero).
    pub fn note_off(channel: Channel, note: Note) -> Self {
        Self {
            header: cin::NOTE_OFF,
            data: [0x80 | channel.index(), note as u8, 0],
        }
    }

    /// Builds a Control Change packet. The controller byte is sent verbatim; see
    /// [`MidiOut::raw_control_change`] for why it is not masked.
    pub fn control_change(channel: Channel, controller: u8, value: u8) -> Self {
        Self {
            header: cin::CONTROL_CHANGE,
            data: [0xB0 | channel.index(), controller, value],
        }
    }

    /// Builds a single-byte System Real Time packet.
    pub fn realtime(status: u8) -> Self {
        Self {
            header: cin::SINGLE_BYTE,
            data: [status, 0, 0],
        }
    }
}

/// Counts received MIDI clock ticks for the ground-effects lamp; reset whenever the host
/// transport starts or stops.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockCounter(u16);

impl ClockCounter {
    /// Advances the counter by one clock tick.
    pub fn increment(&mut self) {
        self.0 = self.0.saturating_add(1);
    }

    /// Resets the counter to the start of its cycle.
    pub fn reset(&mut self) {
        self.0 = 0;
    }

    /// The current tick count.
    pub const fn value(&self) -> u16 {
        self.0
    }
}

/// Classifies one inbound packet and applies it.
///
/// Real-time clock traffic drives `clock`; SysEx fragments are forwarded byte-for-byte to the
/// external reader (content is none of our business); Note events on `receive_channel` update
/// the ledger, with a Note-Off always recording zero regardless of its velocity byte. Anything
/// else is dropped without comment — unrecognized traffic is a normal condition, not an error.
pub fn demultiplex(
    packet: &EventPacket,
    receive_channel: Channel,
    notes: &mut NoteTable,
    clock: &mut ClockCounter,
    sysex: &mut impl SysexSink,
) {
    match packet.code_index() {
        // System Real Time carries no channel, so it is classified first.
        cin::SINGLE_BYTE => match packet.data[0] {
            CLOCK => clock.increment(),
            START | STOP => clock.reset(),
            _ => {}
        },
        cin::SYSEX_CONTINUE => {
            for byte in packet.data {
                sysex.push_byte(byte);
            }
        }
        cin::SYSEX_END_1 => {
            sysex.push_byte(packet.data[0]);
            sysex.end_message();
        }
        cin::SYSEX_END_2 => {
            sysex.push_byte(packet.data[0]);
            sysex.push_byte(packet.data[1]);
            sysex.end_message();
        }
        cin::SYSEX_END_3 => {
            for byte in packet.data {
                sysex.push_byte(byte);
            }
            sysex.end_message();
        }
        command => {
            let channel = packet.data[0] & 0x0f;
            if channel != receive_channel.index() {
                return;
            }
            match command {
                cin::NOTE_ON => {
                    // The velocity is stored verbatim, zero included.
                    let note = crate::keymap::note(packet.data[1]);
                    notes.set(note, U7::from_u8_lossy(packet.data[2]));
                    #[cfg(feature = "defmt")]
                    defmt::trace!(
                        "inbound note-on: note {} velocity {}",
                        packet.data[1],
                        packet.data[2]
                    );
                }
                cin::NOTE_OFF => {
                    let note = crate::keymap::note(packet.data[1]);
                    notes.clear(note);
                    #[cfg(feature = "defmt")]
                    defmt::trace!("inbound note-off: note {}", packet.data[1]);
                }
                _ => {}
            }
        }
    }
}

/// Capacity of the per-tick outbound queue. Sized for the worst tick the grid can produce:
/// every key edging at once in Ableton mode plus the digital, analog, bank, and combo events.
pub const OUTPUT_QUEUE_LEN: usize = 64;

/// The outbound MIDI stream for one tick.
///
/// Events are buffered and handed to the transport in one [`flush`][MidiOut::flush] at the end
/// of the emission phase. Every synthesized note also lands in the ledger here, so bank,
/// analog, digital, and combo notes light LEDs exactly like notes echoed back by the host.
pub struct MidiOut<'a> {
    queue: ArrayVec<[EventPacket; OUTPUT_QUEUE_LEN]>,
    notes: &'a mut NoteTable,
    channel: Channel,
    velocity: U7,
}

impl<'a> MidiOut<'a> {
    /// Opens the stream for one tick.
    pub fn new(notes: &'a mut NoteTable, settings: &Settings) -> Self {
        Self {
            queue: ArrayVec::new(),
            notes,
            channel: settings.channel,
            velocity: settings.velocity,
        }
    }

    /// Queues a Note-On (at the configured velocity) or Note-Off and records it in the ledger.
    pub fn note(&mut self, note: Note, on: bool) {
        if on {
            self.notes.set(note, self.velocity);
            self.push(EventPacket::note_on(self.channel, note, self.velocity));
        } else {
            self.notes.clear(note);
            self.push(EventPacket::note_off(self.channel, note));
        }
    }

    /// Queues a Control Change on the configured channel.
    pub fn control_change(&mut self, controller: u8, value: u8) {
        self.push(EventPacket::control_change(self.channel, controller, value));
    }

    /// Queues a Control Change on an explicit channel.
    ///
    /// The controller byte is deliberately not masked to 7 bits: Ableton mode reuses note
    /// numbers as controller numbers and the historical behavior is to send them as-is. No
    /// current bank layout produces a note above 99, so the wire never sees an invalid
    /// controller in practice.
    pub fn raw_control_change(&mut self, channel: Channel, controller: u8, value: u8) {
        self.push(EventPacket::control_change(channel, controller, value));
    }

    /// The events queued so far, in emission order.
    pub fn queued(&self) -> &[EventPacket] {
        &self.queue
    }

    /// Hands the queued events to the transport and flushes it. The transport may block here;
    /// that is accepted backpressure, bounded by its own buffer.
    pub fn flush(self, port: &mut impl MidiPort) {
        for packet in self.queue {
            port.send(packet);
        }
        port.flush();
    }

    fn push(&mut self, packet: EventPacket) {
        // A full queue means the tick produced more than the transport could ever accept at
        // once; the excess is dropped like any other ignorable input.
        let _ = self.queue.try_push(packet);
    }
}
