//! Traits the tick engine uses to talk to the outside world. The firmware crate implements
//! these over the real USB transport, debounce buffers, ADC, and LED shift registers; the
//! test suite implements them over in-memory recorders.
//!
//! Every input is a snapshot read once per tick and every call is non-blocking, with one
//! sanctioned exception: [`MidiPort::flush`] may block on transport backpressure.

use crate::combo::ComboAction;
use crate::keyset::KeySet;
use crate::midi::EventPacket;

/// The USB-MIDI transport, both directions.
pub trait MidiPort {
    /// Whether the transport is enumerated and ready to carry traffic. While this is false
    /// the engine ticks over without touching any other peripheral.
    fn is_ready(&self) -> bool;

    /// Pops the next inbound event packet, if any. An empty queue is the normal case, not an
    /// error.
    fn try_receive(&mut self) -> Option<EventPacket>;

    /// Appends a packet to the outbound buffer.
    fn send(&mut self, packet: EventPacket);

    /// Pushes the outbound buffer onto the wire. May block until the transport drains.
    fn flush(&mut self);
}

/// The debounced 4x4 key matrix.
pub trait KeypadDriver {
    /// The current debounced pressed set.
    fn read(&mut self) -> KeySet;
}

/// The expansion port: four debounced digital pins and four analog channels.
pub trait ExpansionDriver {
    /// The current debounced pressed set of the digital pins (low four bits).
    fn read_keys(&mut self) -> KeySet;

    /// One raw 10-bit sample from the given analog channel.
    fn read_analog(&mut self, channel: u8) -> u16;
}

/// The LED output stages.
pub trait LedDriver {
    /// Latches the sixteen grid key LEDs.
    fn set_keys(&mut self, pattern: KeySet);

    /// Latches the four expansion key LEDs.
    fn set_expansion(&mut self, pattern: KeySet);

    /// Drives the ground-effects lamp.
    fn set_groundfx(&mut self, lit: bool);
}

/// Receives SysEx payload bytes as they arrive. Interpretation (configuration transfer) is
/// entirely the implementor's concern.
pub trait SysexSink {
    /// Accepts one payload byte.
    fn push_byte(&mut self, byte: u8);

    /// Marks the end of the current message.
    fn end_message(&mut self);
}

/// The external gesture recognizer.
pub trait ComboRecognizer {
    /// Classifies one tick's key edges and state into at most one action.
    fn classify(&mut self, down: KeySet, up: KeySet, state: KeySet) -> ComboAction;
}

/// The full set of drivers handed to the engine each tick.
pub struct Peripherals<M, K, X, L, S, C> {
    /// USB-MIDI transport.
    pub midi: M,
    /// Key matrix input.
    pub keypad: K,
    /// Expansion port input.
    pub expansion: X,
    /// LED output.
    pub leds: L,
    /// SysEx reader.
    pub sysex: S,
    /// Combo recognizer.
    pub combos: C,
}
