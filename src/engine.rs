//! The per-tick translation engine. [`Engine`] owns every piece of mutable core state — the
//! note ledger, input edge trackers, analog filter history, bank selection, and the clock
//! counter — and [`Engine::tick`] runs the whole translation once, to completion, with no
//! suspension points. The enclosing loop calls `tick`, then services the transport, then
//! checks [`Engine::acknowledge_tick`] to pet the hardware watchdog.

use crate::analog::{AnalogChannel, CHANNEL_COUNT};
use crate::banks;
use crate::combo;
use crate::config::{DeviceMode, FourbanksMode, Settings};
use crate::io::{
    ComboRecognizer, ExpansionDriver, KeypadDriver, LedDriver, MidiPort, Peripherals, SysexSink,
};
use crate::keymap;
use crate::keyset::{KeyScan, KeySet};
use crate::leds::{self, GROUNDFX_CYCLE};
use crate::midi::{self, ClockCounter, MidiOut};
use crate::note_table::NoteTable;
use wmidi::Channel;

/// Rounds of oversampling per analog channel per tick; the sum is shifted back down by two.
const OVERSAMPLE: usize = 4;

/// All mutable state of the control core. One instance lives for the whole power-on session,
/// owned by the tick loop and passed nowhere else.
#[derive(Default)]
pub struct Engine {
    notes: NoteTable,
    keys: KeyScan,
    expansion_keys: KeyScan,
    analog: [AnalogChannel; CHANNEL_COUNT],
    selected_bank: u8,
    clock: ClockCounter,
    tick_complete: bool,
}

impl Engine {
    /// Constructs an engine with every note off and bank 0 selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// The note ledger, for callers that mirror state elsewhere (e.g. the menu's display).
    pub const fn notes(&self) -> &NoteTable {
        &self.notes
    }

    /// The currently selected bank.
    pub const fn selected_bank(&self) -> u8 {
        self.selected_bank
    }

    /// Reports whether a tick has run to completion since the last call, clearing the flag.
    ///
    /// The tick loop must acknowledge the external watchdog exactly once per `true`. This is
    /// a liveness heartbeat only: if a tick ever stalls inside a driver call the flag stays
    /// down and the watchdog resets the device.
    pub fn acknowledge_tick(&mut self) -> bool {
        core::mem::take(&mut self.tick_complete)
    }

    /// Runs one full translation tick: drain inbound MIDI, scan inputs, emit the outbound
    /// event stream, flush it, and render the LEDs.
    ///
    /// While the transport is not ready the tick short-circuits immediately after asserting
    /// liveness — no input scanning, no output, no LED writes — and resumes full operation on
    /// its own once the transport comes up.
    pub fn tick<M, K, X, L, S, C>(
        &mut self,
        settings: &Settings,
        peripherals: &mut Peripherals<M, K, X, L, S, C>,
    ) where
        M: MidiPort,
        K: KeypadDriver,
        X: ExpansionDriver,
        L: LedDriver,
        S: SysexSink,
        C: ComboRecognizer,
    {
        if !peripherals.midi.is_ready() {
            self.tick_complete = true;
            return;
        }

        // Inbound first, so notes echoed by the host are in the ledger before rendering.
        while let Some(packet) = peripherals.midi.try_receive() {
            midi::demultiplex(
                &packet,
                settings.channel,
                &mut self.notes,
                &mut self.clock,
                &mut peripherals.sysex,
            );
        }

        self.expansion_keys
            .scan(peripherals.expansion.read_keys() & KeySet::mask(4));

        let mut out = MidiOut::new(&mut self.notes, settings);

        // Digital expansion pins play notes unless external banking has repurposed them as
        // bank selects.
        if settings.fourbanks != FourbanksMode::External {
            for index in self.expansion_keys.down().iter() {
                out.note(keymap::digital_note(index), true);
            }
            for index in self.expansion_keys.up().iter() {
                out.note(keymap::digital_note(index), false);
            }
        }

        let mut totals = [0u16; CHANNEL_COUNT];
        for _ in 0..OVERSAMPLE {
            for (channel, total) in totals.iter_mut().enumerate() {
                // Sample the channels round-robin; out-of-range driver values are clipped to
                // 10 bits to keep the averaging arithmetic honest.
                *total += peripherals.expansion.read_analog(channel as u8) & 0x03ff;
            }
        }
        for (index, channel) in self.analog.iter_mut().enumerate() {
            let mut average = totals[index] >> 2;
            // Inversion must precede hysteresis or the flip turns the dead-band into noise.
            if !settings.rotate_enabled && settings.invert_sliders[index] {
                average = 1024 - average;
            }
            channel.update(index as u8, average, settings.device_mode, &mut out);
        }

        self.keys.scan(peripherals.keypad.read());

        if settings.fourbanks == FourbanksMode::Off {
            self.selected_bank = 0;
        }
        let plan = banks::plan(settings.fourbanks, &self.keys, &self.expansion_keys);
        banks::select(&mut self.selected_bank, &plan, &mut out);

        let shadow = shadow_channel(settings.channel);
        for index in 0..plan.count {
            let key = index + plan.offset;
            if plan.key_down.contains(index) {
                let note = keymap::key_to_note(settings.fourbanks, self.selected_bank, key);
                if settings.device_mode == DeviceMode::Ableton {
                    out.raw_control_change(shadow, note as u8, 127);
                }
                out.note(note, true);
            }
            if plan.key_up.contains(index) {
                let note = keymap::key_to_note(settings.fourbanks, self.selected_bank, key);
                out.note(note, false);
                if settings.device_mode == DeviceMode::Ableton {
                    out.raw_control_change(shadow, note as u8, 0);
                }
            }
        }

        if settings.combos_enabled {
            let action = peripherals.combos.classify(
                self.keys.down(),
                self.keys.up(),
                self.keys.state(),
            );
            if let Some((note, on)) = combo::reserved_note(action) {
                out.note(note, on);
            }
        }

        out.flush(&mut peripherals.midi);

        if self.clock.value() >= GROUNDFX_CYCLE {
            self.clock.reset();
        }
        let pattern = leds::render(
            &self.notes,
            settings,
            self.selected_bank,
            self.keys.state(),
            self.expansion_keys.state(),
            self.clock.value(),
        );
        peripherals.leds.set_keys(pattern.keys);
        peripherals.leds.set_expansion(pattern.expansion);
        peripherals.leds.set_groundfx(pattern.groundfx);

        self.tick_complete = true;
    }
}

/// The channel one above the receive channel, for Ableton-mode CC duplication. Wraps at 16 so
/// the arithmetic stays total.
fn shadow_channel(channel: Channel) -> Channel {
    Channel::from_index((channel.index() + 1) % 16).unwrap_or(Channel::Ch1)
}
