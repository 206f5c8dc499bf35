//! Derives the LED display from the note ledger and bank state. The pattern is recomputed
//! from scratch every tick — there is no incremental patching, so a missed tick can never
//! leave a stale light behind.

use crate::banks::BANK_KEYS;
use crate::config::{FourbanksMode, Settings};
use crate::keymap::{self, GRID_KEYS};
use crate::keyset::KeySet;
use crate::note_table::NoteTable;

/// Clock ticks per GroundFx cycle. At 24 MIDI clocks per beat the on(1)/off(7)/on(16) shape
/// reads as a beat-synchronized flash.
pub const GROUNDFX_CYCLE: u16 = 24;

/// One tick's complete LED state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedPattern {
    /// The sixteen grid key LEDs.
    pub keys: KeySet,
    /// The four expansion key LEDs.
    pub expansion: KeySet,
    /// The ground-effects lamp.
    pub groundfx: bool,
}

/// Whether the ground-effects lamp is lit at `counter` ticks into the clock cycle: lit on the
/// downbeat tick, dark for ticks 1..=7, lit again from tick 8 until the cycle wraps.
pub const fn groundfx_lit(counter: u16) -> bool {
    !matches!(counter, 1..=7)
}

/// Renders the full LED pattern from the current note ledger, bank selection, and raw press
/// state.
pub fn render(
    notes: &NoteTable,
    settings: &Settings,
    bank: u8,
    key_state: KeySet,
    expansion_state: KeySet,
    clock: u16,
) -> LedPattern {
    let mut keys = KeySet::EMPTY;
    let mut expansion = KeySet::EMPTY;

    match settings.fourbanks {
        FourbanksMode::Off => {
            for key in 0..GRID_KEYS {
                if notes.is_on(keymap::key_to_note(FourbanksMode::Off, 0, key)) {
                    keys.insert(key);
                }
            }
            if settings.keypress_leds {
                keys |= key_state;
            }
            expansion = digital_leds(notes);
            if settings.expansion_keypress_leds {
                expansion |= expansion_state;
            }
        }
        FourbanksMode::Internal => {
            // The top row shows the selection; at least one bank is always lit.
            keys.insert(bank);
            for key in 4..GRID_KEYS {
                if notes.is_on(keymap::key_to_note(FourbanksMode::Internal, bank, key)) {
                    keys.insert(key);
                }
            }
            if settings.keypress_leds {
                // Keep the overlay off the bank-select row.
                keys |= key_state & !BANK_KEYS;
            }
            expansion = digital_leds(notes);
        }
        FourbanksMode::External => {
            expansion.insert(bank);
            for key in 0..GRID_KEYS {
                if notes.is_on(keymap::key_to_note(FourbanksMode::External, bank, key)) {
                    keys.insert(key);
                }
            }
            if settings.keypress_leds {
                keys |= key_state;
            }
        }
    }

    LedPattern {
        keys,
        expansion,
        groundfx: groundfx_lit(clock),
    }
}

fn digital_leds(notes: &NoteTable) -> KeySet {
    let mut leds = KeySet::EMPTY;
    for index in 0..4 {
        if notes.is_on(keymap::digital_note(index)) {
            leds.insert(index);
        }
    }
    leds
}
