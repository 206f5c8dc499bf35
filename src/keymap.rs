//! The fixed mapping between physical key indices and MIDI notes.
//!
//! Key index 0 is the top-left pad and rows run top to bottom, but musically the notes ascend
//! from the bottom row, so the bottom-left pad carries the base note. The reserved ranges are
//! laid out so nothing collides: bank-select notes 0..=3, digital expansion notes 4..=7, combo
//! notes 8..=12, the playable grid from 36 upwards (up to four banks deep), and the analog zone
//! notes at 100..=107.

use crate::config::FourbanksMode;
use wmidi::{Note, U7};

/// The note carried by the bottom-left pad of bank 0.
pub const GRID_BASE_NOTE: u8 = 36;

/// The lowest of the four digital expansion notes.
pub const DIGITAL_BASE_NOTE: u8 = 4;

/// Number of keys on the grid.
pub const GRID_KEYS: u8 = 16;

/// Notes per bank when the top row is spent on bank selection.
pub const BANKED_KEYS: u8 = 12;

/// Note offset per key index: row-reflected so offsets ascend from the bottom row.
const LAYOUT: [u8; GRID_KEYS as usize] = [
    12, 13, 14, 15, // top row
    8, 9, 10, 11,
    4, 5, 6, 7,
    0, 1, 2, 3, // bottom row
];

/// Converts a raw note number to a [`Note`], masking to the 7-bit range.
pub(crate) fn note(number: u8) -> Note {
    Note::from(U7::from_u8_lossy(number))
}

/// Maps a physical key index to its MIDI note under the given Fourbanks mode and bank.
///
/// In [`FourbanksMode::Internal`] only key indices 4..=15 are playable (the top row selects
/// banks) and each bank spans twelve notes; in [`FourbanksMode::External`] all sixteen keys are
/// playable and each bank spans sixteen notes. The function is total over valid key indices;
/// indices come from fixed-width bitsets, never from user input.
pub fn key_to_note(mode: FourbanksMode, bank: u8, key: u8) -> Note {
    let offset = LAYOUT[key as usize];
    let number = match mode {
        FourbanksMode::Off => GRID_BASE_NOTE + offset,
        // Playable keys sit below the bank-select row, so their layout offsets
        // already start at zero.
        FourbanksMode::Internal => GRID_BASE_NOTE + bank * BANKED_KEYS + offset,
        FourbanksMode::External => GRID_BASE_NOTE + bank * GRID_KEYS + offset,
    };
    note(number)
}

/// The note generated by digital expansion pin `index` (0..=3).
pub fn digital_note(index: u8) -> Note {
    note(DIGITAL_BASE_NOTE + index)
}

/// The note announcing selection of `bank` (0..=3).
pub fn bank_note(bank: u8) -> Note {
    note(bank)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bottom_left_pad_carries_base_note() {
        assert_eq!(
            note(GRID_BASE_NOTE),
            key_to_note(FourbanksMode::Off, 0, 12),
            "Expected left but got right"
        );
    }

    #[test]
    fn top_left_pad_carries_highest_row() {
        assert_eq!(note(48), key_to_note(FourbanksMode::Off, 0, 0));
    }

    #[test]
    fn plain_mapping_is_a_bijection_over_the_grid() {
        let mut seen = [false; 16];
        for key in 0..GRID_KEYS {
            let offset = key_to_note(FourbanksMode::Off, 0, key) as u8 - GRID_BASE_NOTE;
            assert!(!seen[offset as usize], "Offset mapped twice");
            seen[offset as usize] = true;
        }
    }

    #[test]
    fn internal_banks_span_twelve_notes() {
        // Key 15 is the bottom-right pad of the playable 4x3 block.
        assert_eq!(note(39), key_to_note(FourbanksMode::Internal, 0, 15));
        assert_eq!(note(75), key_to_note(FourbanksMode::Internal, 3, 15));
        // Key 4 is the top-left playable pad.
        assert_eq!(note(44), key_to_note(FourbanksMode::Internal, 0, 4));
        assert_eq!(note(80), key_to_note(FourbanksMode::Internal, 3, 4));
    }

    #[test]
    fn external_banks_span_sixteen_notes() {
        assert_eq!(note(36), key_to_note(FourbanksMode::External, 0, 12));
        assert_eq!(note(84), key_to_note(FourbanksMode::External, 3, 12));
        // The top-right pad of the deepest bank stays clear of the analog zone at 100.
        assert_eq!(note(99), key_to_note(FourbanksMode::External, 3, 3));
    }

    #[test]
    fn reserved_notes() {
        assert_eq!(note(4), digital_note(0));
        assert_eq!(note(7), digital_note(3));
        assert_eq!(note(0), bank_note(0));
        assert_eq!(note(3), bank_note(3));
    }
}
