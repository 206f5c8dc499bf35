//! The Fourbanks bank-selection state machine: decides which raw bitsets act as bank-select
//! keys versus playable keys for the active mode, and keeps the selected bank consistent with
//! the note ledger during fast swaps.

use crate::config::FourbanksMode;
use crate::keymap::{self, BANKED_KEYS, GRID_KEYS};
use crate::keyset::{KeyScan, KeySet};
use crate::midi::MidiOut;

/// Number of selectable banks.
pub const BANK_COUNT: u8 = 4;

/// The bank-select key positions within their source bitset.
pub const BANK_KEYS: KeySet = KeySet::mask(BANK_COUNT);

/// One tick's view of the inputs, partitioned into bank-select and playable roles.
///
/// The playable edge sets are reindexed to start at zero; `offset` maps a playable index back
/// to its physical key for note lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BankPlan {
    /// Down edges on the bank-select keys.
    pub bank_down: KeySet,
    /// Up edges on the bank-select keys.
    pub bank_up: KeySet,
    /// Current pressed state of the bank-select keys.
    pub bank_state: KeySet,
    /// Down edges on the playable keys, reindexed from zero.
    pub key_down: KeySet,
    /// Up edges on the playable keys, reindexed from zero.
    pub key_up: KeySet,
    /// Physical key index of playable index zero.
    pub offset: u8,
    /// Number of playable keys.
    pub count: u8,
}

/// Partitions the key matrix and expansion inputs according to the Fourbanks mode.
///
/// With banking off there are no bank-select keys; internally banked layouts spend the low
/// four grid keys (the top row) on selection, leaving twelve playable; externally banked
/// layouts repurpose the digital expansion pins for selection and keep all sixteen grid keys
/// playable.
pub fn plan(mode: FourbanksMode, keys: &KeyScan, expansion: &KeyScan) -> BankPlan {
    match mode {
        FourbanksMode::Off => BankPlan {
            bank_down: KeySet::EMPTY,
            bank_up: KeySet::EMPTY,
            bank_state: KeySet::EMPTY,
            key_down: keys.down(),
            key_up: keys.up(),
            offset: 0,
            count: GRID_KEYS,
        },
        FourbanksMode::Internal => BankPlan {
            bank_down: keys.down(),
            bank_up: keys.up(),
            bank_state: keys.state(),
            key_down: keys.down().shifted_down(BANK_COUNT),
            key_up: keys.up().shifted_down(BANK_COUNT),
            offset: BANK_COUNT,
            count: BANKED_KEYS,
        },
        FourbanksMode::External => BankPlan {
            bank_down: expansion.down(),
            bank_up: expansion.up(),
            bank_state: expansion.state(),
            key_down: keys.down(),
            key_up: keys.up(),
            offset: 0,
            count: GRID_KEYS,
        },
    }
}

/// Applies one tick's bank-select edges to the selection.
///
/// The lowest-indexed down edge wins a simultaneous press. Selecting a new bank while the old
/// bank's key is still held forces the old bank's Note-Off first, so the ledger never shows
/// two banks on at once. Reselecting the already-active bank re-announces it with a fresh
/// Note-On. A release emits a Note-Off only for the currently selected bank.
pub fn select(selected: &mut u8, plan: &BankPlan, out: &mut MidiOut<'_>) {
    if let Some(new_bank) = (plan.bank_down & BANK_KEYS).lowest_set() {
        if *selected != new_bank && plan.bank_state.contains(*selected) {
            out.note(keymap::bank_note(*selected), false);
        }
        out.note(keymap::bank_note(new_bank), true);
        *selected = new_bank;
    }

    if (plan.bank_up & BANK_KEYS).contains(*selected) {
        out.note(keymap::bank_note(*selected), false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::keymap::bank_note;
    use crate::midi::{EventPacket, cin};
    use crate::note_table::NoteTable;

    fn scanned(bits: u16) -> KeyScan {
        let mut scan = KeyScan::default();
        scan.scan(KeySet::new(bits));
        scan
    }

    #[test]
    fn off_mode_has_no_bank_keys() {
        let keys = scanned(0xffff);
        let plan = plan(FourbanksMode::Off, &keys, &KeyScan::default());
        assert_eq!(KeySet::EMPTY, plan.bank_down);
        assert_eq!(GRID_KEYS, plan.count);
        assert_eq!(0, plan.offset);
        assert_eq!(keys.down(), plan.key_down);
    }

    #[test]
    fn internal_mode_reserves_the_low_four_keys() {
        let keys = scanned(0b0000_0000_0001_0001);
        let plan = plan(FourbanksMode::Internal, &keys, &KeyScan::default());
        assert!(plan.bank_down.contains(0), "Key 0 is a bank select");
        assert!(
            plan.key_down.contains(0),
            "Key 4 should reindex to playable index 0"
        );
        assert_eq!(BANKED_KEYS, plan.count);
        assert_eq!(BANK_COUNT, plan.offset);
    }

    #[test]
    fn external_mode_banks_on_the_expansion_pins() {
        let keys = scanned(0x8000);
        let expansion = scanned(0b0100);
        let plan = plan(FourbanksMode::External, &keys, &expansion);
        assert!(plan.bank_down.contains(2));
        assert_eq!(GRID_KEYS, plan.count);
        assert!(plan.key_down.contains(15));
    }

    fn select_with(
        selected: &mut u8,
        bank_down: u16,
        bank_up: u16,
        bank_state: u16,
    ) -> tinyvec::ArrayVec<[EventPacket; 8]> {
        let mut notes = NoteTable::new();
        let settings = Settings::default();
        let mut out = MidiOut::new(&mut notes, &settings);
        let plan = BankPlan {
            bank_down: KeySet::new(bank_down),
            bank_up: KeySet::new(bank_up),
            bank_state: KeySet::new(bank_state),
            key_down: KeySet::EMPTY,
            key_up: KeySet::EMPTY,
            offset: 0,
            count: 0,
        };
        select(selected, &plan, &mut out);
        out.queued().iter().copied().collect()
    }

    #[test]
    fn simultaneous_presses_pick_the_lowest_bank() {
        let mut selected = 0;
        let events = select_with(&mut selected, 0b0110, 0, 0b0110);
        assert_eq!(1, selected, "Expected left but got right");
        // Old bank 0 is not held, so only the new bank's Note-On goes out.
        assert_eq!(1, events.len());
        assert_eq!(bank_note(1) as u8, events[0].data[1]);
        assert_eq!(cin::NOTE_ON, events[0].code_index());
    }

    #[test]
    fn swapping_while_held_releases_the_old_bank_first() {
        let mut selected = 1;
        // Bank 2 goes down while bank 1 is still physically held.
        let events = select_with(&mut selected, 0b0100, 0, 0b0110);
        assert_eq!(2, selected);
        assert_eq!(2, events.len());
        assert_eq!(cin::NOTE_OFF, events[0].code_index());
        assert_eq!(bank_note(1) as u8, events[0].data[1]);
        assert_eq!(cin::NOTE_ON, events[1].code_index());
        assert_eq!(bank_note(2) as u8, events[1].data[1]);
    }

    #[test]
    fn reselecting_the_active_bank_reannounces_it() {
        let mut selected = 3;
        let events = select_with(&mut selected, 0b1000, 0, 0b1000);
        assert_eq!(3, selected);
        assert_eq!(1, events.len());
        assert_eq!(cin::NOTE_ON, events[0].code_index());
    }

    #[test]
    fn releasing_a_non_active_bank_key_is_a_no_op() {
        let mut selected = 2;
        let events = select_with(&mut selected, 0, 0b0001, 0b0100);
        assert!(events.is_empty(), "Expected no events");

        let events = select_with(&mut selected, 0, 0b0100, 0);
        assert_eq!(1, events.len(), "Releasing the active bank emits its Note-Off");
        assert_eq!(cin::NOTE_OFF, events[0].code_index());
        assert_eq!(bank_note(2) as u8, events[0].data[1]);
    }
}
