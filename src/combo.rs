//! Translation of recognized key gestures into their reserved notes. The recognition
//! algorithm itself lives behind [`crate::io::ComboRecognizer`]; this module only maps its
//! verdict onto the wire.

use crate::keymap::note;
use wmidi::Note;

/// Note announcing combo A; combos B through E follow consecutively.
pub const COMBO_BASE_NOTE: u8 = 8;

/// The verdict of the external gesture recognizer for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ComboAction {
    /// Nothing recognized this tick.
    #[default]
    None,
    /// Combo A began.
    ADown,
    /// Combo A ended.
    ARelease,
    /// Combo B began.
    BDown,
    /// Combo B ended.
    BRelease,
    /// Combo C began.
    CDown,
    /// Combo C ended.
    CRelease,
    /// Combo D began.
    DDown,
    /// Combo D ended.
    DRelease,
    /// Combo E began.
    EDown,
    /// Combo E ended.
    ERelease,
}

/// Maps an action to its reserved note and on/off polarity; `None` produces no output.
pub fn reserved_note(action: ComboAction) -> Option<(Note, bool)> {
    let (letter, on) = match action {
        ComboAction::None => return None,
        ComboAction::ADown => (0, true),
        ComboAction::ARelease => (0, false),
        ComboAction::BDown => (1, true),
        ComboAction::BRelease => (1, false),
        ComboAction::CDown => (2, true),
        ComboAction::CRelease => (2, false),
        ComboAction::DDown => (3, true),
        ComboAction::DRelease => (3, false),
        ComboAction::EDown => (4, true),
        ComboAction::ERelease => (4, false),
    };
    Some((note(COMBO_BASE_NOTE + letter), on))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_letter_gets_its_own_note() {
        assert_eq!(
            Some((note(8), true)),
            reserved_note(ComboAction::ADown),
            "Expected left but got right"
        );
        assert_eq!(Some((note(8), false)), reserved_note(ComboAction::ARelease));
        assert_eq!(Some((note(12), true)), reserved_note(ComboAction::EDown));
        assert_eq!(Some((note(12), false)), reserved_note(ComboAction::ERelease));
    }

    #[test]
    fn no_action_is_silent() {
        assert_eq!(None, reserved_note(ComboAction::None));
    }
}
