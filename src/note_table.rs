//! Provides [`NoteTable`], the ledger recording the most recent velocity of every MIDI note.
//! A nonzero velocity means the note is sounding; zero means it is off. Both the inbound
//! demultiplexer and the outbound event stream write here, so the LED renderer has a single
//! consistent source of truth regardless of where a note originated.

use wmidi::{Note, U7};

/// Velocity of a silent note.
pub const SILENT: U7 = U7::from_u8_lossy(0);

/// The most recent velocity of each of the 128 MIDI notes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NoteTable {
    velocities: [U7; 128],
}

impl Default for NoteTable {
    fn default() -> Self {
        Self::new()
    }
}

impl NoteTable {
    /// Constructs a ledger with every note off.
    pub const fn new() -> Self {
        Self {
            velocities: [SILENT; 128],
        }
    }

    /// Overwrites the stored velocity for `note`. A zero velocity is stored verbatim, which is
    /// how a running-status NoteOn encodes a release.
    pub fn set(&mut self, note: Note, velocity: U7) {
        self.velocities[note as usize] = velocity;
    }

    /// Forces `note` to velocity zero. A NoteOff always lands here no matter what release
    /// velocity it carried, otherwise the LEDs would disagree with the wire.
    pub fn clear(&mut self, note: Note) {
        self.set(note, SILENT);
    }

    /// The stored velocity for `note`.
    pub fn get(&self, note: Note) -> U7 {
        self.velocities[note as usize]
    }

    /// Whether `note` is currently sounding.
    pub fn is_on(&self, note: Note) -> bool {
        u8::from(self.get(note)) > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOTE: Note = Note::C4;

    #[test]
    fn set_stores_velocity_verbatim() {
        let mut table = NoteTable::new();
        table.set(NOTE, U7::from_u8_lossy(99));
        assert_eq!(
            U7::from_u8_lossy(99),
            table.get(NOTE),
            "Expected left but got right"
        );
        assert!(table.is_on(NOTE));
    }

    #[test]
    fn zero_velocity_note_on_reads_as_off() {
        let mut table = NoteTable::new();
        table.set(NOTE, SILENT);
        assert!(!table.is_on(NOTE));
    }

    #[test]
    fn clear_always_wins() {
        let mut table = NoteTable::new();
        table.set(NOTE, U7::from_u8_lossy(127));
        table.clear(NOTE);
        assert_eq!(SILENT, table.get(NOTE), "Expected left but got right");
    }
}
