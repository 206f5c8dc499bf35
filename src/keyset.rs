//! Provides [`KeySet`], a fixed-width bitset over key indices, and [`KeyScan`], the per-tick
//! edge detector built on top of it. Bit 0 is always key 0; the key matrix uses all sixteen
//! bits while the expansion port uses the low four.

use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

/// A set of key indices packed into a `u16`, bit 0 = key 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeySet(u16);

impl KeySet {
    /// An empty set.
    pub const EMPTY: KeySet = KeySet(0);

    /// Constructs a set from a raw bitmask.
    pub const fn new(bits: u16) -> Self {
        Self(bits)
    }

    /// A set containing the first `width` key indices.
    pub const fn mask(width: u8) -> Self {
        debug_assert!(width <= 16);
        Self(((1u32 << width) - 1) as u16)
    }

    /// Returns the raw bitmask, bit 0 = key 0.
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Whether no keys are in the set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether the key at `index` is in the set.
    pub const fn contains(self, index: u8) -> bool {
        self.0 & (1 << index) != 0
    }

    /// Adds the key at `index` to the set.
    pub fn insert(&mut self, index: u8) {
        self.0 |= 1 << index;
    }

    /// The lowest-indexed key in the set, if any. This is the tie-break used when several
    /// bank-select keys land on the same tick.
    pub const fn lowest_set(self) -> Option<u8> {
        if self.0 == 0 {
            None
        } else {
            Some(self.0.trailing_zeros() as u8)
        }
    }

    /// Reindexes the set downwards by `count` positions, discarding the low bits. Used to view
    /// the playable keys of a banked layout as indices starting at zero.
    pub const fn shifted_down(self, count: u8) -> Self {
        Self(self.0 >> count)
    }

    /// Iterates over the key indices in the set, lowest first.
    pub fn iter(self) -> impl Iterator<Item = u8> {
        Indices(self.0)
    }

    /// Computes the down and up edge sets between two consecutive snapshots.
    pub const fn edges(previous: KeySet, current: KeySet) -> (KeySet, KeySet) {
        let down = KeySet(current.0 & !previous.0);
        let up = KeySet(previous.0 & !current.0);
        (down, up)
    }
}

impl BitOr for KeySet {
    type Output = KeySet;

    fn bitor(self, rhs: KeySet) -> KeySet {
        KeySet(self.0 | rhs.0)
    }
}

impl BitOrAssign for KeySet {
    fn bitor_assign(&mut self, rhs: KeySet) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for KeySet {
    type Output = KeySet;

    fn bitand(self, rhs: KeySet) -> KeySet {
        KeySet(self.0 & rhs.0)
    }
}

impl BitAndAssign for KeySet {
    fn bitand_assign(&mut self, rhs: KeySet) {
        self.0 &= rhs.0;
    }
}

impl Not for KeySet {
    type Output = KeySet;

    fn not(self) -> KeySet {
        KeySet(!self.0)
    }
}

struct Indices(u16);

impl Iterator for Indices {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.0 == 0 {
            return None;
        }
        let index = self.0.trailing_zeros() as u8;
        self.0 &= self.0 - 1;
        Some(index)
    }
}

/// Tracks one debounced input source across ticks: the current pressed set plus the down and
/// up edge sets derived by diffing against the previous tick's snapshot. The edge sets are
/// transient and only meaningful until the next [`KeyScan::scan`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyScan {
    state: KeySet,
    down: KeySet,
    up: KeySet,
}

impl KeyScan {
    /// Absorbs a fresh debounced snapshot and recomputes the edge sets.
    pub fn scan(&mut self, fresh: KeySet) {
        let (down, up) = KeySet::edges(self.state, fresh);
        self.down = down;
        self.up = up;
        self.state = fresh;
    }

    /// The currently pressed keys.
    pub const fn state(&self) -> KeySet {
        self.state
    }

    /// Keys that went down on the last scan.
    pub const fn down(&self) -> KeySet {
        self.down
    }

    /// Keys that were released on the last scan.
    pub const fn up(&self) -> KeySet {
        self.up
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_split_down_and_up() {
        let (down, up) = KeySet::edges(KeySet::new(0b0011), KeySet::new(0b0110));
        assert_eq!(
            KeySet::new(0b0100),
            down,
            "Expected left but got right"
        );
        assert_eq!(KeySet::new(0b0001), up, "Expected left but got right");
    }

    #[test]
    fn lowest_set_breaks_ties_leftmost() {
        assert_eq!(Some(1), KeySet::new(0b0110).lowest_set());
        assert_eq!(None, KeySet::EMPTY.lowest_set());
    }

    #[test]
    fn iter_ascends() {
        let mut iter = KeySet::new(0b1000_0000_0000_0101).iter();
        assert_eq!(Some(0), iter.next());
        assert_eq!(Some(2), iter.next());
        assert_eq!(Some(15), iter.next());
        assert_eq!(None, iter.next());
    }

    #[test]
    fn mask_covers_low_indices() {
        assert_eq!(KeySet::new(0x000f), KeySet::mask(4));
        assert_eq!(KeySet::new(0xffff), KeySet::mask(16));
    }

    #[test]
    fn shifted_down_reindexes() {
        let playable = KeySet::new(0b1_0000_0000).shifted_down(4);
        assert!(playable.contains(4), "Bit 8 should become index 4");
    }

    #[test]
    fn scan_tracks_edges_for_one_tick_only() {
        let mut scan = KeyScan::default();
        scan.scan(KeySet::new(0b1000));
        assert_eq!(KeySet::new(0b1000), scan.down());
        assert_eq!(KeySet::EMPTY, scan.up());

        // Held key: edge must clear on the next snapshot.
        scan.scan(KeySet::new(0b1000));
        assert_eq!(KeySet::EMPTY, scan.down());
        assert_eq!(KeySet::EMPTY, scan.up());

        scan.scan(KeySet::EMPTY);
        assert_eq!(KeySet::new(0b1000), scan.up());
    }
}
