//! User-configurable settings. Everything here is decided elsewhere — the menu system and the
//! persistent store own these values — and is strictly read-only to the tick engine, which
//! receives a [`Settings`] reference every tick.
//!
//! The mode enums convert to and from raw bytes (the form the persistent store keeps them in)
//! via `num`'s primitive casts, and implement [`CycleConfig`] so a single-button menu can step
//! through their variants.

use num_traits::{FromPrimitive, ToPrimitive};
use wmidi::{Channel, U7};

/// Output policy tweaks for specific controller software.
///
/// The zone and threshold arithmetic is mode-agnostic; the mode only gates which extra
/// messages are emitted alongside the plain ones.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[derive(num_derive::FromPrimitive, num_derive::ToPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceMode {
    /// Plain notes and CCs only.
    #[default]
    Default,
    /// Adds the second analog CC zone and the analog end-stop notes.
    Traktor,
    /// Duplicates every key note as a raw CC toggle on the next channel up, because the target
    /// software expects discrete feedback rather than note messages for some mappings.
    Ableton,
}

/// How the sixteen grid keys and the expansion pins are partitioned into banks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[derive(num_derive::FromPrimitive, num_derive::ToPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FourbanksMode {
    /// A single 16-key layout; bank 0 is always selected.
    #[default]
    Off,
    /// The top row of the grid selects among four 12-key banks.
    Internal,
    /// The digital expansion pins select among four 16-key banks; the pins stop producing
    /// notes of their own.
    External,
}

/// Steps an enum through its variants, wrapping at the end. The pushbutton menu uses this to
/// advance a setting one press at a time.
pub trait CycleConfig {
    /// Returns the variant after `self`, wrapping back to the first.
    fn cycle(self) -> Self
    where
        Self: FromPrimitive + ToPrimitive + Sized,
    {
        let current = self.to_u8().unwrap_or(0);
        match Self::from_u8(current.wrapping_add(1)) {
            Some(next) => next,
            None => Self::from_u8(0).expect("configuration enums have at least one variant"),
        }
    }
}

impl CycleConfig for DeviceMode {}
impl CycleConfig for FourbanksMode {}

/// The complete configuration snapshot the engine reads each tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Channel on which inbound Note events are honored and outbound events are sent.
    pub channel: Channel,
    /// Velocity attached to every synthesized Note-On.
    pub velocity: U7,
    /// Controller-software output policy.
    pub device_mode: DeviceMode,
    /// Bank partitioning of the key grid and expansion pins.
    pub fourbanks: FourbanksMode,
    /// Overlay the raw key-press bitset onto the grid LEDs.
    pub keypress_leds: bool,
    /// Overlay the raw expansion-press bitset onto the expansion LEDs.
    pub expansion_keypress_leds: bool,
    /// Feed key edges to the combo recognizer.
    pub combos_enabled: bool,
    /// The unit is mounted rotated; slider inversion does not apply.
    pub rotate_enabled: bool,
    /// Invert individual analog channels (applied before hysteresis).
    pub invert_sliders: [bool; 4],
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            channel: Channel::Ch1,
            velocity: U7::from_u8_lossy(127),
            device_mode: DeviceMode::default(),
            fourbanks: FourbanksMode::default(),
            keypress_leds: true,
            expansion_keypress_leds: true,
            combos_enabled: false,
            rotate_enabled: false,
            invert_sliders: [false; 4],
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Settings {
    fn format(&self, fmt: defmt::Formatter) {
        let Settings {
            channel,
            velocity,
            device_mode,
            fourbanks,
            keypress_leds,
            expansion_keypress_leds,
            combos_enabled,
            rotate_enabled,
            invert_sliders,
        } = *self;
        defmt::write!(
            fmt,
            "Settings {{ channel: {}, velocity: {}, device_mode: {}, fourbanks: {}, \
             keypress_leds: {}, expansion_keypress_leds: {}, combos_enabled: {}, \
             rotate_enabled: {}, invert_sliders: {} }}",
            channel.number(),
            u8::from(velocity),
            device_mode,
            fourbanks,
            keypress_leds,
            expansion_keypress_leds,
            combos_enabled,
            rotate_enabled,
            invert_sliders
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_wraps_around() {
        assert_eq!(
            DeviceMode::Traktor,
            DeviceMode::Default.cycle(),
            "Expected left but got right"
        );
        assert_eq!(DeviceMode::Ableton, DeviceMode::Traktor.cycle());
        assert_eq!(DeviceMode::Default, DeviceMode::Ableton.cycle());
    }

    #[test]
    fn modes_decode_from_stored_bytes() {
        assert_eq!(Some(FourbanksMode::External), FourbanksMode::from_u8(2));
        assert_eq!(None, FourbanksMode::from_u8(3), "Expected left but got right");
    }
}
