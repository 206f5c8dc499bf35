//! The analog pipeline: noise averaging, hysteresis, and the dual-zone remap that turns each
//! expansion slider into one or two CCs plus a pair of end-stop notes.
//!
//! Values arrive as 10-bit averages. A dead-band keeps ADC jitter from becoming MIDI traffic,
//! then the value is reduced to 7 bits and compared against the last emitted position; only a
//! 7-bit change produces output. The mapping carves the travel into zones:
//!
//! ```text
//!   0  3             64           124 127
//!   |--|-------------|-------------|--|    full 7-bit range
//!      |0=======================127|       CC A (always)
//!                    |0=========105|       CC B (Traktor only)
//!   |on|..............................|    note A at the bottom stop (Traktor only)
//!   |..............................|on|    note B at the top stop (Traktor only)
//! ```

use crate::config::DeviceMode;
use crate::keymap::note;
use crate::midi::MidiOut;

/// Number of analog expansion channels.
pub const CHANNEL_COUNT: usize = 4;

/// Bottom dead-zone boundary in 7-bit units.
pub const NOTEON_LOW: u8 = 3;

/// Top dead-zone boundary in 7-bit units.
pub const NOTEON_HIGH: u8 = 127 - NOTEON_LOW;

/// Controller number of channel 0's primary CC; each channel takes two consecutive numbers.
pub const BASE_CC: u8 = 16;

/// Note number of channel 0's bottom end-stop; each channel takes two consecutive notes.
pub const BASE_NOTE: u8 = 100;

/// Minimum 10-bit delta that counts as user action rather than sampling noise.
pub const DEAD_BAND: u16 = 8;

/// Linearly rescales `value` from the domain `[from, to]` onto `[lo, hi]`, clamping outside
/// the domain. Integer arithmetic, truncating division.
pub fn remap(value: u8, from: u8, to: u8, lo: u8, hi: u8) -> u8 {
    if value < from {
        return lo;
    }
    if value > to {
        return hi;
    }
    let numer = (value - from) as u16 * (hi - lo) as u16;
    let denom = (to - from) as u16;
    lo + (numer / denom) as u8
}

/// Per-channel filter state retained across ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AnalogChannel {
    /// The last 10-bit value that produced output (or absorbed a sub-dead-band wiggle).
    previous: u16,
    /// Last value sent on the second CC, so its return to zero is sent once, not every tick.
    second_cc: u8,
}

impl AnalogChannel {
    /// Feeds one tick's 10-bit average through the filter, emitting CC and note events for any
    /// 7-bit position change. `index` selects the channel's CC and note numbers.
    pub fn update(&mut self, index: u8, average: u16, mode: DeviceMode, out: &mut MidiOut<'_>) {
        let mut sample = average;

        // Hysteresis: a wiggle inside the dead-band is noise, not movement.
        let difference = sample as i32 - self.previous as i32;
        if difference.unsigned_abs() < DEAD_BAND as u32 {
            sample = self.previous;
        }

        // Drop to CC resolution before deciding whether anything changed.
        let value = (sample >> 3) as u8;
        let previous = (self.previous >> 3) as u8;
        if value == previous {
            return;
        }

        let cc_a = BASE_CC + 2 * index;
        let cc_b = cc_a + 1;
        let note_a = note(BASE_NOTE + 2 * index);
        let note_b = note(BASE_NOTE + 2 * index + 1);

        if (NOTEON_LOW..=NOTEON_HIGH).contains(&value) {
            out.control_change(cc_a, remap(value, NOTEON_LOW, NOTEON_HIGH, 0, 127));

            if mode == DeviceMode::Traktor {
                // The second CC covers only the upper half of the travel.
                if value >= 64 {
                    self.second_cc = remap(value, 64, NOTEON_HIGH, 0, 105);
                    out.control_change(cc_b, self.second_cc);
                } else if self.second_cc > 0 {
                    self.second_cc = 0;
                    out.control_change(cc_b, 0);
                }
            }
        }

        // End-stop notes fire on zone crossings: on when leaving the bottom tick or entering
        // the top tick, off on the way back. The stream records them in the ledger so the
        // LEDs reflect them.
        if mode == DeviceMode::Traktor {
            if value <= NOTEON_LOW && previous > NOTEON_LOW {
                out.note(note_a, true);
            } else if value > NOTEON_LOW && previous <= NOTEON_LOW {
                out.note(note_a, false);
            } else if value >= NOTEON_HIGH && previous < NOTEON_HIGH {
                out.note(note_b, true);
            } else if value < NOTEON_HIGH && previous >= NOTEON_HIGH {
                out.note(note_b, false);
            }
        }

        self.previous = sample;
    }
}
