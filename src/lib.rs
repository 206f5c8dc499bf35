//! This crate contains the architecture-agnostic control core for a 4x4 USB-MIDI control surface:
//! a grid of sixteen backlit keys, four digital and four analog expansion ports, and a
//! clock-synchronized status lamp. Once per tick the [`engine::Engine`] drains inbound USB-MIDI
//! traffic, scans the debounced key and expansion inputs, translates them into an outbound MIDI
//! event stream, and renders the LED state — all against a single note-velocity ledger so the
//! lights always agree with the wire.
//!
//! Hardware access (USB transport, debounce timers, ADC sampling, LED shift registers) lives in
//! the firmware crate behind the traits in [`io`]; everything here runs unchanged on the build
//! host, which is where the unit tests execute.

#![deny(missing_docs)]
#![no_std]

/// Per-channel smoothing, hysteresis, and dual-zone remapping for the analog expansion ports.
pub mod analog;

/// The Fourbanks bank-selection state machine.
pub mod banks;

/// Translation of externally recognized key gestures into reserved notes.
pub mod combo;

/// User-configurable settings (read-only to the engine) and helpers for the menu system.
pub mod config;

/// The per-tick orchestrator owning all mutable core state.
pub mod engine;

/// Traits implemented by the hardware drivers the engine collaborates with.
pub mod io;

/// The fixed mapping between physical key indices and MIDI notes.
pub mod keymap;

/// Fixed-width key bitsets and edge detection.
pub mod keyset;

/// LED pattern derivation from note state.
pub mod leds;

/// USB-MIDI event packets, the inbound demultiplexer, and the buffered outbound stream.
pub mod midi;

/// The 128-entry note-velocity ledger.
pub mod note_table;
