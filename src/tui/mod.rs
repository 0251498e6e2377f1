//! Terminal front panel.
//!
//! Provides an interactive stand-in for the machine's console:
//! - Flag, accumulator and program counter lamps
//! - Address/value toggle switches and the paper tape reader
//! - Reset/halt buttons and a free-running clock, one cycle per frame
//! - Disassembly view

mod app;
mod ui;

pub use app::{PanelApp, Row, run_panel};
