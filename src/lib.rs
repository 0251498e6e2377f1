//! # CheaPU
//!
//! A cycle-by-cycle emulator of a minimal, fictional 8-bit accumulator
//! machine.
//!
//! The CPU has no clock of its own: whoever drives it calls
//! [`Cpu::cycle`] once per time step, and instructions that need several
//! cycles stay in flight between calls. Everything around the core (panel
//! switches, paper tape, terminal and browser front ends) only resets the
//! CPU, ticks it, and pokes bytes into [`Memory`].

pub mod cpu;
pub mod asm;
pub mod panel;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use cpu::{Cpu, CpuState, Fault, Flags, Memory, MemoryError, Opcode, Registers, MEMORY_SIZE};
pub use asm::{assemble, disassemble, load_image, save_image, AssemblerError, ImageError};
pub use panel::{FrontPanel, PaperTape, SwitchBank};

#[cfg(feature = "tui")]
pub use tui::run_panel;
