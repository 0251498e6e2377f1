//! CPU registers and flags.
//!
//! The machine has exactly two registers:
//! - program counter: 8 bits, wraps at 256
//! - accumulator: 8 bits, implicit operand and destination of arithmetic
//!
//! and three one-bit flags: overflow, zero and error.

use serde::{Serialize, Deserialize};

/// The register file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// Address of the next opcode to fetch.
    pub program_counter: u8,

    /// The only general-purpose register.
    pub accumulator: u8,
}

impl Registers {
    /// Create a new register file with all values zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all registers to zero.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Move the program counter forward by `n` bytes.
    pub fn advance_pc(&mut self, n: u8) {
        self.program_counter = self.program_counter.wrapping_add(n);
    }

    /// Set the program counter to an absolute address.
    pub fn jump(&mut self, addr: u8) {
        self.program_counter = addr;
    }

    /// Address of the operand byte of a two-byte instruction at the PC.
    pub fn operand_addr(&self) -> u8 {
        self.program_counter.wrapping_add(1)
    }
}

/// Status flags. Packed in hardware, three plain booleans here.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flags {
    /// Carry out of ADD or borrow out of SUB.
    pub overflow: bool,

    /// Last accumulator write produced 0.
    pub zero: bool,

    /// Machine fault. Sticky until reset.
    pub error: bool,
}

impl Flags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Update the zero flag from an accumulator result.
    pub fn set_zero_from(&mut self, value: u8) {
        self.zero = value == 0;
    }
}
