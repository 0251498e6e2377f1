//! CPU execution engine.
//!
//! The clock lives outside the CPU: the driver calls [`Cpu::cycle`] once per
//! time step. A cycle either fetches and decodes a new opcode, or advances
//! the instruction already in flight by one step. Fetch never executes
//! anything, except for the single-byte NOP and HALT which retire within
//! their own fetch cycle.

use crate::cpu::decode::{self, Opcode};
use crate::cpu::instruction::Instruction;
use crate::cpu::memory::{Memory, MemoryError};
use crate::cpu::registers::{Flags, Registers};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// No instruction in flight; the next cycle fetches.
    Idle,
    /// A multi-cycle instruction is in progress.
    Running,
    /// The error flag is up. Only a reset leaves this state.
    Halted,
}

/// Why the machine stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum Fault {
    #[error("HALT executed")]
    Halt,

    #[error("illegal opcode {0:#04x}")]
    IllegalOpcode(u8),

    #[error("bus error: {0}")]
    Bus(#[from] MemoryError),

    #[error("halted from the front panel")]
    Manual,
}

/// The CPU. Memory is owned by the caller and lent on every cycle.
#[derive(Clone, Serialize, Deserialize)]
pub struct Cpu {
    /// CPU registers.
    pub regs: Registers,
    /// Status flags.
    pub flags: Flags,
    /// Cycles run since the last reset (halted cycles are not counted).
    pub cycles: u64,
    in_flight: Option<Instruction>,
    fault: Option<Fault>,
}

impl Cpu {
    /// Create a CPU in the "just turned on" state.
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            flags: Flags::new(),
            cycles: 0,
            in_flight: None,
            fault: None,
        }
    }

    /// Zero registers and flags and drop any instruction in flight.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.flags.reset();
        self.cycles = 0;
        self.in_flight = None;
        self.fault = None;
        log::info!("cpu reset");
    }

    /// Simulate a single machine cycle.
    ///
    /// Never fails: every fault surfaces as the error flag, after which this
    /// is a no-op until [`Cpu::reset`].
    pub fn cycle(&mut self, mem: &mut Memory) {
        if self.flags.error {
            return;
        }
        self.cycles += 1;

        if let Err(fault) = self.tick(mem) {
            self.raise(fault);
        }
    }

    fn tick(&mut self, mem: &mut Memory) -> Result<(), Fault> {
        match self.in_flight.as_mut() {
            None => self.fetch(mem),
            Some(instr) => {
                let progress = instr.advance(&mut self.regs, &mut self.flags, mem)?;
                if progress.is_completed() {
                    log::debug!("retired {} at pc={:#04x}", instr.opcode(), self.regs.program_counter);
                    self.in_flight = None;
                }
                Ok(())
            }
        }
    }

    /// Fetch and decode. Consumes the cycle.
    fn fetch(&mut self, mem: &mut Memory) -> Result<(), Fault> {
        let pc = self.regs.program_counter;
        let byte = mem.read(pc as usize)?;
        let opcode = decode::decode(byte).map_err(|_| Fault::IllegalOpcode(byte))?;

        let operand = if opcode.has_operand() {
            mem.read(self.regs.operand_addr() as usize)?
        } else {
            0
        };
        log::debug!("fetched {} {:#04x} at pc={:#04x}", opcode, operand, pc);

        let mut instr = Instruction::new(opcode, operand);
        if opcode.has_operand() {
            self.in_flight = Some(instr);
        } else {
            instr.advance(&mut self.regs, &mut self.flags, mem)?;
            if opcode == Opcode::Halt {
                self.fault = Some(Fault::Halt);
                log::warn!("machine halted at pc={:#04x}: {}", pc, Fault::Halt);
            }
        }

        Ok(())
    }

    fn raise(&mut self, fault: Fault) {
        log::warn!("machine fault at pc={:#04x}: {}", self.regs.program_counter, fault);
        self.flags.error = true;
        self.in_flight = None;
        self.fault = Some(fault);
    }

    /// Raise the error flag from outside (the front-panel HALT button).
    pub fn halt(&mut self) {
        if !self.flags.error {
            self.raise(Fault::Manual);
        }
    }

    /// Run until halted or `max_cycles` cycles have elapsed.
    ///
    /// Returns the number of cycles run.
    pub fn run_limited(&mut self, mem: &mut Memory, max_cycles: u64) -> u64 {
        let start_cycles = self.cycles;

        while !self.is_halted() && self.cycles - start_cycles < max_cycles {
            self.cycle(mem);
        }

        self.cycles - start_cycles
    }

    /// Current state of the fetch/execute state machine.
    pub fn state(&self) -> CpuState {
        if self.flags.error {
            CpuState::Halted
        } else if self.in_flight.is_some() {
            CpuState::Running
        } else {
            CpuState::Idle
        }
    }

    /// The instruction in flight, if any.
    pub fn in_flight(&self) -> Option<&Instruction> {
        self.in_flight.as_ref()
    }

    /// Why the machine halted, if it did.
    pub fn fault(&self) -> Option<Fault> {
        self.fault
    }

    /// Check if the CPU is halted.
    pub fn is_halted(&self) -> bool {
        self.flags.error
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state())
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .field("flags", &self.flags)
            .finish()
    }
}
