//! Multi-cycle instruction execution.
//!
//! An [`Instruction`] is "the rest of one opcode": it is created when the
//! opcode is fetched and then advanced once per cycle until it reports
//! [`Progress::Completed`]. The state needed to resume is held by value (the
//! step index plus the operand byte), so nothing is suspended on a call
//! stack between cycles.
//!
//! Two-byte instructions go through two steps after their fetch cycle:
//!
//! | Step      | LD / ADD / SUB              | ST        | JMP        | JZE                         |
//! |-----------|-----------------------------|-----------|------------|-----------------------------|
//! | `Address` | -                           | -         | -          | A != 0: PC += 2, completed  |
//! | `Execute` | read `mem[op]`, update A    | store A   | PC = op    | PC = op                     |
//!
//! Memory is only touched in `Execute`, so a byte deposited between cycles
//! is seen by the instruction in flight.
//!
//! NOP and HALT start directly at `Execute`; the CPU runs that step inside
//! the fetch cycle.

use crate::cpu::decode::Opcode;
use crate::cpu::memory::{Memory, MemoryError};
use crate::cpu::registers::{Flags, Registers};
use serde::{Deserialize, Serialize};

/// What an [`Instruction::advance`] call left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// More steps remain; call `advance` again next cycle.
    Pending,
    /// The instruction has retired and can be dropped.
    Completed,
}

impl Progress {
    pub fn is_completed(self) -> bool {
        self == Progress::Completed
    }
}

/// The next piece of work an instruction will perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    /// Put the operand address on the bus.
    Address,
    /// Write results back to registers or memory.
    Execute,
}

/// An instruction in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    opcode: Opcode,
    step: Step,
    /// Operand byte captured at fetch time.
    operand: u8,
}

impl Instruction {
    /// Build the instruction for a freshly fetched opcode.
    pub fn new(opcode: Opcode, operand: u8) -> Self {
        let step = if opcode.has_operand() {
            Step::Address
        } else {
            Step::Execute
        };

        Self {
            opcode,
            step,
            operand,
        }
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn operand(&self) -> u8 {
        self.operand
    }

    /// Perform the work scheduled for this cycle.
    ///
    /// A bus error aborts the instruction; the caller treats it as a machine
    /// fault.
    pub fn advance(
        &mut self,
        regs: &mut Registers,
        flags: &mut Flags,
        mem: &mut Memory,
    ) -> Result<Progress, MemoryError> {
        match self.step {
            Step::Address => Ok(self.address(regs)),
            Step::Execute => {
                self.execute(regs, flags, mem)?;
                Ok(Progress::Completed)
            }
        }
    }

    fn address(&mut self, regs: &mut Registers) -> Progress {
        // Branch not taken: skip the operand without another cycle.
        if self.opcode == Opcode::Jze && regs.accumulator != 0 {
            regs.advance_pc(2);
            return Progress::Completed;
        }

        self.step = Step::Execute;
        Progress::Pending
    }

    fn execute(&mut self, regs: &mut Registers, flags: &mut Flags, mem: &mut Memory) -> Result<(), MemoryError> {
        match self.opcode {
            Opcode::Nop => {
                regs.advance_pc(1);
            }

            Opcode::Halt => {
                flags.error = true;
            }

            Opcode::Ld => {
                regs.accumulator = mem.read(self.operand as usize)?;
                flags.set_zero_from(regs.accumulator);
                regs.advance_pc(2);
            }

            Opcode::St => {
                mem.write(self.operand as usize, regs.accumulator)?;
                regs.advance_pc(2);
            }

            Opcode::Add => {
                let (result, carry) = regs.accumulator.overflowing_add(mem.read(self.operand as usize)?);
                regs.accumulator = result;
                flags.overflow = carry;
                flags.set_zero_from(result);
                regs.advance_pc(2);
            }

            Opcode::Sub => {
                let (result, borrow) = regs.accumulator.overflowing_sub(mem.read(self.operand as usize)?);
                regs.accumulator = result;
                flags.overflow = borrow;
                flags.set_zero_from(result);
                regs.advance_pc(2);
            }

            Opcode::Jmp | Opcode::Jze => {
                regs.jump(self.operand);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bench {
        regs: Registers,
        flags: Flags,
        mem: Memory,
    }

    impl Bench {
        fn new() -> Self {
            Self {
                regs: Registers::new(),
                flags: Flags::new(),
                mem: Memory::new(),
            }
        }

        fn advance(&mut self, instr: &mut Instruction) -> Progress {
            instr.advance(&mut self.regs, &mut self.flags, &mut self.mem).unwrap()
        }
    }

    #[test]
    fn test_single_byte_starts_at_execute() {
        assert_eq!(Instruction::new(Opcode::Nop, 0).step(), Step::Execute);
        assert_eq!(Instruction::new(Opcode::Halt, 0).step(), Step::Execute);
        assert_eq!(Instruction::new(Opcode::Ld, 0x10).step(), Step::Address);
    }

    #[test]
    fn test_load_takes_two_steps() {
        let mut bench = Bench::new();
        bench.mem.write(0x30, 42).unwrap();
        let mut ld = Instruction::new(Opcode::Ld, 0x30);

        assert_eq!(bench.advance(&mut ld), Progress::Pending);
        assert_eq!(bench.regs.accumulator, 0);
        assert_eq!(ld.step(), Step::Execute);

        assert_eq!(bench.advance(&mut ld), Progress::Completed);
        assert_eq!(bench.regs.accumulator, 42);
        assert_eq!(bench.regs.program_counter, 2);
    }

    #[test]
    fn test_load_reads_memory_on_execute() {
        let mut bench = Bench::new();
        bench.mem.write(0x30, 7).unwrap();
        let mut ld = Instruction::new(Opcode::Ld, 0x30);

        bench.advance(&mut ld);
        bench.mem.write(0x30, 99).unwrap();
        bench.advance(&mut ld);

        assert_eq!(bench.regs.accumulator, 99);
    }

    #[test]
    fn test_store_writes_on_execute() {
        let mut bench = Bench::new();
        bench.regs.accumulator = 12;
        let mut st = Instruction::new(Opcode::St, 0x40);

        assert_eq!(bench.advance(&mut st), Progress::Pending);
        assert_eq!(bench.mem.read(0x40).unwrap(), 0);

        assert_eq!(bench.advance(&mut st), Progress::Completed);
        assert_eq!(bench.mem.read(0x40).unwrap(), 12);
    }

    #[test]
    fn test_jze_not_taken_completes_early() {
        let mut bench = Bench::new();
        bench.regs.accumulator = 54;
        let mut jze = Instruction::new(Opcode::Jze, 0x30);

        assert_eq!(bench.advance(&mut jze), Progress::Completed);
        assert_eq!(bench.regs.program_counter, 2);
    }

    #[test]
    fn test_jze_taken() {
        let mut bench = Bench::new();
        let mut jze = Instruction::new(Opcode::Jze, 0x30);

        assert_eq!(bench.advance(&mut jze), Progress::Pending);
        assert_eq!(bench.advance(&mut jze), Progress::Completed);
        assert_eq!(bench.regs.program_counter, 0x30);
    }

    #[test]
    fn test_add_sets_overflow_on_carry() {
        let mut bench = Bench::new();
        bench.regs.accumulator = 200;
        bench.mem.write(0x30, 100).unwrap();
        let mut add = Instruction::new(Opcode::Add, 0x30);

        bench.advance(&mut add);
        bench.advance(&mut add);

        assert_eq!(bench.regs.accumulator, 44);
        assert!(bench.flags.overflow);
        assert!(!bench.flags.zero);
    }

    #[test]
    fn test_sub_sets_overflow_on_borrow() {
        let mut bench = Bench::new();
        bench.regs.accumulator = 1;
        bench.mem.write(0x30, 2).unwrap();
        let mut sub = Instruction::new(Opcode::Sub, 0x30);

        bench.advance(&mut sub);
        bench.advance(&mut sub);

        assert_eq!(bench.regs.accumulator, 0xff);
        assert!(bench.flags.overflow);
    }

    #[test]
    fn test_sub_to_zero_sets_zero_and_clears_overflow() {
        let mut bench = Bench::new();
        bench.regs.accumulator = 42;
        bench.flags.overflow = true;
        bench.mem.write(0x30, 42).unwrap();
        let mut sub = Instruction::new(Opcode::Sub, 0x30);

        bench.advance(&mut sub);
        bench.advance(&mut sub);

        assert_eq!(bench.regs.accumulator, 0);
        assert!(bench.flags.zero);
        assert!(!bench.flags.overflow);
    }

    #[test]
    fn test_halt_raises_error() {
        let mut bench = Bench::new();
        let mut halt = Instruction::new(Opcode::Halt, 0);

        assert_eq!(bench.advance(&mut halt), Progress::Completed);
        assert!(bench.flags.error);
        assert_eq!(bench.regs.program_counter, 0);
    }
}
