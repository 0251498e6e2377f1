//! CPU emulation.
//!
//! The machine is about as small as a stored-program computer gets:
//! - 8K of flat byte memory (only the first 256 bytes are reachable by the CPU)
//! - 2 registers: program counter and accumulator
//! - 3 flags: overflow, zero, error
//! - 8 instructions, one addressing mode (absolute)

pub mod memory;
pub mod registers;
pub mod decode;
pub mod instruction;
pub mod execute;

pub use memory::{Memory, MemoryError, MEMORY_SIZE};
pub use registers::{Flags, Registers};
pub use decode::{Opcode, DecodeError};
pub use instruction::{Instruction, Progress, Step};
pub use execute::{Cpu, CpuState, Fault};
