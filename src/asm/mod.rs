//! Program tooling.
//!
//! This module provides:
//! - A simple two-pass assembler (text → memory image)
//! - A disassembler (memory image → readable text)
//! - Raw image files (memory contents, byte for byte)

pub mod assembler;
pub mod disasm;
pub mod image;

pub use assembler::{assemble, AssemblerError};
pub use disasm::disassemble;
pub use image::{load_image, save_image, ImageError};
