//! Opcode table and decoder.
//!
//! Every instruction starts with one opcode byte. All opcodes except NOP and
//! HALT are followed by exactly one operand byte, which is always an absolute
//! memory address (there are no immediates and no other addressing modes).

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Machine-language opcodes. The discriminants are the binary encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Opcode {
    /// Does nothing. No operand.
    Nop = 0x00,

    /// Load: copy the byte at the operand address into the accumulator.
    Ld = 0x01,

    /// Store: copy the accumulator to the operand address.
    St = 0x02,

    /// Add the byte at the operand address to the accumulator.
    Add = 0x03,

    /// Raise the error flag to block the machine. No operand.
    Halt = 0x04,

    /// Jump to the operand address.
    Jmp = 0x05,

    /// Jump to the operand address if the accumulator is zero.
    Jze = 0x06,

    /// Subtract the byte at the operand address from the accumulator.
    Sub = 0x07,
}

impl Opcode {
    /// All opcodes in encoding order.
    pub const ALL: [Opcode; 8] = [
        Opcode::Nop,
        Opcode::Ld,
        Opcode::St,
        Opcode::Add,
        Opcode::Halt,
        Opcode::Jmp,
        Opcode::Jze,
        Opcode::Sub,
    ];

    /// The machine-language byte.
    pub const fn to_byte(self) -> u8 {
        self as u8
    }

    /// Total instruction length in bytes (opcode plus operand).
    pub const fn width(self) -> u8 {
        match self {
            Opcode::Nop | Opcode::Halt => 1,
            _ => 2,
        }
    }

    /// Whether an operand byte follows the opcode.
    pub const fn has_operand(self) -> bool {
        self.width() == 2
    }

    /// Assembly mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Nop => "NOP",
            Opcode::Ld => "LD",
            Opcode::St => "ST",
            Opcode::Add => "ADD",
            Opcode::Halt => "HALT",
            Opcode::Jmp => "JMP",
            Opcode::Jze => "JZE",
            Opcode::Sub => "SUB",
        }
    }

    /// Look up an opcode by mnemonic (case-insensitive).
    pub fn from_mnemonic(name: &str) -> Option<Opcode> {
        Opcode::ALL
            .into_iter()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(name))
    }
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> u8 {
        op.to_byte()
    }
}

impl TryFrom<u8> for Opcode {
    type Error = DecodeError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        decode(byte)
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Decode an opcode byte.
pub fn decode(byte: u8) -> Result<Opcode, DecodeError> {
    let opcode = match byte {
        0x00 => Opcode::Nop,
        0x01 => Opcode::Ld,
        0x02 => Opcode::St,
        0x03 => Opcode::Add,
        0x04 => Opcode::Halt,
        0x05 => Opcode::Jmp,
        0x06 => Opcode::Jze,
        0x07 => Opcode::Sub,
        _ => return Err(DecodeError::InvalidOpcode(byte)),
    };

    Ok(opcode)
}

/// Encode an instruction into its one or two bytes.
///
/// The operand is ignored for single-byte opcodes.
pub fn encode(opcode: Opcode, operand: u8) -> Vec<u8> {
    if opcode.has_operand() {
        vec![opcode.to_byte(), operand]
    } else {
        vec![opcode.to_byte()]
    }
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid opcode: {0:#04x}")]
    InvalidOpcode(u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_encoding() {
        assert_eq!(Opcode::Nop.to_byte(), 0x00);
        assert_eq!(Opcode::Ld.to_byte(), 0x01);
        assert_eq!(Opcode::St.to_byte(), 0x02);
        assert_eq!(Opcode::Add.to_byte(), 0x03);
        assert_eq!(Opcode::Halt.to_byte(), 0x04);
        assert_eq!(Opcode::Jmp.to_byte(), 0x05);
        assert_eq!(Opcode::Jze.to_byte(), 0x06);
        assert_eq!(Opcode::Sub.to_byte(), 0x07);
    }

    #[test]
    fn test_decode_every_known_byte() {
        for op in Opcode::ALL {
            assert_eq!(decode(op.to_byte()), Ok(op));
        }
    }

    #[test]
    fn test_decode_rejects_unknown() {
        for byte in 0x08..=0xff {
            assert_eq!(decode(byte), Err(DecodeError::InvalidOpcode(byte)));
        }
    }

    #[test]
    fn test_widths() {
        assert_eq!(Opcode::Nop.width(), 1);
        assert_eq!(Opcode::Halt.width(), 1);
        assert_eq!(encode(Opcode::Ld, 0x30), vec![0x01, 0x30]);
        assert_eq!(encode(Opcode::Halt, 0x30), vec![0x04]);
    }

    #[test]
    fn test_mnemonic_lookup() {
        assert_eq!(Opcode::from_mnemonic("jze"), Some(Opcode::Jze));
        assert_eq!(Opcode::from_mnemonic("HALT"), Some(Opcode::Halt));
        assert_eq!(Opcode::from_mnemonic("HLT"), None);
    }
}
