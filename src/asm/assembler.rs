//! Two-pass assembler.
//!
//! Syntax:
//! ```text
//! ; Comment
//! LOOP:           ; Define a label
//!     LD  COUNT   ; Load from the address of COUNT
//!     SUB ONE     ; Subtract
//!     JZE DONE    ; Forward references are fine
//!     ST  COUNT
//!     JMP LOOP
//! DONE:
//!     HALT
//!
//!     ORG 0x30    ; Set origin address
//! COUNT: DAT 3    ; Define a data byte
//! ONE:   DAT 0b00000001
//! ```
//!
//! The output is a raw memory image starting at address 0; gaps left by `ORG`
//! are zero-filled.

use crate::cpu::decode::{encode, Opcode};
use std::collections::HashMap;
use thiserror::Error;

/// Highest address the assembler can place a byte at (the PC is 8 bits).
const MAX_ADDR: usize = u8::MAX as usize;

/// Assemble source code to a memory image.
pub fn assemble(source: &str) -> Result<Vec<u8>, AssemblerError> {
    let mut asm = Assembler::new();
    asm.assemble(source)
}

/// The assembler state.
struct Assembler {
    /// Current address (origin).
    current_addr: usize,
    /// Symbol table (label -> address).
    symbols: HashMap<String, u8>,
    /// Label references waiting for pass 2: (image offset, label, source line).
    pending: Vec<(usize, String, usize)>,
    /// Output image.
    output: Vec<u8>,
}

impl Assembler {
    fn new() -> Self {
        Self {
            current_addr: 0,
            symbols: HashMap::new(),
            pending: Vec::new(),
            output: Vec::new(),
        }
    }

    fn assemble(&mut self, source: &str) -> Result<Vec<u8>, AssemblerError> {
        // Pass 1: Collect labels and generate code
        for (line_num, line) in source.lines().enumerate() {
            self.process_line(line, line_num + 1)?;
        }

        // Pass 2: Patch label references
        self.resolve_references()?;

        Ok(std::mem::take(&mut self.output))
    }

    fn process_line(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        // Strip comments
        let line = match line.find(';') {
            Some(idx) => &line[..idx],
            None => line,
        };
        let line = line.trim();

        if line.is_empty() {
            return Ok(());
        }

        if let Some(colon_idx) = line.find(':') {
            let label = line[..colon_idx].trim().to_uppercase();
            self.define_label(label, line_num)?;

            let rest = line[colon_idx + 1..].trim();
            if !rest.is_empty() {
                return self.process_statement(rest, line_num);
            }
            return Ok(());
        }

        self.process_statement(line, line_num)
    }

    fn define_label(&mut self, label: String, line_num: usize) -> Result<(), AssemblerError> {
        let valid = label
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(AssemblerError::SyntaxError {
                line: line_num,
                message: format!("invalid label '{}'", label),
            });
        }

        if self.symbols.contains_key(&label) {
            return Err(AssemblerError::DuplicateLabel { line: line_num, label });
        }

        let addr = self.here(line_num)?;
        self.symbols.insert(label, addr);
        Ok(())
    }

    fn process_statement(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let mnemonic = parts[0].to_uppercase();
        if parts.len() > 2 {
            return Err(AssemblerError::SyntaxError {
                line: line_num,
                message: format!("unexpected '{}'", parts[2]),
            });
        }
        let operand = parts.get(1).copied();

        match mnemonic.as_str() {
            // Directives
            "ORG" => {
                let text = self.require(operand, &mnemonic, line_num)?;
                let addr = parse_number(text, line_num)?;
                if !(0..=MAX_ADDR as i64).contains(&addr) {
                    return Err(AssemblerError::ValueOutOfRange { line: line_num, value: addr });
                }
                self.current_addr = addr as usize;
            }

            "DAT" | "DB" => {
                let text = self.require(operand, &mnemonic, line_num)?;
                let offset = self.current_addr;
                let value = self.parse_data(text, offset, line_num)?;
                self.emit(value, line_num)?;
            }

            // Instructions
            _ => {
                let opcode = Opcode::from_mnemonic(&mnemonic).ok_or_else(|| {
                    AssemblerError::UnknownMnemonic { line: line_num, mnemonic: mnemonic.clone() }
                })?;

                let addr = if opcode.has_operand() {
                    let text = self.require(operand, &mnemonic, line_num)?;
                    let offset = self.current_addr + 1;
                    self.parse_address(text, offset, line_num)?
                } else {
                    if let Some(extra) = operand {
                        return Err(AssemblerError::SyntaxError {
                            line: line_num,
                            message: format!("{} takes no operand, found '{}'", mnemonic, extra),
                        });
                    }
                    0
                };

                for byte in encode(opcode, addr) {
                    self.emit(byte, line_num)?;
                }
            }
        }

        Ok(())
    }

    fn require<'a>(&self, operand: Option<&'a str>, mnemonic: &str, line_num: usize) -> Result<&'a str, AssemblerError> {
        operand.ok_or_else(|| AssemblerError::MissingOperand {
            line: line_num,
            mnemonic: mnemonic.to_string(),
        })
    }

    /// An address operand: 0-255 or a label.
    fn parse_address(&mut self, text: &str, offset: usize, line_num: usize) -> Result<u8, AssemblerError> {
        if !starts_numeric(text) {
            self.pending.push((offset, text.to_uppercase(), line_num));
            return Ok(0); // Placeholder, patched in pass 2
        }

        let value = parse_number(text, line_num)?;
        u8::try_from(value).map_err(|_| AssemblerError::ValueOutOfRange { line: line_num, value })
    }

    /// A data byte: -128..=255 (negatives stored as two's complement) or a label.
    fn parse_data(&mut self, text: &str, offset: usize, line_num: usize) -> Result<u8, AssemblerError> {
        if !starts_numeric(text) {
            return self.parse_address(text, offset, line_num);
        }

        let value = parse_number(text, line_num)?;
        match value {
            0..=255 => Ok(value as u8),
            -128..=-1 => Ok(value as i8 as u8),
            _ => Err(AssemblerError::ValueOutOfRange { line: line_num, value }),
        }
    }

    /// Current address as a byte.
    fn here(&self, line_num: usize) -> Result<u8, AssemblerError> {
        u8::try_from(self.current_addr).map_err(|_| AssemblerError::AddressOverflow { line: line_num })
    }

    fn emit(&mut self, byte: u8, line_num: usize) -> Result<(), AssemblerError> {
        let addr = self.here(line_num)? as usize;
        if self.output.len() <= addr {
            self.output.resize(addr + 1, 0);
        }
        self.output[addr] = byte;
        self.current_addr += 1;
        Ok(())
    }

    fn resolve_references(&mut self) -> Result<(), AssemblerError> {
        for (offset, label, line_num) in &self.pending {
            let addr = self.symbols.get(label).ok_or_else(|| AssemblerError::UndefinedLabel {
                line: *line_num,
                label: label.clone(),
            })?;

            self.output[*offset] = *addr;
        }
        Ok(())
    }
}

fn starts_numeric(text: &str) -> bool {
    text.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '+')
}

/// Parse a decimal, `0x` hex or `0b` binary literal.
fn parse_number(text: &str, line_num: usize) -> Result<i64, AssemblerError> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let lower = digits.to_ascii_lowercase();
    let parsed = if let Some(hex) = lower.strip_prefix("0x") {
        i64::from_str_radix(hex, 16)
    } else if let Some(bin) = lower.strip_prefix("0b") {
        i64::from_str_radix(&bin.replace('_', ""), 2)
    } else {
        lower.parse::<i64>()
    };

    let value = parsed.map_err(|_| AssemblerError::SyntaxError {
        line: line_num,
        message: format!("invalid number '{}'", text),
    })?;

    Ok(if negative { -value } else { value })
}

/// Errors that can occur during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("syntax error on line {line}: {message}")]
    SyntaxError { line: usize, message: String },

    #[error("unknown mnemonic on line {line}: {mnemonic}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("missing operand on line {line}: {mnemonic} needs an address")]
    MissingOperand { line: usize, mnemonic: String },

    #[error("undefined label on line {line}: {label}")]
    UndefinedLabel { line: usize, label: String },

    #[error("duplicate label on line {line}: {label}")]
    DuplicateLabel { line: usize, label: String },

    #[error("value out of range on line {line}: {value}")]
    ValueOutOfRange { line: usize, value: i64 },

    #[error("program runs past address 0xff on line {line}")]
    AddressOverflow { line: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_simple() {
        let source = r#"
            ; Simple test program
            LD 0x10
            ADD 0x11
            ST 0x12
            HALT
        "#;

        let result = assemble(source).unwrap();
        assert_eq!(result, vec![0x01, 0x10, 0x03, 0x11, 0x02, 0x12, 0x04]);
    }

    #[test]
    fn test_assemble_with_labels() {
        let source = r#"
        START:
            LD VALUE
            JMP END
            NOP
        END:
            HALT
        VALUE: DAT 42
        "#;

        let result = assemble(source).unwrap();
        assert_eq!(result, vec![0x01, 0x06, 0x05, 0x05, 0x00, 0x04, 42]);
    }

    #[test]
    fn test_assemble_org_and_data() {
        let source = r#"
            JMP 0x04
            ORG 4
            HALT
            DAT 0b1010_0101
            DAT -1
            dat 0x2A
        "#;

        let result = assemble(source).unwrap();
        assert_eq!(result, vec![0x05, 0x04, 0x00, 0x00, 0x04, 0xa5, 0xff, 0x2a]);
    }

    #[test]
    fn test_label_as_data() {
        let result = assemble("PTR: DAT PTR\n").unwrap();
        assert_eq!(result, vec![0x00]);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            assemble("FOO 1"),
            Err(AssemblerError::UnknownMnemonic { line: 1, .. })
        ));
        assert!(matches!(
            assemble("NOP\nJMP NOWHERE"),
            Err(AssemblerError::UndefinedLabel { line: 2, .. })
        ));
        assert!(matches!(
            assemble("A: NOP\nA: NOP"),
            Err(AssemblerError::DuplicateLabel { line: 2, .. })
        ));
        assert!(matches!(
            assemble("LD 256"),
            Err(AssemblerError::ValueOutOfRange { line: 1, value: 256 })
        ));
        assert!(matches!(
            assemble("LD"),
            Err(AssemblerError::MissingOperand { line: 1, .. })
        ));
        assert!(matches!(
            assemble("HALT 3"),
            Err(AssemblerError::SyntaxError { line: 1, .. })
        ));
        assert!(matches!(
            assemble("ORG 255\nLD 1"),
            Err(AssemblerError::AddressOverflow { line: 2 })
        ));
    }
}
