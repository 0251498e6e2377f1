//! Disassembler.
//!
//! Converts a memory image back to readable assembly.

use crate::cpu::decode::decode;

/// Disassemble the instruction at `addr`.
///
/// Returns the text and the number of bytes consumed. Bytes that do not
/// decode come back as `DAT`, as does an opcode whose operand would fall off
/// the end of the image.
pub fn disassemble_at(image: &[u8], addr: usize) -> (String, usize) {
    let Some(&byte) = image.get(addr) else {
        return (String::new(), 0);
    };

    match decode(byte) {
        Ok(op) if !op.has_operand() => (op.mnemonic().to_string(), 1),
        Ok(op) => match image.get(addr + 1) {
            Some(operand) => (format!("{} {:#04x}", op.mnemonic(), operand), 2),
            None => (format!("DAT {:#04x}", byte), 1),
        },
        Err(_) => (format!("DAT {:#04x}", byte), 1),
    }
}

/// Disassemble a whole image, one instruction per line.
///
/// Addresses and raw bytes go in comments so the listing assembles back
/// to the same image.
pub fn disassemble(image: &[u8]) -> String {
    let mut output = String::new();
    output.push_str("; CheaPU Disassembly\n");
    output.push_str("; ------------------\n\n");

    let mut addr = 0;
    while addr < image.len() {
        let (text, width) = disassemble_at(image, addr);
        let raw: Vec<String> = image[addr..addr + width]
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        output.push_str(&format!("    {:<12} ; {:02x}: {}\n", text, addr, raw.join(" ")));
        addr += width;
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::assemble;

    #[test]
    fn test_disassemble_halt() {
        assert_eq!(disassemble_at(&[0x04], 0), ("HALT".to_string(), 1));
    }

    #[test]
    fn test_disassemble_add() {
        assert_eq!(disassemble_at(&[0x03, 0x30], 0), ("ADD 0x30".to_string(), 2));
    }

    #[test]
    fn test_disassemble_unknown_and_truncated() {
        assert_eq!(disassemble_at(&[0x56], 0), ("DAT 0x56".to_string(), 1));
        assert_eq!(disassemble_at(&[0x05], 0), ("DAT 0x05".to_string(), 1));
        assert_eq!(disassemble_at(&[], 0), (String::new(), 0));
    }

    #[test]
    fn test_disassembly_reassembles() {
        let image = vec![0x01, 0x10, 0x07, 0x11, 0x06, 0x08, 0x00, 0x04, 0xff];

        let listing = disassemble(&image);

        assert!(listing.contains("LD 0x10      ; 00: 01 10"));
        assert!(listing.contains("DAT 0xff     ; 08: ff"));
        assert_eq!(assemble(&listing).unwrap(), image);
    }
}
