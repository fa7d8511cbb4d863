//! Disassembler for Computron programs.
//!
//! Converts raw instruction words back to readable assembly.

use crate::cpu::decode::{decode, Instruction, Operation};

/// Disassemble a single word to text.
///
/// Words that do not decode are rendered as data.
pub fn disassemble_word(word: i32) -> String {
    match decode(word) {
        Ok(instr) => format_instruction(&instr),
        Err(_) => format!("DAT {}", word),
    }
}

/// Disassemble a word image to a listing.
pub fn disassemble(image: &[i32]) -> String {
    let mut output = String::new();
    output.push_str("; Computron disassembly\n");
    output.push_str("; ---------------------\n\n");

    for (addr, &word) in image.iter().enumerate() {
        let line = disassemble_word(word);
        output.push_str(&format!("{:02}: {}  ; {:+05}\n", addr, line, word));
    }

    output
}

/// Format a decoded instruction as assembly text.
fn format_instruction(instr: &Instruction) -> String {
    match instr.op {
        Operation::Halt => instr.op.mnemonic().to_string(),
        _ => format!("{} {:02}", instr.op.mnemonic(), instr.addr),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disassemble_halt() {
        assert_eq!(disassemble_word(4300), "HALT");
    }

    #[test]
    fn test_disassemble_load() {
        assert_eq!(disassemble_word(2010), "LOAD 10");
    }

    #[test]
    fn test_disassemble_data_fallback() {
        assert_eq!(disassemble_word(42), "DAT 42");
        assert_eq!(disassemble_word(-17), "DAT -17");
    }

    #[test]
    fn test_disassemble_listing() {
        let listing = disassemble(&[1005, 4300]);

        assert!(listing.contains("00: READ 05"));
        assert!(listing.contains("01: HALT"));
    }
}
