//! Simple assembler for Computron programs.
//!
//! Syntax:
//! ```text
//! ; Comment
//! LABEL:          ; Define a label
//!     READ 10     ; Read input into address 10
//!     LOAD 10
//!     ADD VALUE   ; Operands may be labels
//!     BRANCHNEG LABEL
//!     HALT
//!
//!     ORG 50      ; Set origin address
//! VALUE: DAT 42   ; Define data value
//! ```

use std::collections::HashMap;

use thiserror::Error;

use crate::cpu::decode::Operation;
use crate::cpu::memory::MEMORY_SIZE;

/// Assemble source code to a word image.
pub fn assemble(source: &str) -> Result<Vec<i32>, AssemblerError> {
    let mut asm = Assembler::new();
    asm.assemble(source)
}

/// The assembler state.
struct Assembler {
    /// Current address (origin).
    current_addr: usize,
    /// Symbol table (label -> address).
    symbols: HashMap<String, usize>,
    /// Pending references (image index, operation, label, source line).
    pending: Vec<(usize, Operation, String, usize)>,
    /// Output image, indexed by address.
    image: Vec<i32>,
}

impl Assembler {
    fn new() -> Self {
        Self {
            current_addr: 0,
            symbols: HashMap::new(),
            pending: Vec::new(),
            image: Vec::new(),
        }
    }

    fn assemble(&mut self, source: &str) -> Result<Vec<i32>, AssemblerError> {
        // Pass 1: collect labels and generate code
        for (line_num, line) in source.lines().enumerate() {
            self.process_line(line, line_num + 1)?;
        }

        // Pass 2: resolve forward references
        self.resolve_references()?;

        Ok(self.image.clone())
    }

    fn process_line(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with(';') {
            return Ok(());
        }

        // Remove inline comments
        let line = if let Some(idx) = line.find(';') {
            line[..idx].trim()
        } else {
            line
        };

        if line.is_empty() {
            return Ok(());
        }

        // Check for label definition
        if let Some(colon_idx) = line.find(':') {
            let label = line[..colon_idx].trim().to_uppercase();
            if !label.is_empty() {
                if self.symbols.contains_key(&label) {
                    return Err(AssemblerError::DuplicateLabel {
                        line: line_num,
                        label,
                    });
                }
                self.symbols.insert(label, self.current_addr);
            }

            // Process rest of line if any
            let rest = line[colon_idx + 1..].trim();
            if !rest.is_empty() {
                return self.process_statement(rest, line_num);
            }
            return Ok(());
        }

        self.process_statement(line, line_num)
    }

    fn process_statement(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            return Ok(());
        }

        let mnemonic = parts[0].to_uppercase();
        let operand = if parts.len() > 1 { Some(parts[1]) } else { None };

        match mnemonic.as_str() {
            // Directives
            "ORG" => {
                let addr = self.require_operand(operand, "ORG", line_num)?;
                let addr: usize = addr.parse().map_err(|_| AssemblerError::SyntaxError {
                    line: line_num,
                    message: format!("ORG requires a literal address, found {}", addr),
                })?;
                if addr >= MEMORY_SIZE {
                    return Err(AssemblerError::AddressOutOfRange {
                        line: line_num,
                        addr,
                    });
                }
                self.current_addr = addr;
            }

            "DAT" | "DATA" => {
                let text = self.require_operand(operand, "DAT", line_num)?;
                let value: i32 = text.parse().map_err(|_| AssemblerError::SyntaxError {
                    line: line_num,
                    message: format!("DAT requires an integer value, found {}", text),
                })?;
                if !crate::word::is_valid(value) {
                    return Err(AssemblerError::ValueOutOfRange {
                        line: line_num,
                        value,
                    });
                }
                self.place(value, line_num)?;
            }

            // Instructions
            _ => {
                let op = parse_mnemonic(&mnemonic).ok_or_else(|| {
                    AssemblerError::UnknownMnemonic {
                        line: line_num,
                        mnemonic: mnemonic.clone(),
                    }
                })?;
                let addr = match operand {
                    Some(text) => self.parse_address(op, text, line_num)?,
                    None => 0,
                };
                self.place(op.code() * 100 + addr as i32, line_num)?;
            }
        }

        Ok(())
    }

    fn require_operand<'a>(
        &self,
        operand: Option<&'a str>,
        directive: &str,
        line_num: usize,
    ) -> Result<&'a str, AssemblerError> {
        operand.ok_or_else(|| AssemblerError::SyntaxError {
            line: line_num,
            message: format!("{} requires an operand", directive),
        })
    }

    /// Parse an instruction operand: a literal address or a label
    /// reference to be resolved in pass 2.
    fn parse_address(
        &mut self,
        op: Operation,
        text: &str,
        line_num: usize,
    ) -> Result<usize, AssemblerError> {
        if let Ok(addr) = text.parse::<usize>() {
            if addr >= MEMORY_SIZE {
                return Err(AssemblerError::AddressOutOfRange {
                    line: line_num,
                    addr,
                });
            }
            return Ok(addr);
        }

        // Label reference: placeholder address, fixed up in pass 2
        self.pending
            .push((self.current_addr, op, text.to_uppercase(), line_num));
        Ok(0)
    }

    /// Place a word at the current address and advance.
    fn place(&mut self, word: i32, line_num: usize) -> Result<(), AssemblerError> {
        if self.current_addr >= MEMORY_SIZE {
            return Err(AssemblerError::ProgramTooLarge { line: line_num });
        }
        if self.current_addr >= self.image.len() {
            self.image.resize(self.current_addr + 1, 0);
        }
        self.image[self.current_addr] = word;
        self.current_addr += 1;
        Ok(())
    }

    fn resolve_references(&mut self) -> Result<(), AssemblerError> {
        for (image_addr, op, label, line_num) in &self.pending {
            let addr = self
                .symbols
                .get(label)
                .ok_or_else(|| AssemblerError::UndefinedLabel {
                    line: *line_num,
                    label: label.clone(),
                })?;

            self.image[*image_addr] = op.code() * 100 + *addr as i32;
        }
        Ok(())
    }
}

/// Map a mnemonic (or one of its aliases) onto an operation.
fn parse_mnemonic(mnemonic: &str) -> Option<Operation> {
    let op = match mnemonic {
        "READ" | "IN" => Operation::Read,
        "WRITE" | "OUT" => Operation::Write,
        "LOAD" | "LDA" => Operation::Load,
        "STORE" | "STA" => Operation::Store,
        "ADD" => Operation::Add,
        "SUB" | "SUBTRACT" => Operation::Subtract,
        "DIV" | "DIVIDE" => Operation::Divide,
        "MUL" | "MULTIPLY" => Operation::Multiply,
        "BRANCH" | "JMP" => Operation::Branch,
        "BRANCHNEG" | "JN" => Operation::BranchNeg,
        "BRANCHZERO" | "JZ" => Operation::BranchZero,
        "HALT" | "HLT" => Operation::Halt,
        _ => return None,
    };
    Some(op)
}

/// Errors that can occur during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("syntax error on line {line}: {message}")]
    SyntaxError { line: usize, message: String },

    #[error("unknown mnemonic on line {line}: {mnemonic}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("undefined label on line {line}: {label}")]
    UndefinedLabel { line: usize, label: String },

    #[error("duplicate label on line {line}: {label}")]
    DuplicateLabel { line: usize, label: String },

    #[error("value out of range on line {line}: {value}")]
    ValueOutOfRange { line: usize, value: i32 },

    #[error("address out of range on line {line}: {addr}")]
    AddressOutOfRange { line: usize, addr: usize },

    #[error("program exceeds memory on line {line}")]
    ProgramTooLarge { line: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_simple() {
        let source = r#"
            ; Add two inputs and print the sum
            READ 10
            READ 11
            LOAD 10
            ADD 11
            STORE 12
            WRITE 12
            HALT
        "#;

        let image = assemble(source).unwrap();
        assert_eq!(image, vec![1010, 1011, 2010, 3011, 2112, 1112, 4300]);
    }

    #[test]
    fn test_assemble_with_labels() {
        let source = r#"
        START:
            LOAD VALUE
            BRANCHZERO END
            BRANCH START
        END:
            HALT
        VALUE: DAT 0
        "#;

        let image = assemble(source).unwrap();
        assert_eq!(image, vec![2004, 4203, 4000, 4300, 0]);
    }

    #[test]
    fn test_assemble_org_and_data() {
        let source = r#"
            LOAD 50
            HALT
            ORG 50
            DAT -17
        "#;

        let image = assemble(source).unwrap();
        assert_eq!(image.len(), 51);
        assert_eq!(image[0], 2050);
        assert_eq!(image[1], 4300);
        assert_eq!(image[50], -17);
        assert!(image[2..50].iter().all(|&w| w == 0));
    }

    #[test]
    fn test_unknown_mnemonic() {
        let err = assemble("NOP").unwrap_err();
        assert_eq!(
            err,
            AssemblerError::UnknownMnemonic {
                line: 1,
                mnemonic: "NOP".to_string()
            }
        );
    }

    #[test]
    fn test_undefined_label() {
        let err = assemble("BRANCH NOWHERE\nHALT").unwrap_err();
        assert_eq!(
            err,
            AssemblerError::UndefinedLabel {
                line: 1,
                label: "NOWHERE".to_string()
            }
        );
    }

    #[test]
    fn test_duplicate_label() {
        let err = assemble("X: HALT\nX: HALT").unwrap_err();
        assert_eq!(
            err,
            AssemblerError::DuplicateLabel {
                line: 2,
                label: "X".to_string()
            }
        );
    }

    #[test]
    fn test_address_out_of_range() {
        let err = assemble("LOAD 100").unwrap_err();
        assert_eq!(
            err,
            AssemblerError::AddressOutOfRange { line: 1, addr: 100 }
        );
    }

    #[test]
    fn test_dat_out_of_range() {
        let err = assemble("DAT 10000").unwrap_err();
        assert_eq!(
            err,
            AssemblerError::ValueOutOfRange {
                line: 1,
                value: 10000
            }
        );
    }
}
