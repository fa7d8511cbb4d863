//! Instruction decoder for the Computron.
//!
//! An instruction word packs a two-digit operation code and a two-digit
//! operand address: `word = code * 100 + operand`. Decoding splits the
//! word with truncating division, checks the operand range, then maps
//! the code onto the closed operation set.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cpu::memory::MEMORY_SIZE;

/// The twelve Computron operations.
///
/// Each variant is bound to a fixed two-digit code; [`Operation::code`]
/// and [`Operation::from_code`] are exact inverses over this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Consume the next input word and store it at the operand address.
    Read,
    /// Emit the word at the operand address to the output sink.
    Write,
    /// accumulator := memory[operand]
    Load,
    /// memory[operand] := accumulator
    Store,
    /// accumulator := accumulator + memory[operand]
    Add,
    /// accumulator := accumulator - memory[operand]
    Subtract,
    /// accumulator := accumulator / memory[operand], truncating toward zero
    Divide,
    /// accumulator := accumulator * memory[operand]
    Multiply,
    /// counter := operand
    Branch,
    /// counter := operand if accumulator < 0
    BranchNeg,
    /// counter := operand if accumulator == 0
    BranchZero,
    /// Stop execution.
    Halt,
}

impl Operation {
    /// Every operation, in code order.
    pub const ALL: [Operation; 12] = [
        Operation::Read,
        Operation::Write,
        Operation::Load,
        Operation::Store,
        Operation::Add,
        Operation::Subtract,
        Operation::Divide,
        Operation::Multiply,
        Operation::Branch,
        Operation::BranchNeg,
        Operation::BranchZero,
        Operation::Halt,
    ];

    /// Map a two-digit operation code onto the operation set.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            10 => Some(Operation::Read),
            11 => Some(Operation::Write),
            20 => Some(Operation::Load),
            21 => Some(Operation::Store),
            30 => Some(Operation::Add),
            31 => Some(Operation::Subtract),
            32 => Some(Operation::Divide),
            33 => Some(Operation::Multiply),
            40 => Some(Operation::Branch),
            41 => Some(Operation::BranchNeg),
            42 => Some(Operation::BranchZero),
            43 => Some(Operation::Halt),
            _ => None,
        }
    }

    /// The fixed two-digit code of this operation.
    pub const fn code(self) -> i32 {
        match self {
            Operation::Read => 10,
            Operation::Write => 11,
            Operation::Load => 20,
            Operation::Store => 21,
            Operation::Add => 30,
            Operation::Subtract => 31,
            Operation::Divide => 32,
            Operation::Multiply => 33,
            Operation::Branch => 40,
            Operation::BranchNeg => 41,
            Operation::BranchZero => 42,
            Operation::Halt => 43,
        }
    }

    /// Assembly mnemonic, as used by the assembler and disassembler.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Operation::Read => "READ",
            Operation::Write => "WRITE",
            Operation::Load => "LOAD",
            Operation::Store => "STORE",
            Operation::Add => "ADD",
            Operation::Subtract => "SUB",
            Operation::Divide => "DIV",
            Operation::Multiply => "MUL",
            Operation::Branch => "BRANCH",
            Operation::BranchNeg => "BRANCHNEG",
            Operation::BranchZero => "BRANCHZERO",
            Operation::Halt => "HALT",
        }
    }
}

/// A decoded instruction: operation plus operand address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    /// The operation to perform.
    pub op: Operation,
    /// Operand address, always within 0-99.
    pub addr: usize,
}

impl Instruction {
    /// Build an instruction from an operation and operand address.
    ///
    /// # Panics
    /// Panics if the address is out of range.
    pub fn new(op: Operation, addr: usize) -> Self {
        assert!(addr < MEMORY_SIZE, "operand address {} out of range", addr);
        Self { op, addr }
    }
}

/// Decode a raw instruction word.
///
/// The operand range check runs first, before the code lookup and
/// independent of which operation is decoded.
pub fn decode(word: i32) -> Result<Instruction, DecodeError> {
    let code = word / 100;
    let operand = word % 100;

    if operand < 0 || operand >= MEMORY_SIZE as i32 {
        return Err(DecodeError::OperandOutOfRange(operand));
    }

    let op = Operation::from_code(code).ok_or(DecodeError::UnknownOperation(code))?;

    Ok(Instruction {
        op,
        addr: operand as usize,
    })
}

/// Encode an instruction back to a raw word.
pub fn encode(instr: &Instruction) -> i32 {
    instr.op.code() * 100 + instr.addr as i32
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown operation code: {0}")]
    UnknownOperation(i32),

    #[error("operand {0} outside addressable memory (0-99)")]
    OperandOutOfRange(i32),
}
