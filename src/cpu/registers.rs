//! Computron register set.
//!
//! One execution context holds every register the machine has:
//! - accumulator: the single arithmetic/transfer register
//! - counter: address of the next instruction to fetch
//! - instruction register: the raw word last fetched
//! - operation code / operand: the two halves of the last decode

use serde::{Deserialize, Serialize};

/// The Computron register file.
///
/// All fields are mutated only by the execution engine during a run and
/// start zeroed. Reporters read them without mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// The single arithmetic and transfer register.
    pub accumulator: i32,

    /// Address of the next instruction to fetch (0-99 before every fetch).
    pub counter: usize,

    /// Raw word last fetched from memory.
    pub instruction_register: i32,

    /// Two-digit operation code from the last successful decode.
    pub operation_code: i32,

    /// Two-digit operand address from the last successful decode.
    pub operand: usize,
}

impl Registers {
    /// Create a new register file with all values zeroed.
    pub fn new() -> Self {
        Self {
            accumulator: 0,
            counter: 0,
            instruction_register: 0,
            operation_code: 0,
            operand: 0,
        }
    }

    /// Reset all registers to zero.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Increment the instruction counter by one.
    /// Returns the old value.
    pub fn advance(&mut self) -> usize {
        let old = self.counter;
        self.counter += 1;
        old
    }

    /// Set the instruction counter to an absolute address.
    pub fn jump(&mut self, addr: usize) {
        self.counter = addr;
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_zeroed() {
        let regs = Registers::new();

        assert_eq!(regs.accumulator, 0);
        assert_eq!(regs.counter, 0);
        assert_eq!(regs.instruction_register, 0);
        assert_eq!(regs.operation_code, 0);
        assert_eq!(regs.operand, 0);
    }

    #[test]
    fn test_advance() {
        let mut regs = Registers::new();
        regs.counter = 10;

        let old = regs.advance();

        assert_eq!(old, 10);
        assert_eq!(regs.counter, 11);
    }

    #[test]
    fn test_jump() {
        let mut regs = Registers::new();
        regs.counter = 3;

        regs.jump(42);

        assert_eq!(regs.counter, 42);
    }

    #[test]
    fn test_reset() {
        let mut regs = Registers::new();
        regs.accumulator = -5;
        regs.counter = 9;
        regs.instruction_register = 4300;

        regs.reset();

        assert_eq!(regs, Registers::new());
    }
}
