//! Execution engine for the Computron.
//!
//! Implements the fetch-decode-execute cycle and all twelve operation
//! behaviors. Arithmetic results are validated against the word range
//! before they are committed; on failure the accumulator keeps its
//! pre-operation value.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cpu::decode::{self, DecodeError, Operation};
use crate::cpu::memory::{Memory, MEMORY_SIZE};
use crate::cpu::registers::Registers;
use crate::word;

/// Machine execution state.
///
/// Termination is tracked here explicitly; the run loop never re-derives
/// "was that halt" from the last decoded code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MachineState {
    /// Machine is running normally.
    Running,
    /// Machine has halted (executed a halt instruction).
    Halted,
    /// Machine aborted on an execution error.
    Faulted,
}

/// Destination for values emitted by the write operation.
///
/// The engine never touches a console directly; callers hand in a sink
/// and decide what emission means.
pub trait OutputSink {
    /// Receive the word at `addr` that a write instruction emitted.
    fn emit(&mut self, addr: usize, value: i32);
}

/// Sink that records every emission, for tests, the debugger, and the
/// wasm bindings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureSink {
    /// Emitted (address, value) pairs in emission order.
    pub records: Vec<(usize, i32)>,
}

impl OutputSink for CaptureSink {
    fn emit(&mut self, addr: usize, value: i32) {
        self.records.push((addr, value));
    }
}

/// The Computron machine: registers, memory, and the input cursor.
#[derive(Clone, Serialize, Deserialize)]
pub struct Machine {
    /// Machine registers.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    /// Current execution state.
    pub state: MachineState,
    /// Instructions executed so far.
    pub cycles: u64,
    /// Input sequence for read instructions.
    inputs: Vec<i32>,
    /// Index of the next unconsumed input element.
    cursor: usize,
    /// Last executed operation (for traces and the debugger).
    last_op: Option<Operation>,
}

impl Machine {
    /// Create a new machine with zeroed state and no inputs.
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            state: MachineState::Running,
            cycles: 0,
            inputs: Vec::new(),
            cursor: 0,
            last_op: None,
        }
    }

    /// Create a machine over a loaded memory image and input sequence.
    pub fn with_program(mem: Memory, inputs: Vec<i32>) -> Self {
        Self {
            mem,
            inputs,
            ..Self::new()
        }
    }

    /// Replace the input sequence and rewind the cursor.
    pub fn set_inputs(&mut self, inputs: Vec<i32>) {
        self.inputs = inputs;
        self.cursor = 0;
    }

    /// Reset registers, memory, state, and the input cursor.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.clear();
        self.state = MachineState::Running;
        self.cycles = 0;
        self.cursor = 0;
        self.last_op = None;
    }

    /// Execute a single instruction.
    ///
    /// Returns the operation that was executed. Any failure moves the
    /// machine to [`MachineState::Faulted`] and leaves registers and
    /// memory at the failure point for inspection.
    pub fn step(&mut self, sink: &mut dyn OutputSink) -> Result<Operation, MachineError> {
        if self.state != MachineState::Running {
            return Err(MachineError::NotRunning(self.state));
        }

        match self.step_inner(sink) {
            Ok(op) => {
                self.cycles += 1;
                self.last_op = Some(op);
                Ok(op)
            }
            Err(e) => {
                self.state = MachineState::Faulted;
                Err(e)
            }
        }
    }

    fn step_inner(&mut self, sink: &mut dyn OutputSink) -> Result<Operation, MachineError> {
        // Fetch
        if self.regs.counter >= MEMORY_SIZE {
            return Err(MachineError::CounterOutOfRange(self.regs.counter));
        }
        let raw = self.mem.read(self.regs.counter);
        self.regs.instruction_register = raw;

        // Decode
        let instr = decode::decode(raw)?;
        self.regs.operation_code = instr.op.code();
        self.regs.operand = instr.addr;

        // Execute
        self.execute(instr.op, instr.addr, sink)?;

        Ok(instr.op)
    }

    /// Run until halt or error.
    ///
    /// Returns the number of instructions executed.
    pub fn run(&mut self, sink: &mut dyn OutputSink) -> Result<u64, MachineError> {
        let start_cycles = self.cycles;

        while self.state == MachineState::Running {
            self.step(sink)?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Run for at most `max_cycles` instructions.
    pub fn run_limited(
        &mut self,
        max_cycles: u64,
        sink: &mut dyn OutputSink,
    ) -> Result<u64, MachineError> {
        let start_cycles = self.cycles;
        let limit = self.cycles + max_cycles;

        while self.state == MachineState::Running && self.cycles < limit {
            self.step(sink)?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Execute a decoded instruction.
    fn execute(
        &mut self,
        op: Operation,
        addr: usize,
        sink: &mut dyn OutputSink,
    ) -> Result<(), MachineError> {
        match op {
            Operation::Read => {
                let input = *self
                    .inputs
                    .get(self.cursor)
                    .ok_or(MachineError::InputExhausted)?;
                if !word::is_valid(input) {
                    return Err(MachineError::InvalidWord(input));
                }
                self.cursor += 1;
                self.mem.write(addr, input);
                self.regs.advance();
            }

            Operation::Write => {
                sink.emit(addr, self.mem.read(addr));
                self.regs.advance();
            }

            Operation::Load => {
                self.regs.accumulator = self.mem.read(addr);
                self.regs.advance();
            }

            Operation::Store => {
                self.mem.write(addr, self.regs.accumulator);
                self.regs.advance();
            }

            Operation::Add => {
                let result = self.regs.accumulator + self.mem.read(addr);
                self.regs.accumulator = self.checked(result)?;
                self.regs.advance();
            }

            Operation::Subtract => {
                let result = self.regs.accumulator - self.mem.read(addr);
                self.regs.accumulator = self.checked(result)?;
                self.regs.advance();
            }

            Operation::Multiply => {
                let result = self.regs.accumulator * self.mem.read(addr);
                self.regs.accumulator = self.checked(result)?;
                self.regs.advance();
            }

            Operation::Divide => {
                let divisor = self.mem.read(addr);
                if divisor == 0 {
                    return Err(MachineError::DivisionByZero);
                }
                // Native integer division: truncates toward zero, also
                // for negative operands.
                let result = self.regs.accumulator / divisor;
                self.regs.accumulator = self.checked(result)?;
                self.regs.advance();
            }

            Operation::Branch => {
                self.regs.jump(addr);
            }

            Operation::BranchNeg => {
                if self.regs.accumulator < 0 {
                    self.regs.jump(addr);
                } else {
                    self.regs.advance();
                }
            }

            Operation::BranchZero => {
                if self.regs.accumulator == 0 {
                    self.regs.jump(addr);
                } else {
                    self.regs.advance();
                }
            }

            Operation::Halt => {
                self.state = MachineState::Halted;
            }
        }

        Ok(())
    }

    /// Validate an arithmetic candidate before it is committed.
    fn checked(&self, candidate: i32) -> Result<i32, MachineError> {
        if word::is_valid(candidate) {
            Ok(candidate)
        } else {
            Err(MachineError::InvalidWord(candidate))
        }
    }

    /// Get the last executed operation.
    pub fn last_operation(&self) -> Option<Operation> {
        self.last_op
    }

    /// Number of input elements not yet consumed.
    pub fn remaining_inputs(&self) -> usize {
        self.inputs.len().saturating_sub(self.cursor)
    }

    /// Check if the machine has halted.
    pub fn is_halted(&self) -> bool {
        self.state == MachineState::Halted
    }

    /// Check if the machine is running.
    pub fn is_running(&self) -> bool {
        self.state == MachineState::Running
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("state", &self.state)
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .finish()
    }
}

/// Errors that can occur during execution.
///
/// Every one is terminal for the run; none are retried internally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineError {
    #[error("machine not running: {0:?}")]
    NotRunning(MachineState),

    #[error("instruction counter {0} outside memory (0-99)")]
    CounterOutOfRange(usize),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("read executed with no remaining input")]
    InputExhausted,

    #[error("invalid word {0}: outside [-9999, 9999]")]
    InvalidWord(i32),

    #[error("division by zero")]
    DivisionByZero,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn machine_with(image: &[i32], inputs: &[i32]) -> Machine {
        let mut mem = Memory::new();
        mem.load_image(image).unwrap();
        Machine::with_program(mem, inputs.to_vec())
    }

    #[test]
    fn test_halt_only() {
        let mut m = machine_with(&[4300], &[]);
        let mut sink = CaptureSink::default();

        let executed = m.run(&mut sink).unwrap();

        assert_eq!(executed, 1);
        assert!(m.is_halted());
        assert_eq!(m.regs.counter, 0);
        assert_eq!(m.regs.accumulator, 0);
        assert_eq!(m.last_operation(), Some(Operation::Halt));
    }

    #[test]
    fn test_read_stores_input() {
        let mut m = machine_with(&[1005, 4300], &[42]);
        let mut sink = CaptureSink::default();

        m.run(&mut sink).unwrap();

        assert_eq!(m.mem.read(5), 42);
        assert_eq!(m.regs.counter, 1);
        assert_eq!(m.last_operation(), Some(Operation::Halt));
        assert_eq!(m.remaining_inputs(), 0);
    }

    #[test]
    fn test_read_input_exhausted() {
        let mut m = machine_with(&[1005, 4300], &[]);
        let mut sink = CaptureSink::default();

        let err = m.run(&mut sink).unwrap_err();

        assert_eq!(err, MachineError::InputExhausted);
        assert_eq!(m.state, MachineState::Faulted);
    }

    #[test]
    fn test_read_invalid_input() {
        let mut m = machine_with(&[1005, 4300], &[10000]);
        let mut sink = CaptureSink::default();

        let err = m.run(&mut sink).unwrap_err();

        assert_eq!(err, MachineError::InvalidWord(10000));
        // The invalid value never reached memory
        assert_eq!(m.mem.read(5), 0);
    }

    #[test]
    fn test_write_emits_without_mutation() {
        let mut m = machine_with(&[1105, 4300], &[]);
        m.mem.write(5, 99);
        let mut sink = CaptureSink::default();

        m.run(&mut sink).unwrap();

        assert_eq!(sink.records, vec![(5, 99)]);
        assert_eq!(m.mem.read(5), 99);
        assert_eq!(m.regs.counter, 1);
        assert_eq!(m.regs.accumulator, 0);
    }

    #[test]
    fn test_load_then_add() {
        let mut m = machine_with(&[2010, 3011, 4300], &[]);
        m.mem.write(10, 6);
        m.mem.write(11, 7);
        let mut sink = CaptureSink::default();

        m.run(&mut sink).unwrap();

        assert_eq!(m.regs.accumulator, 13);
        assert_eq!(m.regs.counter, 2);
    }

    #[test]
    fn test_store() {
        let mut m = machine_with(&[2010, 2107, 4300], &[]);
        m.mem.write(10, 555);
        let mut sink = CaptureSink::default();

        m.run(&mut sink).unwrap();

        assert_eq!(m.mem.read(7), 555);
        assert_eq!(m.regs.counter, 2);
    }

    #[test]
    fn test_subtract() {
        let mut m = machine_with(&[2010, 3111, 4300], &[]);
        m.mem.write(10, 20);
        m.mem.write(11, 5);
        let mut sink = CaptureSink::default();

        m.run(&mut sink).unwrap();

        assert_eq!(m.regs.accumulator, 15);
    }

    #[test]
    fn test_multiply() {
        let mut m = machine_with(&[2010, 3311, 4300], &[]);
        m.mem.write(10, 12);
        m.mem.write(11, 3);
        let mut sink = CaptureSink::default();

        m.run(&mut sink).unwrap();

        assert_eq!(m.regs.accumulator, 36);
    }

    #[test]
    fn test_multiply_negative() {
        let mut m = machine_with(&[2010, 3311, 4300], &[]);
        m.mem.write(10, -5);
        m.mem.write(11, 10);
        let mut sink = CaptureSink::default();

        m.run(&mut sink).unwrap();

        assert_eq!(m.regs.accumulator, -50);
    }

    #[test]
    fn test_multiply_out_of_range_keeps_accumulator() {
        let mut m = machine_with(&[2010, 3311, 4300], &[]);
        m.mem.write(10, 500);
        m.mem.write(11, 30);
        let mut sink = CaptureSink::default();

        let err = m.run(&mut sink).unwrap_err();

        assert_eq!(err, MachineError::InvalidWord(15000));
        // No partial write: the accumulator keeps its pre-multiply value
        assert_eq!(m.regs.accumulator, 500);
        assert_eq!(m.state, MachineState::Faulted);
    }

    #[test]
    fn test_divide() {
        let mut m = machine_with(&[2010, 3211, 4300], &[]);
        m.mem.write(10, 100);
        m.mem.write(11, 25);
        let mut sink = CaptureSink::default();

        m.run(&mut sink).unwrap();

        assert_eq!(m.regs.accumulator, 4);
    }

    #[test]
    fn test_divide_truncates_toward_zero() {
        let mut m = machine_with(&[2010, 3211, 4300], &[]);
        m.mem.write(10, -7);
        m.mem.write(11, 2);
        let mut sink = CaptureSink::default();

        m.run(&mut sink).unwrap();

        // -7 / 2 is -3 under truncation, not -4
        assert_eq!(m.regs.accumulator, -3);
    }

    #[test]
    fn test_divide_by_zero() {
        let mut m = machine_with(&[2010, 3211, 4300], &[]);
        m.mem.write(10, 123);
        m.mem.write(11, 0);
        let mut sink = CaptureSink::default();

        let err = m.run(&mut sink).unwrap_err();

        assert_eq!(err, MachineError::DivisionByZero);
        assert_eq!(m.regs.accumulator, 123);
    }

    #[test]
    fn test_divide_out_of_range_word() {
        // An invalid word placed directly in memory surfaces when the
        // quotient is validated.
        let mut m = machine_with(&[2010, 3211, 4300], &[]);
        m.mem.write(10, 12000);
        m.mem.write(11, 1);
        let mut sink = CaptureSink::default();

        let err = m.run(&mut sink).unwrap_err();

        assert_eq!(err, MachineError::InvalidWord(12000));
    }

    #[test]
    fn test_branch_unconditional() {
        let mut m = machine_with(&[4005, 4300], &[]);
        m.mem.write(5, 4300);
        let mut sink = CaptureSink::default();

        m.run(&mut sink).unwrap();

        // Branched over the halt at index 1 and halted at index 5
        assert_eq!(m.regs.counter, 5);
        assert_eq!(m.cycles, 2);
    }

    #[test]
    fn test_branch_neg_taken_and_not_taken() {
        // accumulator starts negative: branchneg at 1 jumps to the halt at 5
        let mut m = machine_with(&[2010, 4105, 4300], &[]);
        m.mem.write(10, -1);
        m.mem.write(5, 4300);
        let mut sink = CaptureSink::default();
        m.run(&mut sink).unwrap();
        assert_eq!(m.regs.counter, 5);

        // accumulator non-negative: falls through to the halt at 2
        let mut m = machine_with(&[2010, 4105, 4300], &[]);
        m.mem.write(10, 1);
        m.mem.write(5, 4300);
        let mut sink = CaptureSink::default();
        m.run(&mut sink).unwrap();
        assert_eq!(m.regs.counter, 2);
    }

    #[test]
    fn test_branch_zero_taken_and_not_taken() {
        // accumulator starts at zero, so the branch at 0 is taken
        let mut m = machine_with(&[4205, 4300], &[]);
        m.mem.write(5, 4300);
        let mut sink = CaptureSink::default();
        m.run(&mut sink).unwrap();
        assert_eq!(m.regs.counter, 5);

        let mut m = machine_with(&[2010, 4205, 4300], &[]);
        m.mem.write(10, 7);
        m.mem.write(5, 4300);
        let mut sink = CaptureSink::default();
        m.run(&mut sink).unwrap();
        assert_eq!(m.regs.counter, 2);
    }

    #[test]
    fn test_unknown_operation_on_empty_memory() {
        // Running off the end of a program hits zeroed cells, which
        // decode as code 00.
        let mut m = machine_with(&[], &[]);
        let mut sink = CaptureSink::default();

        let err = m.run(&mut sink).unwrap_err();

        assert_eq!(
            err,
            MachineError::Decode(DecodeError::UnknownOperation(0))
        );
    }

    #[test]
    fn test_operand_out_of_range() {
        // -1005 is a valid word but splits into operand -5
        let mut m = machine_with(&[-1005], &[]);
        let mut sink = CaptureSink::default();

        let err = m.run(&mut sink).unwrap_err();

        assert_eq!(
            err,
            MachineError::Decode(DecodeError::OperandOutOfRange(-5))
        );
        assert_eq!(m.regs.instruction_register, -1005);
    }

    #[test]
    fn test_counter_out_of_range() {
        // write at address 99 advances the counter to 100; the next
        // fetch must fail rather than wrap
        let mut m = machine_with(&[4099], &[]);
        m.mem.write(99, 1150);
        let mut sink = CaptureSink::default();

        let err = m.run(&mut sink).unwrap_err();

        assert_eq!(err, MachineError::CounterOutOfRange(100));
        assert_eq!(sink.records, vec![(50, 0)]);
    }

    #[test]
    fn test_step_after_halt_is_not_running() {
        let mut m = machine_with(&[4300], &[]);
        let mut sink = CaptureSink::default();
        m.run(&mut sink).unwrap();

        let err = m.step(&mut sink).unwrap_err();

        assert_eq!(err, MachineError::NotRunning(MachineState::Halted));
        // A rejected step does not fault the machine
        assert_eq!(m.state, MachineState::Halted);
    }

    #[test]
    fn test_run_limited_stops_short() {
        // Tight loop: branch to self
        let mut m = machine_with(&[4000], &[]);
        let mut sink = CaptureSink::default();

        let executed = m.run_limited(10, &mut sink).unwrap();

        assert_eq!(executed, 10);
        assert!(m.is_running());
    }

    #[test]
    fn test_reset() {
        let mut m = machine_with(&[2010, 4300], &[]);
        m.mem.write(10, 9);
        let mut sink = CaptureSink::default();
        m.run(&mut sink).unwrap();

        m.reset();

        assert_eq!(m.regs, Registers::new());
        assert_eq!(m.state, MachineState::Running);
        assert_eq!(m.cycles, 0);
        assert_eq!(m.mem.read(10), 0);
    }

    proptest! {
        #[test]
        fn determinism(seed_inputs in proptest::collection::vec(-9999i32..=9999, 0..4)) {
            // Same image and inputs always produce identical final state
            let image = [1010, 2010, 3010, 2111, 4300];

            let mut first = machine_with(&image, &seed_inputs);
            let mut second = machine_with(&image, &seed_inputs);
            let mut sink_a = CaptureSink::default();
            let mut sink_b = CaptureSink::default();

            let result_a = first.run(&mut sink_a);
            let result_b = second.run(&mut sink_b);

            prop_assert_eq!(result_a, result_b);
            prop_assert_eq!(first.regs, second.regs);
            prop_assert_eq!(first.mem.cells(), second.mem.cells());
            prop_assert_eq!(first.state, second.state);
            prop_assert_eq!(sink_a, sink_b);
        }
    }
}
