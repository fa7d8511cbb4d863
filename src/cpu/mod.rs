//! CPU emulation for the Computron machine.
//!
//! This module implements the complete architecture:
//! - 100 word-addressable memory cells
//! - a single accumulator plus instruction counter/register and the
//!   decoded operation code and operand
//! - a twelve-operation instruction set with single-address format

pub mod decode;
pub mod execute;
pub mod memory;
pub mod registers;

pub use decode::{decode, encode, DecodeError, Instruction, Operation};
pub use execute::{CaptureSink, Machine, MachineError, MachineState, OutputSink};
pub use memory::{Memory, MemoryError, MEMORY_SIZE};
pub use registers::Registers;
