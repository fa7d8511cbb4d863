//! # Computron Emulator
//!
//! An emulator of the Computron, a four-digit decimal teaching computer:
//! 100 words of memory, a single accumulator, and a twelve-operation
//! instruction set driven by a fetch-decode-execute cycle.

pub mod asm;
pub mod cpu;
pub mod report;
pub mod word;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use asm::{assemble, disassemble, load_program, parse_program, AssemblerError, LoadError};
pub use cpu::{
    CaptureSink, DecodeError, Instruction, Machine, MachineError, MachineState, Memory, Operation,
    OutputSink, Registers,
};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
