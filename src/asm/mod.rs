//! Program-text tooling for the Computron.
//!
//! This module provides:
//! - The word-per-line program file loader (sentinel-terminated)
//! - A simple two-pass assembler (mnemonics → word image)
//! - A disassembler (word image → readable text)

pub mod assembler;
pub mod disasm;
pub mod loader;

pub use assembler::{assemble, AssemblerError};
pub use disasm::{disassemble, disassemble_word};
pub use loader::{load_program, parse_program, save_program, LoadError};
