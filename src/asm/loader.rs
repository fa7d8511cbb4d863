//! Program file loader for the Computron.
//!
//! Program files are plain text:
//! - One signed decimal word per line
//! - A line containing exactly `-99999` terminates the program
//! - Lines after the sentinel are ignored
//! - Blank lines and lines starting with `;` are skipped

use std::path::Path;

use thiserror::Error;

use crate::cpu::memory::{Memory, MEMORY_SIZE};
use crate::word;

/// Parse program text into a memory image.
///
/// Every loaded word must pass validation; at most 100 words may appear
/// before the sentinel. Cells past the last loaded word stay zero.
pub fn parse_program(source: &str) -> Result<Memory, LoadError> {
    let mut mem = Memory::new();
    let mut next = 0;

    for (line_num, line) in source.lines().enumerate() {
        let trimmed = line.trim();

        // Skip empty lines and comments
        if trimmed.is_empty() || trimmed.starts_with(';') {
            continue;
        }

        let value: i32 = trimmed.parse().map_err(|_| LoadError::Parse {
            line: line_num + 1,
            text: trimmed.to_string(),
        })?;

        if value == word::SENTINEL {
            return Ok(mem);
        }

        if !word::is_valid(value) {
            return Err(LoadError::OutOfRange {
                line: line_num + 1,
                value,
            });
        }

        if next >= MEMORY_SIZE {
            return Err(LoadError::TooLarge);
        }

        mem.write(next, value);
        next += 1;
    }

    // No sentinel before EOF: accept the image as-is
    Ok(mem)
}

/// Load a program file from disk.
pub fn load_program<P: AsRef<Path>>(path: P) -> Result<Memory, LoadError> {
    let source =
        std::fs::read_to_string(path.as_ref()).map_err(|e| LoadError::Io(e.to_string()))?;
    parse_program(&source)
}

/// Save a word image as a program file, sentinel-terminated.
pub fn save_program<P: AsRef<Path>>(path: P, words: &[i32]) -> Result<(), LoadError> {
    let mut text = String::new();
    for &w in words {
        text.push_str(&w.to_string());
        text.push('\n');
    }
    text.push_str(&word::SENTINEL.to_string());
    text.push('\n');

    std::fs::write(path.as_ref(), text).map_err(|e| LoadError::Io(e.to_string()))
}

/// Errors that can occur while loading a program file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("line {line}: not a valid integer: {text}")]
    Parse { line: usize, text: String },

    #[error("line {line}: word {value} outside [-9999, 9999]")]
    OutOfRange { line: usize, value: i32 },

    #[error("program exceeds 100-word memory")]
    TooLarge,
}
