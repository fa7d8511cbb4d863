//! Computron memory subsystem.
//!
//! The machine has 100 word-addressable cells, indexed 00-99. A program
//! image occupies the front of memory; everything past the last loaded
//! word stays zero.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The number of memory cells in the machine.
pub const MEMORY_SIZE: usize = 100;

/// Computron memory: 100 signed decimal words.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    cells: Vec<i32>,
}

impl Memory {
    /// Create a new memory with all cells zeroed.
    pub fn new() -> Self {
        Self {
            cells: vec![0; MEMORY_SIZE],
        }
    }

    /// Read a cell by address (0-99).
    ///
    /// # Panics
    /// Panics if the address is out of range. Addresses reaching memory
    /// have already been validated by decode or fetch.
    #[inline]
    pub fn read(&self, addr: usize) -> i32 {
        assert!(
            addr < MEMORY_SIZE,
            "memory address {} out of range (0-{})",
            addr,
            MEMORY_SIZE - 1
        );
        self.cells[addr]
    }

    /// Write a cell by address (0-99).
    ///
    /// # Panics
    /// Panics if the address is out of range.
    #[inline]
    pub fn write(&mut self, addr: usize, value: i32) {
        assert!(
            addr < MEMORY_SIZE,
            "memory address {} out of range (0-{})",
            addr,
            MEMORY_SIZE - 1
        );
        self.cells[addr] = value;
    }

    /// Clear all memory to zeros.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            *cell = 0;
        }
    }

    /// Load a program image into the front of memory.
    ///
    /// Cells past the image keep their current value; call on a fresh
    /// memory to get the zero-defaulted remainder the loader guarantees.
    pub fn load_image(&mut self, image: &[i32]) -> Result<(), MemoryError> {
        if image.len() > MEMORY_SIZE {
            return Err(MemoryError::ProgramTooLarge {
                size: image.len(),
                available: MEMORY_SIZE,
            });
        }

        for (i, &word) in image.iter().enumerate() {
            self.cells[i] = word;
        }

        Ok(())
    }

    /// All 100 cells in address order, for reporters and views.
    pub fn cells(&self) -> &[i32] {
        &self.cells
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only count non-zero cells
        let non_zero = self.cells.iter().filter(|&&cell| cell != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &MEMORY_SIZE)
            .finish()
    }
}

/// Errors that can occur when placing a program image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("program size {size} exceeds {available}-word memory")]
    ProgramTooLarge { size: usize, available: usize },
}
