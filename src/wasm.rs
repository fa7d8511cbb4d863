//! WebAssembly bindings for the Computron emulator.
//!
//! This module provides JavaScript-friendly wrappers around the core
//! emulator.

use wasm_bindgen::prelude::*;

use crate::asm::assembler::assemble;
use crate::asm::disasm::disassemble_word;
use crate::cpu::memory::MEMORY_SIZE;
use crate::{CaptureSink, Machine, Memory};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WebAssembly-friendly machine wrapper.
#[wasm_bindgen]
pub struct WasmMachine {
    machine: Machine,
    image: Vec<i32>,
    inputs: Vec<i32>,
    outputs: CaptureSink,
}

#[wasm_bindgen]
impl WasmMachine {
    /// Create a new machine instance.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            machine: Machine::new(),
            image: Vec::new(),
            inputs: Vec::new(),
            outputs: CaptureSink::default(),
        }
    }

    /// Load a program from assembly source code.
    #[wasm_bindgen]
    pub fn load_asm(&mut self, source: &str) -> Result<usize, JsError> {
        let image = assemble(source).map_err(|e| JsError::new(&format!("{}", e)))?;
        self.load_image(image)
    }

    /// Load a program from raw words.
    #[wasm_bindgen]
    pub fn load_words(&mut self, words: Vec<i32>) -> Result<usize, JsError> {
        self.load_image(words)
    }

    fn load_image(&mut self, image: Vec<i32>) -> Result<usize, JsError> {
        let mut mem = Memory::new();
        mem.load_image(&image)
            .map_err(|e| JsError::new(&format!("{}", e)))?;

        self.image = image;
        self.machine = Machine::with_program(mem, self.inputs.clone());
        self.outputs = CaptureSink::default();

        Ok(self.image.len())
    }

    /// Set the input sequence for read instructions.
    #[wasm_bindgen]
    pub fn set_inputs(&mut self, inputs: Vec<i32>) {
        self.inputs = inputs.clone();
        self.machine.set_inputs(inputs);
    }

    /// Step one instruction. Returns the disassembled instruction.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<String, JsError> {
        if !self.machine.is_running() {
            return Err(JsError::new("machine is not running"));
        }

        self.machine
            .step(&mut self.outputs)
            .map_err(|e| JsError::new(&format!("{}", e)))?;

        Ok(disassemble_word(self.machine.regs.instruction_register))
    }

    /// Run until halt or max cycles.
    #[wasm_bindgen]
    pub fn run(&mut self, max_cycles: u32) -> u64 {
        let _ = self.machine.run_limited(max_cycles as u64, &mut self.outputs);
        self.machine.cycles
    }

    /// Reset the machine to its initial state with the loaded program.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        let mut mem = Memory::new();
        if !self.image.is_empty() {
            let _ = mem.load_image(&self.image);
        }
        self.machine = Machine::with_program(mem, self.inputs.clone());
        self.outputs = CaptureSink::default();
    }

    /// Check if the machine is running.
    #[wasm_bindgen]
    pub fn is_running(&self) -> bool {
        self.machine.is_running()
    }

    /// Check if the machine has halted.
    #[wasm_bindgen]
    pub fn is_halted(&self) -> bool {
        self.machine.is_halted()
    }

    /// Get cycle count.
    #[wasm_bindgen]
    pub fn cycles(&self) -> u64 {
        self.machine.cycles
    }

    /// Get the instruction counter.
    #[wasm_bindgen]
    pub fn counter(&self) -> usize {
        self.machine.regs.counter
    }

    /// Get the accumulator value.
    #[wasm_bindgen]
    pub fn accumulator(&self) -> i32 {
        self.machine.regs.accumulator
    }

    /// Get state as string.
    #[wasm_bindgen]
    pub fn state(&self) -> String {
        format!("{:?}", self.machine.state)
    }

    /// Get memory cell value at address (0-99).
    #[wasm_bindgen]
    pub fn memory_at(&self, addr: usize) -> i32 {
        if addr < MEMORY_SIZE {
            self.machine.mem.read(addr)
        } else {
            0
        }
    }

    /// Get all memory as an array of values.
    #[wasm_bindgen]
    pub fn memory_all(&self) -> Vec<i32> {
        self.machine.mem.cells().to_vec()
    }

    /// Get captured write output as flat (address, value) pairs.
    #[wasm_bindgen]
    pub fn outputs(&self) -> Vec<i32> {
        self.outputs
            .records
            .iter()
            .flat_map(|&(addr, value)| [addr as i32, value])
            .collect()
    }

    /// Get registers as a JSON string.
    #[wasm_bindgen]
    pub fn registers_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.machine.regs).map_err(|e| JsError::new(&format!("{}", e)))
    }
}

impl Default for WasmMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Assemble source code and return the word image.
#[wasm_bindgen]
pub fn wasm_assemble(source: &str) -> Result<Vec<i32>, JsError> {
    assemble(source).map_err(|e| JsError::new(&format!("{}", e)))
}

/// Disassemble a single word.
#[wasm_bindgen]
pub fn wasm_disassemble(word: i32) -> String {
    disassemble_word(word)
}
