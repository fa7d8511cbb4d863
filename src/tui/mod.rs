//! TUI debugger for the Computron emulator.
//!
//! Provides an interactive terminal-based debugger with:
//! - Real-time register visualization
//! - Scrollable memory view
//! - Step/run/breakpoint controls
//! - Disassembly and captured-output views

mod app;
mod ui;

pub use app::{run_debugger, DebuggerApp};
