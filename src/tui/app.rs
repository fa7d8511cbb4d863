//! Debugger application state and logic.

use std::collections::HashSet;

use crate::asm::disasm::disassemble_word;
use crate::cpu::memory::MEMORY_SIZE;
use crate::{CaptureSink, Machine, Memory};

/// Debugger application state.
pub struct DebuggerApp {
    /// The machine being debugged.
    pub machine: Machine,
    /// Original memory image and inputs, for reset.
    image: Memory,
    inputs: Vec<i32>,
    /// Captured write emissions.
    pub outputs: CaptureSink,
    /// Breakpoints (by address).
    pub breakpoints: HashSet<usize>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Memory view scroll offset.
    pub mem_scroll: usize,
}

impl DebuggerApp {
    /// Create a new debugger over a loaded memory image.
    pub fn new(image: Memory, inputs: Vec<i32>) -> Self {
        let machine = Machine::with_program(image.clone(), inputs.clone());

        Self {
            machine,
            image,
            inputs,
            outputs: CaptureSink::default(),
            breakpoints: HashSet::new(),
            running: false,
            should_quit: false,
            status: "Ready. Press 's' to step, 'r' to run, 'q' to quit.".into(),
            mem_scroll: 0,
        }
    }

    /// Step one instruction.
    pub fn step(&mut self) {
        if !self.machine.is_running() {
            self.status = format!("Machine stopped: {:?}", self.machine.state);
            self.running = false;
            return;
        }

        let pc = self.machine.regs.counter;
        match self.machine.step(&mut self.outputs) {
            Ok(_) => {
                let listing = disassemble_word(self.machine.regs.instruction_register);
                self.status = format!("{:02}: {}", pc, listing);
            }
            Err(e) => {
                self.status = format!("Error: {}", e);
                self.running = false;
            }
        }
    }

    /// Run until halt, breakpoint, or error.
    pub fn run(&mut self) {
        self.running = true;
        self.status = "Running...".into();
    }

    /// Run one iteration of continuous execution.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }

        if !self.machine.is_running() {
            self.running = false;
            self.status = format!("Stopped after {} cycles", self.machine.cycles);
            return;
        }

        // Check for breakpoint
        let pc = self.machine.regs.counter;
        if self.breakpoints.contains(&pc) {
            self.running = false;
            self.status = format!("Breakpoint at {:02}", pc);
            return;
        }

        self.step();
    }

    /// Toggle breakpoint at the current counter.
    pub fn toggle_breakpoint(&mut self) {
        let pc = self.machine.regs.counter;
        if self.breakpoints.contains(&pc) {
            self.breakpoints.remove(&pc);
            self.status = format!("Removed breakpoint at {:02}", pc);
        } else {
            self.breakpoints.insert(pc);
            self.status = format!("Set breakpoint at {:02}", pc);
        }
    }

    /// Reset the machine to its initial state.
    pub fn reset(&mut self) {
        self.machine = Machine::with_program(self.image.clone(), self.inputs.clone());
        self.outputs = CaptureSink::default();
        self.running = false;
        self.status = "Reset. Ready.".into();
    }

    /// Get disassembly around the current counter.
    pub fn get_disassembly(&self, lines: usize) -> Vec<(usize, String, bool)> {
        let pc = self.machine.regs.counter.min(MEMORY_SIZE - 1);
        let start = pc.saturating_sub(lines / 2);

        (start..MEMORY_SIZE)
            .take(lines)
            .map(|addr| {
                let listing = disassemble_word(self.machine.mem.read(addr));
                (addr, listing, addr == self.machine.regs.counter)
            })
            .collect()
    }
}

/// Run the debugger over a memory image and input sequence.
pub fn run_debugger(image: Memory, inputs: Vec<i32>) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Create app
    let mut app = DebuggerApp::new(image, inputs);

    // Main loop
    loop {
        // Draw
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        // Handle input
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char('s') => {
                            app.running = false;
                            app.step();
                        }
                        KeyCode::Char('r') => app.run(),
                        KeyCode::Char('p') => {
                            app.running = false;
                            app.status = "Paused.".into();
                        }
                        KeyCode::Char('b') => app.toggle_breakpoint(),
                        KeyCode::Char('x') => app.reset(),
                        KeyCode::Up => {
                            if app.mem_scroll > 0 {
                                app.mem_scroll -= 1;
                            }
                        }
                        KeyCode::Down => {
                            if app.mem_scroll < MEMORY_SIZE - 10 {
                                app.mem_scroll += 1;
                            }
                        }
                        _ => {}
                    }
                }
            }
        }

        // Tick for continuous running
        if app.running {
            app.tick();
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}
