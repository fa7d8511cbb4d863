//! State dump rendering.
//!
//! Renders register and memory contents for inspection without mutating
//! them. The canonical word representation pads to four digits with an
//! explicit sign character, e.g. `+0042`.

use crate::cpu::execute::Machine;
use crate::cpu::memory::Memory;
use crate::cpu::registers::Registers;

/// Render a word in the canonical sign-padded form.
pub fn format_word(word: i32) -> String {
    format!("{:+05}", word)
}

/// Render the register set, one labelled line per register.
pub fn render_registers(regs: &Registers) -> String {
    let mut out = String::from("Registers\n");
    out.push_str(&format!(
        "{:<24}{}\n",
        "accumulator",
        format_word(regs.accumulator)
    ));
    out.push_str(&format!("{:<24}   {:02}\n", "instruction counter", regs.counter));
    out.push_str(&format!(
        "{:<24}{}\n",
        "instruction register",
        format_word(regs.instruction_register)
    ));
    out.push_str(&format!(
        "{:<24}   {:02}\n",
        "operation code", regs.operation_code
    ));
    out.push_str(&format!("{:<24}   {:02}\n", "operand", regs.operand));
    out
}

/// Render memory as a 10x10 grid with two-digit row labels.
pub fn render_memory(mem: &Memory) -> String {
    let cells = mem.cells();
    let mut out = String::from("Memory\n");

    for (row, chunk) in cells.chunks(10).enumerate() {
        out.push_str(&format!("{:02}", row * 10));
        for &cell in chunk {
            out.push(' ');
            out.push_str(&format_word(cell));
        }
        out.push('\n');
    }

    out
}

/// Render the full dump: registers followed by memory.
pub fn render_dump(machine: &Machine) -> String {
    let mut out = render_registers(&machine.regs);
    out.push('\n');
    out.push_str(&render_memory(&machine.mem));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::execute::CaptureSink;

    #[test]
    fn test_format_word() {
        assert_eq!(format_word(0), "+0000");
        assert_eq!(format_word(42), "+0042");
        assert_eq!(format_word(-7), "-0007");
        assert_eq!(format_word(9999), "+9999");
        assert_eq!(format_word(-9999), "-9999");
    }

    #[test]
    fn test_render_registers() {
        let mut regs = Registers::new();
        regs.accumulator = -55;
        regs.counter = 3;
        regs.instruction_register = 4300;
        regs.operation_code = 43;

        let text = render_registers(&regs);

        assert!(text.contains("accumulator"));
        assert!(text.contains("-0055"));
        assert!(text.contains("+4300"));
    }

    #[test]
    fn test_render_memory_grid() {
        let mut mem = Memory::new();
        mem.write(0, 1005);
        mem.write(99, -1);

        let text = render_memory(&mem);
        let rows: Vec<&str> = text.lines().collect();

        // Title plus ten rows of ten cells
        assert_eq!(rows.len(), 11);
        assert!(rows[1].starts_with("00 +1005"));
        assert!(rows[10].ends_with("-0001"));
    }

    #[test]
    fn test_render_dump_reflects_final_state() {
        let mut machine = Machine::new();
        machine.mem.load_image(&[2010, 4300]).unwrap();
        machine.mem.write(10, 77);
        let mut sink = CaptureSink::default();
        machine.run(&mut sink).unwrap();

        let text = render_dump(&machine);

        assert!(text.contains("+0077"));
        assert!(text.contains("Memory"));
    }
}
