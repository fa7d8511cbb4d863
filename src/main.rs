//! Computron Emulator - CLI Entry Point
//!
//! Commands:
//! - `computron-emu run <program>` - Run a program or ASM file
//! - `computron-emu debug <program>` - Interactive debugger
//! - `computron-emu asm <source>` - Assemble to a program file
//! - `computron-emu disasm <program>` - Disassemble a program file
//! - `computron-emu test` - Built-in self-test

use clap::{Parser, Subcommand};

use computron::asm::{disassemble, disassemble_word};
use computron::report;
use computron::{Machine, Memory, OutputSink};

#[derive(Parser)]
#[command(name = "computron-emu")]
#[command(version = "0.1.0")]
#[command(about = "An emulator of the Computron four-digit decimal teaching computer")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts
    Run {
        /// Path to the program or ASM file to execute
        program: String,
        /// Input words consumed by read instructions, in order
        #[arg(short, long)]
        input: Vec<i32>,
        /// Maximum number of cycles to run (default: 10000)
        #[arg(short, long, default_value = "10000")]
        max_cycles: u64,
        /// Show trace output
        #[arg(short, long)]
        trace: bool,
        /// Print the register and memory dump after the run
        #[arg(short, long)]
        dump: bool,
    },
    /// Interactive debugger
    Debug {
        /// Path to the program or ASM file to debug
        program: String,
        /// Input words consumed by read instructions, in order
        #[arg(short, long)]
        input: Vec<i32>,
    },
    /// Assemble source to a program file
    Asm {
        /// Path to the source file
        source: String,
        /// Output program file
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Disassemble a program file to readable text
    Disasm {
        /// Path to the program file
        program: String,
    },
    /// Run the built-in self-test
    Test,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run {
            program,
            input,
            max_cycles,
            trace,
            dump,
        }) => {
            run_program(&program, input, max_cycles, trace, dump);
        }
        Some(Commands::Debug { program, input }) => {
            debug_program(&program, input);
        }
        Some(Commands::Asm { source, output }) => {
            assemble_file(&source, output);
        }
        Some(Commands::Disasm { program }) => {
            disassemble_file(&program);
        }
        Some(Commands::Test) => {
            run_self_test();
        }
        None => {
            println!("Computron Emulator v0.1.0");
            println!("A four-digit decimal teaching computer");
            println!();
            println!("Use --help for available commands");
        }
    }
}

/// Sink that prints write emissions to stdout.
struct ConsoleSink;

impl OutputSink for ConsoleSink {
    fn emit(&mut self, addr: usize, value: i32) {
        println!("Contents of {:02} : {}", addr, report::format_word(value));
    }
}

/// Load a memory image from either an ASM source or a program file.
fn load_image(path: &str) -> Memory {
    if path.ends_with(".asm") {
        let source = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Failed to read file: {}", e);
                std::process::exit(1);
            }
        };

        let image = match computron::assemble(&source) {
            Ok(image) => {
                println!("Assembled {} words", image.len());
                image
            }
            Err(e) => {
                eprintln!("Assembly error: {}", e);
                std::process::exit(1);
            }
        };

        let mut mem = Memory::new();
        if let Err(e) = mem.load_image(&image) {
            eprintln!("Failed to load program: {}", e);
            std::process::exit(1);
        }
        mem
    } else {
        match computron::load_program(path) {
            Ok(mem) => mem,
            Err(e) => {
                eprintln!("Failed to load program: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn run_program(path: &str, inputs: Vec<i32>, max_cycles: u64, trace: bool, dump: bool) {
    println!("Running: {}", path);

    let mem = load_image(path);
    let mut machine = Machine::with_program(mem, inputs);
    let mut sink = ConsoleSink;

    println!();

    // Run with optional trace
    let mut failed = false;
    while machine.is_running() && machine.cycles < max_cycles {
        let pc = machine.regs.counter;

        match machine.step(&mut sink) {
            Ok(_) => {
                if trace {
                    let listing = disassemble_word(machine.regs.instruction_register);
                    println!(
                        "{:02}: {:<14} acc={}",
                        pc,
                        listing,
                        report::format_word(machine.regs.accumulator)
                    );
                }
            }
            Err(e) => {
                eprintln!("Machine error at counter {:02}: {}", pc, e);
                failed = true;
                break;
            }
        }
    }

    println!();
    println!("Cycles: {}", machine.cycles);
    println!("State: {:?}", machine.state);
    println!(
        "Accumulator: {}",
        report::format_word(machine.regs.accumulator)
    );

    if dump || failed {
        println!();
        print!("{}", report::render_dump(&machine));
    }

    if machine.is_running() && machine.cycles >= max_cycles {
        println!();
        println!(
            "Reached max cycles limit ({}). Use --max-cycles to increase.",
            max_cycles
        );
    }

    if failed {
        std::process::exit(1);
    }
}

fn debug_program(path: &str, inputs: Vec<i32>) {
    #[cfg(feature = "tui")]
    {
        let mem = load_image(path);

        println!("Launching debugger...");
        if let Err(e) = computron::tui::run_debugger(mem, inputs) {
            eprintln!("Debugger error: {}", e);
            std::process::exit(1);
        }
    }

    #[cfg(not(feature = "tui"))]
    {
        let _ = (path, inputs);
        eprintln!("This build was compiled without the `tui` feature");
        std::process::exit(1);
    }
}

fn assemble_file(source_path: &str, output: Option<String>) {
    let out_path = output.unwrap_or_else(|| source_path.replace(".asm", ".ctn"));

    println!("Assembling: {} -> {}", source_path, out_path);

    let source = match std::fs::read_to_string(source_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to read file: {}", e);
            std::process::exit(1);
        }
    };

    let image = match computron::assemble(&source) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("Assembly error: {}", e);
            std::process::exit(1);
        }
    };

    println!("Assembled {} words", image.len());

    if let Err(e) = computron::asm::save_program(&out_path, &image) {
        eprintln!("Failed to save program: {}", e);
        std::process::exit(1);
    }

    println!("Saved to {}", out_path);
}

fn disassemble_file(path: &str) {
    println!("Disassembling: {}", path);
    println!();

    let mem = load_image(path);
    print!("{}", disassemble(mem.cells()));
}

fn run_self_test() {
    use computron::{assemble, parse_program, CaptureSink, Operation};

    println!("Computron Emulator Self-Test");
    println!();

    let mut passed = 0;
    let mut failed = 0;

    // Test 1: word validator boundaries
    print!("Word validator boundaries... ");
    let ok = computron::word::is_valid(9999)
        && computron::word::is_valid(-9999)
        && !computron::word::is_valid(10000)
        && !computron::word::is_valid(-10000);
    if ok {
        println!("ok");
        passed += 1;
    } else {
        println!("FAILED");
        failed += 1;
    }

    // Test 2: decode roundtrip over the operation set
    print!("Decode/encode roundtrip... ");
    let mut ok = true;
    for op in Operation::ALL {
        let instr = computron::Instruction::new(op, 17);
        if computron::cpu::decode(computron::cpu::encode(&instr)) != Ok(instr) {
            ok = false;
            break;
        }
    }
    if ok {
        println!("ok");
        passed += 1;
    } else {
        println!("FAILED");
        failed += 1;
    }

    // Test 3: halt program
    print!("Halt instruction... ");
    let mem = parse_program("4300\n-99999\n").unwrap();
    let mut machine = Machine::with_program(mem, vec![]);
    let mut sink = CaptureSink::default();
    let result = machine.run(&mut sink);
    if result.is_ok() && machine.is_halted() && machine.regs.counter == 0 {
        println!("ok");
        passed += 1;
    } else {
        println!("FAILED");
        failed += 1;
    }

    // Test 4: load/add/write program
    print!("Load/add/write program... ");
    let mem = parse_program("2010\n3011\n2112\n1112\n4300\n-99999\n").unwrap();
    let mut machine = Machine::with_program(mem, vec![]);
    machine.mem.write(10, 6);
    machine.mem.write(11, 7);
    let mut sink = CaptureSink::default();
    let result = machine.run(&mut sink);
    if result.is_ok() && machine.regs.accumulator == 13 && sink.records == vec![(12, 13)] {
        println!("ok");
        passed += 1;
    } else {
        println!("FAILED");
        failed += 1;
    }

    // Test 5: assembler round through the machine
    print!("Assembler end-to-end... ");
    let image = assemble("READ 10\nLOAD 10\nMUL 10\nSTORE 11\nWRITE 11\nHALT").unwrap();
    let mut mem = Memory::new();
    mem.load_image(&image).unwrap();
    let mut machine = Machine::with_program(mem, vec![12]);
    let mut sink = CaptureSink::default();
    let result = machine.run(&mut sink);
    if result.is_ok() && sink.records == vec![(11, 144)] {
        println!("ok");
        passed += 1;
    } else {
        println!("FAILED");
        failed += 1;
    }

    println!();
    println!("Results: {} passed, {} failed", passed, failed);

    if failed > 0 {
        std::process::exit(1);
    }
    println!("All tests passed");
}
