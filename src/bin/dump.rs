use std::io::{self, BufRead};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use clap_num::maybe_hex;

use chip8_vm::emu::{
    Chip8, Chip8Result, Chip8Runner, Instruction, Opcode, PROGRAM_START_ADDRESS, RunnerConfig,
    disassemble, load_program_file,
};

/// Prints a disassembly listing of a CHIP-8 program and optionally runs it
/// headless.
#[derive(Parser)]
#[command(about)]
struct Args {
    /// Path to the ROM file to load
    rom_path: PathBuf,

    /// Run this many instructions unthrottled, then print the machine state
    #[arg(long)]
    cycles: Option<u64>,

    /// Execute one instruction per line read from stdin (`q` quits)
    #[arg(long)]
    step: bool,

    /// Seed for the random number generator (decimal or 0x-prefixed hex)
    #[arg(long, value_parser = maybe_hex::<u64>)]
    seed: Option<u64>,

    /// Log every executed instruction with the register state
    #[arg(long)]
    trace: bool,
}

fn init_logger(trace: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if trace {
        builder.filter_module("chip8_vm", log::LevelFilter::Trace);
    }
    builder.init();
}

fn print_listing(rom: &[u8]) {
    println!("Program has a size of {} bytes", rom.len());
    println!("Addr | Word | Instruction");

    for (address, word, opcode) in disassemble(rom, PROGRAM_START_ADDRESS as u16) {
        println!("{address:03X}  | {word:04X} | {opcode}");
    }
}

/// Waits for the next line on stdin. Returns false on EOF or `q`.
fn wait_for_step(
    lines: &mut impl Iterator<Item = io::Result<String>>,
) -> anyhow::Result<bool> {
    match lines.next() {
        Some(line) => Ok(line.context("Failed to read stdin")?.trim() != "q"),
        None => Ok(false),
    }
}

fn print_next_instruction(chip8: &Chip8) {
    let pc = chip8.registers().pc;
    match chip8.memory().read_word(pc) {
        Ok(word) => println!("{pc:03X}: {word:04X} {}", Opcode::decode(Instruction(word))),
        Err(e) => println!("{pc:03X}: {e}"),
    }
}

fn run_headless(mut runner: Chip8Runner, cycles: Option<u64>, step: bool) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut executed = 0;

    while cycles.is_none_or(|limit| executed < limit) {
        if step {
            print_next_instruction(runner.chip8_ref());
            if !wait_for_step(&mut lines)? {
                break;
            }
        }

        let result = runner
            .step()
            .with_context(|| format!("Execution halted after {executed} cycles"))?;
        executed += 1;

        if step {
            println!("{}", runner.chip8_ref().registers());
        }

        if result == Chip8Result::WaitingForKey {
            println!("Blocked waiting for a key press");
            break;
        }
    }

    let chip8 = runner.chip8_ref();
    println!("Executed {executed} cycles");
    println!("{}", chip8.registers());
    println!("Stack: {:03X?}", chip8.stack().as_slice());
    if chip8.should_beep() {
        println!("Sound timer is running");
    }

    if chip8.screen().is_blank() {
        println!("Display is blank");
        return Ok(());
    }

    for row in chip8.screen().pixels() {
        let line: String = row.iter().map(|&p| if p { '#' } else { '.' }).collect();
        println!("{line}");
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logger(args.trace);

    let rom = load_program_file(&args.rom_path).context("Failed to read ROM file")?;
    print_listing(&rom);

    if args.cycles.is_none() && !args.step {
        return Ok(());
    }

    let mut chip8 = match args.seed {
        Some(seed) => Chip8::with_seed(seed),
        None => Chip8::new(),
    };
    chip8
        .load(&rom)
        .context("Failed to load ROM into CHIP-8 memory")?;

    let runner = Chip8Runner::new(chip8, RunnerConfig::unthrottled());
    run_headless(runner, args.cycles, args.step)
}
