//! CheaPU - CLI Entry Point
//!
//! Commands:
//! - `cheapu run <program>` - Run an image or ASM file until it halts
//! - `cheapu panel [program]` - Interactive front panel
//! - `cheapu asm <source>` - Assemble to a raw image
//! - `cheapu disasm <image>` - Disassemble a raw image

use anyhow::{bail, Context, Result};
use cheapu::{assemble, disassemble, load_image, save_image, Cpu, Fault, Memory};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cheapu")]
#[command(version)]
#[command(about = "A cycle-by-cycle emulator of a minimal 8-bit accumulator machine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts
    Run {
        /// Path to the image or ASM file to execute
        program: String,
        /// Maximum number of cycles to run
        #[arg(short, long, default_value = "10000")]
        max_cycles: u64,
        /// Print machine state after every cycle
        #[arg(short, long)]
        trace: bool,
        /// Print the final machine state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive front panel, one cycle per frame
    Panel {
        /// Image or ASM file to load at address 0
        program: Option<String>,
        /// Clock frequency in cycles per second
        #[arg(long, default_value = "10")]
        hz: u32,
    },
    /// Assemble source to a raw image
    Asm {
        /// Path to the source file
        source: String,
        /// Output image file
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Disassemble a raw image to readable text
    Disasm {
        /// Path to the image file
        image: String,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { program, max_cycles, trace, json } => {
            run_program(&program, max_cycles, trace, json)
        }
        Commands::Panel { program, hz } => {
            let image = match program {
                Some(path) => load_program(&path)?,
                None => Vec::new(),
            };
            run_panel(image, hz)
        }
        Commands::Asm { source, output } => assemble_file(&source, output),
        Commands::Disasm { image } => disassemble_file(&image),
    }
}

#[cfg(feature = "tui")]
fn run_panel(image: Vec<u8>, hz: u32) -> Result<()> {
    cheapu::run_panel(image, hz).context("front panel failed")
}

#[cfg(not(feature = "tui"))]
fn run_panel(_image: Vec<u8>, _hz: u32) -> Result<()> {
    bail!("built without the `tui` feature")
}

/// Load a program: `.asm` files are assembled, anything else is a raw image.
fn load_program(path: &str) -> Result<Vec<u8>> {
    if path.ends_with(".asm") {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path))?;
        let image = assemble(&source)
            .with_context(|| format!("failed to assemble {}", path))?;
        log::info!("assembled {} bytes from {}", image.len(), path);
        Ok(image)
    } else {
        load_image(path).with_context(|| format!("failed to load image {}", path))
    }
}

fn run_program(path: &str, max_cycles: u64, trace: bool, json: bool) -> Result<()> {
    let image = load_program(path)?;
    if image.is_empty() {
        bail!("{} is empty", path);
    }

    let mut mem = Memory::new();
    mem.load(0, &image)?;
    let mut cpu = Cpu::new();
    cpu.reset();

    // One cycle at a time, like any other driver.
    while !cpu.is_halted() && cpu.cycles < max_cycles {
        cpu.cycle(&mut mem);

        if trace {
            let in_flight = cpu.in_flight()
                .map(|i| format!("{} {:#04x} ({:?})", i.opcode(), i.operand(), i.step()))
                .unwrap_or_else(|| "-".into());
            println!(
                "{:6}: PC={:#04x} A={:#04x} O={} Z={} E={}  {:?} {}",
                cpu.cycles,
                cpu.regs.program_counter,
                cpu.regs.accumulator,
                u8::from(cpu.flags.overflow),
                u8::from(cpu.flags.zero),
                u8::from(cpu.flags.error),
                cpu.state(),
                in_flight,
            );
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&cpu)?);
    } else {
        println!("Cycles: {}", cpu.cycles);
        println!("State: {:?}", cpu.state());
        println!("PC: {:#04x}", cpu.regs.program_counter);
        println!("Accumulator: {:#04x} ({})", cpu.regs.accumulator, cpu.regs.accumulator);
        println!(
            "Flags: overflow={} zero={} error={}",
            cpu.flags.overflow, cpu.flags.zero, cpu.flags.error
        );
    }

    if let Some(notice) = cut_off_notice(&cpu, max_cycles) {
        eprintln!("{}", notice);
    }

    match cpu.fault() {
        None | Some(Fault::Halt) => Ok(()),
        Some(fault) => bail!("machine fault at PC={:#04x}: {}", cpu.regs.program_counter, fault),
    }
}

/// The stderr notice for a run stopped by the cycle limit rather than a fault.
fn cut_off_notice(cpu: &Cpu, max_cycles: u64) -> Option<String> {
    if cpu.is_halted() {
        return None;
    }
    Some(format!(
        "Stopped after {} cycles without halting (max cycles {}); use --max-cycles to increase",
        cpu.cycles, max_cycles
    ))
}

fn assemble_file(source_path: &str, output: Option<String>) -> Result<()> {
    let out_path = output.unwrap_or_else(|| source_path.replace(".asm", ".bin"));
    if out_path == source_path {
        bail!("refusing to overwrite {}; pass --output", source_path);
    }

    let source = std::fs::read_to_string(source_path)
        .with_context(|| format!("failed to read {}", source_path))?;
    let image = assemble(&source)
        .with_context(|| format!("failed to assemble {}", source_path))?;
    save_image(&out_path, &image)
        .with_context(|| format!("failed to write {}", out_path))?;

    println!("Assembled {} bytes: {} → {}", image.len(), source_path, out_path);
    Ok(())
}

fn disassemble_file(path: &str) -> Result<()> {
    let image = load_image(path).with_context(|| format!("failed to load image {}", path))?;
    print!("{}", disassemble(&image));
    Ok(())
}
