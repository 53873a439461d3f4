use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use brainfry_core::{CompileOptions, compile_file, default_output_path};
use clap::Parser;
use colored::Colorize;

/// Compile brainfuck into x86-64 NASM assembly
#[derive(Parser, Debug)]
#[command(name = "brainfry", version, about, long_about = None)]
struct Cli {
    /// Brainfuck source file to compile
    input: PathBuf,

    #[arg(
        short,
        long,
        value_name = "PATH",
        help = "Where to write the assembly (defaults to the input with an .asm extension)"
    )]
    output: Option<PathBuf>,

    #[arg(
        long,
        help = "Don't fold repeated +/- into single instructions; faster compiles, slower executables"
    )]
    dont_optimize: bool,

    #[arg(short, long, help = "Assemble with nasm, link with ld and run the executable")]
    run: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    execute(cli)
}

fn execute(cli: Cli) -> Result<()> {
    let options = CompileOptions {
        optimize: !cli.dont_optimize,
    };
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.input));

    let start = Instant::now();
    let summary = compile_file(&cli.input, &output, &options)
        .with_context(|| format!("failed to compile {}", cli.input.display()))?;
    info(format!("Compilation finished in {:.2?}", start.elapsed()));
    info(format!("Used optimizations = {}", options.optimize));
    info(format!(
        "{} instructions, {} loops, {} grouped runs -> {}",
        summary.instructions,
        summary.loops,
        summary.runs,
        output.display()
    ));

    if cli.run {
        let status = assemble_and_run(&output)?;
        info(format!("Program exited with {status}"));
    }

    Ok(())
}

/// Status lines go to stderr so that stdout belongs to the compiled program.
fn info(message: impl Display) {
    eprintln!("{} {message}", "[INFO]:".blue());
}

fn assemble_and_run(asm: &Path) -> Result<i32> {
    let object = asm.with_extension("o");
    let executable = asm.with_extension("");
    if executable == asm {
        bail!(
            "cannot derive an executable name from {}; give the output an extension",
            asm.display()
        );
    }

    info(format!("Assembling {}", asm.display()));
    run_tool(
        Command::new("nasm")
            .args(["-f", "elf64", "-o"])
            .arg(&object)
            .arg(asm),
    )?;

    info(format!("Linking {}", object.display()));
    let linked = run_tool(Command::new("ld").arg("-o").arg(&executable).arg(&object));
    fs::remove_file(&object)
        .with_context(|| format!("failed to remove object file {}", object.display()))?;
    linked?;

    info(format!("Running {}", executable.display()));
    // A bare file name would be looked up on PATH.
    let program = if executable.is_absolute() {
        executable
    } else {
        Path::new(".").join(executable)
    };
    let status = Command::new(&program)
        .status()
        .with_context(|| format!("failed to execute {}", program.display()))?;
    Ok(status.code().unwrap_or(-1))
}

fn run_tool(command: &mut Command) -> Result<()> {
    let name = command.get_program().to_string_lossy().into_owned();
    let status = command
        .status()
        .with_context(|| format!("failed to launch {name}; is it installed?"))?;
    if !status.success() {
        bail!("{name} failed with {status}");
    }
    Ok(())
}
