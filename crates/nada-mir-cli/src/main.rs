use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nada_mir_core::MirProgram;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nada-mir")]
#[command(about = "Nada frontend - compiles program graphs into MIR documents")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Compile {
        input: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        target_dir: Option<PathBuf>,

        #[arg(long)]
        compact: bool,

        /// Also write the loaded program graph as `<name>.nada-pydsl-hir.json`
        #[arg(long)]
        emit_hir: bool,

        #[arg(short, long)]
        verbose: bool,
    },

    Debug {
        input: PathBuf,

        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            input,
            output,
            target_dir,
            compact,
            emit_hir,
            verbose,
        } => {
            init_tracing(verbose);
            cmd_compile(input, output, target_dir, compact, emit_hir, verbose)
        }
        Commands::Debug { input, verbose } => {
            init_tracing(verbose);
            cmd_debug(input, verbose)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// `prog.hir.json` and `prog.json` both become `prog`.
fn program_name(input: &Path) -> String {
    let file_name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "program".to_string());
    for suffix in [".hir.json", ".json"] {
        if let Some(stem) = file_name.strip_suffix(suffix) {
            if !stem.is_empty() {
                return stem.to_string();
            }
        }
    }
    file_name
}

fn cmd_compile(
    input: PathBuf,
    output: Option<PathBuf>,
    target_dir: Option<PathBuf>,
    compact: bool,
    emit_hir: bool,
    verbose: bool,
) -> Result<()> {
    use colored::*;
    use nada_mir_compiler::HirProgram;
    use nada_mir_emit::{EmitterConfig, MirEmitter};
    use std::fs;
    use std::time::Instant;

    if verbose {
        println!("{}", " Nada MIR Compiler".bright_blue().bold());
        println!("{}", "=".repeat(50).bright_blue());
        println!(" Input: {}", input.display());
        if let Some(ref out) = output {
            println!(" Output: {}", out.display());
        }
        println!();
    }

    let start = Instant::now();
    tracing::debug!(input = %input.display(), compact, "compiling program");

    if verbose {
        println!(" Loading program graph...");
    }
    let hir = fs::read_to_string(&input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let outputs = HirProgram::from_json(&hir)?.to_outputs()?;

    if verbose {
        println!(" Lowering to MIR...");
    }
    let program = nada_mir_compiler::compile(&outputs)?;

    let mut config = if compact {
        EmitterConfig::compact()
    } else {
        EmitterConfig::default()
    };
    if let Some(dir) = target_dir {
        config = config.with_target_dir(dir);
    }
    let emitter = MirEmitter::new(config);
    let name = program_name(&input);

    let written = match &output {
        Some(path) => {
            fs::write(path, emitter.emit_to_string(&program)?)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            path.clone()
        }
        None => emitter.write(&program, &name)?,
    };

    let hir_written = if emit_hir {
        if verbose {
            println!(" Writing program graph...");
        }
        let dumped = HirProgram::from_outputs(&outputs)?;
        // With -o the graph lands beside the MIR file instead of in the target dir.
        let hir_emitter = match output.as_ref().and_then(|path| path.parent()) {
            Some(dir) => MirEmitter::new(emitter.config().clone().with_target_dir(dir)),
            None => emitter,
        };
        Some(hir_emitter.write_hir(&dumped, &name)?)
    } else {
        None
    };

    if verbose {
        let elapsed = start.elapsed();
        println!(
            "\n {} Compilation successful!",
            "SUCCESS:".bright_green().bold()
        );
        println!("   Time: {:.3}s", elapsed.as_secs_f64());
        println!(
            "   Functions: {}, inputs: {}, outputs: {}",
            program.functions.len(),
            program.inputs.len(),
            program.outputs.len()
        );
    }
    println!("{}", written.display());
    if let Some(path) = hir_written {
        println!("{}", path.display());
    }

    Ok(())
}

fn cmd_debug(input: PathBuf, verbose: bool) -> Result<()> {
    use colored::*;
    use nada_mir_compiler::compile_hir;
    use std::fs;

    if verbose {
        println!("{}", " Debug MIR Dump".bright_cyan().bold());
        println!("{}", "=".repeat(50).bright_cyan());
        println!(" Input: {}", input.display());
        println!();
    }

    let hir = fs::read_to_string(&input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let program = compile_hir(&hir)?;
    tracing::debug!(functions = program.functions.len(), "loaded program");

    print_program(&program, verbose)
}

fn print_program(program: &MirProgram, verbose: bool) -> Result<()> {
    use colored::*;

    println!("{}", " Parties".bright_green().bold());
    for party in &program.parties {
        println!("   {}", party.name);
    }

    println!("{}", " Inputs".bright_green().bold());
    for input in &program.inputs {
        println!(
            "   {}.{}: {}",
            input.party,
            input.name,
            serde_json::to_string(&input.ty)?
        );
    }

    println!("{}", " Functions".bright_green().bold());
    for function in &program.functions {
        println!(
            "   {} {} ({} args)",
            function.id,
            function.function,
            function.args.len()
        );
        if verbose {
            println!("     Body: {}", function.inner.kind_name());
            println!("     Returns: {}", serde_json::to_string(&function.return_type)?);
        }
    }

    println!("{}", " Outputs".bright_green().bold());
    for output in &program.outputs {
        println!(
            "   {} -> {}: {}",
            output.name,
            output.party,
            output.inner.kind_name()
        );
        if verbose {
            let inputs = output.inner.input_references();
            if !inputs.is_empty() {
                println!("     Reads: {}", inputs.join(", "));
            }
        }
    }

    if verbose && !program.source_files.is_empty() {
        println!("{}", " Source files".bright_green().bold());
        for file in &program.source_files {
            println!("   {}", file);
        }
    }

    Ok(())
}
