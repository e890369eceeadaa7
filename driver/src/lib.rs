use std::{fs, path::PathBuf, process::ExitCode};

use anyhow::{Context as _, Result};
use emit::{EmitOptions, Emitted};
use ir_anf::Program;
use session::{CompilerOption, Session};

pub struct CompilerArgs {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub compiler_option: CompilerOption,
}

pub trait IntoArgs {
    fn into_args(self) -> CompilerArgs;
}

pub fn run_compiler(args: CompilerArgs) -> ExitCode {
    let mut fatal_errs = 0;
    let mut fatal = |message: &str| {
        fatal_errs += 1;
        log::error!("{message}");
    };

    if args.input.is_none() {
        fatal("an input file is required");
    }
    if args.output.is_none() {
        fatal("an output file is required");
    }
    let (Some(input), Some(output)) = (args.input, args.output) else {
        log::error!("cannot start compilation due to {fatal_errs} previous error(s)");
        return ExitCode::FAILURE;
    };

    let session = Session::new(input, output, args.compiler_option);
    match compile(&session) {
        Ok(emitted) => {
            for file in emitted.files() {
                log::info!("wrote `{}`", file.display());
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Compiles the program read from the session's input file.
pub fn compile(session: &Session) -> Result<Emitted> {
    let input = &session.input_path;
    let content = fs::read_to_string(input)
        .with_context(|| format!("failed to read `{}`", input.display()))?;
    let mut program: Program = serde_json::from_str(&content)
        .with_context(|| format!("`{}` is not a valid ANF program", input.display()))?;
    if program.source.is_none() {
        program.source = Some(input.display().to_string());
    }
    log::info!("read `{}`", input.display());

    compile_program(program, session)
}

/// Verifies, optimizes, lowers and emits `program` as configured by `session`.
pub fn compile_program(program: Program, session: &Session) -> Result<Emitted> {
    let option = &session.compiler_option;

    if option.verify_ir {
        ir_anf::check_program(&program).context("internal compiler error: malformed input")?;
    }

    let program = if option.optimize {
        log::info!("optimizing");
        let mut passes = ir_anf_passes::default_passes();
        let program = ir_anf_passes::run_passes(program, &mut passes);
        if option.verify_ir {
            ir_anf::check_program(&program)
                .context("internal compiler error: optimization broke scoping")?;
        }
        program
    } else {
        program
    };
    log::debug!("final program:\n{program}");

    log::info!("generating wasm");
    let module = codegen_wasm::codegen(&program).context("failed to generate wasm")?;

    let emit_options = EmitOptions {
        debug: option.debug,
        source_map: option.source_map,
    };
    let emitted = emit::emit_module(&module, &session.output_path, &emit_options)?;
    Ok(emitted)
}
