use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::Parser;
use driver::{CompilerArgs, IntoArgs};
use serde::Deserialize;
use session::CompilerOption;
use simplelog::{ColorChoice, LevelFilter, TermLogger, TerminalMode};

#[derive(Parser, Debug)]
#[clap(name = "anfc", version, about = "Optimizes ANF programs and emits WebAssembly")]
struct CommandLine {
    #[clap(flatten)]
    command_line: Config,
    #[clap(long, value_name = "FILE")]
    /// Path to the config file
    config: Option<PathBuf>,
    #[clap(short, long)]
    /// Log every pass and emitted file
    verbose: bool,
}

#[derive(clap::Args, Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct Config {
    #[clap(short, long, value_name = "FILE")]
    /// Path to the input program (JSON)
    input: Option<PathBuf>,
    #[clap(short, long, value_name = "FILE")]
    /// Path to the output module
    output: Option<PathBuf>,
    #[clap(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    /// Also write the text dump and the module signature
    debug: Option<bool>,
    #[clap(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    /// Also write a source map
    source_map: Option<bool>,
    #[clap(long, value_name = "BOOL")]
    /// Run the optimization passes [default: true]
    optimize: Option<bool>,
    #[clap(long, value_name = "BOOL")]
    /// Check scoping before and after optimization [default: true]
    verify_ir: Option<bool>,
}

impl Config {
    fn merge(self, other: Self) -> Self {
        Self {
            input: self.input.or(other.input),
            output: self.output.or(other.output),
            debug: self.debug.or(other.debug),
            source_map: self.source_map.or(other.source_map),
            optimize: self.optimize.or(other.optimize),
            verify_ir: self.verify_ir.or(other.verify_ir),
        }
    }
}

impl IntoArgs for Config {
    fn into_args(self) -> CompilerArgs {
        let default = CompilerOption::default();
        CompilerArgs {
            input: self.input,
            output: self.output,
            compiler_option: CompilerOption {
                debug: self.debug.unwrap_or(default.debug),
                source_map: self.source_map.unwrap_or(default.source_map),
                optimize: self.optimize.unwrap_or(default.optimize),
                verify_ir: self.verify_ir.unwrap_or(default.verify_ir),
            },
        }
    }
}

fn main() -> ExitCode {
    let command_line = CommandLine::parse();

    let level = if command_line.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if let Err(err) = TermLogger::init(
        level,
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ) {
        eprintln!("failed to initialize the logger: {err}");
    }

    let config = if let Some(path) = command_line.config {
        match read_config(&path) {
            Ok(config) => config,
            Err(message) => {
                log::error!("{message}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        Config::default()
    };
    let config = command_line.command_line.merge(config);

    driver::run_compiler(config.into_args())
}

fn read_config(path: &Path) -> Result<Config, String> {
    let config = fs::read_to_string(path)
        .map_err(|err| format!("failed to read config `{}`: {err}", path.display()))?;
    toml::from_str(&config)
        .map_err(|err| format!("invalid config `{}`: {err}", path.display()))
}
