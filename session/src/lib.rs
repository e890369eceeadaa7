use std::path::PathBuf;

/// Session is a struct that holds the input and compiler options for a single compilation.
#[derive(Debug, Clone)]
pub struct Session {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub compiler_option: CompilerOption,
}

impl Session {
    pub fn new(input_path: PathBuf, output_path: PathBuf, compiler_option: CompilerOption) -> Self {
        Self {
            input_path,
            output_path,
            compiler_option,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompilerOption {
    /// Write the text dump and the module signature next to the binary.
    pub debug: bool,
    /// Write a source map and reference it from the binary.
    pub source_map: bool,
    /// Run the optimization passes.
    pub optimize: bool,
    /// Check scoping before and after optimization.
    pub verify_ir: bool,
}

impl Default for CompilerOption {
    fn default() -> Self {
        Self {
            debug: false,
            source_map: false,
            optimize: true,
            verify_ir: true,
        }
    }
}
