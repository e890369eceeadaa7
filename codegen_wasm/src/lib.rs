pub(crate) mod constant;
pub(crate) mod expr;
pub(crate) mod function;
pub(crate) mod index;
pub(crate) mod program;
mod signature;

use anyhow::{Context as _, Result};

pub use program::{codegen, CompiledModule, EncodedModule, FunctionOffset};
pub use signature::{ExportSignature, ImportSignature, ModuleSignature, SignatureKind};

/// Disassembles an encoded module into the wasm text format.
pub fn to_text(bytes: &[u8]) -> Result<String> {
    wasmprinter::print_bytes(bytes).context("failed to disassemble the module")
}
