//! Writes a compiled module and its companion files.
//!
//! Every file of one emission is written while holding a lock marker next to the primary
//! artifact, so two compilations targeting the same path never interleave their writes.

mod error;
mod lock;

use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

use codegen_wasm::{CompiledModule, EncodedModule};
use sourcemap::{Loc, SourceMap, SourceMapBuilder};

pub use error::EmitError;
pub use lock::LockMarker;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitOptions {
    /// Also write the text dump and the module signature.
    pub debug: bool,
    /// Also write a source map and reference it from the module.
    pub source_map: bool,
}

/// The files written by [`emit_module`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emitted {
    pub primary: PathBuf,
    pub source_map: Option<PathBuf>,
    pub text: Option<PathBuf>,
    pub signature: Option<PathBuf>,
}

impl Emitted {
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.primary.as_path()).chain(
            [&self.source_map, &self.text, &self.signature]
                .into_iter()
                .flatten()
                .map(PathBuf::as_path),
        )
    }
}

/// `<output>.lock`
pub fn lock_path(output: &Path) -> PathBuf {
    with_suffix(output, ".lock")
}

/// `<output>.map`
pub fn source_map_path(output: &Path) -> PathBuf {
    with_suffix(output, ".map")
}

/// `<output>.wast`
pub fn text_path(output: &Path) -> PathBuf {
    with_suffix(output, ".wast")
}

/// `<output>.modsig`
pub fn signature_path(output: &Path) -> PathBuf {
    with_suffix(output, ".modsig")
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

pub fn emit_module(
    module: &CompiledModule,
    output: &Path,
    options: &EmitOptions,
) -> Result<Emitted, EmitError> {
    let file_name = output
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| EmitError::InvalidOutput {
            path: output.to_path_buf(),
        })?;

    if let Some(parent) = output.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| EmitError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let lock = LockMarker::acquire(lock_path(output))?;

    let map_url = options.source_map.then(|| format!("{file_name}.map"));
    let encoded = module.encode(map_url.as_deref());

    let source_map = if options.source_map {
        let path = source_map_path(output);
        let json = build_source_map(module, &encoded, &file_name)
            .to_json()
            .map_err(|err| EmitError::Serialize {
                path: path.clone(),
                message: err.to_string(),
            })?;
        write_file(&path, json)?;
        Some(path)
    } else {
        None
    };

    write_file(output, &encoded.bytes)?;

    let (text, signature) = if options.debug {
        let text_file = text_path(output);
        let text = codegen_wasm::to_text(&encoded.bytes).map_err(|err| EmitError::Encode {
            path: text_file.clone(),
            message: format!("{err:#}"),
        })?;
        write_file(&text_file, text)?;

        let signature_file = signature_path(output);
        let signature =
            toml::to_string_pretty(&module.signature()).map_err(|err| EmitError::Serialize {
                path: signature_file.clone(),
                message: err.to_string(),
            })?;
        write_file(&signature_file, signature)?;

        (Some(text_file), Some(signature_file))
    } else {
        (None, None)
    };

    drop(lock);

    Ok(Emitted {
        primary: output.to_path_buf(),
        source_map,
        text,
        signature,
    })
}

fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> Result<(), EmitError> {
    fs::write(path, contents).map_err(|source| EmitError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("wrote `{}`", path.display());
    Ok(())
}

/// Maps the start of every function body that has a span back to the source.
fn build_source_map(module: &CompiledModule, encoded: &EncodedModule, file: &str) -> SourceMap {
    let mut builder = SourceMapBuilder::new(Some(file.to_owned()));
    match module.source() {
        Some(source) => {
            let source = builder.add_source(source);
            for function in &encoded.functions {
                let Some(span) = function.span else {
                    continue;
                };
                let name = builder.add_name(&function.name);
                builder.add_mapping(
                    Loc {
                        line: 0,
                        column: function.body_offset,
                    },
                    source,
                    span.start,
                    Some(name),
                );
            }
        }
        None => log::debug!("program has no source file; the source map is empty"),
    }
    builder.build()
}
