use anyhow::{bail, Context as _, Result};
use data_structure::{
    arena::TypedArena,
    index::{vec::Idx, Indexable},
    FxHashMap, FxHashSet,
};
use ir_anf::Ident;
use sourcemap::Span;
use wasm_encoder::{
    ConstExpr, Encode, EntityType, ExportKind, ExportSection, FunctionSection, GlobalSection,
    GlobalType, ImportSection, MemorySection, MemoryType, Module, TypeSection, ValType,
};

use crate::{
    constant::{CODE_SECTION_ID, CUSTOM_SECTION_ID, MEMORY_EXPORT, SOURCE_MAPPING_URL},
    function::{self, FunctionDef},
    index::{FuncIdx, TypeIdx},
    signature::{ExportSignature, ImportSignature, ModuleSignature, SignatureKind},
};

/// Lowers `program` to a wasm module.
///
/// Imports come first in the function index space, then the program's functions in order,
/// then the entry function built from `program.body`.
pub fn codegen(program: &ir_anf::Program) -> Result<CompiledModule> {
    let signature_arena = TypedArena::new();

    let (imports, functions) = {
        let mut state = State {
            signature_interner: SignatureInterner::new(&signature_arena),
            imports: Vec::new(),
            callees: FxHashMap::default(),
        };

        for import in &program.imports {
            state.declare_import(import)?;
        }
        for (index, function) in program.functions.iter().enumerate() {
            state.declare_function(index, function)?;
        }

        let mut functions = Vec::with_capacity(program.functions.len() + 1);
        for function in &program.functions {
            functions.push(function::codegen(&mut state, function)?);
        }
        functions.push(function::codegen_entry(&mut state, &program.body)?);

        (state.imports, functions)
    };

    let module = CompiledModule {
        source: program.source.clone(),
        signatures: signature_arena.into_vec(),
        imports,
        functions,
    };
    module.check_export_names()?;

    log::debug!(
        "lowered {} import(s) and {} function(s) using {} type(s)",
        module.imports.len(),
        module.functions.len(),
        module.signatures.len()
    );
    Ok(module)
}

/// A lowered module, ready to be encoded.
#[derive(Debug)]
pub struct CompiledModule {
    source: Option<String>,
    signatures: Vec<FnTypeSignature>,
    imports: Vec<ImportDef>,
    functions: Vec<FunctionDef>,
}

/// The encoded bytes of a [`CompiledModule`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedModule {
    pub bytes: Vec<u8>,
    /// One entry per defined function, in function index order.
    pub functions: Vec<FunctionOffset>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionOffset {
    pub name: String,
    /// Byte offset of the function body (after its size prefix) from the start of the module.
    pub body_offset: u32,
    pub span: Option<Span>,
}

impl CompiledModule {
    /// Name of the source file the program was compiled from.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    fn func_idx(&self, position: usize) -> FuncIdx {
        FuncIdx::new(self.imports.len() + position)
    }

    fn exported_functions(&self) -> impl Iterator<Item = (usize, &FunctionDef, &str)> + '_ {
        self.functions
            .iter()
            .enumerate()
            .filter_map(|(position, function)| {
                function
                    .export
                    .as_deref()
                    .map(|name| (position, function, name))
            })
    }

    fn check_export_names(&self) -> Result<()> {
        let mut seen = FxHashSet::default();
        seen.insert(MEMORY_EXPORT);
        for (_, _, name) in self.exported_functions() {
            if !seen.insert(name) {
                bail!("export name `{name}` is used more than once");
            }
        }
        Ok(())
    }

    /// Encodes the module. With `source_map_url`, a `sourceMappingURL` custom section pointing
    /// to it is appended.
    pub fn encode(&self, source_map_url: Option<&str>) -> EncodedModule {
        let mut module_builder = Module::new();

        // write type section
        let mut type_section = TypeSection::new();
        for signature in &self.signatures {
            type_section.function(
                signature.params.iter().copied(),
                signature.results.iter().copied(),
            );
        }
        module_builder.section(&type_section);

        // write import section
        if !self.imports.is_empty() {
            let mut import_section = ImportSection::new();
            for import in &self.imports {
                import_section.import(
                    &import.module,
                    &import.name,
                    EntityType::Function(import.sig.unwrap_idx()),
                );
            }
            module_builder.section(&import_section);
        }

        // write function section
        let mut function_section = FunctionSection::new();
        for function in &self.functions {
            function_section.function(function.sig.unwrap_idx());
        }
        module_builder.section(&function_section);

        // write memory section
        let mut memory_section = MemorySection::new();
        memory_section.memory(MemoryType {
            minimum: 1,
            maximum: None,
            memory64: false,
            shared: false,
            page_size_log2: None,
        });
        module_builder.section(&memory_section);

        // write global section
        let mut global_section = GlobalSection::new();
        global_section.global(
            GlobalType {
                val_type: ValType::I32,
                mutable: true,
                shared: false,
            },
            &ConstExpr::i32_const(0),
        );
        module_builder.section(&global_section);

        // write export section
        let mut export_section = ExportSection::new();
        for (position, _, name) in self.exported_functions() {
            export_section.export(name, ExportKind::Func, self.func_idx(position).unwrap_idx());
        }
        export_section.export(MEMORY_EXPORT, ExportKind::Memory, 0);
        module_builder.section(&export_section);

        let mut bytes = module_builder.finish();

        // write code section by hand to learn where each body lands
        let mut payload = Vec::new();
        self.functions.len().encode(&mut payload);
        let mut body_starts = Vec::with_capacity(self.functions.len());
        for function in &self.functions {
            let start = payload.len();
            function.to_wasm().encode(&mut payload);
            body_starts.push(start + leb128_len(&payload[start..]));
        }
        bytes.push(CODE_SECTION_ID);
        payload.len().encode(&mut bytes);
        let payload_offset = bytes.len();
        bytes.extend_from_slice(&payload);

        let functions = self
            .functions
            .iter()
            .zip(body_starts)
            .map(|(function, start)| FunctionOffset {
                name: function.name.clone(),
                body_offset: (payload_offset + start) as u32,
                span: function.span,
            })
            .collect();

        if let Some(url) = source_map_url {
            let mut custom = Vec::new();
            SOURCE_MAPPING_URL.encode(&mut custom);
            url.encode(&mut custom);
            bytes.push(CUSTOM_SECTION_ID);
            custom.len().encode(&mut bytes);
            bytes.extend_from_slice(&custom);
        }

        EncodedModule { bytes, functions }
    }

    /// The interface of the module: what it exports and what it expects from its host.
    pub fn signature(&self) -> ModuleSignature {
        let mut exports: Vec<_> = self
            .exported_functions()
            .map(|(_, function, name)| ExportSignature {
                name: name.to_owned(),
                kind: SignatureKind::Function,
                arity: Some(function.arity),
            })
            .collect();
        exports.push(ExportSignature {
            name: MEMORY_EXPORT.to_owned(),
            kind: SignatureKind::Memory,
            arity: None,
        });

        let imports = self
            .imports
            .iter()
            .map(|import| ImportSignature {
                module: import.module.clone(),
                name: import.name.clone(),
                arity: import.arity,
            })
            .collect();

        ModuleSignature { exports, imports }
    }
}

/// Length of the unsigned LEB128 number at the start of `bytes`.
fn leb128_len(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .position(|byte| byte & 0x80 == 0)
        .map_or(bytes.len(), |last| last + 1)
}

pub struct State<'arena> {
    pub signature_interner: SignatureInterner<'arena>,
    imports: Vec<ImportDef>,
    callees: FxHashMap<Ident, Callee>,
}

impl State<'_> {
    fn declare_import(&mut self, import: &ir_anf::Import) -> Result<()> {
        let func_idx = FuncIdx::new(self.imports.len());
        let arity = import.arity as usize;
        self.insert_callee(
            &import.id,
            Callee {
                func_idx,
                arity,
                foreign: true,
            },
        )?;
        let sig = self
            .signature_interner
            .intern(FnTypeSignature::of_arity(arity));
        self.imports.push(ImportDef {
            module: import.module.clone(),
            name: import.name.clone(),
            arity: import.arity,
            sig,
        });
        Ok(())
    }

    fn declare_function(&mut self, index: usize, function: &ir_anf::Function) -> Result<()> {
        let func_idx = FuncIdx::new(self.imports.len() + index);
        self.insert_callee(
            &function.id,
            Callee {
                func_idx,
                arity: function.params.len(),
                foreign: false,
            },
        )
    }

    fn insert_callee(&mut self, ident: &Ident, callee: Callee) -> Result<()> {
        if self.callees.insert(ident.clone(), callee).is_some() {
            bail!("`{ident}` is declared more than once");
        }
        Ok(())
    }

    /// Resolves the target of a call and checks that it is called the way it was declared.
    pub fn get_callee(&self, ident: &Ident, foreign: bool, arg_count: usize) -> Result<Callee> {
        let callee = *self
            .callees
            .get(ident)
            .with_context(|| format!("call of unknown function `{ident}`"))?;
        if callee.foreign != foreign {
            let expected = if foreign { "an import" } else { "a function" };
            bail!("`{ident}` is not {expected}");
        }
        if callee.arity != arg_count {
            bail!(
                "`{ident}` takes {} argument(s) but is given {arg_count}",
                callee.arity
            );
        }
        Ok(callee)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Callee {
    pub func_idx: FuncIdx,
    pub arity: usize,
    pub foreign: bool,
}

#[derive(Debug)]
struct ImportDef {
    module: String,
    name: String,
    arity: u32,
    sig: TypeIdx,
}

#[derive(Debug, Hash, PartialEq, Eq, Clone)]
pub struct FnTypeSignature {
    pub params: Vec<ValType>,
    pub results: Vec<ValType>,
}

impl FnTypeSignature {
    /// Every value is an `i32`, so a signature is determined by its arity.
    pub fn of_arity(arity: usize) -> Self {
        Self {
            params: vec![ValType::I32; arity],
            results: vec![ValType::I32],
        }
    }
}

pub struct SignatureInterner<'arena> {
    map: FxHashMap<&'arena FnTypeSignature, TypeIdx>,
    signatures_arena: &'arena TypedArena<FnTypeSignature>,
}
impl Indexable<TypeIdx> for FnTypeSignature {}

impl<'arena> SignatureInterner<'arena> {
    fn new(signatures_arena: &'arena TypedArena<FnTypeSignature>) -> Self {
        Self {
            map: FxHashMap::default(),
            signatures_arena,
        }
    }

    pub fn intern(&mut self, signature: FnTypeSignature) -> TypeIdx {
        if let Some(&idx) = self.map.get(&signature) {
            return idx;
        }
        let idx = TypeIdx::new(self.signatures_arena.len());
        self.map.insert(self.signatures_arena.alloc(signature), idx);
        idx
    }
}
