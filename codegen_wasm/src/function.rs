use anyhow::{Context as _, Result};
use data_structure::{
    index::{vec::IndexVec, Indexable},
    FxHashMap,
};
use ir_anf::Ident;
use sourcemap::Span;
use wasm_encoder::{Instruction, ValType};

use crate::{
    constant::ENTRY_EXPORT,
    expr,
    index::{LocalIdx, TypeIdx},
    program::{self, FnTypeSignature},
};

pub fn codegen(
    program_state: &mut program::State<'_>,
    function: &ir_anf::Function,
) -> Result<FunctionDef> {
    let mut state = State::new();
    for param in &function.params {
        state.bind(param);
    }

    expr::codegen(program_state, &mut state, &function.body)
        .with_context(|| format!("failed to lower function `{}`", function.id))?;
    state.push_raw(Instruction::End);

    let arity = function.params.len();
    Ok(FunctionDef {
        name: function.id.name.clone(),
        export: function.export.then(|| function.id.name.clone()),
        sig: program_state
            .signature_interner
            .intern(FnTypeSignature::of_arity(arity)),
        arity: arity as u32,
        local_decls: state.local_decls,
        instrs: state.instrs,
        span: function.span,
    })
}

/// Lowers the entry expression to the exported `_start` function.
pub fn codegen_entry(
    program_state: &mut program::State<'_>,
    body: &ir_anf::Expr,
) -> Result<FunctionDef> {
    let mut state = State::new();
    expr::codegen(program_state, &mut state, body)
        .context("failed to lower the entry expression")?;
    state.push_raw(Instruction::End);

    Ok(FunctionDef {
        name: ENTRY_EXPORT.to_owned(),
        export: Some(ENTRY_EXPORT.to_owned()),
        sig: program_state
            .signature_interner
            .intern(FnTypeSignature::of_arity(0)),
        arity: 0,
        local_decls: state.local_decls,
        instrs: state.instrs,
        span: None,
    })
}

#[derive(Debug)]
pub struct FunctionDef {
    pub name: String,
    /// Export name, if the function is visible to the host.
    pub export: Option<String>,
    pub sig: TypeIdx,
    pub arity: u32,
    /// Parameters first, then one local per let-bound identifier.
    pub local_decls: IndexVec<LocalIdx, LocalDecl>,
    pub instrs: Vec<Instruction<'static>>,
    pub span: Option<Span>,
}

impl FunctionDef {
    pub fn to_wasm(&self) -> wasm_encoder::Function {
        let mut function_builder = wasm_encoder::Function::new_with_locals_types(
            self.local_decls
                .iter()
                .skip(self.arity as usize)
                .map(|local_decl| local_decl.val_type),
        );
        for instr in &self.instrs {
            function_builder.instruction(instr);
        }
        function_builder
    }
}

pub struct State {
    /// Mapping from identifiers to the locals holding them.
    locals: FxHashMap<Ident, LocalIdx>,
    /// Local declarations.
    local_decls: IndexVec<LocalIdx, LocalDecl>,

    /// Instructions built so far.
    instrs: Vec<Instruction<'static>>,
}

#[derive(Debug, Clone, Copy)]
pub struct LocalDecl {
    pub val_type: ValType,
}
impl Indexable<LocalIdx> for LocalDecl {}

impl State {
    fn new() -> Self {
        Self {
            locals: FxHashMap::default(),
            local_decls: IndexVec::new(),
            instrs: Vec::new(),
        }
    }

    /// Creates the local holding `ident`.
    pub fn bind(&mut self, ident: &Ident) -> LocalIdx {
        let local = self.local_decls.push(LocalDecl {
            val_type: ValType::I32,
        });
        self.locals.insert(ident.clone(), local);
        local
    }

    /// Get the local index of the given identifier.
    pub fn get_local(&self, ident: &Ident) -> Result<LocalIdx> {
        self.locals
            .get(ident)
            .copied()
            .with_context(|| format!("`{ident}` is not a local value here"))
    }

    /// Push a raw instruction.
    pub fn push_raw(&mut self, value: Instruction<'static>) {
        self.instrs.push(value)
    }
}
