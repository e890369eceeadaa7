use anyhow::{bail, Result};
use data_structure::FxHashSet;
use ir_anf::{Binding, Comp, Constant, Expr, Ident, Imm, LetKind, Prim1, Prim2, Visitor};
use wasm_encoder::{BlockType, Instruction, MemArg, ValType};

use crate::{
    constant::{HEAP_PTR, MEM_ARG, WORD_SIZE},
    function, program,
};

/// Lowers `expr`, leaving exactly one `i32` on the stack.
pub fn codegen(
    program_state: &mut program::State<'_>,
    function_state: &mut function::State,
    expr: &Expr,
) -> Result<()> {
    match expr {
        Expr::Let {
            kind,
            bindings,
            body,
        } => {
            if *kind == LetKind::Rec {
                check_rec_group(bindings)?;
            }
            for binding in bindings {
                codegen_comp(program_state, function_state, &binding.comp)?;
                let local = function_state.bind(&binding.id);
                function_state.push_raw(Instruction::LocalSet(local.unwrap_idx()));
            }
            codegen(program_state, function_state, body)
        }
        Expr::Seq(comp, rest) => {
            codegen_comp(program_state, function_state, comp)?;
            function_state.push_raw(Instruction::Drop);
            codegen(program_state, function_state, rest)
        }
        Expr::Comp(comp) => codegen_comp(program_state, function_state, comp),
    }
}

fn codegen_comp(
    program_state: &mut program::State<'_>,
    function_state: &mut function::State,
    comp: &Comp,
) -> Result<()> {
    match comp {
        Comp::Imm(imm) => codegen_imm(function_state, imm)?,
        Comp::Prim1(prim, imm) => match prim {
            Prim1::Not => {
                codegen_imm(function_state, imm)?;
                function_state.push_raw(Instruction::I32Eqz);
            }
            Prim1::Neg => {
                function_state.push_raw(Instruction::I32Const(0));
                codegen_imm(function_state, imm)?;
                function_state.push_raw(Instruction::I32Sub);
            }
        },
        Comp::Prim2(prim, lhs, rhs) => {
            codegen_imm(function_state, lhs)?;
            codegen_imm(function_state, rhs)?;
            let instr = match prim {
                Prim2::Add => Instruction::I32Add,
                Prim2::Sub => Instruction::I32Sub,
                Prim2::Mul => Instruction::I32Mul,
                Prim2::Div => Instruction::I32DivS,
                Prim2::Eq => Instruction::I32Eq,
                Prim2::Ne => Instruction::I32Ne,
                Prim2::Lt => Instruction::I32LtS,
                Prim2::Le => Instruction::I32LeS,
                Prim2::Gt => Instruction::I32GtS,
                Prim2::Ge => Instruction::I32GeS,
                Prim2::And => Instruction::I32And,
                Prim2::Or => Instruction::I32Or,
            };
            function_state.push_raw(instr);
        }
        Comp::Adt {
            type_tag,
            variant,
            args,
        } => {
            let header = [
                Field::Const(*type_tag as i32),
                Field::Const(*variant as i32),
                Field::Const(args.len() as i32),
            ];
            allocate(
                function_state,
                header.into_iter().chain(args.iter().map(Field::Imm)),
            )?;
        }
        Comp::Tuple(elems) => {
            allocate(
                function_state,
                std::iter::once(Field::Const(elems.len() as i32))
                    .chain(elems.iter().map(Field::Imm)),
            )?;
        }
        Comp::TupleGet(index, tuple) => {
            codegen_imm(function_state, tuple)?;
            // skip the arity word
            function_state.push_raw(Instruction::I32Load(word(u64::from(*index) + 1)));
        }
        Comp::BoxNew(value) => allocate(function_state, [Field::Imm(value)])?,
        Comp::Unbox(cell) => {
            codegen_imm(function_state, cell)?;
            function_state.push_raw(Instruction::I32Load(MEM_ARG));
        }
        Comp::BoxSet(cell, value) => {
            codegen_imm(function_state, cell)?;
            codegen_imm(function_state, value)?;
            function_state.push_raw(Instruction::I32Store(MEM_ARG));
            // unit
            function_state.push_raw(Instruction::I32Const(0));
        }
        Comp::Call(callee, args) | Comp::CallForeign(callee, args) => {
            let foreign = matches!(comp, Comp::CallForeign(..));
            let callee = program_state.get_callee(callee, foreign, args.len())?;
            for arg in args {
                codegen_imm(function_state, arg)?;
            }
            function_state.push_raw(Instruction::Call(callee.func_idx.unwrap_idx()));
        }
        Comp::If(cond, then_expr, else_expr) => {
            codegen_imm(function_state, cond)?;
            function_state.push_raw(Instruction::If(BlockType::Result(ValType::I32)));
            codegen(program_state, function_state, then_expr)?;
            function_state.push_raw(Instruction::Else);
            codegen(program_state, function_state, else_expr)?;
            function_state.push_raw(Instruction::End);
        }
        Comp::Fail(code) => {
            log::trace!("lowering failure with code {code} to a trap");
            function_state.push_raw(Instruction::Unreachable);
        }
    };
    Ok(())
}

fn codegen_imm(function_state: &mut function::State, imm: &Imm) -> Result<()> {
    let instr = match imm {
        Imm::Id(ident) => Instruction::LocalGet(function_state.get_local(ident)?.unwrap_idx()),
        Imm::Const(Constant::Int(i)) => Instruction::I32Const(*i),
        Imm::Const(Constant::Bool(b)) => Instruction::I32Const(if *b { 1 } else { 0 }),
        Imm::Const(Constant::Unit) => Instruction::I32Const(0),
    };
    function_state.push_raw(instr);
    Ok(())
}

/// One word of a heap object.
enum Field<'a> {
    Const(i32),
    Imm(&'a Imm),
}

/// Stores `fields` at the heap pointer and bumps it, leaving the object's address on the stack.
fn allocate<'a>(
    function_state: &mut function::State,
    fields: impl IntoIterator<Item = Field<'a>>,
) -> Result<()> {
    // return the address of the object
    function_state.push_raw(Instruction::GlobalGet(HEAP_PTR));

    let mut words = 0;
    for field in fields {
        function_state.push_raw(Instruction::GlobalGet(HEAP_PTR));
        match field {
            Field::Const(value) => function_state.push_raw(Instruction::I32Const(value)),
            Field::Imm(imm) => codegen_imm(function_state, imm)?,
        }
        function_state.push_raw(Instruction::I32Store(word(words)));
        words += 1;
    }
    grow_heap(function_state, (words * WORD_SIZE) as i32);
    Ok(())
}

/// Memory argument addressing the `index`-th word of an object.
fn word(index: u64) -> MemArg {
    MemArg {
        offset: index * WORD_SIZE,
        ..MEM_ARG
    }
}

/// Grow the heap pointer by the given size.
fn grow_heap(function_state: &mut function::State, size: i32) {
    function_state.push_raw(Instruction::GlobalGet(HEAP_PTR));
    function_state.push_raw(Instruction::I32Const(size));
    function_state.push_raw(Instruction::I32Add);
    function_state.push_raw(Instruction::GlobalSet(HEAP_PTR));
}

/// A recursive group can only be lowered when no right-hand side mentions the group itself.
fn check_rec_group(bindings: &[Binding]) -> Result<()> {
    struct Mentions<'a> {
        group: &'a FxHashSet<&'a Ident>,
        found: Option<Ident>,
    }

    impl Visitor for Mentions<'_> {
        fn visit_binder(&mut self, _ident: &Ident) {}

        fn visit_ident(&mut self, ident: &Ident) {
            if self.found.is_none() && self.group.contains(ident) {
                self.found = Some(ident.clone());
            }
        }
    }

    let group: FxHashSet<&Ident> = bindings.iter().map(|binding| &binding.id).collect();
    for binding in bindings {
        let mut mentions = Mentions {
            group: &group,
            found: None,
        };
        mentions.visit_comp(&binding.comp);
        if let Some(ident) = mentions.found {
            bail!(
                "recursive binding `{}` refers to `{ident}`, which has no value layout",
                binding.id
            );
        }
    }
    Ok(())
}
