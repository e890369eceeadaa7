//! The rewriting engine every optimization pass is an instance of.
//!
//! [`map_program`] walks the tree once, calling `enter_*` before a node's children are
//! rewritten and `leave_*` afterwards, and rebuilds the tree from whatever the hooks return.
//! Enter hooks therefore observe the original children and leave hooks the rewritten ones.

use crate::syntax::{Binding, Comp, Expr, Function, Imm, Program};

/// Per-node-kind hooks. Every hook defaults to the identity.
pub trait Mapper {
    fn enter_program(&mut self, program: Program) -> Program {
        program
    }

    fn leave_program(&mut self, program: Program) -> Program {
        program
    }

    fn enter_function(&mut self, function: Function) -> Function {
        function
    }

    fn leave_function(&mut self, function: Function) -> Function {
        function
    }

    fn enter_expr(&mut self, expr: Expr) -> Expr {
        expr
    }

    fn leave_expr(&mut self, expr: Expr) -> Expr {
        expr
    }

    fn enter_binding(&mut self, binding: Binding) -> Binding {
        binding
    }

    fn leave_binding(&mut self, binding: Binding) -> Binding {
        binding
    }

    fn enter_comp(&mut self, comp: Comp) -> Comp {
        comp
    }

    fn leave_comp(&mut self, comp: Comp) -> Comp {
        comp
    }

    fn enter_imm(&mut self, imm: Imm) -> Imm {
        imm
    }

    fn leave_imm(&mut self, imm: Imm) -> Imm {
        imm
    }
}

pub fn map_program<M: Mapper + ?Sized>(mapper: &mut M, program: Program) -> Program {
    let Program {
        source,
        imports,
        functions,
        body,
    } = mapper.enter_program(program);
    let functions = functions
        .into_iter()
        .map(|function| map_function(mapper, function))
        .collect();
    let body = map_expr(mapper, body);
    mapper.leave_program(Program {
        source,
        imports,
        functions,
        body,
    })
}

pub fn map_function<M: Mapper + ?Sized>(mapper: &mut M, function: Function) -> Function {
    let Function {
        id,
        params,
        body,
        export,
        span,
    } = mapper.enter_function(function);
    let body = map_expr(mapper, body);
    mapper.leave_function(Function {
        id,
        params,
        body,
        export,
        span,
    })
}

pub fn map_expr<M: Mapper + ?Sized>(mapper: &mut M, expr: Expr) -> Expr {
    let expr = match mapper.enter_expr(expr) {
        Expr::Let {
            kind,
            bindings,
            body,
        } => {
            // bindings first, then the continuation
            let bindings = bindings
                .into_iter()
                .map(|binding| map_binding(mapper, binding))
                .collect();
            let body = Box::new(map_expr(mapper, *body));
            Expr::Let {
                kind,
                bindings,
                body,
            }
        }
        Expr::Seq(comp, rest) => {
            let comp = map_comp(mapper, comp);
            let rest = Box::new(map_expr(mapper, *rest));
            Expr::Seq(comp, rest)
        }
        Expr::Comp(comp) => Expr::Comp(map_comp(mapper, comp)),
    };
    mapper.leave_expr(expr)
}

pub fn map_binding<M: Mapper + ?Sized>(mapper: &mut M, binding: Binding) -> Binding {
    let Binding { id, comp, span } = mapper.enter_binding(binding);
    let comp = map_comp(mapper, comp);
    mapper.leave_binding(Binding { id, comp, span })
}

pub fn map_comp<M: Mapper + ?Sized>(mapper: &mut M, comp: Comp) -> Comp {
    let map_imms = |mapper: &mut M, imms: Vec<Imm>| -> Vec<Imm> {
        imms.into_iter().map(|imm| map_imm(mapper, imm)).collect()
    };

    let comp = match mapper.enter_comp(comp) {
        Comp::Imm(imm) => Comp::Imm(map_imm(mapper, imm)),
        Comp::Prim1(op, imm) => Comp::Prim1(op, map_imm(mapper, imm)),
        Comp::Prim2(op, lhs, rhs) => {
            let lhs = map_imm(mapper, lhs);
            let rhs = map_imm(mapper, rhs);
            Comp::Prim2(op, lhs, rhs)
        }
        Comp::Adt {
            type_tag,
            variant,
            args,
        } => Comp::Adt {
            type_tag,
            variant,
            args: map_imms(mapper, args),
        },
        Comp::Tuple(args) => Comp::Tuple(map_imms(mapper, args)),
        Comp::TupleGet(index, imm) => Comp::TupleGet(index, map_imm(mapper, imm)),
        Comp::BoxNew(imm) => Comp::BoxNew(map_imm(mapper, imm)),
        Comp::Unbox(imm) => Comp::Unbox(map_imm(mapper, imm)),
        Comp::BoxSet(cell, value) => {
            let cell = map_imm(mapper, cell);
            let value = map_imm(mapper, value);
            Comp::BoxSet(cell, value)
        }
        Comp::Call(callee, args) => Comp::Call(callee, map_imms(mapper, args)),
        Comp::CallForeign(callee, args) => Comp::CallForeign(callee, map_imms(mapper, args)),
        Comp::If(cond, then, els) => {
            let cond = map_imm(mapper, cond);
            let then = Box::new(map_expr(mapper, *then));
            let els = Box::new(map_expr(mapper, *els));
            Comp::If(cond, then, els)
        }
        Comp::Fail(code) => Comp::Fail(code),
    };
    mapper.leave_comp(comp)
}

pub fn map_imm<M: Mapper + ?Sized>(mapper: &mut M, imm: Imm) -> Imm {
    let imm = mapper.enter_imm(imm);
    mapper.leave_imm(imm)
}
