use crate::syntax::{Binding, Comp, Expr, Function, Ident, Imm, Import, Program};

/// A read-only walk over the IR.
///
/// Override `visit_*` to observe a node kind and call the matching `super_*` to keep descending.
pub trait Visitor {
    fn visit_program(&mut self, program: &Program) {
        self.super_program(program);
    }

    fn super_program(&mut self, program: &Program) {
        for import in &program.imports {
            self.visit_import(import);
        }
        for function in &program.functions {
            self.visit_function(function);
        }
        self.visit_expr(&program.body);
    }

    fn visit_import(&mut self, import: &Import) {
        self.visit_binder(&import.id);
    }

    fn visit_function(&mut self, function: &Function) {
        self.super_function(function);
    }

    fn super_function(&mut self, function: &Function) {
        self.visit_binder(&function.id);
        for param in &function.params {
            self.visit_binder(param);
        }
        self.visit_expr(&function.body);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        self.super_expr(expr);
    }

    fn super_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Let { bindings, body, .. } => {
                for binding in bindings {
                    self.visit_binding(binding);
                }
                self.visit_expr(body);
            }
            Expr::Seq(comp, rest) => {
                self.visit_comp(comp);
                self.visit_expr(rest);
            }
            Expr::Comp(comp) => self.visit_comp(comp),
        }
    }

    fn visit_binding(&mut self, binding: &Binding) {
        self.super_binding(binding);
    }

    fn super_binding(&mut self, binding: &Binding) {
        self.visit_binder(&binding.id);
        self.visit_comp(&binding.comp);
    }

    fn visit_comp(&mut self, comp: &Comp) {
        self.super_comp(comp);
    }

    fn super_comp(&mut self, comp: &Comp) {
        match comp {
            Comp::Imm(imm)
            | Comp::Prim1(_, imm)
            | Comp::TupleGet(_, imm)
            | Comp::BoxNew(imm)
            | Comp::Unbox(imm) => self.visit_imm(imm),
            Comp::Prim2(_, lhs, rhs) | Comp::BoxSet(lhs, rhs) => {
                self.visit_imm(lhs);
                self.visit_imm(rhs);
            }
            Comp::Adt { args, .. } | Comp::Tuple(args) => {
                for arg in args {
                    self.visit_imm(arg);
                }
            }
            Comp::Call(callee, args) | Comp::CallForeign(callee, args) => {
                self.visit_ident(callee);
                for arg in args {
                    self.visit_imm(arg);
                }
            }
            Comp::If(cond, then, els) => {
                self.visit_imm(cond);
                self.visit_expr(then);
                self.visit_expr(els);
            }
            Comp::Fail(_) => (),
        }
    }

    fn visit_imm(&mut self, imm: &Imm) {
        self.super_imm(imm);
    }

    fn super_imm(&mut self, imm: &Imm) {
        match imm {
            Imm::Id(ident) => self.visit_ident(ident),
            Imm::Const(_) => (),
        }
    }

    /// A binding occurrence: import, function, parameter, or let-bound identifier.
    fn visit_binder(&mut self, ident: &Ident) {
        self.visit_ident(ident);
    }

    /// Every identifier occurrence ends up here unless `visit_binder` is overridden.
    fn visit_ident(&mut self, _ident: &Ident) {}
}
