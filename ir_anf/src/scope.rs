use data_structure::{FxHashMap, FxHashSet};
use thiserror::Error;

use crate::{
    syntax::{Comp, Expr, Function, Ident, LetKind, Program},
    Visitor,
};

/// A broken IR invariant. Well-formed input from lowering never produces one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralViolation {
    #[error("`{name}/{stamp}` is referenced outside the scope of its binding")]
    Unbound { name: String, stamp: u32 },
    #[error("`{name}/{stamp}` is bound more than once")]
    Rebound { name: String, stamp: u32 },
    #[error("`{name}/{stamp}` is called but is not a function of the program")]
    NotAFunction { name: String, stamp: u32 },
    #[error("`{name}/{stamp}` is called as a foreign function but is not imported")]
    NotAnImport { name: String, stamp: u32 },
    #[error("`{name}` expects {expected} arguments but is applied to {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
}

/// Checks that every identifier is bound exactly once and only used where its binding is visible.
pub fn check_program(program: &Program) -> Result<(), StructuralViolation> {
    let mut checker = ScopeChecker::default();
    for import in &program.imports {
        checker.bind_global(&import.id);
        checker
            .imports
            .insert(import.id.clone(), import.arity as usize);
    }
    for function in &program.functions {
        checker.bind_global(&function.id);
        checker
            .functions
            .insert(function.id.clone(), function.params.len());
    }
    for function in &program.functions {
        checker.visit_function(function);
    }
    checker.visit_expr(&program.body);

    match checker.error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

#[derive(Default)]
struct ScopeChecker {
    functions: FxHashMap<Ident, usize>,
    imports: FxHashMap<Ident, usize>,
    /// Every binder seen so far.
    bound: FxHashSet<Ident>,
    /// Values visible at the current point.
    visible: FxHashSet<Ident>,
    error: Option<StructuralViolation>,
}

impl ScopeChecker {
    fn report(&mut self, error: StructuralViolation) {
        // keep the first violation, later ones are usually consequences of it
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    fn bind_global(&mut self, ident: &Ident) {
        if !self.bound.insert(ident.clone()) {
            self.report(StructuralViolation::Rebound {
                name: ident.name.clone(),
                stamp: ident.stamp,
            });
        }
    }

    fn bind(&mut self, ident: &Ident) {
        self.bind_global(ident);
        self.visible.insert(ident.clone());
    }

    fn check_call(&mut self, callee: &Ident, found: usize, foreign: bool) {
        let table = if foreign {
            &self.imports
        } else {
            &self.functions
        };
        match table.get(callee).copied() {
            Some(expected) if expected != found => {
                self.report(StructuralViolation::ArityMismatch {
                    name: callee.name.clone(),
                    expected,
                    found,
                });
            }
            Some(_) => (),
            None if foreign => self.report(StructuralViolation::NotAnImport {
                name: callee.name.clone(),
                stamp: callee.stamp,
            }),
            None => self.report(StructuralViolation::NotAFunction {
                name: callee.name.clone(),
                stamp: callee.stamp,
            }),
        }
    }
}

impl Visitor for ScopeChecker {
    fn visit_function(&mut self, function: &Function) {
        let outer = std::mem::take(&mut self.visible);
        for param in &function.params {
            self.bind(param);
        }
        self.visit_expr(&function.body);
        self.visible = outer;
    }

    fn visit_expr(&mut self, expr: &Expr) {
        let Expr::Let {
            kind,
            bindings,
            body,
        } = expr
        else {
            self.super_expr(expr);
            return;
        };

        match kind {
            LetKind::Nonrec => {
                for binding in bindings {
                    self.visit_comp(&binding.comp);
                    self.bind(&binding.id);
                }
            }
            LetKind::Rec => {
                for binding in bindings {
                    self.bind(&binding.id);
                }
                for binding in bindings {
                    self.visit_comp(&binding.comp);
                }
            }
        }
        self.visit_expr(body);
        for binding in bindings {
            self.visible.remove(&binding.id);
        }
    }

    fn visit_comp(&mut self, comp: &Comp) {
        match comp {
            Comp::Call(callee, args) | Comp::CallForeign(callee, args) => {
                let foreign = matches!(comp, Comp::CallForeign(..));
                self.check_call(callee, args.len(), foreign);
                for arg in args {
                    self.visit_imm(arg);
                }
            }
            _ => self.super_comp(comp),
        }
    }

    fn visit_ident(&mut self, ident: &Ident) {
        if !self.visible.contains(ident) {
            self.report(StructuralViolation::Unbound {
                name: ident.name.clone(),
                stamp: ident.stamp,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Binding, Context, Imm, Import};

    #[test]
    fn sibling_branches_do_not_see_each_other() {
        let ctx = Context::new();
        let x = ctx.fresh_ident("x");
        let y = ctx.fresh_ident("y");
        let body = Expr::Comp(Comp::If(
            Imm::bool(true),
            Box::new(Expr::let_one(
                x.clone(),
                Comp::Imm(Imm::int(1)),
                Expr::imm(Imm::id(&x)),
            )),
            Box::new(Expr::let_one(
                y.clone(),
                Comp::Imm(Imm::int(2)),
                Expr::imm(Imm::id(&x)),
            )),
        ));
        assert_eq!(
            check_program(&Program::new(body)),
            Err(StructuralViolation::Unbound {
                name: "x".to_owned(),
                stamp: x.stamp,
            })
        );
    }

    #[test]
    fn nonrec_bindings_see_only_earlier_siblings() {
        let ctx = Context::new();
        let a = ctx.fresh_ident("a");
        let b = ctx.fresh_ident("b");
        let forward = vec![
            Binding::new(a.clone(), Comp::Tuple(vec![Imm::id(&b)])),
            Binding::new(b.clone(), Comp::Imm(Imm::int(1))),
        ];
        let nonrec = Program::new(Expr::let_(forward.clone(), Expr::imm(Imm::id(&a))));
        assert!(check_program(&nonrec).is_err());

        let rec = Program::new(Expr::let_rec(forward, Expr::imm(Imm::id(&a))));
        assert_eq!(check_program(&rec), Ok(()));

        let backward = vec![
            Binding::new(b.clone(), Comp::Imm(Imm::int(1))),
            Binding::new(a.clone(), Comp::Tuple(vec![Imm::id(&b)])),
        ];
        let nonrec = Program::new(Expr::let_(backward, Expr::imm(Imm::id(&a))));
        assert_eq!(check_program(&nonrec), Ok(()));
    }

    #[test]
    fn foreign_calls_must_target_imports() {
        let ctx = Context::new();
        let print = ctx.fresh_ident("print");
        let r = ctx.fresh_ident("r");
        let mut program = Program::new(Expr::let_one(
            r.clone(),
            Comp::CallForeign(print.clone(), vec![Imm::int(1)]),
            Expr::imm(Imm::id(&r)),
        ));
        assert!(matches!(
            check_program(&program),
            Err(StructuralViolation::NotAnImport { .. })
        ));

        program.imports.push(Import {
            id: print,
            module: "env".to_owned(),
            name: "print".to_owned(),
            arity: 1,
        });
        assert_eq!(check_program(&program), Ok(()));
    }
}
