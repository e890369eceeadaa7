use data_structure::FxHashMap;
use ir_anf::{map_program, purity, Binding, Comp, Expr, Ident, Imm, LetKind, Mapper, Program};

use crate::AnfPass;

/// Content-derived identity of a compound expression.
///
/// Operands are stored after substitution, so two constructions over merged values share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CseKey {
    Adt {
        type_tag: u32,
        variant: u32,
        args: Vec<Imm>,
    },
    Tuple(Vec<Imm>),
}

/// Returns the key of `comp` if its kind may be deduplicated at all.
///
/// Only constructions of immutable values qualify. Every other kind returns `None`
/// and is never merged, whatever its purity.
pub fn cse_key(comp: &Comp) -> Option<CseKey> {
    match comp {
        Comp::Adt {
            type_tag,
            variant,
            args,
        } => Some(CseKey::Adt {
            type_tag: *type_tag,
            variant: *variant,
            args: args.clone(),
        }),
        Comp::Tuple(args) => Some(CseKey::Tuple(args.clone())),
        // a fresh box has an identity that later writes can observe
        Comp::BoxNew(..) => None,
        Comp::Imm(..)
        | Comp::Prim1(..)
        | Comp::Prim2(..)
        | Comp::TupleGet(..)
        | Comp::Unbox(..)
        | Comp::BoxSet(..)
        | Comp::Call(..)
        | Comp::CallForeign(..)
        | Comp::If(..)
        | Comp::Fail(..) => None,
    }
}

/// Replaces a pure construction by an earlier identical one that is still in scope.
pub struct CommonSubexpressionElimination {
    merged: usize,
}

impl CommonSubexpressionElimination {
    pub fn new() -> Self {
        Self { merged: 0 }
    }

    /// Number of bindings removed by the last run.
    pub fn merged(&self) -> usize {
        self.merged
    }
}

impl Default for CommonSubexpressionElimination {
    fn default() -> Self {
        Self::new()
    }
}

impl AnfPass for CommonSubexpressionElimination {
    fn name(&self) -> &'static str {
        "cse"
    }

    fn run_pass(&mut self, program: Program) -> Program {
        let mut mapper = CseMapper::default();
        let program = map_program(&mut mapper, program);
        debug_assert!(mapper.scopes.is_empty() && mapper.table.is_empty());

        self.merged = mapper.merged;
        log::debug!("cse: merged {} binding(s)", self.merged);
        program
    }
}

struct Scope {
    kind: LetKind,
    /// Keys this scope added to the table.
    keys: Vec<CseKey>,
}

#[derive(Default)]
struct CseMapper {
    table: FxHashMap<CseKey, Ident>,
    subst: FxHashMap<Ident, Ident>,
    scopes: Vec<Scope>,
    merged: usize,
}

impl CseMapper {
    fn resolve(&self, ident: Ident) -> Ident {
        let mut current = ident;
        while let Some(next) = self.subst.get(&current) {
            current = next.clone();
        }
        current
    }
}

impl Mapper for CseMapper {
    fn enter_expr(&mut self, expr: Expr) -> Expr {
        if let Expr::Let { kind, .. } = &expr {
            self.scopes.push(Scope {
                kind: *kind,
                keys: Vec::new(),
            });
        }
        expr
    }

    fn leave_expr(&mut self, expr: Expr) -> Expr {
        let Expr::Let {
            kind,
            bindings,
            body,
        } = expr
        else {
            return expr;
        };

        let scope = self
            .scopes
            .pop()
            .unwrap_or_else(|| unreachable!("scope stack out of sync"));
        for key in &scope.keys {
            self.table.remove(key);
        }

        let bindings: Vec<_> = bindings
            .into_iter()
            .filter(|binding| !self.subst.contains_key(&binding.id))
            .collect();
        if bindings.is_empty() {
            *body
        } else {
            Expr::Let {
                kind,
                bindings,
                body,
            }
        }
    }

    fn leave_binding(&mut self, binding: Binding) -> Binding {
        let Some(scope) = self.scopes.last_mut() else {
            return binding;
        };
        if scope.kind == LetKind::Rec || !purity(&binding.comp).is_pure() {
            return binding;
        }
        let Some(key) = cse_key(&binding.comp) else {
            return binding;
        };

        match self.table.get(&key) {
            Some(existing) => {
                log::debug!("cse: {} is replaced by {}", binding.id, existing);
                self.subst.insert(binding.id.clone(), existing.clone());
                self.merged += 1;
            }
            None => {
                self.table.insert(key.clone(), binding.id.clone());
                scope.keys.push(key);
            }
        }
        binding
    }

    fn enter_imm(&mut self, imm: Imm) -> Imm {
        match imm {
            Imm::Id(ident) => Imm::Id(self.resolve(ident)),
            imm => imm,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ir_anf::Prim2;

    #[test]
    fn only_immutable_constructions_have_keys() {
        assert!(cse_key(&Comp::adt(0, 0, vec![])).is_some());
        assert!(cse_key(&Comp::Tuple(vec![Imm::int(1)])).is_some());
        assert!(cse_key(&Comp::BoxNew(Imm::int(1))).is_none());
        assert!(cse_key(&Comp::Prim2(Prim2::Add, Imm::int(1), Imm::int(2))).is_none());
    }

    #[test]
    fn keys_compare_by_content() {
        let a = cse_key(&Comp::adt(2, 1, vec![Imm::int(7)]));
        let b = cse_key(&Comp::adt(2, 1, vec![Imm::int(7)]));
        let c = cse_key(&Comp::adt(2, 0, vec![Imm::int(7)]));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
