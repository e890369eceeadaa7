use crate::syntax::{Comp, Prim2};

/// Whether evaluating a compound expression has effects beyond producing its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purity {
    Pure,
    Impure,
    /// Not known to be pure. Consumers must treat this like [`Purity::Impure`].
    Unknown,
}

impl Purity {
    /// Only a definite answer licenses an optimization.
    pub fn is_pure(self) -> bool {
        matches!(self, Self::Pure)
    }
}

/// Classifies `comp` by its operation kind alone.
///
/// Operands are immediates and never need inspecting; the arms of an `if` are not looked into.
pub fn purity(comp: &Comp) -> Purity {
    match comp {
        Comp::Imm(..)
        | Comp::Prim1(..)
        | Comp::Adt { .. }
        | Comp::Tuple(..)
        | Comp::TupleGet(..)
        | Comp::BoxNew(..) => Purity::Pure,
        // division traps on a zero divisor
        Comp::Prim2(Prim2::Div, ..) => Purity::Impure,
        Comp::Prim2(..) => Purity::Pure,
        Comp::BoxSet(..) | Comp::CallForeign(..) | Comp::Fail(..) => Purity::Impure,
        Comp::Unbox(..) | Comp::Call(..) | Comp::If(..) => Purity::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Expr, Ident, Imm};

    #[test]
    fn constructions_are_pure() {
        assert_eq!(purity(&Comp::adt(0, 1, vec![])), Purity::Pure);
        assert_eq!(purity(&Comp::Tuple(vec![Imm::int(1)])), Purity::Pure);
        assert_eq!(purity(&Comp::BoxNew(Imm::int(1))), Purity::Pure);
    }

    #[test]
    fn effects_are_impure() {
        let f = Ident::new("print", 0);
        assert_eq!(purity(&Comp::CallForeign(f, vec![])), Purity::Impure);
        assert_eq!(purity(&Comp::Fail(1)), Purity::Impure);
        assert_eq!(
            purity(&Comp::Prim2(Prim2::Div, Imm::int(1), Imm::int(0))),
            Purity::Impure
        );
        assert_eq!(
            purity(&Comp::Prim2(Prim2::Add, Imm::int(1), Imm::int(0))),
            Purity::Pure
        );
    }

    #[test]
    fn unknown_is_not_pure() {
        let cell = Ident::new("cell", 0);
        let unbox = purity(&Comp::Unbox(Imm::id(&cell)));
        assert_eq!(unbox, Purity::Unknown);
        assert!(!unbox.is_pure());

        let branch = Comp::If(
            Imm::bool(true),
            Box::new(Expr::imm(Imm::int(1))),
            Box::new(Expr::imm(Imm::int(2))),
        );
        assert!(!purity(&branch).is_pure());
    }
}
