use std::cell::Cell;

use crate::Ident;

/// Hands out identifiers with stamps unique to one compilation unit.
pub struct Context {
    next_stamp: Cell<u32>,
}

impl Context {
    pub fn new() -> Self {
        Self {
            next_stamp: Cell::new(0),
        }
    }

    /// # Panics
    ///
    /// Panics once the stamp space of this context is exhausted, rather than handing out a
    /// stamp twice.
    pub fn fresh_ident(&self, name: &str) -> Ident {
        let stamp = self.next_stamp.get();
        let Some(next) = stamp.checked_add(1) else {
            panic!("identifier stamps exhausted while creating `{name}`");
        };
        self.next_stamp.set(next);
        Ident::new(name, stamp)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_idents_are_distinct_even_with_equal_names() {
        let ctx = Context::new();
        let a = ctx.fresh_ident("x");
        let b = ctx.fresh_ident("x");
        assert_ne!(a, b);
    }

    #[test]
    fn last_stamp_before_exhaustion_is_still_unique() {
        let ctx = Context {
            next_stamp: Cell::new(u32::MAX - 1),
        };
        assert_eq!(ctx.fresh_ident("x").stamp, u32::MAX - 1);
    }

    #[test]
    #[should_panic(expected = "identifier stamps exhausted")]
    fn exhausted_stamps_are_never_reused() {
        let ctx = Context {
            next_stamp: Cell::new(u32::MAX),
        };
        ctx.fresh_ident("x");
    }
}
