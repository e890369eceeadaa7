/// An arena handing out references that live as long as the arena itself.
///
/// Values are never moved once allocated, so the references can be used as stable keys.
pub struct TypedArena<T> {
    container: typed_arena::Arena<T>,
}

impl<T> TypedArena<T> {
    pub fn new() -> Self {
        Self {
            container: typed_arena::Arena::new(),
        }
    }

    pub fn alloc(&self, value: T) -> &mut T {
        self.container.alloc(value)
    }

    pub fn len(&self) -> usize {
        self.container.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consumes the arena, returning the values in allocation order.
    pub fn into_vec(self) -> Vec<T> {
        self.container.into_vec()
    }
}

impl<T> Default for TypedArena<T> {
    fn default() -> Self {
        Self::new()
    }
}
