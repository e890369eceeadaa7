use serde::{Deserialize, Serialize};
use sourcemap::Span;

/// A binder of the program.
///
/// Two identifiers are the same iff their stamps are equal; the name is only used for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ident {
    pub name: String,
    pub stamp: u32,
}

impl Ident {
    pub fn new(name: impl Into<String>, stamp: u32) -> Self {
        Self {
            name: name.into(),
            stamp,
        }
    }
}

impl PartialEq for Ident {
    fn eq(&self, other: &Self) -> bool {
        self.stamp == other.stamp
    }
}

impl Eq for Ident {}

impl std::hash::Hash for Ident {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.stamp.hash(state);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Constant {
    Int(i32),
    Bool(bool),
    Unit,
}

/// A value available without further computation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Imm {
    Id(Ident),
    Const(Constant),
}

impl Imm {
    pub fn id(ident: &Ident) -> Self {
        Self::Id(ident.clone())
    }

    pub fn int(value: i32) -> Self {
        Self::Const(Constant::Int(value))
    }

    pub fn bool(value: bool) -> Self {
        Self::Const(Constant::Bool(value))
    }

    pub fn unit() -> Self {
        Self::Const(Constant::Unit)
    }

    pub fn as_id(&self) -> Option<&Ident> {
        if let Self::Id(v) = self {
            Some(v)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Prim1 {
    Not,
    Neg,
}

/// Binary primitives. Comparisons are only defined on ints and bools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Prim2 {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// A computation over immediates. Operands never nest other compound expressions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comp {
    Imm(Imm),
    Prim1(Prim1, Imm),
    Prim2(Prim2, Imm, Imm),
    /// Construction of an immutable variant value.
    Adt {
        type_tag: u32,
        variant: u32,
        args: Vec<Imm>,
    },
    Tuple(Vec<Imm>),
    TupleGet(u32, Imm),
    BoxNew(Imm),
    Unbox(Imm),
    BoxSet(Imm, Imm),
    /// Call of a function defined in the program.
    Call(Ident, Vec<Imm>),
    /// Call of an imported function.
    CallForeign(Ident, Vec<Imm>),
    If(Imm, Box<Expr>, Box<Expr>),
    Fail(u32),
}

impl Comp {
    pub fn adt(type_tag: u32, variant: u32, args: Vec<Imm>) -> Self {
        Self::Adt {
            type_tag,
            variant,
            args,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LetKind {
    /// Each binding sees the ones before it; the body sees all of them.
    #[default]
    Nonrec,
    /// The bindings also see each other.
    Rec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub id: Ident,
    pub comp: Comp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
}

impl Binding {
    pub fn new(id: Ident, comp: Comp) -> Self {
        Self {
            id,
            comp,
            span: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expr {
    Let {
        #[serde(default)]
        kind: LetKind,
        bindings: Vec<Binding>,
        body: Box<Expr>,
    },
    /// Evaluate `comp` for its effect, then continue.
    Seq(Comp, Box<Expr>),
    Comp(Comp),
}

impl Expr {
    pub fn let_(bindings: Vec<Binding>, body: Expr) -> Self {
        Self::Let {
            kind: LetKind::Nonrec,
            bindings,
            body: Box::new(body),
        }
    }

    pub fn let_rec(bindings: Vec<Binding>, body: Expr) -> Self {
        Self::Let {
            kind: LetKind::Rec,
            bindings,
            body: Box::new(body),
        }
    }

    /// A single non-recursive binding.
    pub fn let_one(id: Ident, comp: Comp, body: Expr) -> Self {
        Self::let_(vec![Binding::new(id, comp)], body)
    }

    pub fn seq(comp: Comp, rest: Expr) -> Self {
        Self::Seq(comp, Box::new(rest))
    }

    pub fn imm(imm: Imm) -> Self {
        Self::Comp(Comp::Imm(imm))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    pub id: Ident,
    pub module: String,
    pub name: String,
    pub arity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub id: Ident,
    pub params: Vec<Ident>,
    pub body: Expr,
    #[serde(default)]
    pub export: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    /// Name of the source file, used by source maps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub imports: Vec<Import>,
    #[serde(default)]
    pub functions: Vec<Function>,
    pub body: Expr,
}

impl Program {
    pub fn new(body: Expr) -> Self {
        Self {
            source: None,
            imports: Vec::new(),
            functions: Vec::new(),
            body,
        }
    }
}
