use std::fmt::{self, Display, Formatter};

use crate::syntax::*;

impl Display for Ident {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.stamp)
    }
}

impl Display for Constant {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(i) => write!(f, "{i}"),
            Constant::Bool(b) => write!(f, "{b}"),
            Constant::Unit => write!(f, "()"),
        }
    }
}

impl Display for Imm {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Imm::Id(ident) => write!(f, "{ident}"),
            Imm::Const(constant) => write!(f, "{constant}"),
        }
    }
}

fn format_prim1(f: &mut Formatter<'_>, op: Prim1) -> fmt::Result {
    match op {
        Prim1::Not => write!(f, "!"),
        Prim1::Neg => write!(f, "-"),
    }
}

fn format_prim2(f: &mut Formatter<'_>, op: Prim2) -> fmt::Result {
    let s = match op {
        Prim2::Add => "+",
        Prim2::Sub => "-",
        Prim2::Mul => "*",
        Prim2::Div => "/",
        Prim2::Eq => "==",
        Prim2::Ne => "!=",
        Prim2::Lt => "<",
        Prim2::Le => "<=",
        Prim2::Gt => ">",
        Prim2::Ge => ">=",
        Prim2::And => "&&",
        Prim2::Or => "||",
    };
    write!(f, "{s}")
}

fn format_args(f: &mut Formatter<'_>, args: &[Imm]) -> fmt::Result {
    write!(f, "(")?;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{arg}")?;
    }
    write!(f, ")")
}

fn newline(f: &mut Formatter<'_>, indent: usize) -> fmt::Result {
    writeln!(f)?;
    write!(f, "{:width$}", "", width = indent * 2)
}

fn format_comp(f: &mut Formatter<'_>, comp: &Comp, indent: usize) -> fmt::Result {
    match comp {
        Comp::Imm(imm) => write!(f, "{imm}"),
        Comp::Prim1(op, imm) => {
            format_prim1(f, *op)?;
            write!(f, "{imm}")
        }
        Comp::Prim2(op, lhs, rhs) => {
            write!(f, "{lhs} ")?;
            format_prim2(f, *op)?;
            write!(f, " {rhs}")
        }
        Comp::Adt {
            type_tag,
            variant,
            args,
        } => {
            write!(f, "adt[{type_tag}.{variant}]")?;
            format_args(f, args)
        }
        Comp::Tuple(args) => {
            write!(f, "tuple")?;
            format_args(f, args)
        }
        Comp::TupleGet(index, tuple) => write!(f, "{tuple}.{index}"),
        Comp::BoxNew(imm) => write!(f, "box({imm})"),
        Comp::Unbox(imm) => write!(f, "unbox({imm})"),
        Comp::BoxSet(cell, value) => write!(f, "{cell} := {value}"),
        Comp::Call(callee, args) => {
            write!(f, "{callee}")?;
            format_args(f, args)
        }
        Comp::CallForeign(callee, args) => {
            write!(f, "foreign {callee}")?;
            format_args(f, args)
        }
        Comp::If(cond, then, els) => {
            write!(f, "if {cond} then")?;
            newline(f, indent + 1)?;
            format_expr(f, then, indent + 1)?;
            newline(f, indent)?;
            write!(f, "else")?;
            newline(f, indent + 1)?;
            format_expr(f, els, indent + 1)?;
            newline(f, indent)?;
            write!(f, "end")
        }
        Comp::Fail(code) => write!(f, "fail {code}"),
    }
}

fn format_expr(f: &mut Formatter<'_>, expr: &Expr, indent: usize) -> fmt::Result {
    match expr {
        Expr::Let {
            kind,
            bindings,
            body,
        } => {
            let keyword = match kind {
                LetKind::Nonrec => "let",
                LetKind::Rec => "let rec",
            };
            for (i, binding) in bindings.iter().enumerate() {
                if i == 0 {
                    write!(f, "{keyword} ")?;
                } else {
                    newline(f, indent)?;
                    write!(f, "and ")?;
                }
                write!(f, "{} = ", binding.id)?;
                format_comp(f, &binding.comp, indent + 1)?;
            }
            write!(f, " in")?;
            newline(f, indent)?;
            format_expr(f, body, indent)
        }
        Expr::Seq(comp, rest) => {
            format_comp(f, comp, indent)?;
            write!(f, ";")?;
            newline(f, indent)?;
            format_expr(f, rest, indent)
        }
        Expr::Comp(comp) => format_comp(f, comp, indent),
    }
}

impl Display for Comp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        format_comp(f, self, 0)
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        format_expr(f, self, 0)
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for import in &self.imports {
            writeln!(
                f,
                "import {} = \"{}\".\"{}\" / {}",
                import.id, import.module, import.name, import.arity
            )?;
        }
        for function in &self.functions {
            let export = if function.export { "export " } else { "" };
            write!(f, "{export}fn {}(", function.id)?;
            for (i, param) in function.params.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{param}")?;
            }
            write!(f, ") =")?;
            newline(f, 1)?;
            format_expr(f, &function.body, 1)?;
            writeln!(f)?;
        }
        format_expr(f, &self.body, 0)?;
        writeln!(f)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Comp, Context, Expr, Imm};

    #[test]
    fn let_chain_layout() {
        let ctx = Context::new();
        let a = ctx.fresh_ident("a");
        let expr = Expr::let_one(
            a.clone(),
            Comp::adt(3, 0, vec![]),
            Expr::Comp(Comp::Tuple(vec![Imm::id(&a), Imm::int(1)])),
        );
        assert_eq!(expr.to_string(), "let a/0 = adt[3.0]() in\ntuple(a/0, 1)");
    }
}
