//! Text rendering of ANF programs for diagnostics.
//!
//! ```text
//! fn (%x: f32[8,3]) {
//!   let %y = nn.relu(%x);
//!   (%y, %x)
//! }
//! ```

use std::fmt::{self, Display, Formatter};

use crate::expr::{Expr, ExprKind, Function, Type, Var};

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Type::Tensor { dims, dtype } => {
                write!(f, "{dtype}[")?;
                write_separated(f, dims.iter(), ",")?;
                write!(f, "]")
            }
            Type::Tuple(fields) => {
                write!(f, "(")?;
                write_separated(f, fields.iter(), ", ")?;
                if fields.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Type::Func { params, ret } => {
                write!(f, "fn (")?;
                write_separated(f, params.iter(), ", ")?;
                write!(f, ") -> {ret}")
            }
            Type::Unknown => write!(f, "?"),
        }
    }
}

impl Display for Var {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.name_hint().is_empty() { write!(f, "%{}", self.id()) } else { write!(f, "%{}", self.name_hint()) }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Printer { f, indent: 0 }.expr(self)
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Printer { f, indent: 0 }.function(self)
    }
}

fn write_separated<T: Display>(f: &mut Formatter<'_>, items: impl Iterator<Item = T>, sep: &str) -> fmt::Result {
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

struct Printer<'a, 'b> {
    f: &'a mut Formatter<'b>,
    indent: usize,
}

impl Printer<'_, '_> {
    fn newline(&mut self) -> fmt::Result {
        writeln!(self.f)?;
        write!(self.f, "{:width$}", "", width = self.indent * 2)
    }

    fn exprs(&mut self, exprs: &[Expr]) -> fmt::Result {
        for (i, expr) in exprs.iter().enumerate() {
            if i > 0 {
                self.f.write_str(", ")?;
            }
            self.expr(expr)?;
        }
        Ok(())
    }

    fn expr(&mut self, expr: &Expr) -> fmt::Result {
        match expr.kind() {
            ExprKind::Var(var) => write!(self.f, "{var}"),
            ExprKind::Constant(value) => write!(self.f, "{value}"),
            ExprKind::Op(name) => self.f.write_str(name),
            ExprKind::GlobalVar(name) => write!(self.f, "@{name}"),
            ExprKind::Call { callee, args } => {
                self.expr(callee)?;
                self.f.write_str("(")?;
                self.exprs(args)?;
                self.f.write_str(")")
            }
            ExprKind::Tuple(fields) => {
                self.f.write_str("(")?;
                self.exprs(fields)?;
                if fields.len() == 1 {
                    self.f.write_str(",")?;
                }
                self.f.write_str(")")
            }
            ExprKind::TupleGetItem { tuple, index } => {
                self.expr(tuple)?;
                write!(self.f, ".{index}")
            }
            ExprKind::Function(func) => self.function(func),
            ExprKind::Let { .. } => self.let_chain(expr),
            ExprKind::If { cond, then_branch, else_branch } => {
                self.f.write_str("if (")?;
                self.expr(cond)?;
                self.f.write_str(") ")?;
                self.block(then_branch)?;
                self.f.write_str(" else ")?;
                self.block(else_branch)
            }
        }
    }

    fn let_chain(&mut self, mut expr: &Expr) -> fmt::Result {
        while let ExprKind::Let { var, value, body } = expr.kind() {
            write!(self.f, "let {var} = ")?;
            self.expr(value)?;
            self.f.write_str(";")?;
            self.newline()?;
            expr = body;
        }
        self.expr(expr)
    }

    fn block(&mut self, body: &Expr) -> fmt::Result {
        self.f.write_str("{")?;
        self.indent += 1;
        self.newline()?;
        self.expr(body)?;
        self.indent -= 1;
        self.newline()?;
        self.f.write_str("}")
    }

    fn function(&mut self, func: &Function) -> fmt::Result {
        self.f.write_str("fn (")?;
        for (i, param) in func.params.iter().enumerate() {
            if i > 0 {
                self.f.write_str(", ")?;
            }
            write!(self.f, "{param}")?;
            if !param.ty().is_unknown() {
                write!(self.f, ": {}", param.ty())?;
            }
        }
        self.f.write_str(") ")?;
        if !func.ret_type.is_unknown() {
            write!(self.f, "-> {} ", func.ret_type)?;
        }
        self.block(&func.body)
    }
}
