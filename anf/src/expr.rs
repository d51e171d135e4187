//! Expression tree of A-normal-form programs.
//!
//! Expressions are immutable and shared through [`Arc`]; rewriting an
//! expression builds new nodes only along the changed path and reuses every
//! untouched subtree.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;
use strata_dtype::ElementType;

/// Static type annotation of a variable or function.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Tensor { dims: SmallVec<[i64; 4]>, dtype: ElementType },
    Tuple(Vec<Type>),
    Func { params: Vec<Type>, ret: Box<Type> },
    /// Not annotated.
    Unknown,
}

impl Type {
    pub fn tensor<I: IntoIterator<Item = i64>>(dtype: ElementType, dims: I) -> Self {
        Self::Tensor { dims: dims.into_iter().collect(), dtype }
    }

    pub fn tuple<I: IntoIterator<Item = Type>>(fields: I) -> Self {
        Self::Tuple(fields.into_iter().collect())
    }

    pub fn func<I: IntoIterator<Item = Type>>(params: I, ret: Type) -> Self {
        Self::Func { params: params.into_iter().collect(), ret: Box::new(ret) }
    }

    pub fn is_tensor(&self) -> bool {
        matches!(self, Self::Tensor { .. })
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    pub fn tuple_fields(&self) -> Option<&[Type]> {
        match self {
            Self::Tuple(fields) => Some(fields),
            _ => None,
        }
    }
}

static NEXT_VAR_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Debug)]
struct VarData {
    id: u64,
    name_hint: String,
    ty: Type,
}

/// A local variable.
///
/// Every call to [`Var::new`] yields a distinct variable; the name hint is only
/// used for printing. Equality and hashing go by identity.
#[derive(Debug, Clone)]
pub struct Var(Arc<VarData>);

impl Var {
    pub fn new(name_hint: impl Into<String>, ty: Type) -> Self {
        let id = NEXT_VAR_ID.fetch_add(1, Ordering::Relaxed);
        Self(Arc::new(VarData { id, name_hint: name_hint.into(), ty }))
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn name_hint(&self) -> &str {
        &self.0.name_hint
    }

    pub fn ty(&self) -> &Type {
        &self.0.ty
    }
}

impl PartialEq for Var {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Var {}

impl std::hash::Hash for Var {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

/// Scalar literal.
#[derive(Debug, Clone, Copy, PartialEq, derive_more::Display)]
pub enum Literal {
    #[display("{_0}")]
    Bool(bool),
    #[display("{_0}")]
    Int(i64),
    #[display("{_0:?}f")]
    Float(f64),
}

/// A function value: parameters bound over a body.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub params: Vec<Var>,
    pub body: Expr,
    pub ret_type: Type,
    pub type_params: Vec<String>,
}

impl Function {
    pub fn new<I: IntoIterator<Item = Var>>(params: I, body: Expr) -> Self {
        Self { params: params.into_iter().collect(), body, ret_type: Type::Unknown, type_params: Vec::new() }
    }

    pub fn with_ret_type(mut self, ret_type: Type) -> Self {
        self.ret_type = ret_type;
        self
    }

    /// `fn(params) -> ret` built from the annotations.
    pub fn func_type(&self) -> Type {
        Type::func(self.params.iter().map(|p| p.ty().clone()), self.ret_type.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Var(Var),
    Constant(Literal),
    /// Primitive operator referenced by name, e.g. `nn.batch_norm`.
    Op(String),
    /// Module-level function referenced by name.
    GlobalVar(String),
    Call { callee: Expr, args: Vec<Expr> },
    Tuple(Vec<Expr>),
    TupleGetItem { tuple: Expr, index: usize },
    Function(Function),
    Let { var: Var, value: Expr, body: Expr },
    If { cond: Expr, then_branch: Expr, else_branch: Expr },
}

/// Shared immutable expression node.
#[derive(Debug, Clone)]
pub struct Expr(Arc<ExprKind>);

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Self(Arc::new(kind))
    }

    pub fn kind(&self) -> &ExprKind {
        &self.0
    }

    /// Reference identity, as opposed to structural `==`.
    pub fn ptr_eq(&self, other: &Expr) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn var(var: &Var) -> Self {
        Self::new(ExprKind::Var(var.clone()))
    }

    pub fn constant(value: Literal) -> Self {
        Self::new(ExprKind::Constant(value))
    }

    pub fn op(name: impl Into<String>) -> Self {
        Self::new(ExprKind::Op(name.into()))
    }

    pub fn global(name: impl Into<String>) -> Self {
        Self::new(ExprKind::GlobalVar(name.into()))
    }

    pub fn call<I: IntoIterator<Item = Expr>>(callee: Expr, args: I) -> Self {
        Self::new(ExprKind::Call { callee, args: args.into_iter().collect() })
    }

    /// Call of the primitive operator `name`.
    pub fn call_op<I: IntoIterator<Item = Expr>>(name: impl Into<String>, args: I) -> Self {
        Self::call(Self::op(name), args)
    }

    pub fn tuple<I: IntoIterator<Item = Expr>>(fields: I) -> Self {
        Self::new(ExprKind::Tuple(fields.into_iter().collect()))
    }

    pub fn tuple_get_item(tuple: Expr, index: usize) -> Self {
        Self::new(ExprKind::TupleGetItem { tuple, index })
    }

    pub fn function(func: Function) -> Self {
        Self::new(ExprKind::Function(func))
    }

    pub fn let_in(var: Var, value: Expr, body: Expr) -> Self {
        Self::new(ExprKind::Let { var, value, body })
    }

    pub fn if_then_else(cond: Expr, then_branch: Expr, else_branch: Expr) -> Self {
        Self::new(ExprKind::If { cond, then_branch, else_branch })
    }

    pub fn as_var(&self) -> Option<&Var> {
        match self.kind() {
            ExprKind::Var(var) => Some(var),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[Expr]> {
        match self.kind() {
            ExprKind::Tuple(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self.kind() {
            ExprKind::Function(func) => Some(func),
            _ => None,
        }
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.kind() == other.kind()
    }
}

impl From<Var> for Expr {
    fn from(var: Var) -> Self {
        Self::new(ExprKind::Var(var))
    }
}

impl From<&Var> for Expr {
    fn from(var: &Var) -> Self {
        Self::var(var)
    }
}

impl From<Function> for Expr {
    fn from(func: Function) -> Self {
        Self::function(func)
    }
}
