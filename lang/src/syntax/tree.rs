use crate::runtime::Value;
use std::fmt::{Display, Formatter};

pub type Ident = String;

/// A bound-variable name, as it appears in parameter lists and defines.
#[derive(Debug, PartialEq, Clone)]
pub struct VarDecl {
    pub name: Ident,
}

impl VarDecl {
    pub fn new(name: impl Into<Ident>) -> VarDecl {
        VarDecl { name: name.into() }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Binding {
    pub var: VarDecl,
    pub val: Expr,
}

/// One `(key . value)` entry of a dict literal. Keys are opaque strings
/// no matter whether they were written as symbols or string literals.
#[derive(Debug, PartialEq, Clone)]
pub struct DictEntry {
    pub key: String,
    pub val: Expr,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expr {
    Num(f64),
    Bool(bool),
    Str(String),
    /// Reference to a primitive operation such as `+` or `car`.
    Prim(Ident),
    Var(Ident),
    /// Literal datum; evaluates to the carried value unchanged. Also used
    /// to re-inject computed values into expression position during
    /// substitution.
    Lit(Value),
    If(Box<Expr>, Box<Expr>, Box<Expr>),
    Lambda(Vec<VarDecl>, Vec<Expr>),
    Let(Vec<Binding>, Vec<Expr>),
    Apply(Box<Expr>, Vec<Expr>),
    Dict(Vec<DictEntry>),
}

#[derive(Debug, PartialEq, Clone)]
pub enum Form {
    Define(VarDecl, Expr),
    Expr(Expr),
}

pub type Program = Vec<Form>;

fn write_body(f: &mut Formatter<'_>, body: &[Expr]) -> std::fmt::Result {
    for expr in body {
        write!(f, " {}", expr)?;
    }
    Ok(())
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Num(n) => write!(f, "{}", crate::runtime::fmt_number(*n)),
            Expr::Bool(b) => write!(f, "{}", if *b { "#t" } else { "#f" }),
            Expr::Str(s) => write!(f, "\"{}\"", s),
            Expr::Prim(op) => write!(f, "{}", op),
            Expr::Var(v) => write!(f, "{}", v),
            Expr::Lit(v) => write!(f, "'{}", v),
            Expr::If(test, then, alt) => write!(f, "(if {} {} {})", test, then, alt),
            Expr::Lambda(params, body) => {
                write!(f, "(lambda (")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", p.name)?;
                }
                write!(f, ")")?;
                write_body(f, body)?;
                write!(f, ")")
            }
            Expr::Let(bindings, body) => {
                write!(f, "(let (")?;
                for (i, b) in bindings.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "({} {})", b.var.name, b.val)?;
                }
                write!(f, ")")?;
                write_body(f, body)?;
                write!(f, ")")
            }
            Expr::Apply(rator, rands) => {
                write!(f, "({}", rator)?;
                write_body(f, rands)?;
                write!(f, ")")
            }
            Expr::Dict(entries) => {
                write!(f, "(dict")?;
                for e in entries {
                    write!(f, " ({} . {})", e.key, e.val)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl Display for Form {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Form::Define(var, val) => write!(f, "(define {} {})", var.name, val),
            Form::Expr(expr) => write!(f, "{}", expr),
        }
    }
}
