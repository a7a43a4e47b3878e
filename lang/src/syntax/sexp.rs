use std::fmt::{Display, Formatter};

/// Generic parenthesized token tree, the first stage of reading. The
/// second stage (`parse.rs`) turns this into the typed AST.
#[derive(Debug, PartialEq, Clone)]
pub enum Sexp {
    Num(f64),
    Bool(bool),
    Str(String),
    Sym(String),
    List(Vec<Sexp>),
    /// A list with a dotted tail, e.g. `(a . 1)` or `(a b . c)`.
    Dotted(Vec<Sexp>, Box<Sexp>),
}

impl Display for Sexp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Sexp::Num(n) => write!(f, "{}", crate::runtime::fmt_number(*n)),
            Sexp::Bool(b) => write!(f, "{}", if *b { "#t" } else { "#f" }),
            Sexp::Str(s) => write!(f, "\"{}\"", s),
            Sexp::Sym(s) => write!(f, "{}", s),
            Sexp::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            Sexp::Dotted(items, tail) => {
                write!(f, "(")?;
                for item in items {
                    write!(f, "{} ", item)?;
                }
                write!(f, ". {})", tail)
            }
        }
    }
}
