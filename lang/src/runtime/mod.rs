use crate::syntax::tree::{Expr, Ident, VarDecl};
use std::{fmt::Formatter, rc::Rc};

pub mod builtins;
pub mod eval;
pub mod subst;

#[derive(Debug, PartialEq)]
pub enum RuntimeError {
    UnboundVariable(Ident),
    BadProcedure(String),
    DictArity(usize),
    BadDictKey(String),
    KeyNotFound(String),
    LetUnsupported,
    EmptySequence,
    BadArity(Ident, usize),
    TypeMismatch(Ident, String),
    DivisionByZero,
    UnknownPrim(Ident),
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeError::UnboundVariable(v) => write!(f, "variable '{}' is not bound", v),
            RuntimeError::BadProcedure(what) => write!(f, "bad procedure: {}", what),
            RuntimeError::DictArity(n) => {
                write!(f, "dict lookup expects a single key, got {} arguments", n)
            }
            RuntimeError::BadDictKey(what) => {
                write!(f, "dict key must be a string or a symbol, got {}", what)
            }
            RuntimeError::KeyNotFound(key) => write!(f, "key not found: {}", key),
            RuntimeError::LetUnsupported => write!(f, "\"let\" not supported (yet)"),
            RuntimeError::EmptySequence => write!(f, "empty sequence"),
            RuntimeError::BadArity(op, n) => {
                write!(f, "wrong number of arguments to '{}': {}", op, n)
            }
            RuntimeError::TypeMismatch(op, what) => {
                write!(f, "'{}' does not apply to {}", op, what)
            }
            RuntimeError::DivisionByZero => write!(f, "division by zero"),
            RuntimeError::UnknownPrim(op) => write!(f, "unknown primitive: {}", op),
        }
    }
}

/// A procedure value. It remembers its parameter names and body verbatim
/// and nothing else: free variables are resolved by substitution at
/// application time, against whatever environment is ambient then.
#[derive(Debug, PartialEq, Clone)]
pub struct Closure {
    pub params: Vec<VarDecl>,
    pub body: Vec<Expr>,
}

/// An ordered, string-keyed association. Immutable once built; lookup is
/// a scan in insertion order, so the first entry wins on duplicate keys.
#[derive(Debug, PartialEq, Clone)]
pub struct DictValue {
    pub entries: Vec<(String, Value)>,
}

impl DictValue {
    pub fn lookup(&self, key: &str) -> Result<Value, RuntimeError> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| RuntimeError::KeyNotFound(key.to_owned()))
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Value {
    Num(f64),
    Bool(bool),
    Str(String),
    Sym(String),
    /// The empty list.
    Empty,
    /// A cons cell; chains of these carry both quoted list data and the
    /// results of the list primitives.
    Pair(Box<Value>, Box<Value>),
    Closure(Closure),
    Prim(Ident),
    Dict(DictValue),
}

pub fn fmt_number(n: f64) -> String {
    if n.is_finite() && n == n.trunc() {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Num(n) => write!(f, "{}", fmt_number(*n)),
            Value::Bool(b) => write!(f, "{}", if *b { "#t" } else { "#f" }),
            Value::Str(s) => write!(f, "\"{}\"", s),
            Value::Sym(s) => write!(f, "{}", s),
            Value::Empty => write!(f, "()"),
            Value::Pair(car, cdr) => {
                write!(f, "({}", car)?;
                let mut rest: &Value = cdr;
                loop {
                    match rest {
                        Value::Pair(a, d) => {
                            write!(f, " {}", a)?;
                            rest = d;
                        }
                        Value::Empty => break,
                        tail => {
                            write!(f, " . {}", tail)?;
                            break;
                        }
                    }
                }
                write!(f, ")")
            }
            Value::Closure(c) => {
                write!(f, "{}", Expr::Lambda(c.params.clone(), c.body.clone()))
            }
            Value::Prim(op) => write!(f, "{}", op),
            Value::Dict(d) => {
                write!(f, "(dict")?;
                for (k, v) in &d.entries {
                    write!(f, " ({} . {})", k, v)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A lexical environment: a chain of single-binding frames ending in the
/// empty sentinel. Extension allocates a fresh frame in front of the old
/// chain, so holders of the old chain never observe the new binding.
#[derive(Debug)]
pub enum Env {
    Empty,
    Frame {
        name: Ident,
        value: Value,
        parent: Rc<Env>,
    },
}

impl Env {
    pub fn empty() -> Rc<Env> {
        Rc::new(Env::Empty)
    }

    pub fn extend(parent: &Rc<Env>, name: Ident, value: Value) -> Rc<Env> {
        Rc::new(Env::Frame {
            name,
            value,
            parent: Rc::clone(parent),
        })
    }

    pub fn apply(&self, name: &str) -> Result<Value, RuntimeError> {
        let mut env = self;
        loop {
            match env {
                Env::Frame { name: n, value, .. } if n == name => return Ok(value.clone()),
                Env::Frame { parent, .. } => env = parent,
                Env::Empty => return Err(RuntimeError::UnboundVariable(name.to_owned())),
            }
        }
    }

    /// Names bound along the chain, innermost first. Shadowed names appear
    /// once per frame; the REPL completer does not care.
    pub fn names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        let mut env = self;
        while let Env::Frame { name, parent, .. } = env {
            out.push(name.as_str());
            env = parent;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extend_does_not_affect_prior_references() {
        let base = Env::empty();
        let one = Env::extend(&base, "x".to_owned(), Value::Num(1.0));
        let two = Env::extend(&one, "x".to_owned(), Value::Num(2.0));

        assert_eq!(one.apply("x"), Ok(Value::Num(1.0)));
        assert_eq!(two.apply("x"), Ok(Value::Num(2.0)));
        assert_eq!(
            base.apply("x"),
            Err(RuntimeError::UnboundVariable("x".to_owned()))
        );
    }

    #[test]
    fn dict_lookup_first_match_wins() {
        let dict = DictValue {
            entries: vec![
                ("a".to_owned(), Value::Num(1.0)),
                ("a".to_owned(), Value::Num(2.0)),
            ],
        };
        assert_eq!(dict.lookup("a"), Ok(Value::Num(1.0)));
        assert_eq!(
            dict.lookup("b"),
            Err(RuntimeError::KeyNotFound("b".to_owned()))
        );
    }

    #[test]
    fn value_display_is_scheme_flavored() {
        let list = Value::Pair(
            Box::new(Value::Num(1.0)),
            Box::new(Value::Pair(
                Box::new(Value::Sym("a".to_owned())),
                Box::new(Value::Empty),
            )),
        );
        assert_eq!(format!("{}", list), "(1 a)");

        let dotted = Value::Pair(Box::new(Value::Num(1.0)), Box::new(Value::Num(2.0)));
        assert_eq!(format!("{}", dotted), "(1 . 2)");

        assert_eq!(format!("{}", Value::Bool(false)), "#f");
        assert_eq!(format!("{}", Value::Num(2.5)), "2.5");
    }
}
