use std::result::Result;

use pest::{error::Error, iterators::Pair, Parser};

use crate::{
    runtime::{builtins::is_prim_op, Value},
    syntax::{
        sexp::Sexp,
        tree::{Binding, DictEntry, Expr, Form, Program, VarDecl},
    },
};

#[derive(Parser)]
#[grammar = "syntax/grammar.pest"]
pub struct KrParser;

pub type ParseError = Error<Rule>;

#[derive(Debug)]
pub enum CompileError {
    /// The token tree could not be read at all.
    Syntax(Box<ParseError>),
    /// The token tree is well-formed but is not a valid program.
    Form(String),
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileError::Syntax(e) => write!(f, "{}", e),
            CompileError::Form(msg) => write!(f, "syntax error: {}", msg),
        }
    }
}

fn form_error<T>(msg: impl Into<String>) -> Result<T, CompileError> {
    Err(CompileError::Form(msg.into()))
}

impl KrParser {
    /// First reader stage: raw text to generic s-expressions.
    pub fn sexps(input: &str) -> Result<Vec<Sexp>, CompileError> {
        let pairs = KrParser::parse(Rule::unit, input)
            .map_err(|e| CompileError::Syntax(Box::new(e)))?;
        Ok(pairs
            .into_iter()
            .flat_map(|unit| unit.into_inner())
            .filter(|node| node.as_rule() != Rule::EOI)
            .map(read_sexp)
            .collect())
    }

    /// Both reader stages: raw text to a typed program.
    pub fn ast(input: &str) -> Result<Program, CompileError> {
        KrParser::sexps(input)?.iter().map(parse_form).collect()
    }
}

fn read_sexp(node: Pair<Rule>) -> Sexp {
    match node.as_rule() {
        Rule::sexp | Rule::atom => read_sexp(node.into_inner().next().unwrap()),

        // 'd is ordinary sugar for (quote d)
        Rule::quoted => Sexp::List(vec![
            Sexp::Sym("quote".to_owned()),
            read_sexp(node.into_inner().next().unwrap()),
        ]),

        Rule::list => {
            let mut items = Vec::new();
            let mut tail = None;
            for child in node.into_inner() {
                match child.as_rule() {
                    Rule::sexp => items.push(read_sexp(child)),
                    Rule::dot_tail => {
                        tail = Some(Box::new(read_sexp(child.into_inner().next().unwrap())))
                    }
                    _ => unreachable!("list members should be sexp or dot_tail"),
                }
            }
            match tail {
                Some(tail) => Sexp::Dotted(items, tail),
                None => Sexp::List(items),
            }
        }

        Rule::boolean => Sexp::Bool(node.as_str() == "#t"),
        Rule::number => Sexp::Num(node.as_str().parse::<f64>().unwrap()),
        Rule::string => {
            let s = node.as_str();
            Sexp::Str(unescaped(&s[1..s.len() - 1]))
        }
        Rule::symbol => Sexp::Sym(node.as_str().to_owned()),

        _ => unreachable!("unexpected rule: {:?}", node.as_rule()),
    }
}

fn unescaped(input: &str) -> String {
    let mut str = String::with_capacity(input.len());
    let mut escape = false;
    for ch in input.chars() {
        if escape {
            escape = false;
            str.push(unescaped_char(ch));
        } else {
            match ch {
                '\\' => escape = true,
                _ => str.push(ch),
            }
        }
    }
    str
}

fn unescaped_char(ch: char) -> char {
    match ch {
        't' => '\t',
        'n' => '\n',
        'r' => '\r',
        '0' => '\0',
        '\'' => '\'',
        '\"' => '\"',
        '\\' => '\\',
        _ => ch,
    }
}

pub fn parse_form(sexp: &Sexp) -> Result<Form, CompileError> {
    match sexp {
        Sexp::List(items) => match items.split_first() {
            Some((Sexp::Sym(head), rest)) if head == "define" => parse_define(rest),
            _ => Ok(Form::Expr(parse_expr(sexp)?)),
        },
        _ => Ok(Form::Expr(parse_expr(sexp)?)),
    }
}

fn parse_define(rest: &[Sexp]) -> Result<Form, CompileError> {
    match rest {
        [Sexp::Sym(name), val] => Ok(Form::Define(VarDecl::new(name.clone()), parse_expr(val)?)),
        _ => form_error("define expects a name and a single expression"),
    }
}

pub fn parse_expr(sexp: &Sexp) -> Result<Expr, CompileError> {
    match sexp {
        Sexp::Num(n) => Ok(Expr::Num(*n)),
        Sexp::Bool(b) => Ok(Expr::Bool(*b)),
        Sexp::Str(s) => Ok(Expr::Str(s.clone())),
        Sexp::Sym(s) => {
            if is_prim_op(s) {
                Ok(Expr::Prim(s.clone()))
            } else {
                Ok(Expr::Var(s.clone()))
            }
        }
        Sexp::Dotted(_, _) => form_error(format!("unexpected dotted list: {}", sexp)),
        Sexp::List(items) => match items.split_first() {
            None => form_error("empty application"),
            Some((Sexp::Sym(head), rest)) => match head.as_str() {
                "if" => parse_if(rest),
                "lambda" => parse_lambda(rest),
                "let" => parse_let(rest),
                "quote" => parse_quote(rest),
                "dict" => parse_dict(rest),
                "define" => form_error("define is only allowed at the top level"),
                _ => parse_apply(items),
            },
            Some(_) => parse_apply(items),
        },
    }
}

fn parse_if(rest: &[Sexp]) -> Result<Expr, CompileError> {
    match rest {
        [test, then, alt] => Ok(Expr::If(
            Box::new(parse_expr(test)?),
            Box::new(parse_expr(then)?),
            Box::new(parse_expr(alt)?),
        )),
        _ => form_error("\"if\" expects a test, a consequent and an alternative"),
    }
}

fn parse_lambda(rest: &[Sexp]) -> Result<Expr, CompileError> {
    match rest.split_first() {
        Some((Sexp::List(params), body)) if !body.is_empty() => Ok(Expr::Lambda(
            params.iter().map(parse_param).collect::<Result<_, _>>()?,
            parse_body(body)?,
        )),
        _ => form_error("\"lambda\" expects a parameter list and a non-empty body"),
    }
}

fn parse_body(body: &[Sexp]) -> Result<Vec<Expr>, CompileError> {
    body.iter().map(parse_expr).collect()
}

fn parse_param(sexp: &Sexp) -> Result<VarDecl, CompileError> {
    match sexp {
        Sexp::Sym(name) => Ok(VarDecl::new(name.clone())),
        other => form_error(format!("lambda parameters must be identifiers, got {}", other)),
    }
}

fn parse_let(rest: &[Sexp]) -> Result<Expr, CompileError> {
    match rest.split_first() {
        Some((Sexp::List(bindings), body)) if !body.is_empty() => Ok(Expr::Let(
            bindings
                .iter()
                .map(parse_binding)
                .collect::<Result<_, _>>()?,
            parse_body(body)?,
        )),
        _ => form_error("\"let\" expects a binding list and a non-empty body"),
    }
}

fn parse_binding(sexp: &Sexp) -> Result<Binding, CompileError> {
    match sexp {
        Sexp::List(pair) => match pair.as_slice() {
            [Sexp::Sym(name), val] => Ok(Binding {
                var: VarDecl::new(name.clone()),
                val: parse_expr(val)?,
            }),
            _ => form_error(format!("malformed let binding: {}", sexp)),
        },
        other => form_error(format!("malformed let binding: {}", other)),
    }
}

fn parse_quote(rest: &[Sexp]) -> Result<Expr, CompileError> {
    match rest {
        [datum] => Ok(Expr::Lit(parse_datum(datum))),
        _ => form_error("\"quote\" expects a single datum"),
    }
}

fn parse_dict(rest: &[Sexp]) -> Result<Expr, CompileError> {
    rest.iter()
        .map(parse_dict_entry)
        .collect::<Result<_, _>>()
        .map(Expr::Dict)
}

fn parse_dict_entry(sexp: &Sexp) -> Result<DictEntry, CompileError> {
    match sexp {
        Sexp::Dotted(key, val) => match key.as_slice() {
            // keys are opaque strings whether written as symbols or strings
            [Sexp::Sym(key)] | [Sexp::Str(key)] => Ok(DictEntry {
                key: key.clone(),
                val: parse_expr(val)?,
            }),
            _ => form_error(format!("dict key must be a symbol or a string: {}", sexp)),
        },
        other => form_error(format!("dict entry must be a (key . value) pair: {}", other)),
    }
}

fn parse_apply(items: &[Sexp]) -> Result<Expr, CompileError> {
    let rator = parse_expr(&items[0])?;
    let rands = items[1..]
        .iter()
        .map(parse_expr)
        .collect::<Result<_, _>>()?;
    Ok(Expr::Apply(Box::new(rator), rands))
}

/// Quoted data is total: every readable s-expression is a datum.
pub fn parse_datum(sexp: &Sexp) -> Value {
    match sexp {
        Sexp::Num(n) => Value::Num(*n),
        Sexp::Bool(b) => Value::Bool(*b),
        Sexp::Str(s) => Value::Str(s.clone()),
        Sexp::Sym(s) => Value::Sym(s.clone()),
        Sexp::List(items) => items.iter().rev().fold(Value::Empty, |tail, head| {
            Value::Pair(Box::new(parse_datum(head)), Box::new(tail))
        }),
        Sexp::Dotted(items, tail) => items
            .iter()
            .rev()
            .fold(parse_datum(tail), |tail, head| {
                Value::Pair(Box::new(parse_datum(head)), Box::new(tail))
            }),
    }
}
