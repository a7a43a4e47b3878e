use crate::syntax::tree::{Binding, Expr, Form, Program};

pub mod dict;

pub use dict::dict_to_lit;

pub struct Lower;

impl Lower {
    /// The whole compilation pipeline: eliminate dict literals, then
    /// rewrite `get` calls into direct applications. The result uses
    /// nothing beyond literals, lambdas, conditionals and applications.
    pub fn run(input: Program) -> Program {
        get_to_apply(dict::dict_to_lit(input))
    }
}

/// Rewrite every two-operand application of the variable `get` into a
/// direct one-argument application: `(get d k)` becomes `(d k)`. A
/// dictionary value acts as its own lookup procedure, so once dict
/// literals are gone this is all that is left of `get`.
pub fn get_to_apply(input: Program) -> Program {
    input
        .into_iter()
        .map(|form| match form {
            Form::Define(var, val) => Form::Define(var, rewrite(val)),
            Form::Expr(expr) => Form::Expr(rewrite(expr)),
        })
        .collect()
}

fn rewrite(expr: Expr) -> Expr {
    match expr {
        Expr::If(test, then, alt) => Expr::If(
            Box::new(rewrite(*test)),
            Box::new(rewrite(*then)),
            Box::new(rewrite(*alt)),
        ),

        Expr::Lambda(params, body) => {
            Expr::Lambda(params, body.into_iter().map(rewrite).collect())
        }

        Expr::Let(bindings, body) => Expr::Let(
            bindings
                .into_iter()
                .map(|b| Binding {
                    var: b.var,
                    val: rewrite(b.val),
                })
                .collect(),
            body.into_iter().map(rewrite).collect(),
        ),

        Expr::Apply(rator, rands) => {
            if matches!(rator.as_ref(), Expr::Var(name) if name == "get") && rands.len() == 2 {
                let mut rands = rands.into_iter();
                let dict = rewrite(rands.next().unwrap());
                let key = rewrite(rands.next().unwrap());
                Expr::Apply(Box::new(dict), vec![key])
            } else {
                Expr::Apply(
                    Box::new(rewrite(*rator)),
                    rands.into_iter().map(rewrite).collect(),
                )
            }
        }

        // atoms and literal data pass through; dict literals are already
        // gone when this pass runs
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        runtime::{eval::eval_program, Value},
        syntax::parse::KrParser,
    };

    fn contains_dict(expr: &Expr) -> bool {
        match expr {
            Expr::Dict(_) => true,
            Expr::If(t, c, a) => contains_dict(t) || contains_dict(c) || contains_dict(a),
            Expr::Lambda(_, body) => body.iter().any(contains_dict),
            Expr::Let(bindings, body) => {
                bindings.iter().any(|b| contains_dict(&b.val)) || body.iter().any(contains_dict)
            }
            Expr::Apply(rator, rands) => {
                contains_dict(rator) || rands.iter().any(contains_dict)
            }
            _ => false,
        }
    }

    #[test]
    fn get_calls_become_applications() {
        let prog = KrParser::ast("(get d \"a\")").unwrap();
        let lowered = get_to_apply(prog);
        assert_eq!(lowered, KrParser::ast("(d \"a\")").unwrap());
    }

    #[test]
    fn get_rewrites_inside_compound_forms() {
        let prog = KrParser::ast("(lambda (d) (if #t (get d 'a) 0))").unwrap();
        let lowered = get_to_apply(prog);
        assert_eq!(
            lowered,
            KrParser::ast("(lambda (d) (if #t (d 'a) 0))").unwrap()
        );
    }

    #[test]
    fn only_two_operand_get_is_rewritten() {
        let one = KrParser::ast("(get d)").unwrap();
        assert_eq!(get_to_apply(one.clone()), one);
        let three = KrParser::ast("(get d \"a\" \"b\")").unwrap();
        assert_eq!(get_to_apply(three.clone()), three);
        let other = KrParser::ast("(f x y)").unwrap();
        assert_eq!(get_to_apply(other.clone()), other);
    }

    #[test]
    fn pipeline_leaves_no_dict_literals() {
        let prog =
            KrParser::ast("(define d (dict (a . 1) (b . (dict (c . 2))))) (get d 'a)").unwrap();
        let lowered = Lower::run(prog);
        for form in &lowered {
            let expr = match form {
                Form::Define(_, e) => e,
                Form::Expr(e) => e,
            };
            assert!(!contains_dict(expr));
        }
    }

    #[test]
    fn pipeline_preserves_meaning() {
        // With get defined as a procedure, the original program runs in
        // the full language; the lowered one uses direct application.
        let src = "(define get (lambda (d k) (d k)))\n\
                   (define d (dict (a . 1) (b . 2)))\n\
                   (get d 'b)";
        let prog = KrParser::ast(src).unwrap();
        let original = eval_program(&prog).unwrap();
        let lowered = eval_program(&Lower::run(prog)).unwrap();
        assert_eq!(original, Value::Num(2.0));
        assert_eq!(original, lowered);
    }
}
