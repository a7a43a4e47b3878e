use crate::{
    runtime::{DictValue, Value},
    syntax::tree::{Binding, Expr, Form, Program},
};

/// Replace every dict literal by a literal dictionary value whose entry
/// values were converted to data. The resulting program constructs the
/// same dictionaries without a dict node in the tree. Total: programs
/// this pass cannot handle indicate a defect, not a user error.
pub fn dict_to_lit(input: Program) -> Program {
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

        Expr::Apply(rator, rands) => Expr::Apply(
            Box::new(rewrite(*rator)),
            rands.into_iter().map(rewrite).collect(),
        ),

        Expr::Dict(entries) => Expr::Lit(Value::Dict(DictValue {
            entries: entries
                .into_iter()
                .map(|e| (e.key, to_datum(e.val)))
                .collect(),
        })),

        other => other,
    }
}

/// Convert an entry value expression to the datum it denotes: references
/// become symbols, applications and lambdas become the lists that spell
/// them, nested dicts become `(dict (k . v) ...)` lists.
fn to_datum(expr: Expr) -> Value {
    match expr {
        Expr::Lit(v) => v,
        Expr::Num(n) => Value::Num(n),
        Expr::Bool(b) => Value::Bool(b),
        Expr::Str(s) => Value::Str(s),
        Expr::Prim(op) => Value::Sym(op),
        Expr::Var(v) => Value::Sym(v),

        Expr::Apply(rator, rands) => {
            let mut items = Vec::with_capacity(rands.len() + 1);
            items.push(to_datum(*rator));
            items.extend(rands.into_iter().map(to_datum));
            proper_list(items)
        }

        Expr::Lambda(params, body) => {
            let mut items = vec![
                Value::Sym("lambda".to_owned()),
                proper_list(params.into_iter().map(|p| Value::Sym(p.name)).collect()),
            ];
            items.extend(body.into_iter().map(to_datum));
            proper_list(items)
        }

        Expr::Dict(entries) => {
            let mut items = vec![Value::Sym("dict".to_owned())];
            items.extend(entries.into_iter().map(|e| {
                Value::Pair(Box::new(Value::Sym(e.key)), Box::new(to_datum(e.val)))
            }));
            proper_list(items)
        }

        // conditionals and lets have no literal spelling; reaching one
        // here means the pass was fed a grammar it was never meant to see
        other => panic!("no literal form for: {}", other),
    }
}

fn proper_list(items: Vec<Value>) -> Value {
    items.into_iter().rev().fold(Value::Empty, |tail, head| {
        Value::Pair(Box::new(head), Box::new(tail))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        runtime::eval::eval_program,
        syntax::parse::KrParser,
    };

    fn sym(s: &str) -> Value {
        Value::Sym(s.to_owned())
    }

    fn list(items: Vec<Value>) -> Value {
        proper_list(items)
    }

    #[test]
    fn entries_become_data() {
        let prog = KrParser::ast("(dict (a . 1) (b . x) (c . +) (d . (f 2)))").unwrap();
        let lowered = dict_to_lit(prog);
        assert_eq!(
            lowered,
            vec![Form::Expr(Expr::Lit(Value::Dict(DictValue {
                entries: vec![
                    ("a".to_owned(), Value::Num(1.0)),
                    ("b".to_owned(), sym("x")),
                    ("c".to_owned(), sym("+")),
                    ("d".to_owned(), list(vec![sym("f"), Value::Num(2.0)])),
                ],
            })))]
        );
    }

    #[test]
    fn lambda_entries_spell_themselves() {
        let prog = KrParser::ast("(dict (f . (lambda (x) (+ x 1))))").unwrap();
        let lowered = dict_to_lit(prog);
        let expected = list(vec![
            sym("lambda"),
            list(vec![sym("x")]),
            list(vec![sym("+"), sym("x"), Value::Num(1.0)]),
        ]);
        assert_eq!(
            lowered,
            vec![Form::Expr(Expr::Lit(Value::Dict(DictValue {
                entries: vec![("f".to_owned(), expected)],
            })))]
        );
    }

    #[test]
    fn nested_dicts_nest_as_lists() {
        let prog = KrParser::ast("(dict (inner . (dict (a . 1))))").unwrap();
        let lowered = dict_to_lit(prog);
        let expected = list(vec![
            sym("dict"),
            Value::Pair(Box::new(sym("a")), Box::new(Value::Num(1.0))),
        ]);
        assert_eq!(
            lowered,
            vec![Form::Expr(Expr::Lit(Value::Dict(DictValue {
                entries: vec![("inner".to_owned(), expected)],
            })))]
        );
    }

    #[test]
    fn rewrites_below_binders_and_applications() {
        let prog = KrParser::ast("(define f (lambda (x) ((dict (a . 1)) x))) (f 'a)").unwrap();
        let lowered = dict_to_lit(prog.clone());
        assert_ne!(lowered, prog);
        assert_eq!(eval_program(&lowered), eval_program(&prog));
    }

    #[test]
    fn dict_free_programs_come_back_unchanged() {
        let prog =
            KrParser::ast("(define f (lambda (x) (if (> x 0) x (- 0 x)))) (f -3) '(1 2)").unwrap();
        assert_eq!(dict_to_lit(prog.clone()), prog);
    }

    #[test]
    fn lowering_preserves_lookup_results() {
        let src = "(define d (dict (a . 1) (b . 2))) (d 'b)";
        let prog = KrParser::ast(src).unwrap();
        let lowered = dict_to_lit(prog.clone());
        assert_eq!(eval_program(&prog), eval_program(&lowered));
    }
}
