use crate::{
    runtime::{
        builtins,
        subst::{rename_exps, Subst},
        Closure, DictValue, Env, RuntimeError, Value,
    },
    syntax::tree::{DictEntry, Expr, Form, Ident, Program},
};
use std::rc::Rc;

/// Run a whole program from an empty top-level environment.
pub fn eval_program(program: &Program) -> Result<Value, RuntimeError> {
    eval_sequence(program, &Env::empty())
}

/// Evaluate a non-empty sequence of top-level forms. A define evaluates
/// its right-hand side and threads the extended environment through the
/// remaining forms; plain expressions are evaluated for their value,
/// which is discarded unless the expression is last.
pub fn eval_sequence(forms: &[Form], env: &Rc<Env>) -> Result<Value, RuntimeError> {
    match forms.split_first() {
        None => Err(RuntimeError::EmptySequence),
        Some((Form::Define(var, val), rest)) => {
            let rhs = eval_expr(val, env)?;
            eval_sequence(rest, &Env::extend(env, var.name.clone(), rhs))
        }
        Some((Form::Expr(expr), rest)) => {
            if rest.is_empty() {
                eval_expr(expr, env)
            } else {
                eval_expr(expr, env)?;
                eval_sequence(rest, env)
            }
        }
    }
}

/// Evaluate a single form, returning its value together with the
/// environment subsequent forms should see. This is the stepping
/// interface the REPL threads its state through.
pub fn eval_form(form: &Form, env: &Rc<Env>) -> Result<(Value, Rc<Env>), RuntimeError> {
    match form {
        Form::Define(var, val) => {
            let rhs = eval_expr(val, env)?;
            let extended = Env::extend(env, var.name.clone(), rhs.clone());
            Ok((rhs, extended))
        }
        Form::Expr(expr) => Ok((eval_expr(expr, env)?, Rc::clone(env))),
    }
}

/// Only the boolean `#f` is false; every other value selects the
/// then-branch of a conditional.
pub fn is_true(value: &Value) -> bool {
    !matches!(value, Value::Bool(false))
}

pub fn eval_expr(expr: &Expr, env: &Rc<Env>) -> Result<Value, RuntimeError> {
    match expr {
        Expr::Num(n) => Ok(Value::Num(*n)),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::Prim(op) => Ok(Value::Prim(op.clone())),
        Expr::Var(v) => env.apply(v),
        Expr::Lit(v) => Ok(v.clone()),
        Expr::If(test, then, alt) => {
            if is_true(&eval_expr(test, env)?) {
                eval_expr(then, env)
            } else {
                eval_expr(alt, env)
            }
        }
        Expr::Lambda(params, body) => Ok(Value::Closure(Closure {
            params: params.clone(),
            body: body.clone(),
        })),
        Expr::Apply(rator, rands) => {
            let proc = eval_expr(rator, env)?;
            let mut args = Vec::with_capacity(rands.len());
            for rand in rands {
                args.push(eval_expr(rand, env)?);
            }
            apply_procedure(proc, args, env)
        }
        Expr::Let(_, _) => Err(RuntimeError::LetUnsupported),
        Expr::Dict(entries) => eval_dict(entries, env),
    }
}

fn apply_procedure(proc: Value, args: Vec<Value>, env: &Rc<Env>) -> Result<Value, RuntimeError> {
    match proc {
        Value::Prim(op) => builtins::apply_prim(&op, &args),
        Value::Closure(closure) => apply_closure(closure, args, env),
        Value::Dict(dict) => apply_dict(&dict, &args),
        other => Err(RuntimeError::BadProcedure(format!("{}", other))),
    }
}

/// Turn a computed value back into an expression that evaluates to it,
/// so it can be substituted into a closure body.
pub fn value_to_expr(value: Value) -> Expr {
    match value {
        Value::Num(n) => Expr::Num(n),
        Value::Bool(b) => Expr::Bool(b),
        Value::Str(s) => Expr::Str(s),
        Value::Prim(op) => Expr::Prim(op),
        Value::Closure(c) => Expr::Lambda(c.params, c.body),
        datum => Expr::Lit(datum),
    }
}

// Application substitutes the computed arguments into the closure body.
// The body's own binders are renamed first so argument expressions that
// happen to mention the same surface names are not captured; the
// substituted body then runs in the ambient environment, which is how
// remaining free variables get resolved.
fn apply_closure(closure: Closure, args: Vec<Value>, env: &Rc<Env>) -> Result<Value, RuntimeError> {
    let vars: Vec<Ident> = closure.params.iter().map(|p| p.name.clone()).collect();
    let body = rename_exps(closure.body);
    let reps: Vec<Expr> = args.into_iter().map(value_to_expr).collect();
    let forms: Vec<Form> = body
        .subst(&vars, &reps)
        .into_iter()
        .map(Form::Expr)
        .collect();
    eval_sequence(&forms, env)
}

fn apply_dict(dict: &DictValue, args: &[Value]) -> Result<Value, RuntimeError> {
    match args {
        [key] => match key {
            Value::Str(s) => dict.lookup(s),
            Value::Sym(s) => dict.lookup(s),
            other => Err(RuntimeError::BadDictKey(format!("{}", other))),
        },
        _ => Err(RuntimeError::DictArity(args.len())),
    }
}

fn eval_dict(entries: &[DictEntry], env: &Rc<Env>) -> Result<Value, RuntimeError> {
    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        out.push((entry.key.clone(), eval_expr(&entry.val, env)?));
    }
    Ok(Value::Dict(DictValue { entries: out }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::tree::VarDecl;

    fn app(rator: Expr, rands: Vec<Expr>) -> Expr {
        Expr::Apply(Box::new(rator), rands)
    }

    fn prim(op: &str) -> Expr {
        Expr::Prim(op.to_owned())
    }

    fn var(name: &str) -> Expr {
        Expr::Var(name.to_owned())
    }

    fn lambda(params: &[&str], body: Vec<Expr>) -> Expr {
        Expr::Lambda(params.iter().map(|p| VarDecl::new(*p)).collect(), body)
    }

    fn eval1(expr: Expr) -> Result<Value, RuntimeError> {
        eval_expr(&expr, &Env::empty())
    }

    #[test]
    fn literals_self_evaluate() {
        assert_eq!(eval1(Expr::Num(3.0)), Ok(Value::Num(3.0)));
        assert_eq!(eval1(Expr::Bool(true)), Ok(Value::Bool(true)));
        assert_eq!(
            eval1(Expr::Str("hi".to_owned())),
            Ok(Value::Str("hi".to_owned()))
        );
        assert_eq!(
            eval1(Expr::Lit(Value::Sym("a".to_owned()))),
            Ok(Value::Sym("a".to_owned()))
        );
    }

    #[test]
    fn only_false_is_false() {
        let pick = |test| Expr::If(Box::new(test), Box::new(Expr::Num(1.0)), Box::new(Expr::Num(2.0)));
        assert_eq!(eval1(pick(Expr::Bool(true))), Ok(Value::Num(1.0)));
        assert_eq!(eval1(pick(Expr::Bool(false))), Ok(Value::Num(2.0)));
        // 0 and "" are both true.
        assert_eq!(eval1(pick(Expr::Num(0.0))), Ok(Value::Num(1.0)));
        assert_eq!(eval1(pick(Expr::Str(String::new()))), Ok(Value::Num(1.0)));
    }

    #[test]
    fn closure_application_substitutes() {
        // ((lambda (x) (+ x 1)) 5) => 6
        let expr = app(
            lambda(&["x"], vec![app(prim("+"), vec![var("x"), Expr::Num(1.0)])]),
            vec![Expr::Num(5.0)],
        );
        assert_eq!(eval1(expr), Ok(Value::Num(6.0)));
    }

    #[test]
    fn free_variables_resolve_in_ambient_env() {
        // (define y 99)
        // (define g ((lambda (x) (lambda (y) (x 0))) (lambda (z) y)))
        // (g 5) => 99: the y freed into g's body is NOT captured by g's
        // own parameter, and resolves through the top-level environment.
        let program: Program = vec![
            Form::Define(VarDecl::new("y"), Expr::Num(99.0)),
            Form::Define(
                VarDecl::new("g"),
                app(
                    lambda(
                        &["x"],
                        vec![lambda(&["y"], vec![app(var("x"), vec![Expr::Num(0.0)])])],
                    ),
                    vec![lambda(&["z"], vec![var("y")])],
                ),
            ),
            Form::Expr(app(var("g"), vec![Expr::Num(5.0)])),
        ];
        assert_eq!(eval_program(&program), Ok(Value::Num(99.0)));
    }

    #[test]
    fn defines_accumulate() {
        let program: Program = vec![
            Form::Define(VarDecl::new("x"), Expr::Num(1.0)),
            Form::Define(
                VarDecl::new("y"),
                app(prim("+"), vec![var("x"), Expr::Num(1.0)]),
            ),
            Form::Expr(app(prim("+"), vec![var("x"), var("y")])),
        ];
        assert_eq!(eval_program(&program), Ok(Value::Num(3.0)));
    }

    #[test]
    fn recursion_through_ambient_define() {
        // (define fact (lambda (n) (if (= n 0) 1 (* n (fact (- n 1))))))
        let fact = lambda(
            &["n"],
            vec![Expr::If(
                Box::new(app(prim("="), vec![var("n"), Expr::Num(0.0)])),
                Box::new(Expr::Num(1.0)),
                Box::new(app(
                    prim("*"),
                    vec![
                        var("n"),
                        app(
                            var("fact"),
                            vec![app(prim("-"), vec![var("n"), Expr::Num(1.0)])],
                        ),
                    ],
                )),
            )],
        );
        let program: Program = vec![
            Form::Define(VarDecl::new("fact"), fact),
            Form::Expr(app(var("fact"), vec![Expr::Num(5.0)])),
        ];
        assert_eq!(eval_program(&program), Ok(Value::Num(120.0)));
    }

    #[test]
    fn dict_literal_round_trip() {
        let dict = Expr::Dict(vec![
            DictEntry {
                key: "a".to_owned(),
                val: Expr::Num(1.0),
            },
            DictEntry {
                key: "b".to_owned(),
                val: app(prim("+"), vec![Expr::Num(1.0), Expr::Num(1.0)]),
            },
        ]);

        let lookup = |key: Expr| eval1(app(dict.clone(), vec![key]));
        assert_eq!(lookup(Expr::Str("a".to_owned())), Ok(Value::Num(1.0)));
        // Entry values were evaluated when the dict was built.
        assert_eq!(
            lookup(Expr::Lit(Value::Sym("b".to_owned()))),
            Ok(Value::Num(2.0))
        );
        assert_eq!(
            lookup(Expr::Str("c".to_owned())),
            Err(RuntimeError::KeyNotFound("c".to_owned()))
        );
        assert_eq!(
            lookup(Expr::Num(1.0)),
            Err(RuntimeError::BadDictKey("1".to_owned()))
        );
        assert_eq!(
            eval1(app(dict, vec![Expr::Num(1.0), Expr::Num(2.0)])),
            Err(RuntimeError::DictArity(2))
        );
    }

    #[test]
    fn dict_entry_failure_short_circuits() {
        let dict = Expr::Dict(vec![
            DictEntry {
                key: "a".to_owned(),
                val: var("missing"),
            },
            DictEntry {
                key: "b".to_owned(),
                val: Expr::Num(2.0),
            },
        ]);
        assert_eq!(
            eval1(dict),
            Err(RuntimeError::UnboundVariable("missing".to_owned()))
        );
    }

    #[test]
    fn let_is_rejected() {
        let expr = Expr::Let(
            vec![crate::syntax::tree::Binding {
                var: VarDecl::new("x"),
                val: Expr::Num(1.0),
            }],
            vec![var("x")],
        );
        let err = eval1(expr).unwrap_err();
        assert_eq!(err, RuntimeError::LetUnsupported);
        assert_eq!(format!("{}", err), "\"let\" not supported (yet)");
    }

    #[test]
    fn application_of_non_procedure_fails() {
        assert_eq!(
            eval1(app(Expr::Num(5.0), vec![Expr::Num(1.0)])),
            Err(RuntimeError::BadProcedure("5".to_owned()))
        );
    }

    #[test]
    fn empty_sequence_fails() {
        assert_eq!(eval_program(&vec![]), Err(RuntimeError::EmptySequence));
    }

    #[test]
    fn unbound_variable_fails() {
        assert_eq!(
            eval1(var("nope")),
            Err(RuntimeError::UnboundVariable("nope".to_owned()))
        );
    }
}
