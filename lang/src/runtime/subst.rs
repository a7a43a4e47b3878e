use crate::syntax::tree::{Binding, DictEntry, Expr, Ident, VarDecl};
use lazy_static::lazy_static;
use spin::Mutex;

lazy_static! {
    static ref FRESH_COUNT: Mutex<usize> = Mutex::new(0);
}

fn fresh_name(base: &str) -> Ident {
    let mut count = FRESH_COUNT.lock();
    *count += 1;
    format!("{}__{}", base, *count)
}

/// Simultaneous substitution of `vars[i]` by `reps[i]` in free positions.
/// Callers are expected to have alpha-renamed binders first (`rename_exps`)
/// so that replacement expressions cannot be captured.
pub trait Subst {
    type Output;

    fn subst(self, vars: &[Ident], reps: &[Expr]) -> Self::Output;
}

impl<T: Subst<Output = T>> Subst for Box<T> {
    type Output = Box<T>;

    fn subst(self, vars: &[Ident], reps: &[Expr]) -> Self::Output {
        Box::new((*self).subst(vars, reps))
    }
}

impl<T: Subst<Output = T>> Subst for Vec<T> {
    type Output = Vec<T>;

    fn subst(self, vars: &[Ident], reps: &[Expr]) -> Self::Output {
        self.into_iter().map(|e| e.subst(vars, reps)).collect()
    }
}

impl Subst for DictEntry {
    type Output = DictEntry;

    fn subst(self, vars: &[Ident], reps: &[Expr]) -> Self::Output {
        DictEntry {
            key: self.key,
            val: self.val.subst(vars, reps),
        }
    }
}

impl Subst for Binding {
    type Output = Binding;

    fn subst(self, vars: &[Ident], reps: &[Expr]) -> Self::Output {
        Binding {
            var: self.var,
            val: self.val.subst(vars, reps),
        }
    }
}

// Drop the pairs whose variable is shadowed by the given binders.
fn free_of(
    params: &[VarDecl],
    vars: &[Ident],
    reps: &[Expr],
) -> (Vec<Ident>, Vec<Expr>) {
    vars.iter()
        .cloned()
        .zip(reps.iter().cloned())
        .filter(|(v, _)| params.iter().all(|p| p.name != *v))
        .unzip()
}

impl Subst for Expr {
    type Output = Expr;

    fn subst(self, vars: &[Ident], reps: &[Expr]) -> Self::Output {
        match self {
            Expr::Var(ref v) => match vars.iter().position(|name| name == v) {
                Some(pos) => reps[pos].clone(),
                None => self,
            },

            Expr::If(test, then, alt) => Expr::If(
                test.subst(vars, reps),
                then.subst(vars, reps),
                alt.subst(vars, reps),
            ),

            Expr::Lambda(params, body) => {
                let (fv, fr) = free_of(&params, vars, reps);
                Expr::Lambda(params, body.subst(&fv, &fr))
            }

            Expr::Let(bindings, body) => {
                let bound: Vec<VarDecl> = bindings.iter().map(|b| b.var.clone()).collect();
                let bindings = bindings.subst(vars, reps);
                let (fv, fr) = free_of(&bound, vars, reps);
                Expr::Let(bindings, body.subst(&fv, &fr))
            }

            Expr::Apply(rator, rands) => {
                Expr::Apply(rator.subst(vars, reps), rands.subst(vars, reps))
            }

            Expr::Dict(entries) => Expr::Dict(entries.subst(vars, reps)),

            atomic => atomic,
        }
    }
}

/// Alpha-rename every lambda's parameters (in every expression of `body`)
/// to globally fresh names, so a later substitution cannot capture free
/// variables of the replacement expressions.
pub fn rename_exps(body: Vec<Expr>) -> Vec<Expr> {
    body.into_iter().map(rename_expr).collect()
}

fn rename_expr(expr: Expr) -> Expr {
    match expr {
        Expr::If(test, then, alt) => Expr::If(
            Box::new(rename_expr(*test)),
            Box::new(rename_expr(*then)),
            Box::new(rename_expr(*alt)),
        ),

        Expr::Lambda(params, body) => {
            // Rename inner lambdas first; their params are then unique and
            // cannot shadow the substitution of this lambda's params.
            let body = rename_exps(body);
            let old: Vec<Ident> = params.iter().map(|p| p.name.clone()).collect();
            let fresh: Vec<Ident> = old.iter().map(|name| fresh_name(name)).collect();
            let refs: Vec<Expr> = fresh.iter().cloned().map(Expr::Var).collect();
            Expr::Lambda(
                fresh.into_iter().map(VarDecl::new).collect(),
                body.subst(&old, &refs),
            )
        }

        Expr::Let(bindings, body) => Expr::Let(
            bindings
                .into_iter()
                .map(|b| Binding {
                    var: b.var,
                    val: rename_expr(b.val),
                })
                .collect(),
            rename_exps(body),
        ),

        Expr::Apply(rator, rands) => {
            Expr::Apply(Box::new(rename_expr(*rator)), rename_exps(rands))
        }

        Expr::Dict(entries) => Expr::Dict(
            entries
                .into_iter()
                .map(|e| DictEntry {
                    key: e.key,
                    val: rename_expr(e.val),
                })
                .collect(),
        ),

        atomic => atomic,
    }
}
