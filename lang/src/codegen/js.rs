use crate::{
    codegen::{CodeGenerator, CodegenError, PartialCodeGenerator},
    runtime::fmt_number,
    syntax::tree::{Expr, Form, Program, VarDecl},
};

/// Translates the minimal subset of the language (no dict literals, no
/// quoted data, no let) directly into JavaScript expression text. This
/// pass is independent of the lowering pipeline.
pub struct JsCodeGenerator;

impl JsCodeGenerator {
    pub fn new() -> JsCodeGenerator {
        JsCodeGenerator {}
    }
}

impl Default for JsCodeGenerator {
    fn default() -> JsCodeGenerator {
        JsCodeGenerator::new()
    }
}

impl CodeGenerator for JsCodeGenerator {
    type Output = String;

    fn codegen(&self, input: &Program) -> Result<String, CodegenError> {
        let lines = input
            .iter()
            .map(|form| form.codegen_to_js())
            .collect::<Result<Vec<_>, _>>()?;
        let last = lines.len().saturating_sub(1);
        Ok(lines
            .into_iter()
            .enumerate()
            .map(|(i, line)| if i < last { line + ";" } else { line })
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

impl PartialCodeGenerator for JsCodeGenerator {
    type Output = String;

    fn partial_codegen_form(&self, form: &Form) -> Result<String, CodegenError> {
        form.codegen_to_js()
    }

    fn partial_codegen_expr(&self, expr: &Expr) -> Result<String, CodegenError> {
        expr.codegen_to_js()
    }
}

trait TargetJs {
    fn codegen_to_js(&self) -> Result<String, CodegenError>;
}

impl TargetJs for Form {
    fn codegen_to_js(&self) -> Result<String, CodegenError> {
        match self {
            Form::Define(var, val) => {
                Ok(format!("const {} = {}", var.name, val.codegen_to_js()?))
            }
            Form::Expr(expr) => expr.codegen_to_js(),
        }
    }
}

impl TargetJs for Expr {
    fn codegen_to_js(&self) -> Result<String, CodegenError> {
        match self {
            Expr::Bool(b) => Ok(if *b { "true" } else { "false" }.to_owned()),
            Expr::Num(n) => Ok(fmt_number(*n)),
            Expr::Str(s) => Ok(format!("\"{}\"", s)),
            Expr::Var(v) => Ok(v.clone()),
            Expr::Prim(op) => Ok(js_op(op).to_owned()),
            Expr::Lambda(params, body) => codegen_lambda(params, body),
            Expr::If(test, then, alt) => Ok(format!(
                "({} ? {} : {})",
                test.codegen_to_js()?,
                then.codegen_to_js()?,
                alt.codegen_to_js()?
            )),
            Expr::Apply(rator, rands) => codegen_apply(rator, rands),
            unsupported => Err(CodegenError::Unsupported(format!("{}", unsupported))),
        }
    }
}

/// Operators with a JavaScript counterpart are renamed; the arithmetic
/// and comparison operators already spell the same.
fn js_op(op: &str) -> &str {
    match op {
        "=" | "eq?" | "boolean?" | "number?" => "===",
        "and" => "&&",
        "or" => "||",
        "not" => "!",
        _ => op,
    }
}

fn codegen_lambda(params: &[VarDecl], body: &[Expr]) -> Result<String, CodegenError> {
    match body {
        [single] => Ok(format!(
            "(({}) => {})",
            params
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>()
                .join(","),
            single.codegen_to_js()?
        )),
        _ => Err(CodegenError::MultiExprLambda),
    }
}

fn codegen_apply(rator: &Expr, rands: &[Expr]) -> Result<String, CodegenError> {
    let args = rands
        .iter()
        .map(|r| r.codegen_to_js())
        .collect::<Result<Vec<_>, _>>()?;

    match rator {
        Expr::Prim(op) => {
            if args.is_empty() {
                return Err(CodegenError::NoOperands(op.clone()));
            }
            if op == "not" && args.len() == 1 {
                Ok(format!("(!{})", args[0]))
            } else {
                Ok(format!("({})", args.join(&format!(" {} ", js_op(op)))))
            }
        }
        _ => Ok(format!("{}({})", rator.codegen_to_js()?, args.join(","))),
    }
}
