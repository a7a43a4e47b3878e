use crate::syntax::tree::{Expr, Form, Ident, Program};

pub mod js;

#[derive(Debug, PartialEq)]
pub enum CodegenError {
    /// The construct has no spelling in the target language.
    Unsupported(String),
    /// Only single-expression lambda bodies translate to arrow functions.
    MultiExprLambda,
    /// An infix operator application needs at least one operand.
    NoOperands(Ident),
}

impl std::fmt::Display for CodegenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodegenError::Unsupported(what) => write!(f, "unsupported expression: {}", what),
            CodegenError::MultiExprLambda => {
                write!(f, "lambda with multiple expressions in body is not supported")
            }
            CodegenError::NoOperands(op) => {
                write!(f, "primitive operation '{}' expects arguments", op)
            }
        }
    }
}

pub trait CodeGenerator {
    type Output;

    fn codegen(&self, input: &Program) -> Result<Self::Output, CodegenError>;
}

pub trait PartialCodeGenerator {
    type Output;

    fn partial_codegen_form(&self, form: &Form) -> Result<Self::Output, CodegenError>;

    fn partial_codegen_expr(&self, expr: &Expr) -> Result<Self::Output, CodegenError>;
}
