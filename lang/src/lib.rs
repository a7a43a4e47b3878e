use crate::{
    runtime::{eval, RuntimeError, Value},
    syntax::{
        lower::Lower,
        parse::{CompileError, KrParser},
        tree::Program,
    },
};

extern crate pest;
#[macro_use]
extern crate pest_derive;

pub mod codegen;
pub mod runtime;
pub mod syntax;


#[derive(Debug)]
pub enum Error {
    Compile(CompileError),
    Runtime(RuntimeError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Compile(e) => write!(f, "{}", e),
            Error::Runtime(e) => write!(f, "{}", e),
        }
    }
}

impl From<CompileError> for Error {
    fn from(e: CompileError) -> Error {
        Error::Compile(e)
    }
}

impl From<RuntimeError> for Error {
    fn from(e: RuntimeError) -> Error {
        Error::Runtime(e)
    }
}

pub struct Compiler;

impl Compiler {
    /// Parse source text into a program.
    pub fn ast(input: &str) -> Result<Program, CompileError> {
        KrParser::ast(input)
    }

    /// Parse source text and run the full lowering pipeline over it.
    pub fn lower(input: &str) -> Result<Program, CompileError> {
        KrParser::ast(input).map(Lower::run)
    }
}

pub struct Interpreter;

impl Interpreter {
    /// Parse and evaluate source text, starting from an empty top-level
    /// environment.
    pub fn run(input: &str) -> Result<Value, Error> {
        let program = Compiler::ast(input)?;
        eval::eval_program(&program).map_err(Error::from)
    }
}
