use rustyline::{
    completion::{Candidate, Completer},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    validate::Validator,
    Context as RContext, Editor, Helper, Result as RResult,
};

use lang::{
    codegen::{js::JsCodeGenerator, CodeGenerator, PartialCodeGenerator},
    runtime::{
        builtins::PRIM_OPS,
        eval::{eval_form, eval_program},
        Env,
    },
    syntax::{
        lower::Lower,
        parse::{CompileError, KrParser},
    },
};

use crate::config::Config;
use std::rc::Rc;

struct REPL {
    rl: Editor<REPLHelper>,
    history_file: Option<String>,
    cfg: Config,
    repl_run: bool,
    prompt: String,
    multiline: bool,
    multiline_buffer: Vec<String>,
}

enum CompleteCandidate {
    Command(String, String),
    Name(String),
}

impl Candidate for CompleteCandidate {
    fn display(&self) -> &str {
        match self {
            CompleteCandidate::Command(cmd, _) => cmd,
            CompleteCandidate::Name(name) => name,
        }
    }

    fn replacement(&self) -> &str {
        match self {
            CompleteCandidate::Command(cmd, _) => cmd,
            CompleteCandidate::Name(name) => name,
        }
    }
}

struct REPLHelper {
    env: Rc<Env>,
}

impl Helper for REPLHelper {}

impl Completer for REPLHelper {
    type Candidate = CompleteCandidate;

    fn complete(
        &self,
        line: &str,
        _pos: usize,
        _ctx: &RContext<'_>,
    ) -> RResult<(usize, Vec<Self::Candidate>)> {
        if line.starts_with(":") {
            let commands = vec![
                (":q", "Quit REPL"),
                (":{", "Start multi-line mode"),
                (":}", "End multi-line mode"),
                (":env", "Show top-level bindings"),
                (":js", "Translate code to JavaScript"),
            ];
            Ok((
                line.len(),
                commands
                    .into_iter()
                    .filter(|it| it.0.starts_with(line))
                    .map(|it| (it.0.split_at(line.len()).1, it.1))
                    .map(|it| CompleteCandidate::Command(it.0.to_owned(), it.1.to_owned()))
                    .collect(),
            ))
        } else {
            Ok((
                line.len(),
                self.env
                    .names()
                    .into_iter()
                    .chain(PRIM_OPS.iter().cloned())
                    .filter(|it| it.starts_with(line))
                    .map(|it| it.split_at(line.len()).1)
                    .map(|it| CompleteCandidate::Name(it.to_owned()))
                    .collect(),
            ))
        }
    }
}

impl Validator for REPLHelper {}

impl Hinter for REPLHelper {}

impl Highlighter for REPLHelper {}

impl REPL {
    fn new(cfg: Config) -> REPL {
        let history_file = dirs::home_dir()
            .map(|mut path| {
                path.push(".kr-history");
                path.to_str().map(|s| s.to_owned())
            })
            .flatten();

        let mut repl = REPL {
            rl: Editor::<REPLHelper>::new(),
            history_file,
            cfg,
            repl_run: true,
            prompt: "Kr> ".to_owned(),
            multiline: false,
            multiline_buffer: Vec::new(),
        };

        if let Some(ref path) = repl.history_file {
            let _ = repl.rl.load_history(path);
        }

        repl.rl.set_helper(Some(REPLHelper { env: Env::empty() }));
        repl
    }

    fn start(&mut self) {
        while self.repl_run {
            let readline = self.rl.readline(self.prompt.as_str());
            match readline {
                Ok(line) => {
                    if line.starts_with(":") {
                        self.process_command(line);
                        continue;
                    }

                    match self.multiline {
                        true => self.multiline_buffer.push(line),
                        _ => self.run_code(line),
                    }
                }

                Err(ReadlineError::Interrupted) => (),
                Err(ReadlineError::Eof) => {
                    break;
                }
                Err(err) => {
                    println!("ReadlineError: {:?}", err);
                    break;
                }
            }
        }
    }

    fn process_command(&mut self, line: String) {
        match line.as_str() {
            ":{" => {
                self.multiline = true;
                self.prompt = "Kr| ".to_owned();
            }

            ":}" => {
                self.multiline = false;
                self.prompt = "Kr> ".to_owned();
                let line = self.multiline_buffer.join("\n");
                self.multiline_buffer.clear();
                self.run_code(line);
            }

            ":q" => {
                self.repl_run = false;
            }

            ":env" => {
                let env = &self.rl.helper().unwrap().env;
                for name in env.names() {
                    println!("- {}", name);
                }
            }

            cmd if cmd.starts_with(":js") => {
                let src = cmd[3..].trim().to_owned();
                match KrParser::ast(src.as_str()) {
                    Ok(program) => {
                        let gen = JsCodeGenerator::new();
                        for form in &program {
                            match gen.partial_codegen_form(form) {
                                Ok(js) => println!("{}", js),
                                Err(err) => eprintln!("{}", err),
                            }
                        }
                    }
                    Err(err) => report_compile_error("<stdin>", err),
                }
            }

            _ => println!("REPL: Unknown command {}", line.as_str()),
        }
    }

    fn run_code(&mut self, line: String) {
        self.rl.add_history_entry(line.as_str());
        let dump_ast = self.cfg.dump_ast;
        let helper = self.rl.helper_mut().unwrap();

        match KrParser::ast(line.as_str()) {
            Ok(program) => {
                if dump_ast {
                    eprintln!("{:#?}", program);
                }

                let mut last = None;
                for form in &program {
                    match eval_form(form, &helper.env) {
                        Ok((value, env)) => {
                            helper.env = env;
                            last = Some(value);
                        }
                        Err(err) => {
                            eprintln!("{}", err);
                            return;
                        }
                    }
                }
                if let Some(value) = last {
                    println!("{}", value);
                }
            }
            Err(err) => report_compile_error("<stdin>", err),
        }
    }
}

impl Drop for REPL {
    fn drop(&mut self) {
        if let Some(ref path) = self.history_file {
            let _ = self.rl.save_history(path);
        }
    }
}

fn report_compile_error(file: &str, err: CompileError) {
    match err {
        CompileError::Syntax(e) => eprintln!("{}", e.with_path(file)),
        err => eprintln!("{}", err),
    }
}

fn run_file(cfg: &Config, file: &str, input: &str) {
    match KrParser::ast(input) {
        Ok(program) => {
            if cfg.dump_ast {
                eprintln!("{:#?}", program);
            }

            if cfg.emit_js {
                match JsCodeGenerator::new().codegen(&program) {
                    Ok(js) => println!("{}", js),
                    Err(err) => eprintln!("{}", err),
                }
            } else if cfg.lower {
                for form in Lower::run(program) {
                    println!("{}", form);
                }
            } else {
                match eval_program(&program) {
                    Ok(value) => println!("{}", value),
                    Err(err) => eprintln!("{}", err),
                }
            }
        }
        Err(err) => report_compile_error(file, err),
    }
}

pub(crate) fn cli_main(cfg: Config, input: Option<String>) {
    if let Some(input) = input {
        let src = std::fs::read_to_string(input.as_str()).expect("unable to open file");
        run_file(&cfg, input.as_str(), src.as_str());
    } else {
        let mut repl = REPL::new(cfg);
        repl.start();
    }
}
