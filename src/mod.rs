pub mod cli;
mod config;

use clap::App;
use config::Config;

fn main() {
    let args = App::new("krypton")
        .version("0.1.0")
        .about("Krypton expression language")
        .args_from_usage(
            "-i, --repl        'Starts an interactive krypton shell'
            -j, --js          'Emit JavaScript instead of evaluating'
            -l, --lower       'Print the lowered program instead of evaluating'
            -d, --dump-ast    'Dump the parsed AST'
            [INPUT]           'Run file'",
        )
        .get_matches();

    let cfg = Config {
        dump_ast: args.is_present("dump-ast"),
        emit_js: args.is_present("js"),
        lower: args.is_present("lower"),
    };

    if args.is_present("repl") {
        cli::cli_main::cli_main(cfg, None);
    } else {
        cli::cli_main::cli_main(cfg, args.value_of("INPUT").map(|e| e.to_owned()));
    }
}
