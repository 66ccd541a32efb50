use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use esparse::{Context, ParseError, Program};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "esparse", version, about = "Parse ECMAScript source into an ESTree JSON tree")]
struct Cli {
    /// JavaScript file to parse
    file: Option<PathBuf>,

    /// Parse inline source instead of a file
    #[arg(short = 'e', long = "eval", conflicts_with = "file")]
    eval: Option<String>,

    /// Parse as a module (implies --strict)
    #[arg(long)]
    module: bool,

    #[arg(long)]
    strict: bool,

    /// Attach line/column locations to every node
    #[arg(long)]
    loc: bool,

    /// Enable staged syntax: object rest patterns, class fields, private names
    #[arg(long)]
    next: bool,

    /// Reject Annex B web-compatibility syntax
    #[arg(long)]
    no_web_compat: bool,

    /// Print the tree on a single line
    #[arg(long)]
    compact: bool,
}

impl Cli {
    fn context(&self) -> Context {
        let mut ctx = Context::EMPTY;
        for (set, flag) in [
            (self.module, Context::MODULE),
            (self.strict, Context::STRICT),
            (self.loc, Context::OPTIONS_LOC),
            (self.next, Context::OPTIONS_NEXT),
            (self.no_web_compat, Context::OPTIONS_DISABLE_WEB_COMPAT),
        ] {
            if set {
                ctx = ctx.with(flag);
            }
        }
        ctx
    }
}

/// Installs a stderr subscriber when `ESPARSE_LOG` or `RUST_LOG` is set.
fn init_tracing() {
    let filter = match std::env::var("ESPARSE_LOG") {
        Ok(val) => EnvFilter::builder().parse_lossy(val),
        Err(_) if std::env::var("RUST_LOG").is_ok() => EnvFilter::from_default_env(),
        Err(_) => return,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_program(program: &Program, compact: bool) -> ExitCode {
    let text = program.to_json().and_then(|json| {
        if compact {
            serde_json::to_string(&json)
        } else {
            serde_json::to_string_pretty(&json)
        }
    });
    match text {
        Ok(text) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error serializing tree: {e}");
            ExitCode::from(1)
        }
    }
}

fn report(err: &ParseError, origin: &str) -> ExitCode {
    eprintln!("{origin}: {err}");
    ExitCode::from(1)
}

fn parse_source(source: &str, origin: &str, cli: &Cli) -> ExitCode {
    match esparse::parse(source, cli.context()) {
        Ok(program) => print_program(&program, cli.compact),
        Err(err) => report(&err, origin),
    }
}

fn parse_file(path: &Path, cli: &Cli) -> ExitCode {
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading {}: {e}", path.display());
            return ExitCode::from(1);
        }
    };
    parse_source(&source, &path.display().to_string(), cli)
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    if let Some(code) = &cli.eval {
        return parse_source(code, "<eval>", &cli);
    }

    if let Some(path) = &cli.file {
        return parse_file(path, &cli);
    }

    eprintln!("esparse: expected a file or --eval <source>");
    ExitCode::from(2)
}
