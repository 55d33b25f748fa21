// Pyxc: indentation-aware language front end

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use crossterm::tty::IsTty;
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry};

use pyxc::lower::lower_item;
use pyxc::lower::printer::SexprPrinter;
use pyxc::{Emitter, Lexer, Mode, Session, SessionOptions};

/// What to print on stdout besides diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
    None,
    Tokens,
    Ast,
}

#[derive(Debug, Parser)]
#[command(name = "pyxc", version, about = "Parse and check Pyxc source")]
struct Args {
    /// Source file; standard input when omitted
    file: Option<PathBuf>,

    /// Prompt for each line and keep going after errors
    #[arg(short, long)]
    interactive: bool,

    #[arg(long, value_enum, default_value_t = Emit::None)]
    emit: Emit,

    /// Interactive prompt
    #[arg(long, default_value = pyxc::session::DEFAULT_PROMPT)]
    prompt: String,

    /// Log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .without_time()
        .with_target(false)
        .with_level(true)
        .with_ansi(false)
        .compact()
        .with_filter(LevelFilter::from_level(level));

    Registry::default().with(layer).init();
}

fn open_input(args: &Args) -> anyhow::Result<(Lexer, Mode)> {
    match &args.file {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("cannot open '{}'", path.display()))?;
            let mode = if args.interactive { Mode::Interactive } else { Mode::File };
            Ok((Lexer::from_reader(BufReader::new(file)), mode))
        }
        None => {
            let mode = if args.interactive || io::stdin().is_tty() {
                Mode::Interactive
            } else {
                Mode::File
            };
            Ok((Lexer::from_reader(io::stdin().lock()), mode))
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.verbose);

    let (mut lexer, mode) = open_input(&args)?;

    if args.emit == Emit::Tokens {
        let mut emitter = Emitter::stderr();
        print!("{}", lexer.render_tokens(&mut emitter));
        return Ok(if emitter.has_errors() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        });
    }

    let options = SessionOptions {
        mode,
        prompt: args.prompt.clone(),
    };
    let mut session = Session::new(lexer, Emitter::stderr(), options);

    let emit_ast = args.emit == Emit::Ast;
    session.run_with(|ast, env, item| {
        if !emit_ast {
            return;
        }
        match lower_item(&mut SexprPrinter::new(), ast, env, item) {
            Ok(text) => println!("{}", text),
            Err(err) => tracing::warn!(error = %err, "could not print item"),
        }
    });

    if mode == Mode::File && session.had_error() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
