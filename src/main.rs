//! CLI tool to compile, inspect, and format connection descriptions.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use connection_compiler::{GeneratorOptions, Source, Target};
use tracing_subscriber::EnvFilter;

/// Connection description compiler
#[derive(Parser)]
#[command(name = "connc", version)]
#[command(about = "Compile connection descriptions into generated output")]
struct Args {
    /// Log level filter (e.g. `warn`, `debug`, `connection_compiler=trace`)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile an input file into an output file
    Build {
        input: PathBuf,
        output: PathBuf,
        /// Indent nested records with this many spaces (0 = tabs)
        #[arg(long, default_value_t = 0)]
        indent: usize,
        /// Omit the generated-file header line
        #[arg(long)]
        no_header: bool,
        /// Output flavour
        #[arg(long, value_enum, default_value_t = TargetArg::Records)]
        target: TargetArg,
    },
    /// Print the token stream of a file
    Tokens { input: PathBuf },
    /// Format a file and print it to stdout
    Fmt { input: PathBuf },
    /// Check whether a file is already formatted
    Check { input: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum TargetArg {
    /// One record per statement
    Records,
    /// C++ message classes and decoder base class
    Decoder,
}

impl From<TargetArg> for Target {
    fn from(arg: TargetArg) -> Self {
        match arg {
            TargetArg::Records => Self::Records,
            TargetArg::Decoder => Self::Decoder,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&args.log_level))
        .with_writer(std::io::stderr)
        .init();

    match run(args.command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            match e.downcast_ref::<connection_compiler::Error>() {
                Some(err) => eprintln!("{}: {err}", err.category()),
                None => eprintln!("error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<bool> {
    match command {
        Command::Build {
            input,
            output,
            indent,
            no_header,
            target,
        } => {
            let options = GeneratorOptions::default()
                .with_indent_width(indent)
                .with_header(!no_header)
                .with_target(target.into());
            connection_compiler::compile_with(&input, &output, &options)?;
            eprintln!("{}: wrote {}", input.display(), output.display());
            Ok(true)
        }
        Command::Tokens { input } => {
            let source = Source::from_text(&read(&input)?);
            let tokens = connection_compiler::tokenize_source(&source)
                .map_err(connection_compiler::Error::from)?;
            for token in tokens {
                println!(
                    "{}:{}\t{}\t{}",
                    token.span.line, token.span.column, token.kind, token.text
                );
            }
            Ok(true)
        }
        Command::Fmt { input } => {
            let program = connection_compiler::parse_str(&read(&input)?)?;
            print!("{}", connection_compiler::format(&program));
            Ok(true)
        }
        Command::Check { input } => {
            let content = read(&input)?;
            let program = connection_compiler::parse_str(&content)?;
            if connection_compiler::format(&program) == content {
                eprintln!("{}: formatted", input.display());
                Ok(true)
            } else {
                eprintln!("{}: not formatted", input.display());
                Ok(false)
            }
        }
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
