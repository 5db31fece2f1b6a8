use std::{fs, path::PathBuf, process::ExitCode, rc::Rc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use sema::{
    config::{CheckerConfig, Language},
    display_error, get_line_at_position,
    lexer::lexer::tokenize,
    parser::parser::parse,
    type_checker::{fortran::declarations::check_program, type_checker::TypeChecker},
};

#[derive(Parser)]
#[command(name = "sema")]
#[command(about = "Type-check and fold expressions of a Fortran source file", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a source file and print the type and value of each statement
    Check {
        /// Source file
        file: PathBuf,

        /// Checker configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the configured language
        #[arg(short, long, value_enum)]
        language: Option<Language>,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.debug {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(cli.debug)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check { file, config, language } => handle_check(file, config, language),
    }
}

fn handle_check(file: PathBuf, config: Option<PathBuf>, language: Option<Language>) -> Result<ExitCode> {
    let mut config = match config {
        Some(path) => CheckerConfig::load(&path)?,
        None => CheckerConfig::default(),
    };
    if let Some(language) = language {
        config.language = language;
    }
    if config.language != Language::Fortran {
        bail!("the source reader only understands Fortran; C and C++ trees come from an external front end");
    }

    let content = fs::read_to_string(&file).with_context(|| format!("reading {}", file.display()))?;
    let file_name = file
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| file.display().to_string());

    let tokens = match tokenize(content.clone(), Some(file_name.clone())) {
        Ok(tokens) => tokens,
        Err(error) => {
            display_error(&error, &file, &content);
            return Ok(ExitCode::FAILURE);
        }
    };
    debug!("{} tokens", tokens.len());

    let program = match parse(tokens, Rc::new(file_name)) {
        Ok(program) => program,
        Err(error) => {
            display_error(&error, &file, &content);
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut type_checker = TypeChecker::new(config);
    let checked = check_program(&mut type_checker, &program);
    info!("checked {} statement(s)", checked.len());

    for statement in checked.iter().filter(|s| !s.is_error()) {
        let line = get_line_at_position(&content, statement.span().start.0)
            .map(|(line, _, _)| line.to_string())
            .unwrap_or_else(|| "?".to_string());
        let ty = type_checker.describe(statement.ty());
        match statement.constant() {
            Some(value) => println!("{}: {} = {}", line, ty, value),
            None => println!("{}: {}", line, ty),
        }
    }

    if !type_checker.diagnostics.has_errors() {
        return Ok(ExitCode::SUCCESS);
    }
    for error in type_checker.diagnostics.errors() {
        display_error(error, &file, &content);
    }
    Ok(ExitCode::FAILURE)
}
