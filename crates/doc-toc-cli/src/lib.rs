use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use doc_toc_config::{Config, LoadOptions};
use doc_toc_core::DocToc;
use doc_toc_format::OutputFormat;
use doc_toc_ops::{
    BuildOptions, BuildOutcome, OperationError, Operations, PlanOptions, PlanOutcome, ScanOptions,
    TocMode, VerifyOptions, VerifyOutcome,
};
use doc_toc_parser::slugify;

mod logging;

/// Exit code for configuration problems.
const EXIT_CONFIG: i32 = 2;
/// Exit code for I/O failures.
const EXIT_IO: i32 = 4;

/// Entry point for CLI execution. Returns the desired exit code.
pub fn run() -> Result<i32> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    if let Command::Slug(args) = &cli.command {
        for text in &args.text {
            println!("{}", slugify(text));
        }
        return Ok(0);
    }

    let mut options = LoadOptions::default();
    if let Some(path) = cli.config {
        options = options.with_override_path(path);
    }
    let config = match Config::load(options) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("doc-toc error: {err}");
            return Ok(EXIT_CONFIG);
        }
    };
    log::debug!(
        "configuration resolved from {} layer(s)",
        config.sources.layers.len()
    );

    let engine = DocToc::bootstrap(config);
    let ops = engine.operations();

    let result = match cli.command {
        Command::Build(args) => handle_build(ops, args),
        Command::Plan(args) => handle_plan(ops, args),
        Command::Verify(args) => handle_verify(ops, args),
        Command::Slug(_) => Ok(0),
    };

    match result {
        Ok(code) => Ok(code),
        Err(OperationError::InvalidInput(message)) => {
            eprintln!("{message}");
            Ok(1)
        }
        Err(OperationError::Io { path, source }) => {
            eprintln!("I/O error on {}: {}", path.display(), source);
            Ok(EXIT_IO)
        }
        Err(OperationError::Config(err)) => {
            eprintln!("doc-toc error: {err}");
            Ok(EXIT_CONFIG)
        }
        Err(err) => Err(err.into()),
    }
}

fn handle_build(ops: &Operations, args: BuildArgs) -> Result<i32, OperationError> {
    let BuildArgs {
        path,
        check,
        update,
        diff,
        format,
        quiet,
        no_ignore,
    } = args;

    let mode = if update {
        TocMode::Update
    } else if diff {
        TocMode::Diff
    } else {
        // Explicit --check maps to same default mode.
        let _ = check;
        TocMode::Check
    };

    let options = BuildOptions {
        scan: ScanOptions {
            paths: path,
            respect_ignore: !no_ignore,
        },
        mode,
        format: format.unwrap_or_default().into(),
        quiet,
    };

    let BuildOutcome {
        rendered,
        exit_code,
        ..
    } = ops.build(options)?;

    if !rendered.is_empty() {
        emit(&rendered);
    }
    Ok(exit_code)
}

fn handle_plan(ops: &Operations, args: PlanArgs) -> Result<i32, OperationError> {
    let PlanArgs { file, format } = args;

    let PlanOutcome {
        rendered,
        exit_code,
        ..
    } = ops.plan(PlanOptions {
        path: file,
        format: format.unwrap_or_default().into(),
    })?;

    emit(&rendered);
    Ok(exit_code)
}

fn handle_verify(ops: &Operations, args: VerifyArgs) -> Result<i32, OperationError> {
    let VerifyArgs {
        path,
        format,
        no_ignore,
    } = args;

    let VerifyOutcome {
        rendered,
        exit_code,
        ..
    } = ops.verify(VerifyOptions {
        scan: ScanOptions {
            paths: path,
            respect_ignore: !no_ignore,
        },
        format: format.unwrap_or_default().into(),
    })?;

    emit(&rendered);
    Ok(exit_code)
}

fn emit(content: &str) {
    print!("{}", content);
    if !content.ends_with('\n') {
        println!();
    }
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Table-of-contents builder for rendered documentation pages",
    propagate_version = true
)]
struct Cli {
    /// Use this config file on top of the discovered ones
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Inject anchors and navigation lists into pages
    Build(BuildArgs),
    /// Show the planned table of contents for one page
    Plan(PlanArgs),
    /// Check that navigation links resolve and anchors are unique
    Verify(VerifyArgs),
    /// Print the slug generated for each argument
    Slug(SlugArgs),
}

#[derive(Args)]
struct BuildArgs {
    /// Restrict processing to specific files or directories
    #[arg(long = "path", value_name = "PATH", action = ArgAction::Append)]
    path: Vec<PathBuf>,
    /// Report pages that would change without modifying them (default)
    #[arg(long, conflicts_with_all = ["update", "diff"])]
    check: bool,
    /// Rewrite pages in place
    #[arg(long, conflicts_with_all = ["check", "diff"])]
    update: bool,
    /// Print unified diffs for pages that would change
    #[arg(long, conflicts_with_all = ["check", "update"])]
    diff: bool,
    /// Output format
    #[arg(long, value_enum)]
    format: Option<FormatValue>,
    /// Suppress output when no changes are required
    #[arg(long)]
    quiet: bool,
    /// Disable `.doc-toc-ignore` filtering
    #[arg(long = "no-ignore")]
    no_ignore: bool,
}

#[derive(Args)]
struct PlanArgs {
    /// Page to plan
    #[arg(value_name = "FILE")]
    file: PathBuf,
    /// Output format
    #[arg(long, value_enum)]
    format: Option<FormatValue>,
}

#[derive(Args)]
struct VerifyArgs {
    /// Restrict verification to specific files or directories
    #[arg(long = "path", value_name = "PATH", action = ArgAction::Append)]
    path: Vec<PathBuf>,
    /// Output format
    #[arg(long, value_enum)]
    format: Option<FormatValue>,
    /// Disable `.doc-toc-ignore` filtering
    #[arg(long = "no-ignore")]
    no_ignore: bool,
}

#[derive(Args)]
struct SlugArgs {
    /// Heading text to convert
    #[arg(value_name = "TEXT", required = true)]
    text: Vec<String>,
}

#[derive(Clone, Copy, Default, ValueEnum)]
enum FormatValue {
    #[default]
    Plain,
    Json,
}

impl From<FormatValue> for OutputFormat {
    fn from(value: FormatValue) -> Self {
        match value {
            FormatValue::Plain => OutputFormat::Plain,
            FormatValue::Json => OutputFormat::Json,
        }
    }
}
