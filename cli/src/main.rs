use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};
use yaml_include_core::{
    ArrayConflictPolicy, KeyConflictPolicy, MergeOptions, ParseError, Value, merge_values,
    parse_text, to_json_string, to_yaml_string,
};
use yaml_include_resolver::{IncludeResolver, ResolveError, ResolverConfig};

/// Lines of context shown around a parse error.
const SNIPPET_CONTEXT: usize = 2;

/// CLI-specific output format enum with clap argument parsing support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliKeyPolicy {
    First,
    Second,
    Error,
}

impl From<CliKeyPolicy> for KeyConflictPolicy {
    fn from(policy: CliKeyPolicy) -> Self {
        match policy {
            CliKeyPolicy::First => Self::ValueFromFirst,
            CliKeyPolicy::Second => Self::ValueFromSecond,
            CliKeyPolicy::Error => Self::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliArrayPolicy {
    Append,
    Prepend,
    First,
    Second,
    KeyPolicy,
}

impl From<CliArrayPolicy> for ArrayConflictPolicy {
    fn from(policy: CliArrayPolicy) -> Self {
        match policy {
            CliArrayPolicy::Append => Self::AppendSecondToFirst,
            CliArrayPolicy::Prepend => Self::AppendFirstToSecond,
            CliArrayPolicy::First => Self::ValueFromFirst,
            CliArrayPolicy::Second => Self::ValueFromSecond,
            CliArrayPolicy::KeyPolicy => Self::UseKeyPolicy,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "yaml-include")]
#[command(about = "Resolve YAML documents linked by includes directives")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve a document and all of its includes into one document.
    Resolve(ResolveArgs),
    /// Parse a single document without processing its includes.
    Parse(ParseArgs),
    /// Deep-merge two documents.
    Merge(MergeArgs),
}

#[derive(Debug, Args)]
struct ResolveArgs {
    /// Root document to resolve.
    path: PathBuf,
    /// Output format.
    #[arg(long, default_value = "yaml")]
    format: CliOutputFormat,
    /// Write the result to a file instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
    /// Resolver configuration file (YAML).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Fail when the root document cannot be read.
    #[arg(long)]
    strict: bool,
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Document to parse.
    path: PathBuf,
    /// Output format.
    #[arg(long, default_value = "yaml")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct MergeArgs {
    /// Base document.
    first: PathBuf,
    /// Overlay document merged on top of the base.
    second: PathBuf,
    /// How conflicting scalar values are settled.
    #[arg(long, default_value = "second")]
    key_policy: CliKeyPolicy,
    /// How two arrays under the same key are combined.
    #[arg(long, default_value = "append")]
    array_policy: CliArrayPolicy,
    /// Replace nested objects instead of merging them.
    #[arg(long)]
    shallow: bool,
    /// Output format.
    #[arg(long, default_value = "yaml")]
    format: CliOutputFormat,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Resolve(args) => run_resolve(args),
        Command::Parse(args) => run_parse(args),
        Command::Merge(args) => run_merge(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn run_resolve(args: ResolveArgs) -> Result<(), String> {
    let mut config = match &args.config {
        Some(path) => ResolverConfig::load(path).map_err(|err| describe_resolve_error(&err))?,
        None => ResolverConfig::default(),
    };
    if args.strict {
        config.lenient_root = false;
    }

    let resolver = IncludeResolver::new().with_config(config);
    let resolution = resolver
        .resolve_with_report(&args.path)
        .map_err(|err| describe_resolve_error(&err))?;

    for warning in &resolution.warnings {
        eprintln!("warning: {warning}");
    }
    info!(
        files = resolution.files.len(),
        root = %args.path.display(),
        "resolved document"
    );

    let raw = format_value(&resolution.document, args.format)?;
    match &args.output {
        Some(path) => write_output(path, &raw),
        None => {
            print!("{raw}");
            Ok(())
        }
    }
}

fn run_parse(args: ParseArgs) -> Result<(), String> {
    let value = read_document(&args.path)?;
    print!("{}", format_value(&value, args.format)?);
    Ok(())
}

fn run_merge(args: MergeArgs) -> Result<(), String> {
    let first = read_document(&args.first)?;
    let second = read_document(&args.second)?;
    let options = MergeOptions {
        key_policy: args.key_policy.into(),
        array_policy: args.array_policy.into(),
        recursive: !args.shallow,
    };
    debug!(?options, "merging documents");

    let merged = merge_values(&first, &second, &options).map_err(|err| err.to_string())?;
    print!("{}", format_value(&merged, args.format)?);
    Ok(())
}

/// Reads and parses one document, printing a snippet on parse failure.
fn read_document(path: &Path) -> Result<Value, String> {
    let text = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read '{}': {err}", path.display()))?;
    parse_text(&text).map_err(|err| {
        print_snippet(&err);
        format!("Failed to parse '{}': {err}", path.display())
    })
}

fn describe_resolve_error(err: &ResolveError) -> String {
    if let Some(parse) = err.parse_error() {
        print_snippet(parse);
    }
    err.to_string()
}

fn print_snippet(err: &ParseError) {
    let snippet = err.snippet(SNIPPET_CONTEXT);
    if !snippet.is_empty() {
        eprint!("{snippet}");
    }
}

fn format_value(value: &Value, format: CliOutputFormat) -> Result<String, String> {
    match format {
        CliOutputFormat::Json => to_json_string(value)
            .map(|raw| raw + "\n")
            .map_err(|err| format!("Failed to render JSON: {err}")),
        CliOutputFormat::Yaml => {
            to_yaml_string(value).map_err(|err| format!("Failed to render YAML: {err}"))
        }
    }
}

fn write_output(path: &Path, raw: &str) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| {
                format!(
                    "Failed to create output directory '{}': {err}",
                    parent.display()
                )
            })?;
        }
    }
    fs::write(path, raw).map_err(|err| format!("Failed to write '{}': {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_policy_flags_map_to_engine_policies() {
        assert_eq!(
            KeyConflictPolicy::from(CliKeyPolicy::First),
            KeyConflictPolicy::ValueFromFirst
        );
        assert_eq!(
            ArrayConflictPolicy::from(CliArrayPolicy::Prepend),
            ArrayConflictPolicy::AppendFirstToSecond
        );
        assert_eq!(
            ArrayConflictPolicy::from(CliArrayPolicy::KeyPolicy),
            ArrayConflictPolicy::UseKeyPolicy
        );
    }

    #[test]
    fn test_verbose_flag_is_global_and_repeatable() {
        let cli = Cli::try_parse_from(["yaml-include", "parse", "a.yaml", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Command::Parse(_)));
    }

    #[test]
    fn test_merge_defaults() {
        let cli = Cli::try_parse_from(["yaml-include", "merge", "a.yaml", "b.yaml"]).unwrap();
        let Command::Merge(args) = cli.command else {
            panic!("expected merge command");
        };
        assert!(matches!(args.key_policy, CliKeyPolicy::Second));
        assert!(matches!(args.array_policy, CliArrayPolicy::Append));
        assert!(!args.shallow);
        assert_eq!(args.format, CliOutputFormat::Yaml);
    }

    #[test]
    fn test_format_value_json_ends_with_newline() {
        let raw = format_value(&json!({"a": 1}), CliOutputFormat::Json).unwrap();
        assert_eq!(raw, "{\n  \"a\": 1\n}\n");
    }

    #[test]
    fn test_format_value_yaml() {
        let raw = format_value(&json!({"a": [1, 2]}), CliOutputFormat::Yaml).unwrap();
        assert_eq!(raw, "a:\n- 1\n- 2\n");
    }
}
