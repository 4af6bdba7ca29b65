use std::fs;
use std::path::{Path, PathBuf};

use argflags_core::{
    Data, Environment, FlagRegistry, FlagSummary, InvalidFlags, Schema, from_environment,
    registry,
};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::debug;

/// CLI output format for reports.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "argflags")]
#[command(version, about = "Parse and validate command-line flags against a schema")]
struct Cli {
    /// Flag schema file (YAML for .yaml/.yml, JSON otherwise).
    #[arg(long, global = true)]
    schema: Option<PathBuf>,
    /// Report flags that the schema does not declare.
    #[arg(long, global = true)]
    strict: bool,
    /// Skip type checks on declared flags.
    #[arg(long, global = true)]
    ignore_types: bool,
    /// Output format.
    #[arg(long, value_enum, default_value_t = CliOutputFormat::Json, global = true)]
    format: CliOutputFormat,
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse a command line and print the resolved flag data.
    Parse(ParseArgs),
    /// Print the declared flags of a schema.
    Inspect,
    /// Check that a schema file loads without conflicts.
    Check,
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Command line to parse as a single string (quotes are honored).
    #[arg(long, allow_hyphen_values = true, conflicts_with = "args")]
    line: Option<String>,
    /// Exit with status 1 and print the violations when the input is invalid.
    #[arg(long)]
    enforce: bool,
    /// Pre-split arguments to parse.
    #[arg(last = true)]
    args: Vec<String>,
}

/// Global options shared by every subcommand.
struct Settings {
    schema: Option<PathBuf>,
    strict: bool,
    ignore_types: bool,
    format: CliOutputFormat,
}

/// The running process as seen by the registry.
struct ProcessEnvironment {
    args: Vec<String>,
}

impl Environment for ProcessEnvironment {
    fn args(&self) -> Vec<String> {
        self.args.clone()
    }

    fn reject(&self, failure: &InvalidFlags) {
        eprintln!("{failure}");
        std::process::exit(1);
    }
}

#[derive(Debug, Serialize)]
struct ParseReport<'a> {
    data: Data<'a>,
    valid: bool,
    violations: Vec<String>,
    consumed: usize,
}

#[derive(Debug, Serialize)]
struct CheckReport {
    schema: String,
    flags: usize,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = Settings {
        schema: cli.schema,
        strict: cli.strict,
        ignore_types: cli.ignore_types,
        format: cli.format,
    };

    let result = match cli.command {
        Command::Parse(args) => run_parse(&settings, args),
        Command::Inspect => run_inspect(&settings),
        Command::Check => run_check(&settings),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_parse(settings: &Settings, args: ParseArgs) -> Result<(), String> {
    let schema = load_schema(settings.schema.as_deref())?;
    let env = ProcessEnvironment { args: args.args };

    let mut registry = match args.line {
        Some(line) => registry(schema, line),
        None => from_environment(schema, &env),
    }
    .map_err(|e| e.to_string())?;
    apply_switches(&mut registry, settings);

    if args.enforce {
        registry
            .enforce_rules_in(&env)
            .map_err(|failure| failure.to_string())?;
    }

    let validation = registry.validate();
    let report = ParseReport {
        data: registry.data(),
        valid: validation.is_valid(),
        violations: validation.messages(),
        consumed: registry.consumed(),
    };
    emit(&report, settings.format)
}

fn run_inspect(settings: &Settings) -> Result<(), String> {
    let registry = build_registry(settings)?;
    let flags: Vec<FlagSummary> = registry.iter().map(|flag| flag.summary()).collect();
    emit(&flags, settings.format)
}

fn run_check(settings: &Settings) -> Result<(), String> {
    let path = settings
        .schema
        .as_deref()
        .ok_or_else(|| "--schema is required for check".to_string())?;
    let registry = build_registry(settings)?;

    let report = CheckReport {
        schema: path.display().to_string(),
        flags: registry.recognized_flags().len(),
    };
    emit(&report, settings.format)
}

fn build_registry(settings: &Settings) -> Result<FlagRegistry, String> {
    let schema = load_schema(settings.schema.as_deref())?;
    let mut registry = FlagRegistry::with_schema(schema).map_err(|e| e.to_string())?;
    apply_switches(&mut registry, settings);
    Ok(registry)
}

fn apply_switches(registry: &mut FlagRegistry, settings: &Settings) {
    if settings.strict {
        registry.disallow_unrecognized();
    }
    if settings.ignore_types {
        registry.ignore_data_types();
    }
}

fn load_schema(path: Option<&Path>) -> Result<Schema, String> {
    let Some(path) = path else {
        return Ok(Schema::new());
    };

    let text = fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    let schema = if is_yaml {
        Schema::from_yaml(&text)
    } else {
        Schema::from_json(&text)
    }
    .map_err(|e| format!("invalid schema {}: {e}", path.display()))?;

    debug!(path = %path.display(), flags = schema.len(), "Loaded schema");
    Ok(schema)
}

fn emit<T: Serialize>(value: &T, format: CliOutputFormat) -> Result<(), String> {
    let rendered = match format {
        CliOutputFormat::Json => serde_json::to_string_pretty(value).map_err(|e| e.to_string())?,
        CliOutputFormat::Yaml => serde_yaml::to_string(value).map_err(|e| e.to_string())?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}
