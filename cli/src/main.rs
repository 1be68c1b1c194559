use std::collections::BTreeMap;
use std::path::PathBuf;

use argmatch_core::{CommandDecl, ContainerId, ContainerKind, Value};
use argmatch_engine::{Command as UsageCommand, tokenize};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Output format for bound values.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "argmatch")]
#[command(about = "Compile docopt-style usage specs and match arguments against them")]
struct Cli {
    /// Log compiler and matcher decisions to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate a command declaration and compile its usage spec.
    Check(SpecArgs),
    /// Match arguments given after `--` and print the bound values.
    Match(MatchArgs),
    /// Print the compiled automaton as a Graphviz digraph.
    Dot(SpecArgs),
    /// Print the tokens of a usage spec.
    Tokens(TokensArgs),
}

#[derive(Debug, Args)]
struct SpecArgs {
    /// YAML or JSON command declaration.
    #[arg(long)]
    config: PathBuf,
    /// Usage spec overriding the one in the declaration.
    #[arg(long)]
    spec: Option<String>,
}

#[derive(Debug, Args)]
struct MatchArgs {
    #[command(flatten)]
    spec: SpecArgs,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
    /// Arguments to match, without the program name.
    #[arg(last = true)]
    args: Vec<String>,
}

#[derive(Debug, Args)]
struct TokensArgs {
    /// Usage spec to tokenize.
    #[arg(long)]
    spec: String,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Check(args) => run_check(args),
        Command::Match(args) => run_match(args),
        Command::Dot(args) => run_dot(args),
        Command::Tokens(args) => run_tokens(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn load_decl(args: &SpecArgs) -> Result<CommandDecl, String> {
    let mut decl = CommandDecl::load(&args.config)
        .map_err(|err| format!("Failed to load '{}': {err}", args.config.display()))?;
    if let Some(spec) = &args.spec {
        decl.spec = Some(spec.clone());
    }
    debug!(command = %decl.name, spec = %decl.effective_spec(), "loaded declaration");
    Ok(decl)
}

fn run_check(args: SpecArgs) -> Result<(), String> {
    let decl = load_decl(&args)?;
    let cmd = UsageCommand::new(&decl).map_err(|e| e.to_string())?;
    let fsm = cmd.automaton();
    println!(
        "{}: '{}' compiled to {} state(s), {} transition(s).",
        cmd.name(),
        cmd.spec(),
        fsm.state_count(),
        fsm.transition_count()
    );
    for option in &decl.options {
        println!("  option {}: {}", option.canonical_name(), option.value_type.label());
    }
    for arg in &decl.args {
        println!("  arg {}: {}", arg.name, arg.value_type.label());
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct Binding<'a> {
    kind: ContainerKind,
    value: &'a Value,
    set_by_user: bool,
}

fn run_match(args: MatchArgs) -> Result<(), String> {
    let decl = load_decl(&args.spec)?;
    let mut cmd = UsageCommand::new(&decl).map_err(|e| e.to_string())?;

    let containers = cmd.containers_mut();
    for i in 0..containers.len() {
        containers.get_mut(ContainerId(i)).set_by_user = Some(false);
    }

    cmd.parse(args.args).map_err(|e| e.to_string())?;

    let bindings: BTreeMap<&str, Binding<'_>> = cmd
        .containers()
        .iter()
        .map(|(_, c)| {
            (
                c.name.as_str(),
                Binding {
                    kind: c.kind,
                    value: &c.value,
                    set_by_user: c.set_by_user.unwrap_or(false),
                },
            )
        })
        .collect();

    let raw = match args.format {
        CliOutputFormat::Json => serde_json::to_string_pretty(&bindings)
            .map_err(|err| format!("Failed to serialize bindings: {err}"))?,
        CliOutputFormat::Yaml => serde_yaml::to_string(&bindings)
            .map_err(|err| format!("Failed to serialize bindings: {err}"))?,
    };
    println!("{}", raw.trim_end());
    Ok(())
}

fn run_dot(args: SpecArgs) -> Result<(), String> {
    let decl = load_decl(&args)?;
    let cmd = UsageCommand::new(&decl).map_err(|e| e.to_string())?;
    print!("{}", cmd.automaton().to_dot());
    Ok(())
}

fn run_tokens(args: TokensArgs) -> Result<(), String> {
    let tokens = tokenize(&args.spec).map_err(|e| e.to_string())?;
    for token in tokens {
        println!("{} {:?} {}", token.offset, token.kind, token.text);
    }
    Ok(())
}
